//! simcache: content-addressed caching of expensive computations.
//!
//! Re-exports the member crates so applications and the integration tests
//! depend on a single package.

pub use simcache_core;
pub use simcache_recipe;
pub use simcache_store;

pub use simcache_core::prelude::*;
pub use simcache_recipe::{
    BoxError, ConvergenceTracker, DependencyOutcome, EvalContext, Evaluator, Freshness, Recipe,
    RecipeError, RecipeState, StaleReason,
};
pub use simcache_store::{FsStorage, MemoryStorage, ResultStore, Results, Storage, StoreError};
