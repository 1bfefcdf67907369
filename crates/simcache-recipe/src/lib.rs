#![forbid(unsafe_code)]
//! simcache-recipe: dependency-aware, cached evaluation.
//!
//! A [`Recipe`] evaluates its dependencies depth-first in list order, then
//! either reuses the result stored under `<root>/<kind>_<fingerprint>/` when
//! the freshness check passes, or runs its evaluator and persists the new
//! result. Either way the dependency manifest is rewritten.
//!
//! Evaluation is single-threaded and synchronous. Recipes with different
//! fingerprints never share a directory; two processes evaluating the same
//! fingerprint at once are not coordinated.

pub mod convergence;
pub mod error;
pub mod freshness;
pub mod recipe;
pub mod recorder;

pub use convergence::ConvergenceTracker;
pub use error::{BoxError, RecipeError, Result};
pub use freshness::{is_fresh, Freshness, StaleReason};
pub use recipe::{DependencyOutcome, EvalContext, Evaluator, Recipe, RecipeBuilder, RecipeState};
pub use recorder::DependencyRecorder;
