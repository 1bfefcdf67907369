#![forbid(unsafe_code)]
//! simcache-store: persistence for result bags.
//!
//! A `ResultStore` reads and writes `<prefix>_results.json` artifacts through
//! a `Storage` backend. The filesystem backend is the only durable one; the
//! in-memory backend exists for tests and dry runs.
//!
//! Known limitation: writers to the same artifact path are not coordinated.
//! Two processes saving the same fingerprint race and the last writer wins.

pub mod error;
pub mod memory_storage;
pub mod paths;
pub mod results;
pub mod storage;
pub mod store;

pub use error::{Result, StoreError};
pub use memory_storage::MemoryStorage;
pub use results::Results;
pub use storage::{FsStorage, Storage};
pub use store::ResultStore;
