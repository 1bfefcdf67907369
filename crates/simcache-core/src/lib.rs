#![forbid(unsafe_code)]
//! simcache-core: the pure half of the result cache.
//!
//! Everything here is deterministic and free of filesystem IO: the
//! configuration model a computation is described by, the fingerprint that
//! addresses it on disk, recipe identities, and the text format of the
//! dependency manifest. Persistence lives in `simcache-store`, orchestration
//! in `simcache-recipe`.

pub mod config;
pub mod configuration;
pub mod error;
pub mod geometry;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod settings;
pub mod stack;
