//! # Graphcache Store
//!
//! The read-through caching facade. `CachingStore` wraps any store adapter
//! (an HTTP SPARQL endpoint, an embedded triple store) behind the cache
//! engine: reads are memoized, updates and statement writes invalidate
//! before being forwarded.
//!
//! The adapter is the only thing an application implements; the cache
//! engine, extraction, and key layout all come along for free.

pub mod error;
pub mod statement;
pub mod store;

pub use error::{Error, Result};
pub use statement::Statement;
pub use store::{CachingStore, StoreAdapter};

pub use graphcache_sparql::{Term, TermKind};
