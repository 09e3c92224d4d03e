//! # Graphcache Core
//!
//! Core building blocks for the graphcache SPARQL query cache:
//!
//! - Deterministic short IDs used as KV keys (`short_id`)
//! - The `KvStore` trait the cache indices are persisted through, plus an
//!   in-memory implementation for tests and embedded use
//! - The persisted record types (`QueryEntry`, `GraphEntry`, `RelatedGroup`)
//!
//! The cache engine itself lives in `graphcache-engine`; this crate holds
//! everything the engine persists and the seam it persists through.

pub mod error;
pub mod hash;
pub mod kv;
pub mod record;

pub use error::{Error, Result};
pub use hash::{related_group_id, short_id, ID_PREFIX};
pub use kv::{FailingKvStore, KvStore, MemoryKvStore};
pub use record::{GraphEntry, QueryEntry, RelatedGroup};
