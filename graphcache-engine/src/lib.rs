//! # Graphcache Engine
//!
//! The query-cache engine: memoizes SPARQL results keyed on query text and
//! invalidates them selectively when data changes. Three indices live in
//! the backing [`KvStore`](graphcache_core::KvStore):
//!
//! - query → entry (text, result, back-references)
//! - graph → referencing queries
//! - triple pattern → owning query
//!
//! supporting three invalidation vectors: by exact query, by graph, and by
//! concrete triple (pattern match). Transactions defer mutations and, on
//! the outermost commit, link every query memoized in the session so that
//! invalidating one invalidates all.

pub mod engine;
pub mod txn;

pub use engine::{candidate_pattern_keys, pattern_key, QueryCache};
pub use txn::{DeferredOp, FinishOutcome, FrameState, TransactionFrame, TransactionLog};

pub use graphcache_core::{Error, Result};
