//! The cache engine proper.
//!
//! `QueryCache` owns a `KvStore` handle and the transaction log. All
//! mutating operations take `&mut self`: the engine is single-threaded
//! cooperative, and callers that need sharing serialize behind a mutex
//! (the store facade does exactly that).
//!
//! Multi-key operations are not atomic. A backend failure mid-operation
//! surfaces to the caller with partial mutation left in place; invalidation
//! is idempotent, so retrying is always safe.

use std::collections::BTreeSet;

use graphcache_core::{
    short_id, Error, GraphEntry, KvStore, QueryEntry, RelatedGroup, Result,
};
use graphcache_sparql::{extract, Term};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::txn::{DeferredOp, FinishOutcome, TransactionLog};

/// The query-cache engine.
///
/// Generic over the backing store; each instance is self-contained, with
/// its own transaction stack.
#[derive(Debug)]
pub struct QueryCache<K: KvStore> {
    kv: K,
    txn: TransactionLog,
}

impl<K: KvStore> QueryCache<K> {
    /// Create an engine over a backing store.
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            txn: TransactionLog::new(),
        }
    }

    /// The memoized result for a query, if one is cached.
    ///
    /// Reads bypass the transaction log: mutations deferred inside an open
    /// transaction are not visible until commit.
    pub async fn lookup(&self, query: &str) -> Result<Option<Value>> {
        let qid = short_id(query);
        Ok(self.fetch_query_entry(&qid).await?.map(|entry| entry.result))
    }

    /// Memoize a query's result.
    ///
    /// Re-memoizing an already-cached query invalidates the old entry
    /// first; overwriting in place is forbidden. Update-form queries are
    /// ignored. Inside a transaction the operation is deferred.
    pub async fn remember(&mut self, query: &str, result: Value) -> Result<()> {
        if self.txn.is_active() {
            debug!(txn = ?self.txn.active_id(), "deferring remember");
            self.txn.defer(DeferredOp::Remember {
                query: query.to_string(),
                result,
            });
            return Ok(());
        }
        self.apply_remember(query, result).await
    }

    /// Drop the memoized entry for exactly this query, along with every
    /// graph/pattern record installed for it. Cascades through the related
    /// group if the query was committed in a transaction. No-op when the
    /// query is not cached. Inside a transaction the operation is deferred.
    pub async fn invalidate_by_query(&mut self, query: &str) -> Result<()> {
        if self.txn.is_active() {
            debug!(txn = ?self.txn.active_id(), "deferring invalidate_by_query");
            self.txn.defer(DeferredOp::InvalidateQuery {
                query: query.to_string(),
            });
            return Ok(());
        }
        self.apply_invalidate_by_query(query).await
    }

    /// Drop every memoized query that reads from `graph_uri`. No-op when no
    /// query references the graph. Inside a transaction the operation is
    /// deferred.
    pub async fn invalidate_by_graph(&mut self, graph_uri: &str) -> Result<()> {
        if self.txn.is_active() {
            debug!(txn = ?self.txn.active_id(), "deferring invalidate_by_graph");
            self.txn.defer(DeferredOp::InvalidateGraph {
                graph_uri: graph_uri.to_string(),
            });
            return Ok(());
        }
        self.apply_invalidate_by_graph(graph_uri).await
    }

    /// Drop every memoized query whose patterns could have matched a
    /// concrete triple written to `graph_uri`.
    ///
    /// A concrete quad has at most eight candidate pattern keys (each URI
    /// position hashed or wildcarded); each is a direct lookup. The owning
    /// queries are then invalidated through [`invalidate_by_query`], so
    /// transactional deferral and related-group cascade apply as usual.
    ///
    /// [`invalidate_by_query`]: Self::invalidate_by_query
    pub async fn invalidate_by_triple(
        &mut self,
        graph_uri: &str,
        subject: &Term,
        predicate: &Term,
        object: &Term,
    ) -> Result<()> {
        let gid = short_id(graph_uri);
        let mut owners: Vec<(String, String)> = Vec::new();

        for key in candidate_pattern_keys(&gid, subject, predicate, object) {
            let Some(value) = self.kv.get(&key).await? else {
                continue;
            };
            let Value::String(qid) = value else {
                warn!(%key, "pattern entry holds a non-string value");
                continue;
            };
            if owners.iter().any(|(seen, _)| *seen == qid) {
                continue;
            }
            match self.fetch_query_entry(&qid).await? {
                Some(entry) => owners.push((qid, entry.query)),
                None => warn!(%key, %qid, "pattern entry names a missing query entry"),
            }
        }

        debug!(graph = graph_uri, hits = owners.len(), "triple-level invalidation");
        for (_, query) in owners {
            self.invalidate_by_query(&query).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Open a transaction frame, returning its ID. Frames nest; mutations
    /// defer to the innermost active frame until the outermost commit.
    pub fn begin_transaction(&mut self) -> usize {
        let id = self.txn.begin();
        debug!(txn = id, "transaction started");
        id
    }

    /// ID of the frame currently accepting operations, if any.
    pub fn active_transaction_id(&self) -> Option<usize> {
        self.txn.active_id()
    }

    /// Number of transaction frames still active.
    pub fn running_transactions(&self) -> usize {
        self.txn.running()
    }

    /// Commit the active transaction frame.
    ///
    /// Committing an inner frame keeps everything deferred. Committing the
    /// outermost frame executes every deferred operation in placement
    /// order, then links all queries memoized during the session into one
    /// content-addressed related group (skipping those invalidated along
    /// the way).
    ///
    /// There is no rollback. If execution fails partway, the error
    /// surfaces and the store is left in an indeterminate state; the
    /// transaction session stays open so the caller can observe it.
    pub async fn commit_transaction(&mut self) -> Result<()> {
        match self.txn.finish_active()? {
            FinishOutcome::Inner { next_active } => {
                debug!(txn = next_active, "inner commit, ops remain deferred");
                Ok(())
            }
            FinishOutcome::Outermost => {
                let ops = self.txn.take_all_ops();
                debug!(ops = ops.len(), "committing outermost transaction");

                let mut remembered: BTreeSet<String> = BTreeSet::new();
                for op in ops {
                    match op {
                        DeferredOp::Remember { query, result } => {
                            remembered.insert(short_id(&query));
                            self.apply_remember(&query, result).await?;
                        }
                        DeferredOp::InvalidateQuery { query } => {
                            self.apply_invalidate_by_query(&query).await?;
                        }
                        DeferredOp::InvalidateGraph { graph_uri } => {
                            self.apply_invalidate_by_graph(&graph_uri).await?;
                        }
                    }
                }

                if !remembered.is_empty() {
                    let group = RelatedGroup::new(remembered.clone());
                    self.kv.set(&group.id, group.to_value()?).await?;

                    for qid in &remembered {
                        if self.txn.was_invalidated(qid) {
                            continue;
                        }
                        match self.fetch_query_entry(qid).await? {
                            Some(mut entry) => {
                                entry.related_group_id = group.id.clone();
                                self.kv.set(qid, entry.to_value()?).await?;
                            }
                            None => warn!(%qid, "remembered query missing at link time"),
                        }
                    }
                    debug!(group = %group.id, members = remembered.len(), "related group linked");
                }

                self.txn.clear();
                Ok(())
            }
        }
    }

    // =========================================================================
    // Direct (non-deferred) operations
    // =========================================================================

    async fn apply_remember(&mut self, query: &str, result: Value) -> Result<()> {
        let qid = short_id(query);

        if self.fetch_query_entry(&qid).await?.is_some() {
            self.apply_invalidate_by_query(query).await?;
        }

        let analysis = extract(query).map_err(|e| Error::malformed_query(e.to_string()))?;
        if analysis.kind.is_update() {
            debug!(%qid, "not memoizing an update");
            return Ok(());
        }

        let mut entry = QueryEntry::new(query, result);

        for graph_uri in &analysis.graphs {
            let gid = short_id(graph_uri);
            let mut graph_entry = self
                .fetch_graph_entry(&gid)
                .await?
                .unwrap_or_else(|| GraphEntry::new(&gid));
            graph_entry.query_ids.insert(qid.clone());
            self.kv.set(&gid, graph_entry.to_value()?).await?;
            entry.graph_ids.insert(gid);
        }

        // Every pattern is indexed under every graph the query reads
        for gid in entry.graph_ids.clone() {
            for pattern in &analysis.patterns {
                let key = pattern_key(&gid, &pattern.subject, &pattern.predicate, &pattern.object);
                trace!(%key, "installing pattern entry");
                self.kv.set(&key, Value::String(qid.clone())).await?;
                entry
                    .triple_patterns
                    .entry(gid.clone())
                    .or_default()
                    .insert(key);
            }
        }

        self.kv.set(&qid, entry.to_value()?).await?;
        debug!(
            %qid,
            graphs = analysis.graphs.len(),
            patterns = analysis.patterns.len(),
            "memoized query"
        );
        Ok(())
    }

    async fn apply_invalidate_by_query(&mut self, query: &str) -> Result<()> {
        let qid = short_id(query);
        let Some(entry) = self.fetch_query_entry(&qid).await? else {
            debug!(%qid, "no cache entry to invalidate");
            return Ok(());
        };

        self.invalidate_single(&qid, &entry, None).await?;
        if !entry.related_group_id.is_empty() {
            self.cascade_related(&qid, &entry.related_group_id).await?;
        }
        Ok(())
    }

    async fn apply_invalidate_by_graph(&mut self, graph_uri: &str) -> Result<()> {
        let gid = short_id(graph_uri);
        let Some(graph_entry) = self.fetch_graph_entry(&gid).await? else {
            debug!(graph = graph_uri, "no graph entry to invalidate");
            return Ok(());
        };

        debug!(
            graph = graph_uri,
            queries = graph_entry.query_ids.len(),
            "invalidating graph"
        );
        for qid in &graph_entry.query_ids {
            // A related-group cascade may already have removed this one
            let Some(entry) = self.fetch_query_entry(qid).await? else {
                continue;
            };
            // This graph's entry is deleted wholesale below; only the
            // query's other graphs need per-entry cleanup
            self.invalidate_single(qid, &entry, Some(&gid)).await?;
            if !entry.related_group_id.is_empty() {
                self.cascade_related(qid, &entry.related_group_id).await?;
            }
        }

        self.kv.delete(&gid).await?;
        Ok(())
    }

    /// Remove one query entry and everything installed on its behalf,
    /// without following its related group.
    async fn invalidate_single(
        &mut self,
        qid: &str,
        entry: &QueryEntry,
        skip_graph: Option<&str>,
    ) -> Result<()> {
        for gid in &entry.graph_ids {
            if skip_graph == Some(gid.as_str()) {
                continue;
            }
            match self.fetch_graph_entry(gid).await? {
                Some(mut graph_entry) => {
                    graph_entry.query_ids.remove(qid);
                    if graph_entry.query_ids.is_empty() {
                        self.kv.delete(gid).await?;
                    } else {
                        self.kv.set(gid, graph_entry.to_value()?).await?;
                    }
                }
                None => {
                    warn!(%qid, graph_id = %gid, "query entry references a missing graph entry")
                }
            }
        }

        for key in entry.pattern_keys() {
            trace!(%key, "removing pattern entry");
            self.kv.delete(key).await?;
        }

        self.txn.note_invalidated(qid);
        self.kv.delete(qid).await?;
        debug!(%qid, "invalidated query entry");
        Ok(())
    }

    /// Invalidate the other members of a related group. Members are swept
    /// without re-checking their own groups, which is what terminates the
    /// cascade in a single pass.
    async fn cascade_related(&mut self, origin_qid: &str, group_id: &str) -> Result<()> {
        let Some(group) = self.fetch_related_group(group_id).await? else {
            warn!(%group_id, "query entry references a missing related group");
            return Ok(());
        };

        debug!(%group_id, members = group.members.len(), "cascading related group");
        for member in &group.members {
            if member == origin_qid {
                continue;
            }
            let Some(entry) = self.fetch_query_entry(member).await? else {
                continue;
            };
            self.invalidate_single(member, &entry, None).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Record fetch helpers
    // =========================================================================

    async fn fetch_query_entry(&self, qid: &str) -> Result<Option<QueryEntry>> {
        match self.kv.get(qid).await? {
            Some(value) => QueryEntry::from_value(value)
                .map(Some)
                .map_err(|e| Error::invariant(format!("corrupt query entry at {qid}: {e}"))),
            None => Ok(None),
        }
    }

    async fn fetch_graph_entry(&self, gid: &str) -> Result<Option<GraphEntry>> {
        match self.kv.get(gid).await? {
            Some(value) => GraphEntry::from_value(value)
                .map(Some)
                .map_err(|e| Error::invariant(format!("corrupt graph entry at {gid}: {e}"))),
            None => Ok(None),
        }
    }

    async fn fetch_related_group(&self, group_id: &str) -> Result<Option<RelatedGroup>> {
        match self.kv.get(group_id).await? {
            Some(value) => RelatedGroup::from_value(value)
                .map(Some)
                .map_err(|e| Error::invariant(format!("corrupt related group at {group_id}: {e}"))),
            None => Ok(None),
        }
    }
}

/// Pattern key for one (graph, subject, predicate, object): URI terms hash
/// to their short ID, everything else is a `*` wildcard. Underscores
/// separate the positions; short IDs never contain one.
pub fn pattern_key(graph_id: &str, subject: &Term, predicate: &Term, object: &Term) -> String {
    format!(
        "{}_{}_{}_{}",
        graph_id,
        term_key(subject),
        term_key(predicate),
        term_key(object)
    )
}

fn term_key(term: &Term) -> String {
    if term.is_uri() {
        short_id(&term.value)
    } else {
        "*".to_string()
    }
}

/// Every pattern key a concrete quad could have been indexed under: each
/// URI position either hashed or wildcarded, non-URI positions wildcard
/// only. At most eight keys.
pub fn candidate_pattern_keys(
    graph_id: &str,
    subject: &Term,
    predicate: &Term,
    object: &Term,
) -> Vec<String> {
    let mut keys = Vec::new();
    for s in position_keys(subject) {
        for p in position_keys(predicate) {
            for o in position_keys(object) {
                keys.push(format!("{graph_id}_{s}_{p}_{o}"));
            }
        }
    }
    keys
}

fn position_keys(term: &Term) -> Vec<String> {
    if term.is_uri() {
        vec![short_id(&term.value), "*".to_string()]
    } else {
        vec!["*".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcache_sparql::Term;

    #[test]
    fn test_pattern_key_wildcards() {
        let key = pattern_key(
            "qc-graph",
            &Term::var("s"),
            &Term::uri("http://e/p"),
            &Term::literal("5"),
        );
        let p_hash = short_id("http://e/p");
        assert_eq!(key, format!("qc-graph_*_{p_hash}_*"));
    }

    #[test]
    fn test_candidate_keys_cross_product() {
        let keys = candidate_pattern_keys(
            "g",
            &Term::uri("http://e/s"),
            &Term::uri("http://e/p"),
            &Term::literal("x"),
        );
        // Two URI positions, one literal: 2 * 2 * 1 candidates
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&format!(
            "g_{}_{}_*",
            short_id("http://e/s"),
            short_id("http://e/p")
        )));
        assert!(keys.contains(&"g_*_*_*".to_string()));
    }

    #[test]
    fn test_candidate_keys_all_uris() {
        let keys = candidate_pattern_keys(
            "g",
            &Term::uri("http://e/s"),
            &Term::uri("http://e/p"),
            &Term::uri("http://e/o"),
        );
        assert_eq!(keys.len(), 8);
    }
}
