//! Read-through caching facade over a SPARQL store adapter.

use std::fmt::Debug;

use async_trait::async_trait;
use graphcache_core::KvStore;
use graphcache_engine::QueryCache;
use graphcache_sparql::{extract, QueryAnalysis, QueryKind};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::statement::Statement;

/// The store the facade caches in front of.
///
/// Implementations wrap an HTTP SPARQL endpoint, an embedded triple store,
/// or anything else that can answer SPARQL. Errors propagate to the
/// facade's caller unchanged.
#[async_trait]
pub trait StoreAdapter: Debug + Send + Sync {
    /// Execute a SPARQL query or update.
    async fn query(&self, sparql: &str) -> Result<Value>;

    /// Insert statements, optionally into a specific graph.
    async fn add_statements(&self, statements: &[Statement], graph: Option<&str>) -> Result<()>;

    /// Delete statements matching the given one (which may contain
    /// variable terms), optionally scoped to a graph.
    async fn delete_matching_statements(
        &self,
        statement: &Statement,
        graph: Option<&str>,
    ) -> Result<()>;
}

/// Caching wrapper around a [`StoreAdapter`].
///
/// Reads consult the cache engine first and memoize on miss. Updates and
/// statement writes invalidate affected cache entries, then forward to the
/// adapter. Engine operations are serialized behind one mutex; the engine
/// itself is single-threaded cooperative.
#[derive(Debug)]
pub struct CachingStore<A: StoreAdapter, K: KvStore> {
    adapter: A,
    cache: Mutex<QueryCache<K>>,
}

impl<A: StoreAdapter, K: KvStore> CachingStore<A, K> {
    /// Wrap an adapter, persisting cache indices through `kv`.
    pub fn new(adapter: A, kv: K) -> Self {
        Self {
            adapter,
            cache: Mutex::new(QueryCache::new(kv)),
        }
    }

    /// Execute a query through the cache.
    ///
    /// Read forms return the memoized result when present; otherwise the
    /// adapter answers and the result is memoized. Update forms are
    /// forwarded first, then invalidation runs: triple-precise for
    /// concrete `INSERT DATA` / `DELETE DATA` quads, graph-level for
    /// everything else.
    pub async fn query(&self, sparql: &str) -> Result<Value> {
        let analysis = extract(sparql).map_err(|e| Error::MalformedQuery(e.to_string()))?;

        match analysis.kind {
            QueryKind::Read(_) => self.cached_read(sparql).await,
            QueryKind::Update(_) => self.write_through(sparql, &analysis).await,
        }
    }

    async fn cached_read(&self, sparql: &str) -> Result<Value> {
        {
            let cache = self.cache.lock().await;
            if let Some(result) = cache.lookup(sparql).await? {
                debug!("cache hit");
                return Ok(result);
            }
        }

        debug!("cache miss, querying adapter");
        let result = self.adapter.query(sparql).await?;

        let mut cache = self.cache.lock().await;
        cache.remember(sparql, result.clone()).await?;
        Ok(result)
    }

    async fn write_through(&self, sparql: &str, analysis: &QueryAnalysis) -> Result<Value> {
        let result = self.adapter.query(sparql).await?;

        let mut cache = self.cache.lock().await;
        if !analysis.data_quads.is_empty() {
            debug!(quads = analysis.data_quads.len(), "triple-precise invalidation");
            for quad in &analysis.data_quads {
                cache
                    .invalidate_by_triple(&quad.graph, &quad.subject, &quad.predicate, &quad.object)
                    .await?;
            }
        } else {
            debug!(graphs = analysis.graphs.len(), "graph-level invalidation");
            for graph in &analysis.graphs {
                cache.invalidate_by_graph(graph).await?;
            }
        }
        Ok(result)
    }

    /// Insert statements, invalidating every graph they mention first.
    pub async fn add_statements(
        &self,
        statements: &[Statement],
        graph: Option<&str>,
    ) -> Result<()> {
        self.invalidate_graphs_of(statements.iter(), graph).await?;
        self.adapter.add_statements(statements, graph).await
    }

    /// Delete matching statements, invalidating every graph mentioned
    /// first.
    pub async fn delete_matching_statements(
        &self,
        statement: &Statement,
        graph: Option<&str>,
    ) -> Result<()> {
        self.invalidate_graphs_of(std::iter::once(statement), graph)
            .await?;
        self.adapter.delete_matching_statements(statement, graph).await
    }

    async fn invalidate_graphs_of<'a>(
        &self,
        statements: impl Iterator<Item = &'a Statement>,
        graph: Option<&str>,
    ) -> Result<()> {
        let mut graphs: Vec<String> = Vec::new();
        if let Some(g) = graph {
            graphs.push(g.to_string());
        }
        for stmt in statements {
            if let Some(g) = &stmt.graph {
                if !graphs.contains(g) {
                    graphs.push(g.clone());
                }
            }
        }
        if graphs.is_empty() {
            graphs.push(String::new());
        }

        let mut cache = self.cache.lock().await;
        for g in &graphs {
            cache.invalidate_by_graph(g).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Transaction passthrough
    // =========================================================================

    /// Open a transaction on the cache engine; write invalidations defer
    /// until the outermost commit.
    pub async fn begin_transaction(&self) -> usize {
        self.cache.lock().await.begin_transaction()
    }

    /// Commit the active cache transaction.
    pub async fn commit_transaction(&self) -> Result<()> {
        self.cache.lock().await.commit_transaction().await?;
        Ok(())
    }

    /// ID of the transaction frame currently accepting operations.
    pub async fn active_transaction_id(&self) -> Option<usize> {
        self.cache.lock().await.active_transaction_id()
    }

    /// Number of transaction frames still active.
    pub async fn running_transactions(&self) -> usize {
        self.cache.lock().await.running_transactions()
    }
}
