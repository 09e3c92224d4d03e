//! Minimal statement type for the write paths.
//!
//! The full RDF data model lives with the adapter; the facade only needs
//! enough of a statement to know which graphs and patterns a write can
//! touch.

use graphcache_sparql::Term;

/// A concrete RDF statement, optionally graph-tagged.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    /// Graph the statement belongs to; `None` means the default graph
    pub graph: Option<String>,
}

impl Statement {
    /// A statement in the default graph.
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: None,
        }
    }

    /// Tag the statement with a graph.
    pub fn in_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    /// The graph URI this statement affects; empty string for the default
    /// graph.
    pub fn graph_uri(&self) -> &str {
        self.graph.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_uri_defaults_to_empty() {
        let stmt = Statement::new(
            Term::uri("http://e/s"),
            Term::uri("http://e/p"),
            Term::literal("o"),
        );
        assert_eq!(stmt.graph_uri(), "");
        assert_eq!(stmt.clone().in_graph("http://g/").graph_uri(), "http://g/");
    }
}
