//! # Graphcache SPARQL
//!
//! Just enough SPARQL understanding for a query cache: given query text,
//! report which named graphs it reads, which triple patterns its WHERE
//! clause matches, and whether it is a read or an update. This is not a
//! query engine's parser; anything that does not affect cache keys or
//! invalidation (expressions, solution modifiers, property-path structure)
//! is tokenized and skipped.
//!
//! ```
//! use graphcache_sparql::{extract, QueryKind, TermKind};
//!
//! let analysis = extract(
//!     "SELECT * FROM <http://example.org/g> WHERE { ?s ?p ?o }",
//! ).unwrap();
//! assert!(matches!(analysis.kind, QueryKind::Read(_)));
//! assert_eq!(analysis.graphs, vec!["http://example.org/g".to_string()]);
//! assert_eq!(analysis.patterns.len(), 1);
//! assert_eq!(analysis.patterns[0].subject.kind, TermKind::Var);
//! ```

pub mod error;
pub mod extract;
pub mod lex;
pub mod span;

pub use error::{ExtractError, Result};
pub use extract::{
    extract, DataQuad, QueryAnalysis, QueryKind, ReadForm, Term, TermKind, TriplePattern,
    UpdateForm, RDF_TYPE,
};
pub use span::SourceSpan;
