//! Token types for the extraction lexer.

use crate::span::SourceSpan;
use std::sync::Arc;

/// A token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The token kind
    pub kind: TokenKind,
    /// Source location
    pub span: SourceSpan,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }

    /// Check if this is an EOF token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// Token kinds the extractor distinguishes.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Full IRI: `<http://example.org/>`
    Iri(Arc<str>),

    /// Prefixed name with local part: `prefix:local`
    PrefixedName {
        /// Namespace prefix (without colon)
        prefix: Arc<str>,
        /// Local name
        local: Arc<str>,
    },

    /// Prefixed name namespace alone: `prefix:` (as in PREFIX declarations)
    PrefixedNameNs(Arc<str>),

    /// Variable: `?name` or `$name` (stored without the sigil)
    Var(Arc<str>),

    /// String literal (unescaped content)
    String(Arc<str>),

    /// Numeric literal, kept as raw text (the extractor only needs to know
    /// it is a literal)
    Number(Arc<str>),

    /// Language tag without the `@`: `en`, `en-US`
    LangTag(Arc<str>),

    /// Labeled blank node: `_:name`
    BlankNodeLabel(Arc<str>),

    /// Anonymous blank node: `[]`
    Anon,

    /// A recognized SPARQL keyword
    Keyword(Keyword),

    /// A bare word that is not a keyword (function names, solution-modifier
    /// words the extractor skips)
    Ident(Arc<str>),

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Semicolon,
    /// Datatype marker: `^^`
    DoubleCaret,

    /// Any other single character (operators inside skipped expressions)
    Other(char),

    /// Lexical error with a message
    Error(Arc<str>),

    /// End of input
    Eof,
}

/// Keywords that steer extraction.
///
/// Keywords are case-insensitive in SPARQL, except `a` (the rdf:type
/// shorthand) which is lowercase only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    // Query forms
    Select,
    Construct,
    Describe,
    Ask,
    // Prologue
    Prefix,
    Base,
    // Dataset clauses
    From,
    Named,
    // Group patterns
    Where,
    Graph,
    Optional,
    Union,
    Minus,
    Filter,
    Bind,
    Values,
    Service,
    Silent,
    Exists,
    Not,
    As,
    // Updates
    Insert,
    Delete,
    Data,
    Clear,
    Drop,
    Create,
    Load,
    With,
    Using,
    Into,
    Default,
    All,
    // Solution modifiers (recognized so the extractor can skip their
    // operands without mistaking a variable for a triple subject)
    Order,
    Group,
    Having,
    Limit,
    Offset,
    By,
    Asc,
    Desc,
    Distinct,
    Reduced,
    // Boolean literals
    True,
    False,
    /// The `a` predicate shorthand for rdf:type
    A,
}

/// Resolve a bare word to a keyword, if it is one.
pub fn keyword_from_str(word: &str) -> Option<Keyword> {
    if word == "a" {
        return Some(Keyword::A);
    }
    let kw = match word.to_ascii_lowercase().as_str() {
        "select" => Keyword::Select,
        "construct" => Keyword::Construct,
        "describe" => Keyword::Describe,
        "ask" => Keyword::Ask,
        "prefix" => Keyword::Prefix,
        "base" => Keyword::Base,
        "from" => Keyword::From,
        "named" => Keyword::Named,
        "where" => Keyword::Where,
        "graph" => Keyword::Graph,
        "optional" => Keyword::Optional,
        "union" => Keyword::Union,
        "minus" => Keyword::Minus,
        "filter" => Keyword::Filter,
        "bind" => Keyword::Bind,
        "values" => Keyword::Values,
        "service" => Keyword::Service,
        "silent" => Keyword::Silent,
        "exists" => Keyword::Exists,
        "not" => Keyword::Not,
        "as" => Keyword::As,
        "insert" => Keyword::Insert,
        "delete" => Keyword::Delete,
        "data" => Keyword::Data,
        "clear" => Keyword::Clear,
        "drop" => Keyword::Drop,
        "create" => Keyword::Create,
        "load" => Keyword::Load,
        "with" => Keyword::With,
        "using" => Keyword::Using,
        "into" => Keyword::Into,
        "default" => Keyword::Default,
        "all" => Keyword::All,
        "order" => Keyword::Order,
        "group" => Keyword::Group,
        "having" => Keyword::Having,
        "limit" => Keyword::Limit,
        "offset" => Keyword::Offset,
        "by" => Keyword::By,
        "asc" => Keyword::Asc,
        "desc" => Keyword::Desc,
        "distinct" => Keyword::Distinct,
        "reduced" => Keyword::Reduced,
        "true" => Keyword::True,
        "false" => Keyword::False,
        _ => return None,
    };
    Some(kw)
}
