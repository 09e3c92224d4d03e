//! Graph and triple-pattern extraction.
//!
//! Walks the token stream of a query and collects the three things the
//! cache needs:
//!
//! 1. the graphs the query touches (`FROM`, `FROM NAMED`, `WITH`, `USING`,
//!    `GRAPH <uri>`, and graph references in update operations),
//! 2. the triple patterns its WHERE clause matches, with each term typed
//!    as URI, variable, literal, or blank node,
//! 3. whether it is a read or an update, and for `INSERT DATA` /
//!    `DELETE DATA` the concrete quads written.
//!
//! Constructs that cannot affect invalidation (expressions, solution
//! modifiers, property-path structure, SERVICE bodies) are skipped.
//! Property-path predicates degrade to a wildcard term, and `GRAPH ?var`
//! degrades to the default graph; both err toward matching more, never
//! less.

use std::collections::HashMap;

use crate::error::{ExtractError, Result};
use crate::lex::{tokenize, Keyword, Token, TokenKind};

/// The IRI the `a` predicate shorthand expands to.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Classification of a term in a triple pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    /// Absolute IRI
    Uri,
    /// Query variable
    Var,
    /// Literal (string, number, boolean)
    Literal,
    /// Blank node (labeled or anonymous)
    BlankNode,
}

/// One position of a triple pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    /// Term text: the IRI, variable name, literal lexical form, or blank
    /// node label
    pub value: String,
    /// What kind of term this is
    pub kind: TermKind,
}

impl Term {
    /// An IRI term.
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TermKind::Uri,
        }
    }

    /// A variable term.
    pub fn var(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TermKind::Var,
        }
    }

    /// A literal term.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TermKind::Literal,
        }
    }

    /// A blank node term.
    pub fn blank(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TermKind::BlankNode,
        }
    }

    /// Whether this term is a concrete IRI (the only kind that hashes into
    /// pattern keys).
    pub fn is_uri(&self) -> bool {
        self.kind == TermKind::Uri
    }
}

/// A WHERE-clause triple pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

/// A concrete quad from an `INSERT DATA` / `DELETE DATA` block.
#[derive(Clone, Debug, PartialEq)]
pub struct DataQuad {
    /// Graph URI the quad is written to; empty string for the default graph
    pub graph: String,
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

/// Read query forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadForm {
    Select,
    Ask,
    Construct,
    Describe,
}

/// Update operation forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateForm {
    Insert,
    Delete,
    Clear,
    Drop,
    Create,
    Load,
}

/// Whether a query reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    Read(ReadForm),
    Update(UpdateForm),
}

impl QueryKind {
    /// Whether this query mutates the store.
    pub fn is_update(&self) -> bool {
        matches!(self, QueryKind::Update(_))
    }
}

/// Everything the cache learns from one query.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryAnalysis {
    /// Read or update, and which form
    pub kind: QueryKind,
    /// Graph URIs the query touches, deduplicated in first-seen order.
    /// A query that names no graph yields a single empty-string entry.
    pub graphs: Vec<String>,
    /// WHERE-clause triple patterns
    pub patterns: Vec<TriplePattern>,
    /// Concrete quads from INSERT DATA / DELETE DATA
    pub data_quads: Vec<DataQuad>,
}

/// Analyze a SPARQL query string.
pub fn extract(input: &str) -> Result<QueryAnalysis> {
    let tokens = tokenize(input);

    for token in &tokens {
        if let TokenKind::Error(msg) = &token.kind {
            return Err(ExtractError::lex(msg.to_string(), token.span.start));
        }
    }

    Extractor::new(tokens).run()
}

struct Extractor {
    tokens: Vec<Token>,
    pos: usize,
    base: Option<String>,
    prefixes: HashMap<String, String>,
    graphs: Vec<String>,
    patterns: Vec<TriplePattern>,
    data_quads: Vec<DataQuad>,
    bnode_counter: usize,
}

impl Extractor {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            base: None,
            prefixes: HashMap::new(),
            graphs: Vec::new(),
            patterns: Vec::new(),
            data_quads: Vec::new(),
            bnode_counter: 0,
        }
    }

    fn run(mut self) -> Result<QueryAnalysis> {
        self.parse_prologue()?;

        let kind = match self.peek_keyword() {
            Some(Keyword::Select) => self.parse_read(ReadForm::Select)?,
            Some(Keyword::Ask) => self.parse_read(ReadForm::Ask)?,
            Some(Keyword::Describe) => self.parse_read(ReadForm::Describe)?,
            Some(Keyword::Construct) => self.parse_read(ReadForm::Construct)?,
            Some(
                Keyword::Insert
                | Keyword::Delete
                | Keyword::With
                | Keyword::Clear
                | Keyword::Drop
                | Keyword::Create
                | Keyword::Load,
            ) => self.parse_update()?,
            _ => return Err(self.err_here("expected a query form or update operation")),
        };

        // A query that names no graph reads the default graph
        if self.graphs.is_empty() {
            self.graphs.push(String::new());
        }

        Ok(QueryAnalysis {
            kind,
            graphs: self.graphs,
            patterns: self.patterns,
            data_quads: self.data_quads,
        })
    }

    // =========================================================================
    // Cursor primitives
    // =========================================================================

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        match self.peek() {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Consume the current token. EOF is sticky.
    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.pos].kind.clone();
        if !matches!(kind, TokenKind::Eof) {
            self.pos += 1;
        }
        kind
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.peek_keyword() == Some(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_lbrace(&mut self) -> Result<()> {
        match self.peek() {
            TokenKind::LBrace => {
                self.advance();
                Ok(())
            }
            _ => Err(self.err_here("expected '{'")),
        }
    }

    fn err_here(&self, msg: &str) -> ExtractError {
        ExtractError::parse(msg, self.tokens[self.pos].span.start)
    }

    // =========================================================================
    // Prologue and IRI resolution
    // =========================================================================

    fn parse_prologue(&mut self) -> Result<()> {
        loop {
            match self.peek_keyword() {
                Some(Keyword::Prefix) => {
                    self.advance();
                    let prefix = match self.peek().clone() {
                        TokenKind::PrefixedNameNs(ns) => {
                            self.advance();
                            ns.to_string()
                        }
                        _ => return Err(self.err_here("expected 'prefix:' after PREFIX")),
                    };
                    let iri = self.expect_iri_token()?;
                    let iri = self.resolve_iri(&iri);
                    self.prefixes.insert(prefix, iri);
                }
                Some(Keyword::Base) => {
                    self.advance();
                    let iri = self.expect_iri_token()?;
                    self.base = Some(iri);
                }
                _ => return Ok(()),
            }
        }
    }

    /// Expect a raw `<...>` IRI token.
    fn expect_iri_token(&mut self) -> Result<String> {
        match self.peek().clone() {
            TokenKind::Iri(iri) => {
                self.advance();
                Ok(iri.to_string())
            }
            _ => Err(self.err_here("expected an IRI")),
        }
    }

    /// Resolve a (possibly relative) IRI against the BASE declaration.
    fn resolve_iri(&self, iri: &str) -> String {
        match &self.base {
            Some(base) if !iri.contains(':') => format!("{base}{iri}"),
            _ => iri.to_string(),
        }
    }

    /// Resolve a prefixed name to an absolute IRI.
    fn resolve_prefixed(&self, prefix: &str, local: &str) -> Result<String> {
        match self.prefixes.get(prefix) {
            Some(ns) => Ok(format!("{ns}{local}")),
            None => Err(ExtractError::unknown_prefix(
                prefix,
                self.tokens[self.pos.saturating_sub(1)].span.start,
            )),
        }
    }

    /// Expect an IRI or prefixed name, resolved to an absolute IRI.
    fn expect_graph_name(&mut self) -> Result<String> {
        match self.peek().clone() {
            TokenKind::Iri(iri) => {
                self.advance();
                Ok(self.resolve_iri(&iri))
            }
            TokenKind::PrefixedName { prefix, local } => {
                self.advance();
                self.resolve_prefixed(&prefix, &local)
            }
            _ => Err(self.err_here("expected a graph IRI")),
        }
    }

    fn record_graph(&mut self, uri: String) {
        if !self.graphs.contains(&uri) {
            self.graphs.push(uri);
        }
    }

    // =========================================================================
    // Read queries
    // =========================================================================

    fn parse_read(&mut self, form: ReadForm) -> Result<QueryKind> {
        self.advance(); // the form keyword

        // CONSTRUCT's template precedes the dataset clauses; its triples are
        // output, not matched data
        if form == ReadForm::Construct && matches!(self.peek(), TokenKind::LBrace) {
            self.advance();
            self.skip_braces()?;
        }

        loop {
            match self.peek() {
                TokenKind::Keyword(Keyword::From) => self.parse_from_clause()?,
                TokenKind::Keyword(Keyword::Where) => {
                    self.advance();
                    self.expect_lbrace()?;
                    self.parse_group()?;
                    break;
                }
                TokenKind::LBrace => {
                    self.advance();
                    self.parse_group()?;
                    break;
                }
                TokenKind::LParen => {
                    self.advance();
                    self.skip_parens()?;
                }
                TokenKind::Eof => break, // e.g. DESCRIBE <iri> with no body
                _ => {
                    self.advance();
                }
            }
        }

        Ok(QueryKind::Read(form))
    }

    fn parse_from_clause(&mut self) -> Result<()> {
        self.advance(); // FROM
        let _named = self.eat_keyword(Keyword::Named);
        let uri = self.expect_graph_name()?;
        self.record_graph(uri);
        Ok(())
    }

    // =========================================================================
    // Group graph patterns
    // =========================================================================

    /// Parse a group graph pattern. The opening brace is already consumed.
    fn parse_group(&mut self) -> Result<()> {
        loop {
            match self.peek().clone() {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::LBrace => {
                    self.advance();
                    self.parse_group()?;
                }
                TokenKind::Keyword(Keyword::Graph) => {
                    self.advance();
                    self.parse_graph_block()?;
                }
                TokenKind::Keyword(Keyword::Optional | Keyword::Minus) => {
                    self.advance();
                    self.expect_lbrace()?;
                    self.parse_group()?;
                }
                TokenKind::Keyword(Keyword::Union | Keyword::Where) => {
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Filter) => {
                    self.advance();
                    self.skip_filter()?;
                }
                TokenKind::Keyword(Keyword::Bind) => {
                    self.advance();
                    if matches!(self.peek(), TokenKind::LParen) {
                        self.advance();
                        self.skip_parens()?;
                    }
                }
                TokenKind::Keyword(Keyword::Values) => {
                    self.advance();
                    self.skip_values()?;
                }
                TokenKind::Keyword(Keyword::Service) => {
                    self.advance();
                    self.skip_service()?;
                }
                TokenKind::Keyword(Keyword::Select) => {
                    self.advance();
                    self.skip_subselect_header()?;
                }
                TokenKind::Keyword(
                    Keyword::Order
                    | Keyword::Group
                    | Keyword::Having
                    | Keyword::Limit
                    | Keyword::Offset
                    | Keyword::By
                    | Keyword::Asc
                    | Keyword::Desc
                    | Keyword::Distinct
                    | Keyword::Reduced,
                ) => {
                    self.advance();
                    self.skip_modifier_operands()?;
                }
                TokenKind::Dot | TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Eof => return Err(self.err_here("unclosed group pattern")),
                TokenKind::Iri(_)
                | TokenKind::PrefixedName { .. }
                | TokenKind::Var(_)
                | TokenKind::BlankNodeLabel(_)
                | TokenKind::Anon
                | TokenKind::LBracket => {
                    self.parse_triples_block(None)?;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// `GRAPH <uri> { ... }` records the named graph; `GRAPH ?var { ... }`
    /// degrades to the default graph.
    fn parse_graph_block(&mut self) -> Result<()> {
        match self.peek().clone() {
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } => {
                let uri = self.expect_graph_name()?;
                self.record_graph(uri);
            }
            TokenKind::Var(_) => {
                self.advance();
                self.record_graph(String::new());
            }
            _ => return Err(self.err_here("expected a graph IRI or variable after GRAPH")),
        }
        self.expect_lbrace()?;
        self.parse_group()
    }

    /// Skip a FILTER constraint. EXISTS / NOT EXISTS bodies still contribute
    /// patterns because they match against stored data.
    fn skip_filter(&mut self) -> Result<()> {
        match self.peek().clone() {
            TokenKind::LParen => {
                self.advance();
                self.skip_parens()
            }
            TokenKind::Keyword(Keyword::Not) => {
                self.advance();
                if !self.eat_keyword(Keyword::Exists) {
                    return Err(self.err_here("expected EXISTS after NOT"));
                }
                self.expect_lbrace()?;
                self.parse_group()
            }
            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect_lbrace()?;
                self.parse_group()
            }
            _ => {
                // Built-in call or bare constant: `FILTER regex(...)`, `FILTER true`
                self.advance();
                if matches!(self.peek(), TokenKind::LParen) {
                    self.advance();
                    self.skip_parens()?;
                }
                Ok(())
            }
        }
    }

    /// Skip a VALUES data block.
    fn skip_values(&mut self) -> Result<()> {
        match self.peek().clone() {
            TokenKind::Var(_) => {
                self.advance();
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_parens()?;
            }
            _ => {}
        }
        if matches!(self.peek(), TokenKind::LBrace) {
            self.advance();
            self.skip_braces()?;
        }
        Ok(())
    }

    /// Skip a SERVICE clause; its patterns match remote data the cache
    /// cannot see.
    fn skip_service(&mut self) -> Result<()> {
        let _ = self.eat_keyword(Keyword::Silent);
        match self.peek() {
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } | TokenKind::Var(_) => {
                self.advance();
            }
            _ => return Err(self.err_here("expected an endpoint IRI or variable after SERVICE")),
        }
        self.expect_lbrace()?;
        self.skip_braces()
    }

    /// Skip a subselect's projection up to (not including) its body brace.
    fn skip_subselect_header(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => return Ok(()),
                TokenKind::LParen => {
                    self.advance();
                    self.skip_parens()?;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip the operands of a solution modifier (`ORDER BY ?x DESC(?y)`,
    /// `LIMIT 5`, ...).
    fn skip_modifier_operands(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                TokenKind::Var(_)
                | TokenKind::Number(_)
                | TokenKind::Ident(_)
                | TokenKind::Keyword(Keyword::By | Keyword::Asc | Keyword::Desc) => {
                    self.advance();
                }
                TokenKind::LParen => {
                    self.advance();
                    self.skip_parens()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip a balanced `{ ... }` block; the opening brace is consumed.
    fn skip_braces(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            match self.advance() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(self.err_here("unclosed '{'")),
                _ => {}
            }
        }
    }

    /// Skip a balanced `( ... )` expression; the opening paren is consumed.
    fn skip_parens(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            match self.advance() {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(self.err_here("unclosed '('")),
                _ => {}
            }
        }
    }

    // =========================================================================
    // Triples
    // =========================================================================

    /// Parse one triples-same-subject block. With `data_graph` set, emitted
    /// triples are concrete data quads instead of patterns.
    fn parse_triples_block(&mut self, data_graph: Option<&str>) -> Result<()> {
        let subject = self.parse_term("subject", data_graph)?;
        self.parse_predicate_object_list(&subject, data_graph)
    }

    fn parse_predicate_object_list(
        &mut self,
        subject: &Term,
        data_graph: Option<&str>,
    ) -> Result<()> {
        loop {
            let predicate = self.parse_predicate()?;

            loop {
                let object = self.parse_term("object", data_graph)?;
                self.emit(subject.clone(), predicate.clone(), object, data_graph);
                if matches!(self.peek(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }

            if matches!(self.peek(), TokenKind::Semicolon) {
                self.advance();
                while matches!(self.peek(), TokenKind::Semicolon) {
                    self.advance();
                }
                if self.starts_predicate() {
                    continue;
                }
            }
            return Ok(());
        }
    }

    fn starts_predicate(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Iri(_)
                | TokenKind::PrefixedName { .. }
                | TokenKind::Var(_)
                | TokenKind::Keyword(Keyword::A)
                | TokenKind::LParen
                | TokenKind::Other('^')
                | TokenKind::Other('!')
        )
    }

    /// Parse a predicate. A property path degrades to a wildcard (variable)
    /// term so the pattern matches any predicate.
    fn parse_predicate(&mut self) -> Result<Term> {
        match self.peek().clone() {
            TokenKind::Keyword(Keyword::A) => {
                self.advance();
                Ok(Term::uri(RDF_TYPE))
            }
            TokenKind::Var(v) => {
                self.advance();
                Ok(Term::var(v.as_ref()))
            }
            TokenKind::Iri(iri) => {
                self.advance();
                let uri = self.resolve_iri(&iri);
                self.finish_predicate(Term::uri(uri))
            }
            TokenKind::PrefixedName { prefix, local } => {
                self.advance();
                let uri = self.resolve_prefixed(&prefix, &local)?;
                self.finish_predicate(Term::uri(uri))
            }
            TokenKind::LParen | TokenKind::Other('^') | TokenKind::Other('!') => {
                self.skip_path()?;
                Ok(self.fresh_path_wildcard())
            }
            _ => Err(self.err_here("expected a predicate")),
        }
    }

    /// A simple IRI predicate followed by a path operator is actually a
    /// property path; swallow the rest and degrade.
    fn finish_predicate(&mut self, simple: Term) -> Result<Term> {
        if self.path_operator_next() {
            self.skip_path_tail()?;
            Ok(self.fresh_path_wildcard())
        } else {
            Ok(simple)
        }
    }

    fn path_operator_next(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Other('/')
                | TokenKind::Other('|')
                | TokenKind::Other('*')
                | TokenKind::Other('+')
                | TokenKind::Other('?')
        )
    }

    /// Skip a property path starting at an inverse/negation marker or a
    /// parenthesized group.
    fn skip_path(&mut self) -> Result<()> {
        match self.peek().clone() {
            TokenKind::Other('^') | TokenKind::Other('!') => {
                self.advance();
                self.skip_path()?;
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_parens()?;
            }
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } | TokenKind::Keyword(Keyword::A) => {
                self.advance();
            }
            _ => return Err(self.err_here("expected a property path")),
        }
        self.skip_path_tail()
    }

    /// Skip `/elt`, `|elt`, and postfix quantifiers after a path element.
    fn skip_path_tail(&mut self) -> Result<()> {
        loop {
            match self.peek().clone() {
                TokenKind::Other('*') | TokenKind::Other('+') | TokenKind::Other('?') => {
                    self.advance();
                }
                TokenKind::Other('/') | TokenKind::Other('|') => {
                    self.advance();
                    match self.peek().clone() {
                        TokenKind::Other('^') | TokenKind::Other('!') | TokenKind::LParen => {
                            self.skip_path()?;
                            return Ok(());
                        }
                        TokenKind::Iri(_)
                        | TokenKind::PrefixedName { .. }
                        | TokenKind::Keyword(Keyword::A) => {
                            self.advance();
                        }
                        _ => return Err(self.err_here("expected a property path element")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Wildcard predicate standing in for a degraded property path.
    fn fresh_path_wildcard(&mut self) -> Term {
        self.bnode_counter += 1;
        Term::var(format!("__path{}", self.bnode_counter))
    }

    /// Parse a subject or object term.
    fn parse_term(&mut self, position: &str, data_graph: Option<&str>) -> Result<Term> {
        match self.peek().clone() {
            TokenKind::Iri(iri) => {
                self.advance();
                Ok(Term::uri(self.resolve_iri(&iri)))
            }
            TokenKind::PrefixedName { prefix, local } => {
                self.advance();
                self.resolve_prefixed(&prefix, &local).map(Term::uri)
            }
            TokenKind::Var(v) => {
                self.advance();
                Ok(Term::var(v.as_ref()))
            }
            TokenKind::String(s) => {
                self.advance();
                self.consume_literal_suffix()?;
                Ok(Term::literal(s.as_ref()))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Term::literal(n.as_ref()))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Term::literal("true"))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Term::literal("false"))
            }
            TokenKind::BlankNodeLabel(label) => {
                self.advance();
                Ok(Term::blank(label.as_ref()))
            }
            TokenKind::Anon => {
                self.advance();
                Ok(self.fresh_blank())
            }
            TokenKind::LBracket => {
                self.advance();
                let node = self.fresh_blank();
                if !matches!(self.peek(), TokenKind::RBracket) {
                    self.parse_predicate_object_list(&node, data_graph)?;
                }
                match self.peek() {
                    TokenKind::RBracket => {
                        self.advance();
                        Ok(node)
                    }
                    _ => Err(self.err_here("unclosed blank node property list")),
                }
            }
            TokenKind::LParen => {
                // RDF collection; its members do not index usefully
                self.advance();
                self.skip_parens()?;
                Ok(self.fresh_blank())
            }
            _ => Err(self.err_here(&format!("expected a {position} term"))),
        }
    }

    /// Consume an optional language tag or `^^datatype` after a string.
    fn consume_literal_suffix(&mut self) -> Result<()> {
        match self.peek().clone() {
            TokenKind::LangTag(_) => {
                self.advance();
                Ok(())
            }
            TokenKind::DoubleCaret => {
                self.advance();
                match self.peek() {
                    TokenKind::Iri(_) | TokenKind::PrefixedName { .. } => {
                        self.advance();
                        Ok(())
                    }
                    _ => Err(self.err_here("expected a datatype IRI after '^^'")),
                }
            }
            _ => Ok(()),
        }
    }

    fn fresh_blank(&mut self) -> Term {
        self.bnode_counter += 1;
        Term::blank(format!("b{}", self.bnode_counter))
    }

    fn emit(&mut self, subject: Term, predicate: Term, object: Term, data_graph: Option<&str>) {
        match data_graph {
            Some(graph) => {
                self.record_graph(graph.to_string());
                self.data_quads.push(DataQuad {
                    graph: graph.to_string(),
                    subject,
                    predicate,
                    object,
                });
            }
            None => self.patterns.push(TriplePattern {
                subject,
                predicate,
                object,
            }),
        }
    }

    // =========================================================================
    // Updates
    // =========================================================================

    fn parse_update(&mut self) -> Result<QueryKind> {
        let mut form: Option<UpdateForm> = None;

        loop {
            match self.peek_keyword() {
                Some(Keyword::With) => {
                    self.advance();
                    let uri = self.expect_graph_name()?;
                    self.record_graph(uri);
                }
                Some(Keyword::Insert) => {
                    self.advance();
                    form.get_or_insert(UpdateForm::Insert);
                    if self.eat_keyword(Keyword::Data) {
                        self.expect_lbrace()?;
                        self.parse_data_block("")?;
                    } else if matches!(self.peek(), TokenKind::LBrace) {
                        self.advance();
                        self.scan_template()?;
                    }
                }
                Some(Keyword::Delete) => {
                    self.advance();
                    form.get_or_insert(UpdateForm::Delete);
                    if self.eat_keyword(Keyword::Data) {
                        self.expect_lbrace()?;
                        self.parse_data_block("")?;
                    } else if self.peek_keyword() == Some(Keyword::Where) {
                        // DELETE WHERE { ... }: the template is the pattern
                        self.advance();
                        self.expect_lbrace()?;
                        self.parse_group()?;
                    } else if matches!(self.peek(), TokenKind::LBrace) {
                        self.advance();
                        self.scan_template()?;
                    }
                }
                Some(Keyword::Using) => {
                    self.advance();
                    let _ = self.eat_keyword(Keyword::Named);
                    let uri = self.expect_graph_name()?;
                    self.record_graph(uri);
                }
                Some(Keyword::Where) => {
                    self.advance();
                    self.expect_lbrace()?;
                    self.parse_group()?;
                }
                Some(Keyword::Clear) => {
                    self.advance();
                    form.get_or_insert(UpdateForm::Clear);
                    self.parse_graph_ref()?;
                }
                Some(Keyword::Drop) => {
                    self.advance();
                    form.get_or_insert(UpdateForm::Drop);
                    self.parse_graph_ref()?;
                }
                Some(Keyword::Create) => {
                    self.advance();
                    form.get_or_insert(UpdateForm::Create);
                    let _ = self.eat_keyword(Keyword::Silent);
                    if self.eat_keyword(Keyword::Graph) {
                        let uri = self.expect_graph_name()?;
                        self.record_graph(uri);
                    }
                }
                Some(Keyword::Load) => {
                    self.advance();
                    form.get_or_insert(UpdateForm::Load);
                    let _ = self.eat_keyword(Keyword::Silent);
                    let _source = self.expect_graph_name()?;
                    if self.eat_keyword(Keyword::Into) {
                        let _ = self.eat_keyword(Keyword::Graph);
                        let uri = self.expect_graph_name()?;
                        self.record_graph(uri);
                    } else {
                        self.record_graph(String::new());
                    }
                }
                _ => match self.peek() {
                    TokenKind::Semicolon => {
                        self.advance();
                    }
                    TokenKind::Eof => break,
                    _ => {
                        self.advance();
                    }
                },
            }
        }

        Ok(QueryKind::Update(form.unwrap_or(UpdateForm::Insert)))
    }

    /// Graph reference after CLEAR / DROP. `DEFAULT` is the empty-string
    /// graph; `NAMED` and `ALL` name no specific graph the cache can target.
    fn parse_graph_ref(&mut self) -> Result<()> {
        let _ = self.eat_keyword(Keyword::Silent);
        match self.peek_keyword() {
            Some(Keyword::Graph) => {
                self.advance();
                let uri = self.expect_graph_name()?;
                self.record_graph(uri);
            }
            Some(Keyword::Default) => {
                self.advance();
                self.record_graph(String::new());
            }
            Some(Keyword::Named | Keyword::All) => {
                self.advance();
            }
            _ => return Err(self.err_here("expected GRAPH, DEFAULT, NAMED, or ALL")),
        }
        Ok(())
    }

    /// Concrete quads inside an INSERT DATA / DELETE DATA block. The opening
    /// brace is consumed; `scope` is the enclosing graph URI.
    fn parse_data_block(&mut self, scope: &str) -> Result<()> {
        loop {
            match self.peek().clone() {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Dot | TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Graph) => {
                    self.advance();
                    let graph = self.expect_graph_name()?;
                    self.record_graph(graph.clone());
                    self.expect_lbrace()?;
                    self.parse_data_block(&graph)?;
                }
                TokenKind::Eof => return Err(self.err_here("unclosed data block")),
                _ => {
                    self.parse_triples_block(Some(scope))?;
                }
            }
        }
    }

    /// Skip an INSERT/DELETE template, recording any `GRAPH <uri>` it
    /// writes into. The opening brace is consumed.
    fn scan_template(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            match self.advance() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Keyword(Keyword::Graph) => {
                    if matches!(
                        self.peek(),
                        TokenKind::Iri(_) | TokenKind::PrefixedName { .. }
                    ) {
                        let uri = self.expect_graph_name()?;
                        self.record_graph(uri);
                    }
                }
                TokenKind::Eof => return Err(self.err_here("unclosed template")),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> QueryAnalysis {
        let analysis = extract(input).expect("extraction should succeed");
        assert!(!analysis.kind.is_update(), "expected a read query");
        analysis
    }

    fn update(input: &str) -> QueryAnalysis {
        let analysis = extract(input).expect("extraction should succeed");
        assert!(analysis.kind.is_update(), "expected an update");
        analysis
    }

    #[test]
    fn test_simple_select() {
        let a = read("SELECT * FROM <http://example.org/g> WHERE { ?s ?p ?o }");
        assert_eq!(a.kind, QueryKind::Read(ReadForm::Select));
        assert_eq!(a.graphs, vec!["http://example.org/g".to_string()]);
        assert_eq!(a.patterns.len(), 1);
        let p = &a.patterns[0];
        assert_eq!(p.subject, Term::var("s"));
        assert_eq!(p.predicate, Term::var("p"));
        assert_eq!(p.object, Term::var("o"));
        assert!(a.data_quads.is_empty());
    }

    #[test]
    fn test_no_from_yields_default_graph() {
        let a = read("SELECT ?s WHERE { ?s ?p ?o }");
        assert_eq!(a.graphs, vec![String::new()]);
    }

    #[test]
    fn test_from_and_from_named_dedup() {
        let a = read(
            "SELECT * FROM <http://g/1> FROM NAMED <http://g/2> FROM <http://g/1> \
             WHERE { ?s ?p ?o }",
        );
        assert_eq!(
            a.graphs,
            vec!["http://g/1".to_string(), "http://g/2".to_string()]
        );
    }

    #[test]
    fn test_prefix_resolution() {
        let a = read(
            "PREFIX foaf: <http://xmlns.com/foaf/0.1/> \
             SELECT ?name WHERE { ?s foaf:name ?name }",
        );
        assert_eq!(
            a.patterns[0].predicate,
            Term::uri("http://xmlns.com/foaf/0.1/name")
        );
    }

    #[test]
    fn test_default_prefix() {
        let a = read("PREFIX : <http://example.org/> SELECT * WHERE { :alice :knows ?x }");
        assert_eq!(a.patterns[0].subject, Term::uri("http://example.org/alice"));
        assert_eq!(
            a.patterns[0].predicate,
            Term::uri("http://example.org/knows")
        );
    }

    #[test]
    fn test_unknown_prefix_errors() {
        let err = extract("SELECT * WHERE { ?s nope:p ?o }").unwrap_err();
        assert!(matches!(err, ExtractError::UnknownPrefix { prefix, .. } if prefix == "nope"));
    }

    #[test]
    fn test_base_resolution() {
        let a = read("BASE <http://example.org/> SELECT * WHERE { </s> </p> ?o }");
        assert_eq!(a.patterns[0].subject, Term::uri("http://example.org//s"));
    }

    #[test]
    fn test_rdf_type_shorthand() {
        let a = read("PREFIX ex: <http://e/> SELECT * WHERE { ?s a ex:Person }");
        assert_eq!(a.patterns[0].predicate, Term::uri(RDF_TYPE));
        assert_eq!(a.patterns[0].object, Term::uri("http://e/Person"));
    }

    #[test]
    fn test_predicate_and_object_lists() {
        let a = read(
            "PREFIX ex: <http://e/> \
             SELECT * WHERE { ?s ex:p1 ?a ; ex:p2 ?b , ?c . }",
        );
        assert_eq!(a.patterns.len(), 3);
        assert_eq!(a.patterns[0].predicate, Term::uri("http://e/p1"));
        assert_eq!(a.patterns[1].predicate, Term::uri("http://e/p2"));
        assert_eq!(a.patterns[1].object, Term::var("b"));
        assert_eq!(a.patterns[2].object, Term::var("c"));
        // all three share a subject
        assert!(a.patterns.iter().all(|p| p.subject == Term::var("s")));
    }

    #[test]
    fn test_literal_objects() {
        let a = read(
            "PREFIX ex: <http://e/> SELECT * WHERE { \
             ?s ex:name \"Alice\"@en . \
             ?s ex:age 42 . \
             ?s ex:height \"1.7\"^^<http://www.w3.org/2001/XMLSchema#decimal> . \
             ?s ex:active true . }",
        );
        assert_eq!(a.patterns.len(), 4);
        assert_eq!(a.patterns[0].object, Term::literal("Alice"));
        assert_eq!(a.patterns[1].object, Term::literal("42"));
        assert_eq!(a.patterns[2].object, Term::literal("1.7"));
        assert_eq!(a.patterns[3].object, Term::literal("true"));
    }

    #[test]
    fn test_blank_nodes() {
        let a = read(
            "PREFIX ex: <http://e/> SELECT * WHERE { _:x ex:p ?o . ?s ex:q [] . }",
        );
        assert_eq!(a.patterns[0].subject, Term::blank("x"));
        assert_eq!(a.patterns[1].object.kind, TermKind::BlankNode);
    }

    #[test]
    fn test_blank_node_property_list() {
        let a = read("PREFIX ex: <http://e/> SELECT * WHERE { ?s ex:knows [ ex:name ?n ] }");
        // inner pattern first (emitted while parsing the bracket), then outer
        assert_eq!(a.patterns.len(), 2);
        assert_eq!(a.patterns[0].predicate, Term::uri("http://e/name"));
        assert_eq!(a.patterns[0].subject.kind, TermKind::BlankNode);
        assert_eq!(a.patterns[1].predicate, Term::uri("http://e/knows"));
        assert_eq!(a.patterns[1].object, a.patterns[0].subject);
    }

    #[test]
    fn test_graph_blocks() {
        let a = read(
            "SELECT * WHERE { \
               GRAPH <http://g/named> { ?s ?p ?o } \
               GRAPH ?g { ?x ?y ?z } \
             }",
        );
        assert_eq!(
            a.graphs,
            vec!["http://g/named".to_string(), String::new()]
        );
        assert_eq!(a.patterns.len(), 2);
    }

    #[test]
    fn test_optional_union_filter_bind_values() {
        let a = read(
            "PREFIX ex: <http://e/> \
             SELECT * WHERE { \
               ?s ex:p ?o . \
               OPTIONAL { ?s ex:q ?q } \
               { ?s ex:r ?r } UNION { ?s ex:t ?t } \
               FILTER (?o > 5) \
               BIND (?o + 1 AS ?o2) \
               VALUES ?v { 1 2 3 } \
             }",
        );
        assert_eq!(a.patterns.len(), 4);
        assert_eq!(a.graphs, vec![String::new()]);
    }

    #[test]
    fn test_filter_not_exists_patterns_counted() {
        let a = read(
            "PREFIX ex: <http://e/> \
             SELECT * WHERE { ?s ex:p ?o . FILTER NOT EXISTS { ?s ex:hidden ?h } }",
        );
        assert_eq!(a.patterns.len(), 2);
        assert_eq!(a.patterns[1].predicate, Term::uri("http://e/hidden"));
    }

    #[test]
    fn test_service_body_skipped() {
        let a = read(
            "PREFIX ex: <http://e/> \
             SELECT * WHERE { ?s ex:p ?o . SERVICE <http://remote/sparql> { ?s ex:far ?f } }",
        );
        assert_eq!(a.patterns.len(), 1);
    }

    #[test]
    fn test_property_path_degrades_to_wildcard() {
        let a = read("PREFIX ex: <http://e/> SELECT * WHERE { ?s ex:a/ex:b ?o }");
        assert_eq!(a.patterns.len(), 1);
        assert_eq!(a.patterns[0].predicate.kind, TermKind::Var);

        let a = read("PREFIX ex: <http://e/> SELECT * WHERE { ?s ^ex:a ?o . ?s ex:b+ ?o2 }");
        assert_eq!(a.patterns.len(), 2);
        assert!(a.patterns.iter().all(|p| p.predicate.kind == TermKind::Var));
    }

    #[test]
    fn test_subselect_with_modifiers() {
        let a = read(
            "PREFIX ex: <http://e/> \
             SELECT * WHERE { \
               { SELECT DISTINCT ?s WHERE { ?s ex:p ?o } ORDER BY DESC(?s) LIMIT 5 } \
               ?s ex:q ?q . \
             }",
        );
        assert_eq!(a.patterns.len(), 2);
    }

    #[test]
    fn test_construct_template_not_matched() {
        let a = read(
            "PREFIX ex: <http://e/> \
             CONSTRUCT { ?s ex:copy ?o } FROM <http://g/> WHERE { ?s ex:p ?o }",
        );
        assert_eq!(a.kind, QueryKind::Read(ReadForm::Construct));
        assert_eq!(a.graphs, vec!["http://g/".to_string()]);
        assert_eq!(a.patterns.len(), 1);
        assert_eq!(a.patterns[0].predicate, Term::uri("http://e/p"));
    }

    #[test]
    fn test_ask_and_describe() {
        let a = read("ASK { ?s ?p ?o }");
        assert_eq!(a.kind, QueryKind::Read(ReadForm::Ask));
        assert_eq!(a.patterns.len(), 1);

        let a = read("DESCRIBE <http://e/thing>");
        assert_eq!(a.kind, QueryKind::Read(ReadForm::Describe));
        assert!(a.patterns.is_empty());
    }

    #[test]
    fn test_insert_data_quads() {
        let a = update(
            "PREFIX ex: <http://e/> \
             INSERT DATA { \
               ex:s ex:p ex:o . \
               GRAPH <http://g/1> { ex:a ex:b \"lit\" } \
             }",
        );
        assert_eq!(a.kind, QueryKind::Update(UpdateForm::Insert));
        assert_eq!(a.data_quads.len(), 2);
        assert_eq!(a.data_quads[0].graph, "");
        assert_eq!(a.data_quads[0].subject, Term::uri("http://e/s"));
        assert_eq!(a.data_quads[1].graph, "http://g/1");
        assert_eq!(a.data_quads[1].object, Term::literal("lit"));
        assert_eq!(a.graphs, vec![String::new(), "http://g/1".to_string()]);
        assert!(a.patterns.is_empty());
    }

    #[test]
    fn test_delete_data() {
        let a = update("PREFIX ex: <http://e/> DELETE DATA { GRAPH ex:g { ex:s ex:p 1 } }");
        assert_eq!(a.kind, QueryKind::Update(UpdateForm::Delete));
        assert_eq!(a.data_quads.len(), 1);
        assert_eq!(a.data_quads[0].graph, "http://e/g");
    }

    #[test]
    fn test_delete_insert_where_with_graphs() {
        let a = update(
            "PREFIX ex: <http://e/> \
             WITH <http://g/main> \
             DELETE { ?s ex:old ?o } \
             INSERT { GRAPH <http://g/audit> { ?s ex:new ?o } } \
             USING NAMED <http://g/aux> \
             WHERE { ?s ex:old ?o }",
        );
        assert_eq!(a.kind, QueryKind::Update(UpdateForm::Delete));
        assert_eq!(
            a.graphs,
            vec![
                "http://g/main".to_string(),
                "http://g/audit".to_string(),
                "http://g/aux".to_string(),
            ]
        );
        // WHERE patterns are reported for updates too
        assert_eq!(a.patterns.len(), 1);
        assert!(a.data_quads.is_empty());
    }

    #[test]
    fn test_delete_where_shortcut() {
        let a = update("PREFIX ex: <http://e/> DELETE WHERE { ?s ex:p ?o }");
        assert_eq!(a.kind, QueryKind::Update(UpdateForm::Delete));
        assert_eq!(a.patterns.len(), 1);
    }

    #[test]
    fn test_clear_and_drop() {
        let a = update("CLEAR GRAPH <http://g/1>");
        assert_eq!(a.kind, QueryKind::Update(UpdateForm::Clear));
        assert_eq!(a.graphs, vec!["http://g/1".to_string()]);

        let a = update("DROP SILENT DEFAULT");
        assert_eq!(a.kind, QueryKind::Update(UpdateForm::Drop));
        assert_eq!(a.graphs, vec![String::new()]);
    }

    #[test]
    fn test_load() {
        let a = update("LOAD <http://e/data.ttl> INTO GRAPH <http://g/1>");
        assert_eq!(a.kind, QueryKind::Update(UpdateForm::Load));
        assert_eq!(a.graphs, vec!["http://g/1".to_string()]);
    }

    #[test]
    fn test_lexical_error_surfaces() {
        let err = extract("SELECT * WHERE { ?s ?p \"unterminated }").unwrap_err();
        assert!(matches!(err, ExtractError::Lex { .. }));
    }

    #[test]
    fn test_unclosed_group_errors() {
        let err = extract("SELECT * WHERE { ?s ?p ?o").unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
    }

    #[test]
    fn test_not_a_query_errors() {
        let err = extract("THIS IS NOT SPARQL").unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
    }
}
