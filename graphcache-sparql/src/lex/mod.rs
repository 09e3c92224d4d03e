//! SPARQL lexing for pattern extraction.
//!
//! The token set is the subset of SPARQL 1.1 terminals the extractor needs:
//! IRIs, prefixed names, variables, literals, blank nodes, the keywords that
//! steer graph/pattern extraction, and enough punctuation to keep braces and
//! parens balanced. Anything else lexes as [`TokenKind::Other`] and is
//! skipped by the extractor.

mod lexer;
mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{Keyword, Token, TokenKind};
