//! SPARQL lexer built on winnow.
//!
//! Tokenizes query text into spanned tokens. Characters that cannot start
//! any token of the subset produce [`TokenKind::Error`] tokens, which the
//! extractor surfaces as a malformed-query error.

use std::sync::Arc;

use winnow::ascii::digit1;
use winnow::combinator::{alt, opt};
use winnow::error::ContextError;
use winnow::stream::{AsChar, Location, Stream};
use winnow::token::{any, one_of, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use super::token::{keyword_from_str, Token, TokenKind};
use crate::span::SourceSpan;

/// Input type for the lexer - tracks position for spans.
pub type Input<'a> = LocatingSlice<&'a str>;

/// Lexer for SPARQL query text.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenize the entire input, ending with an EOF token.
    pub fn tokenize(self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut input = LocatingSlice::new(self.input);

        loop {
            skip_ws_and_comments(&mut input);

            if input.is_empty() {
                let pos = input.current_token_start();
                tokens.push(Token::new(TokenKind::Eof, SourceSpan::point(pos)));
                break;
            }

            let start = input.current_token_start();

            match next_token(&mut input) {
                Ok(kind) => {
                    let end = input.current_token_start();
                    tokens.push(Token::new(kind, SourceSpan::new(start, end)));
                }
                Err(_) => {
                    // Skip one character and emit an error token
                    let c = any::<_, ContextError>.parse_next(&mut input).unwrap_or('?');
                    let end = input.current_token_start();
                    tokens.push(Token::new(
                        TokenKind::Error(Arc::from(format!("unexpected character: '{}'", c))),
                        SourceSpan::new(start, end),
                    ));
                }
            }
        }

        tokens
    }
}

/// Tokenize a SPARQL query string.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

fn backtrack() -> winnow::error::ErrMode<ContextError> {
    winnow::error::ErrMode::Backtrack(ContextError::new())
}

/// Skip whitespace and `#` line comments.
fn skip_ws_and_comments(input: &mut Input<'_>) {
    loop {
        let _: ModalResult<&str, ContextError> = take_while(0.., is_ws).parse_next(input);

        if input.starts_with('#') {
            let _: ModalResult<&str, ContextError> =
                take_while(0.., |c| c != '\n' && c != '\r').parse_next(input);
        } else {
            break;
        }
    }
}

/// Parse the next token.
fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        parse_double_caret,
        parse_iri_ref,
        parse_blank_node_label,
        parse_anon,
        parse_default_prefix,
        parse_word,
        parse_variable,
        parse_string_literal,
        parse_number,
        parse_lang_tag,
        parse_punctuation,
    ))
    .parse_next(input)
}

// =============================================================================
// IRIs
// =============================================================================

/// Parse an IRI reference: `<...>`
fn parse_iri_ref(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '<'.parse_next(input)?;
    let iri = parse_iri_content(input)?;
    '>'.parse_next(input)?;
    Ok(TokenKind::Iri(Arc::from(iri)))
}

/// Parse IRI content, handling `\uXXXX` / `\UXXXXXXXX` escapes.
fn parse_iri_content(input: &mut Input<'_>) -> ModalResult<String> {
    let mut iri = String::new();

    loop {
        let chunk: &str = take_while(0.., is_iri_char).parse_next(input)?;
        iri.push_str(chunk);

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let c: char = any.parse_next(input)?;
            match c {
                'u' => iri.push(unicode_escape(input, 4)?),
                'U' => iri.push(unicode_escape(input, 8)?),
                _ => return Err(backtrack()),
            }
        } else {
            break;
        }
    }

    if iri.is_empty() {
        return Err(backtrack());
    }

    Ok(iri)
}

/// Parse a fixed-length hex escape payload into a char.
fn unicode_escape(input: &mut Input<'_>, len: usize) -> ModalResult<char> {
    let hex: &str = take_while(len..=len, AsChar::is_hex_digit).parse_next(input)?;
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(backtrack)
}

// =============================================================================
// Blank nodes
// =============================================================================

/// Parse a labeled blank node: `_:name`
fn parse_blank_node_label(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    "_:".parse_next(input)?;
    let first: char = any
        .verify(|c: &char| is_pn_chars_u(*c) || c.is_ascii_digit())
        .parse_next(input)?;

    let mut name = String::new();
    name.push(first);
    take_word_tail(input, &mut name)?;

    Ok(TokenKind::BlankNodeLabel(Arc::from(name)))
}

/// Parse an anonymous blank node: `[]` (whitespace inside allowed)
fn parse_anon(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    ('[', take_while(0.., is_ws), ']')
        .map(|_| TokenKind::Anon)
        .parse_next(input)
}

// =============================================================================
// Prefixed names, keywords, bare words
// =============================================================================

/// Parse a default-prefix name (`:local`) or bare default namespace (`:`).
fn parse_default_prefix(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    ':'.parse_next(input)?;
    match opt(parse_pn_local).parse_next(input)? {
        Some(local) => Ok(TokenKind::PrefixedName {
            prefix: Arc::from(""),
            local: Arc::from(local.as_str()),
        }),
        None => Ok(TokenKind::PrefixedNameNs(Arc::from(""))),
    }
}

/// Parse a word: a prefixed name (`prefix:local`), a prefix namespace
/// (`prefix:`), a keyword, or a bare identifier.
fn parse_word(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let start = input.checkpoint();

    let first = input.chars().next().ok_or_else(backtrack)?;
    if !is_pn_chars_u(first) {
        return Err(backtrack());
    }

    let mut word = String::new();
    let c: char = any.parse_next(input)?;
    word.push(c);
    take_word_tail(input, &mut word)?;

    if input.starts_with(':') {
        // Prefixed name; the prefix must start with a letter
        if !is_pn_chars_base(first) {
            input.reset(&start);
            return Err(backtrack());
        }
        ':'.parse_next(input)?;
        match opt(parse_pn_local).parse_next(input)? {
            Some(local) => Ok(TokenKind::PrefixedName {
                prefix: Arc::from(word.as_str()),
                local: Arc::from(local.as_str()),
            }),
            None => Ok(TokenKind::PrefixedNameNs(Arc::from(word.as_str()))),
        }
    } else {
        match keyword_from_str(&word) {
            Some(kw) => Ok(TokenKind::Keyword(kw)),
            None => Ok(TokenKind::Ident(Arc::from(word.as_str()))),
        }
    }
}

/// Continue a word with PN_CHARS, consuming interior dots only when another
/// word character follows (a trailing dot is a triple terminator).
fn take_word_tail(input: &mut Input<'_>, word: &mut String) -> ModalResult<()> {
    loop {
        let chunk: &str = take_while(0.., is_pn_chars).parse_next(input)?;
        word.push_str(chunk);

        if input.starts_with('.') {
            let rest = &input.as_ref()[1..];
            if rest.chars().next().is_some_and(is_pn_chars) {
                '.'.parse_next(input)?;
                word.push('.');
                continue;
            }
        }
        break;
    }
    Ok(())
}

/// Parse a local name (after the colon in a prefixed name).
///
/// Handles interior dots, `:` in locals, percent escapes, and `\`-escaped
/// punctuation. Cannot end with a dot.
fn parse_pn_local(input: &mut Input<'_>) -> ModalResult<String> {
    let first = input.chars().next().ok_or_else(backtrack)?;
    if !(is_pn_chars_u(first) || first == ':' || first.is_ascii_digit())
        && first != '%'
        && first != '\\'
    {
        return Err(backtrack());
    }

    let mut local = String::new();

    loop {
        let chunk: &str =
            take_while(0.., |c: char| is_pn_chars(c) || c == ':').parse_next(input)?;
        local.push_str(chunk);

        if input.starts_with('.') {
            let rest = &input.as_ref()[1..];
            let continues = rest
                .chars()
                .next()
                .is_some_and(|c| is_pn_chars(c) || c == ':' || c == '%' || c == '\\');
            if continues {
                '.'.parse_next(input)?;
                local.push('.');
                continue;
            }
            break;
        }

        if input.starts_with('%') {
            '%'.parse_next(input)?;
            let hex: &str = take_while(2..=2, AsChar::is_hex_digit).parse_next(input)?;
            local.push('%');
            local.push_str(hex);
        } else if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped: char = any.parse_next(input)?;
            if "_~.-!$&'()*+,;=/?#@%".contains(escaped) {
                local.push(escaped);
            } else {
                return Err(backtrack());
            }
        } else {
            break;
        }
    }

    if local.is_empty() {
        return Err(backtrack());
    }

    Ok(local)
}

// =============================================================================
// Variables
// =============================================================================

/// Parse a variable: `?name` or `$name`
fn parse_variable(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    one_of(['?', '$']).parse_next(input)?;
    let name: &str = (
        take_while(1, is_varname_start),
        take_while(0.., is_varname_char),
    )
        .take()
        .parse_next(input)?;
    Ok(TokenKind::Var(Arc::from(name)))
}

// =============================================================================
// String literals
// =============================================================================

/// Parse a string literal (single or double quoted, short or long).
fn parse_string_literal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        |i: &mut Input<'_>| parse_long_string(i, '"'),
        |i: &mut Input<'_>| parse_long_string(i, '\''),
        |i: &mut Input<'_>| parse_short_string(i, '"'),
        |i: &mut Input<'_>| parse_short_string(i, '\''),
    ))
    .parse_next(input)
}

/// Parse a long (triple-quoted) string.
fn parse_long_string(input: &mut Input<'_>, quote: char) -> ModalResult<TokenKind> {
    let mut fence: &str = if quote == '"' { "\"\"\"" } else { "'''" };
    fence.parse_next(input)?;

    let mut content = String::new();
    loop {
        let chunk: &str =
            take_while(0.., |c: char| c != quote && c != '\\').parse_next(input)?;
        content.push_str(chunk);

        if input.is_empty() {
            return Err(backtrack());
        }
        if input.starts_with(fence) {
            break;
        }
        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            content.push(parse_escape_char(input)?);
        } else {
            // A lone quote (or two) inside the fence
            let c: char = any.parse_next(input)?;
            content.push(c);
        }
    }

    fence.parse_next(input)?;
    Ok(TokenKind::String(Arc::from(content)))
}

/// Parse a short (single-line) string.
fn parse_short_string(input: &mut Input<'_>, mut quote: char) -> ModalResult<TokenKind> {
    quote.parse_next(input)?;

    let mut content = String::new();
    loop {
        let chunk: &str =
            take_while(0.., |c: char| c != quote && c != '\\' && c != '\n' && c != '\r')
                .parse_next(input)?;
        content.push_str(chunk);

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            content.push(parse_escape_char(input)?);
        } else {
            break;
        }
    }

    quote.parse_next(input)?;
    Ok(TokenKind::String(Arc::from(content)))
}

/// Parse an escape character after a backslash.
fn parse_escape_char(input: &mut Input<'_>) -> ModalResult<char> {
    let c: char = any.parse_next(input)?;
    match c {
        't' => Ok('\t'),
        'b' => Ok('\x08'),
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        'f' => Ok('\x0C'),
        '"' => Ok('"'),
        '\'' => Ok('\''),
        '\\' => Ok('\\'),
        'u' => unicode_escape(input, 4),
        'U' => unicode_escape(input, 8),
        _ => Err(backtrack()),
    }
}

// =============================================================================
// Numbers and language tags
// =============================================================================

/// Parse a numeric literal. Integers, decimals, and doubles all lex to
/// [`TokenKind::Number`]; the extractor only cares that they are literals.
fn parse_number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let start = input.checkpoint();
    let mut text = String::new();

    if let Some(sign) = opt(one_of(['+', '-'])).parse_next(input)? {
        text.push(sign);
    }

    let whole: &str = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    text.push_str(whole);

    // Fractional part, only when the dot is followed by a digit
    // (`5 .` is a literal and a triple terminator, `5.5` is a decimal)
    if input.starts_with('.') {
        let rest = &input.as_ref()[1..];
        if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            '.'.parse_next(input)?;
            let frac: &str = digit1.parse_next(input)?;
            text.push('.');
            text.push_str(frac);
        }
    }

    if !text.chars().any(|c| c.is_ascii_digit()) {
        input.reset(&start);
        return Err(backtrack());
    }

    // Optional exponent; `1e` alone stays Number(1) + Ident(e)
    if exponent_follows(input) {
        let e: char = any.parse_next(input)?;
        text.push(e);
        if let Some(sign) = opt(one_of(['+', '-'])).parse_next(input)? {
            text.push(sign);
        }
        let digits: &str = digit1.parse_next(input)?;
        text.push_str(digits);
    }

    Ok(TokenKind::Number(Arc::from(text)))
}

/// Check whether the input continues with a well-formed exponent.
fn exponent_follows(input: &Input<'_>) -> bool {
    let rest: &str = input.as_ref();
    let mut chars = rest.chars();
    if !matches!(chars.next(), Some('e') | Some('E')) {
        return false;
    }
    match chars.next() {
        Some('+') | Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        Some(c) => c.is_ascii_digit(),
        None => false,
    }
}

/// Parse a language tag: `@en`, `@en-US`
fn parse_lang_tag(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '@'.parse_next(input)?;
    let first: &str = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;

    let mut tag = first.to_string();
    while input.starts_with('-') {
        let rest = &input.as_ref()[1..];
        if !rest.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            break;
        }
        '-'.parse_next(input)?;
        let part: &str =
            take_while(1.., |c: char| c.is_ascii_alphanumeric()).parse_next(input)?;
        tag.push('-');
        tag.push_str(part);
    }

    Ok(TokenKind::LangTag(Arc::from(tag)))
}

// =============================================================================
// Punctuation
// =============================================================================

/// Parse `^^` (datatype marker).
fn parse_double_caret(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    "^^".map(|_| TokenKind::DoubleCaret).parse_next(input)
}

/// Parse structural punctuation plus the operator characters that occur in
/// expressions the extractor skips. Unknown characters fail, surfacing as
/// error tokens.
fn parse_punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    any.verify_map(|c| match c {
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '[' => Some(TokenKind::LBracket),
        ']' => Some(TokenKind::RBracket),
        '.' => Some(TokenKind::Dot),
        ',' => Some(TokenKind::Comma),
        ';' => Some(TokenKind::Semicolon),
        '=' | '<' | '>' | '+' | '-' | '*' | '/' | '!' | '?' | '|' | '^' | '&' | '@' | '~' => {
            Some(TokenKind::Other(c))
        }
        _ => None,
    })
    .parse_next(input)
}

// =============================================================================
// Character classes (SPARQL 1.1 grammar productions)
// =============================================================================

/// PN_CHARS_BASE: letters, plus the unicode ranges the grammar names.
fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// PN_CHARS_U: PN_CHARS_BASE or underscore.
fn is_pn_chars_u(c: char) -> bool {
    is_pn_chars_base(c) || c == '_'
}

/// PN_CHARS: PN_CHARS_U, hyphen, digits, and combining marks.
fn is_pn_chars(c: char) -> bool {
    is_pn_chars_u(c)
        || c == '-'
        || c.is_ascii_digit()
        || c == '\u{00B7}'
        || matches!(c, '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

/// First character of a variable name.
fn is_varname_start(c: char) -> bool {
    is_pn_chars_u(c) || c.is_ascii_digit()
}

/// Continuation character of a variable name.
fn is_varname_char(c: char) -> bool {
    is_pn_chars_u(c)
        || c.is_ascii_digit()
        || c == '\u{00B7}'
        || matches!(c, '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

/// Characters allowed unescaped inside an IRIREF.
fn is_iri_char(c: char) -> bool {
    !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '\x00'..='\x20')
}

/// SPARQL whitespace.
fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Keyword;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, TokenKind::Eof))
            .collect()
    }

    #[test]
    fn test_iri() {
        assert_eq!(
            kinds("<http://example.org/g>"),
            vec![TokenKind::Iri(Arc::from("http://example.org/g"))]
        );
    }

    #[test]
    fn test_prefixed_names() {
        assert_eq!(
            kinds("foaf:name"),
            vec![TokenKind::PrefixedName {
                prefix: Arc::from("foaf"),
                local: Arc::from("name"),
            }]
        );
        assert_eq!(kinds("foaf:"), vec![TokenKind::PrefixedNameNs(Arc::from("foaf"))]);
        assert_eq!(
            kinds(":name"),
            vec![TokenKind::PrefixedName {
                prefix: Arc::from(""),
                local: Arc::from("name"),
            }]
        );
    }

    #[test]
    fn test_local_name_trailing_dot_is_terminator() {
        assert_eq!(
            kinds("ex:foo."),
            vec![
                TokenKind::PrefixedName {
                    prefix: Arc::from("ex"),
                    local: Arc::from("foo"),
                },
                TokenKind::Dot,
            ]
        );
        assert_eq!(
            kinds("ex:foo.bar"),
            vec![TokenKind::PrefixedName {
                prefix: Arc::from("ex"),
                local: Arc::from("foo.bar"),
            }]
        );
    }

    #[test]
    fn test_variables() {
        assert_eq!(kinds("?s $o"), vec![
            TokenKind::Var(Arc::from("s")),
            TokenKind::Var(Arc::from("o")),
        ]);
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("SELECT where a regex"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::Where),
                TokenKind::Keyword(Keyword::A),
                TokenKind::Ident(Arc::from("regex")),
            ]
        );
    }

    #[test]
    fn test_blank_nodes() {
        assert_eq!(kinds("_:b1"), vec![TokenKind::BlankNodeLabel(Arc::from("b1"))]);
        assert_eq!(kinds("[]"), vec![TokenKind::Anon]);
        assert_eq!(kinds("[ ]"), vec![TokenKind::Anon]);
    }

    #[test]
    fn test_blank_node_trailing_dot() {
        assert_eq!(
            kinds("_:b1."),
            vec![TokenKind::BlankNodeLabel(Arc::from("b1")), TokenKind::Dot]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds(r#""hello""#), vec![TokenKind::String(Arc::from("hello"))]);
        assert_eq!(kinds("'hi'"), vec![TokenKind::String(Arc::from("hi"))]);
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::String(Arc::from("a\nb"))]
        );
        assert_eq!(
            kinds("\"\"\"multi\n\"line\"\"\""),
            vec![TokenKind::String(Arc::from("multi\n\"line"))]
        );
    }

    #[test]
    fn test_unterminated_string_errors() {
        let toks = kinds("\"oops");
        assert!(toks.iter().any(|k| matches!(k, TokenKind::Error(_))));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Number(Arc::from("42"))]);
        assert_eq!(kinds("-3.14"), vec![TokenKind::Number(Arc::from("-3.14"))]);
        assert_eq!(kinds("1.5e-3"), vec![TokenKind::Number(Arc::from("1.5e-3"))]);
        // Dot after an integer terminates a triple, it is not a decimal point
        assert_eq!(
            kinds("5 ."),
            vec![TokenKind::Number(Arc::from("5")), TokenKind::Dot]
        );
    }

    #[test]
    fn test_lang_tag_and_datatype() {
        assert_eq!(
            kinds(r#""x"@en-US"#),
            vec![
                TokenKind::String(Arc::from("x")),
                TokenKind::LangTag(Arc::from("en-US")),
            ]
        );
        assert_eq!(
            kinds(r#""5"^^<http://www.w3.org/2001/XMLSchema#int>"#),
            vec![
                TokenKind::String(Arc::from("5")),
                TokenKind::DoubleCaret,
                TokenKind::Iri(Arc::from("http://www.w3.org/2001/XMLSchema#int")),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("SELECT # trailing comment\n?x"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Var(Arc::from("x")),
            ]
        );
    }

    #[test]
    fn test_filter_expression_chars() {
        // Operators lex as Other so the extractor can skip balanced parens
        let toks = kinds("(?age >= 21)");
        assert_eq!(toks[0], TokenKind::LParen);
        assert_eq!(toks[1], TokenKind::Var(Arc::from("age")));
        assert_eq!(toks[2], TokenKind::Other('>'));
        assert_eq!(toks[3], TokenKind::Other('='));
        assert_eq!(toks[4], TokenKind::Number(Arc::from("21")));
        assert_eq!(toks[5], TokenKind::RParen);
    }

    #[test]
    fn test_simple_query_stream() {
        assert_eq!(
            kinds("SELECT ?name WHERE { ?s <http://example.org/name> ?name }"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Var(Arc::from("name")),
                TokenKind::Keyword(Keyword::Where),
                TokenKind::LBrace,
                TokenKind::Var(Arc::from("s")),
                TokenKind::Iri(Arc::from("http://example.org/name")),
                TokenKind::Var(Arc::from("name")),
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("ASK { }");
        assert_eq!(tokens[0].span, SourceSpan::new(0, 3));
        assert_eq!(tokens[1].span, SourceSpan::new(4, 5));
    }
}
