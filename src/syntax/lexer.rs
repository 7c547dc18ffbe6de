//! Tokenizer for lisp2js source.
//!
//! Besides splitting text into tokens, the lexer performs the surface
//! rewrites of the language:
//!
//! - `[a b]` becomes `( Array a b )` and `{:k v}` becomes `( Object :k v )`.
//! - `x[i]` (a `[` glued to the previous token) becomes `( get x i )`, and
//!   `(f y)[i]` wraps the whole preceding group.
//! - `x.name` becomes `( get x "name" )`, `(f y).name` wraps the group, and
//!   `"abc".name` is glued onto the string literal.
//!
//! Every bracket kind closes with the same `Close` token, so only the total
//! balance is checked here; ordering mistakes surface in the parser.

use crate::ast::Span;
use crate::errors::{CompileError, ErrorKind};
use serde::Serialize;
use std::fmt;

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuoteMarker {
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplice,
}

impl QuoteMarker {
    pub const fn text(self) -> &'static str {
        match self {
            Self::Quote => "'",
            Self::Quasiquote => "`",
            Self::Unquote => "~",
            Self::UnquoteSplice => "~@",
        }
    }

    /// Name of the list form the marker abbreviates.
    pub const fn form_name(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Quasiquote => "quasiquote",
            Self::Unquote => "unquote",
            Self::UnquoteSplice => "unquote-splice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Open,
    Close,
    Marker(QuoteMarker),
    Atom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    fn atom(text: impl Into<String>, span: Span) -> Self {
        Self::new(TokenKind::Atom(text.into()), span)
    }

    pub fn text(&self) -> &str {
        match &self.kind {
            TokenKind::Open => "(",
            TokenKind::Close => ")",
            TokenKind::Marker(marker) => marker.text(),
            TokenKind::Atom(text) => text,
        }
    }

    pub fn is_close(&self) -> bool {
        self.kind == TokenKind::Close
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

// ============================================================================
// LEXER
// ============================================================================

/// Splits `source` into tokens, applying the surface rewrites.
///
/// Fails when the brackets do not balance.
///
/// ```rust
/// use lisp2js::syntax::tokenize;
/// let tokens = tokenize("(x.y [1 2])").unwrap();
/// let text: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
/// assert_eq!(text, ["(", "(", "get", "x", "\"y\"", ")", "(", "Array", "1", "2", ")", ")"]);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).run()
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\r')
}

fn ends_atom(c: char) -> bool {
    is_space(c)
        || matches!(
            c,
            ',' | ')' | '(' | ']' | '[' | '{' | '}' | '\'' | '`' | '~' | ';' | ':' | '.'
        )
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    tokens: Vec<Token>,
    depth: i64,
    open_spans: Vec<Span>,
    stray_close: Option<Span>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            tokens: Vec::new(),
            depth: 0,
            open_spans: Vec::new(),
            stray_close: None,
        }
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).map(|&(_, c)| c)
    }

    fn prev_char(&self, index: usize) -> Option<char> {
        index.checked_sub(1).and_then(|i| self.char_at(i))
    }

    fn offset(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    /// Span covering chars `from..to`.
    fn span(&self, from: usize, to: usize) -> Span {
        Span::new(self.offset(from), self.offset(to))
    }

    fn text(&self, from: usize, to: usize) -> &'a str {
        &self.source[self.offset(from)..self.offset(to)]
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }

    fn open(&mut self, span: Span) {
        self.depth += 1;
        self.open_spans.push(span);
    }

    fn close(&mut self, span: Span) {
        self.push(TokenKind::Close, span);
        self.depth -= 1;
        if self.open_spans.pop().is_none() && self.stray_close.is_none() {
            self.stray_close = Some(span);
        }
    }

    fn run(mut self) -> Result<Vec<Token>, CompileError> {
        let mut i = 0;
        while let Some(c) = self.char_at(i) {
            let span = self.span(i, i + 1);
            match c {
                '(' => {
                    self.push(TokenKind::Open, span);
                    self.open(span);
                }
                '[' => {
                    let glued = self
                        .prev_char(i)
                        .is_some_and(|p| !is_space(p) && !matches!(p, '\'' | '`' | '~' | '(' | '{' | '['));
                    if glued && !self.tokens.is_empty() {
                        self.wrap_previous_in_get(span)?;
                    } else {
                        self.push(TokenKind::Open, span);
                        self.tokens.push(Token::atom("Array", span));
                    }
                    self.open(span);
                }
                '{' => {
                    self.push(TokenKind::Open, span);
                    self.tokens.push(Token::atom("Object", span));
                    self.open(span);
                }
                ')' | ']' | '}' => self.close(span),
                ',' => {}
                c if is_space(c) => {}
                '~' if self.char_at(i + 1) == Some('@') => {
                    let span = self.span(i, i + 2);
                    self.push(TokenKind::Marker(QuoteMarker::UnquoteSplice), span);
                    i += 1;
                }
                '`' => self.push(TokenKind::Marker(QuoteMarker::Quasiquote), span),
                '~' => self.push(TokenKind::Marker(QuoteMarker::Unquote), span),
                '\'' => self.push(TokenKind::Marker(QuoteMarker::Quote), span),
                ';' => {
                    while self.char_at(i).is_some_and(|c| c != '\n') {
                        i += 1;
                    }
                }
                '"' => i = self.string_literal(i),
                _ => {
                    i = self.atom(i)?;
                    continue;
                }
            }
            i += 1;
        }
        self.finish()
    }

    /// Reads a string literal starting at `start`; returns the index of its closing quote.
    fn string_literal(&mut self, start: usize) -> usize {
        let mut end = start + 1;
        while let Some(c) = self.char_at(end) {
            match c {
                '\\' => end += 2,
                '"' => break,
                _ => end += 1,
            }
        }
        let end = end.min(self.chars.len());
        let stop = (end + 1).min(self.chars.len());
        let token = Token::atom(self.text(start, stop), self.span(start, stop));
        self.tokens.push(token);
        end
    }

    /// Reads an atom starting at `start`; returns the index just past it.
    fn atom(&mut self, start: usize) -> Result<usize, CompileError> {
        let mut end = start + 1;
        while self.char_at(end).is_some_and(|c| !ends_atom(c)) {
            end += 1;
        }
        let text = self.text(start, end);
        let span = self.span(start, end);

        match text.strip_prefix('.') {
            Some(name) => self.property_access(start, name, text, span)?,
            None => self.tokens.push(Token::atom(text, span)),
        }
        Ok(end)
    }

    /// Applies the `.name` rewrites for a dotted atom at `start`.
    fn property_access(
        &mut self,
        start: usize,
        name: &str,
        text: &str,
        span: Span,
    ) -> Result<(), CompileError> {
        let prev = self.prev_char(start);
        let key = format!("\"{}\"", name);
        let last_is_close = self.tokens.last().is_some_and(Token::is_close);

        if last_is_close && prev.is_some_and(|p| !is_space(p)) {
            // (f x).name
            let group_start = self.group_start(span)?;
            let open_span = self.tokens[group_start].span;
            self.tokens.splice(
                group_start..group_start,
                [Token::new(TokenKind::Open, open_span), Token::atom("get", open_span)],
            );
            self.tokens.push(Token::atom(key, span));
            self.push(TokenKind::Close, span);
            return Ok(());
        }

        if prev == Some('"') {
            if let Some(Token {
                kind: TokenKind::Atom(literal),
                span: literal_span,
            }) = self.tokens.last_mut()
            {
                if literal.starts_with('"') {
                    // "abc".length
                    literal.push_str(text);
                    *literal_span = literal_span.merge(span);
                    return Ok(());
                }
            }
        }

        let glued = prev.is_some_and(|p| !is_space(p) && !matches!(p, '{' | '(' | '}' | ')'));
        match self.tokens.pop() {
            Some(receiver) if glued => {
                // x.name
                let receiver_span = receiver.span;
                self.push(TokenKind::Open, receiver_span);
                self.tokens.push(Token::atom("get", receiver_span));
                self.tokens.push(receiver);
                self.tokens.push(Token::atom(key, span));
                self.push(TokenKind::Close, span);
            }
            popped => {
                self.tokens.extend(popped);
                self.tokens.push(Token::atom(text, span));
            }
        }
        Ok(())
    }

    /// `x[` or `(f y)[`: turns the previous token or group into the receiver of a `get`.
    fn wrap_previous_in_get(&mut self, span: Span) -> Result<(), CompileError> {
        let last_is_close = self.tokens.last().is_some_and(Token::is_close);
        if last_is_close {
            let group_start = self.group_start(span)?;
            let open_span = self.tokens[group_start].span;
            self.tokens.splice(
                group_start..group_start,
                [Token::new(TokenKind::Open, open_span), Token::atom("get", open_span)],
            );
        } else if let Some(receiver) = self.tokens.pop() {
            let receiver_span = receiver.span;
            self.push(TokenKind::Open, receiver_span);
            self.tokens.push(Token::atom("get", receiver_span));
            self.tokens.push(receiver);
        }
        Ok(())
    }

    /// Index of the `Open` matching the trailing `Close`.
    fn group_start(&self, at: Span) -> Result<usize, CompileError> {
        let mut balance = 0i64;
        for (index, token) in self.tokens.iter().enumerate().rev() {
            match token.kind {
                TokenKind::Close => balance += 1,
                TokenKind::Open => balance -= 1,
                _ => {}
            }
            if balance == 0 {
                return Ok(index);
            }
        }
        Err(CompileError::new(ErrorKind::UnexpectedClose).with_span(self.stray_close.unwrap_or(at)))
    }

    fn finish(self) -> Result<Vec<Token>, CompileError> {
        if self.depth == 0 {
            return Ok(self.tokens);
        }
        let span = if self.depth > 0 {
            self.open_spans.last().copied()
        } else {
            self.stray_close
        };
        let mut error = CompileError::new(ErrorKind::UnbalancedDelimiters { depth: self.depth });
        if let Some(span) = span {
            error = error.with_span(span);
        }
        Err(error)
    }
}
