//! Token sequence to tree.
//!
//! The parser walks the tokens from right to left, consing each node onto
//! the list being built, which keeps every list in source order without a
//! reversal pass. A quote marker directly before a node wraps that node as
//! `(quote x)`, `(quasiquote x)`, `(unquote x)` or `(unquote-splice x)`, and
//! an unquoted group headed by `Array` becomes a [`Value::Vector`].

use super::lexer::{Token, TokenKind};
use crate::ast::{Span, Value};
use crate::errors::{CompileError, ErrorKind};

/// The top-level forms of a program, with the source span of each one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProgram {
    /// A proper list of the top-level forms, `Null` for an empty program.
    pub forms: Value,
    pub spans: Vec<Span>,
}

impl ParsedProgram {
    /// Each top-level form together with its span.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, Span)> {
        self.forms.iter().zip(self.spans.iter().copied())
    }
}

/// Builds the tree for a token sequence.
///
/// ```rust
/// use lisp2js::syntax::{parse, tokenize};
/// let program = parse(&tokenize("(def x 'a) [1 2]").unwrap()).unwrap();
/// let forms: Vec<String> = program.forms.iter().map(|f| f.pretty()).collect();
/// assert_eq!(forms, ["(def x (quote a))", "[1 2]"]);
/// ```
pub fn parse(tokens: &[Token]) -> Result<ParsedProgram, CompileError> {
    let mut current = Value::Null;
    // Lists to the right of each open group, with the span of its closer.
    let mut pending: Vec<(Value, Span)> = Vec::new();
    let mut spans = Vec::new();

    let mut i = tokens.len();
    while i > 0 {
        i -= 1;
        let token = &tokens[i];
        match &token.kind {
            TokenKind::Close => {
                pending.push((std::mem::take(&mut current), token.span));
            }
            TokenKind::Open => {
                let (enclosing, close_span) = pending.pop().ok_or_else(|| {
                    CompileError::new(ErrorKind::UnbalancedDelimiters { depth: 1 })
                        .with_span(token.span)
                })?;
                let group = std::mem::take(&mut current);
                let (node, start) = match marker_before(tokens, i) {
                    Some(form_name) => {
                        i -= 1;
                        (Value::list(vec![Value::atom(form_name), group]), tokens[i].span)
                    }
                    None => (vectorize(group), token.span),
                };
                current = Value::cons(node, enclosing);
                if pending.is_empty() {
                    spans.push(start.merge(close_span));
                }
            }
            TokenKind::Marker(_) | TokenKind::Atom(_) => {
                let atom = Value::atom(token.text());
                let (node, span) = match marker_before(tokens, i) {
                    Some(form_name) => {
                        i -= 1;
                        let span = tokens[i].span.merge(token.span);
                        (Value::list(vec![Value::atom(form_name), atom]), span)
                    }
                    None => (atom, token.span),
                };
                current = Value::cons(node, current);
                if pending.is_empty() {
                    spans.push(span);
                }
            }
        }
    }

    if let Some((_, close_span)) = pending.last() {
        return Err(CompileError::new(ErrorKind::UnexpectedClose).with_span(*close_span));
    }

    spans.reverse();
    Ok(ParsedProgram {
        forms: current,
        spans,
    })
}

/// Form name of the quote marker immediately before token `index`, if any.
fn marker_before(tokens: &[Token], index: usize) -> Option<&'static str> {
    let previous = tokens.get(index.checked_sub(1)?)?;
    match previous.kind {
        TokenKind::Marker(marker) => Some(marker.form_name()),
        _ => None,
    }
}

/// `(Array a b)` groups become vectors.
fn vectorize(group: Value) -> Value {
    match group.as_pair() {
        Some(pair) if pair.first.is_atom("Array") => Value::Vector(pair.rest.to_vec()),
        _ => group,
    }
}
