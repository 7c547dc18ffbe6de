//! AST module for lisp2js
//!
//! The compiler works on a single tree shape: atoms, pairs chained into
//! lists, vectors, and the empty list. Lists are built from immutable,
//! reference-counted pairs so subtrees can be shared between a macro's
//! arguments and its expansion without copying.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

pub mod list;

pub use list::ListIter;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A byte range in the source text.
///
/// # Examples
///
/// ```rust
/// use lisp2js::ast::Span;
/// let span = Span::new(0, 5).merge(Span::new(3, 9));
/// assert_eq!(span, Span { start: 0, end: 9 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::from(span.start..span.end)
    }
}

/// One link of a list: a head value and the remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub first: Value,
    pub rest: Value,
}

// Long lists and deeply nested construction code would otherwise be freed
// by one recursive call per link.
impl Drop for Pair {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach(&mut self.first, &mut pending);
        detach(&mut self.rest, &mut pending);
        while let Some(mut pair) = pending.pop() {
            detach(&mut pair.first, &mut pending);
            detach(&mut pair.rest, &mut pending);
        }
    }
}

/// Moves a uniquely owned pair out of `value` so it can be freed iteratively.
fn detach(value: &mut Value, pending: &mut Vec<Pair>) {
    if !value.is_pair() {
        return;
    }
    if let Value::Pair(rc) = std::mem::take(value) {
        if let Ok(pair) = Rc::try_unwrap(rc) {
            pending.push(pair);
        }
    }
}

/// A node of the tree the lexer/parser produce and the code generator consumes.
///
/// Atoms keep their exact token text: symbols, numeric literals, booleans,
/// `:keywords`, and string literals with their surrounding quotes.
///
/// # Examples
///
/// ```rust
/// use lisp2js::ast::Value;
/// let form = Value::list(vec![Value::atom("+"), Value::atom("1"), Value::atom("2")]);
/// assert_eq!(form.head_atom(), Some("+"));
/// assert_eq!(form.len(), 3);
/// assert_eq!(form.pretty(), "(+ 1 2)");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Atom(String),
    Pair(Rc<Pair>),
    Vector(Vec<Value>),
}

// ============================================================================
// CONSTRUCTION AND INSPECTION
// ============================================================================

impl Value {
    pub fn atom(text: impl Into<String>) -> Value {
        Value::Atom(text.into())
    }

    pub fn cons(first: Value, rest: Value) -> Value {
        Value::Pair(Rc::new(Pair { first, rest }))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Atom(_) => "Atom",
            Value::Pair(_) => "Pair",
            Value::Vector(_) => "Vector",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    /// True for the two nested shapes a pattern or argument can take.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Pair(_) | Value::Vector(_))
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Value::Atom(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<&Pair> {
        match self {
            Value::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// True when this is an atom spelled exactly `text`.
    pub fn is_atom(&self, text: &str) -> bool {
        self.as_atom() == Some(text)
    }

    pub fn first(&self) -> Option<&Value> {
        self.as_pair().map(|pair| &pair.first)
    }

    pub fn rest(&self) -> Option<&Value> {
        self.as_pair().map(|pair| &pair.rest)
    }

    /// The head of a list when that head is an atom.
    pub fn head_atom(&self) -> Option<&str> {
        self.first().and_then(Value::as_atom)
    }

    /// Source-form rendering, used by the CLI's `ast` output and in diagnostics.
    pub fn pretty(&self) -> String {
        match self {
            Value::Null => "()".to_string(),
            Value::Atom(text) => text.clone(),
            Value::Vector(items) => {
                let inner: Vec<String> = items.iter().map(Value::pretty).collect();
                format!("[{}]", inner.join(" "))
            }
            Value::Pair(_) => {
                let mut out = String::from("(");
                let mut cursor = self;
                let mut first = true;
                while let Value::Pair(pair) = cursor {
                    if !first {
                        out.push(' ');
                    }
                    out.push_str(&pair.first.pretty());
                    first = false;
                    cursor = &pair.rest;
                }
                if !cursor.is_null() {
                    out.push_str(" . ");
                    out.push_str(&cursor.pretty());
                }
                out.push(')');
                out
            }
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::atom(text)
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

/// Renders values the way the runtime list type prints itself:
/// `(1, 2, 3)`, dotted tails as `(a . b)`, vectors as `[1,2]`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "()"),
            Value::Atom(text) => write!(f, "{}", text),
            Value::Vector(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Pair(_) => {
                write!(f, "(")?;
                let mut cursor = self;
                let mut first = true;
                while let Value::Pair(pair) = cursor {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", pair.first)?;
                    first = false;
                    cursor = &pair.rest;
                }
                if !cursor.is_null() {
                    write!(f, " . {}", cursor)?;
                }
                write!(f, ")")
            }
        }
    }
}
