//! Quote and quasiquote lowering.
//!
//! A quoted datum is rewritten into the code that builds it at run time:
//! lists become nested `(cons … …)` calls ending in `Null`, vectors become
//! `(Array …)` constructions, and atoms become `(quote atom)` leaves, which
//! the code generator prints as string or numeric literals. Under
//! quasiquote, `(unquote e)` contributes the expression `e` itself and
//! `(unquote-splice e)` appends the list `e` in front of the remainder.

use crate::ast::Value;

fn quote_leaf(datum: &Value) -> Value {
    Value::list(vec![Value::atom("quote"), datum.clone()])
}

fn call(head: &str, args: Vec<Value>) -> Value {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::atom(head));
    items.extend(args);
    Value::list(items)
}

/// `(unquote e)` → `Some(e)`
fn unquoted(value: &Value, tag: &str) -> Option<Value> {
    if value.head_atom() == Some(tag) {
        Some(value.second().cloned().unwrap_or_default())
    } else {
        None
    }
}

// ============================================================================
// QUOTE
// ============================================================================

/// Construction code for `'datum`.
pub fn quote_datum(datum: &Value) -> Value {
    match datum {
        Value::Pair(_) => quote_list(datum),
        Value::Vector(items) => array_construction(items, false),
        Value::Atom(_) | Value::Null => quote_leaf(datum),
    }
}

/// Construction code for a quoted pair chain.
///
/// ```rust
/// use lisp2js::ast::Value;
/// use lisp2js::quote::quote_list;
/// let datum = Value::list(vec!["a".into(), "1".into()]);
/// assert_eq!(
///     quote_list(&datum).pretty(),
///     "(cons (quote a) (cons (quote 1) ()))"
/// );
/// ```
pub fn quote_list(list: &Value) -> Value {
    let (elements, tail) = spine(list);
    let tail = tail.map(quote_datum).unwrap_or_default();
    elements.into_iter().rev().fold(tail, |rest, element| {
        let element = match element {
            Value::Pair(_) => quote_list(element),
            Value::Vector(items) => array_construction(items, false),
            Value::Atom(_) | Value::Null => quote_leaf(element),
        };
        call("cons", vec![element, rest])
    })
}

/// The elements of a pair chain and the datum after it, if any: the node
/// following a `.` marker, or an improper tail.
fn spine(list: &Value) -> (Vec<&Value>, Option<&Value>) {
    let mut elements = Vec::new();
    let mut cursor = list;
    loop {
        match cursor {
            Value::Pair(pair) if pair.first.is_atom(".") => {
                return (elements, Some(pair.rest.first().unwrap_or(&Value::Null)));
            }
            Value::Pair(pair) => {
                elements.push(&pair.first);
                cursor = &pair.rest;
            }
            Value::Null => return (elements, None),
            other => return (elements, Some(other)),
        }
    }
}

// ============================================================================
// QUASIQUOTE
// ============================================================================

/// Construction code for `` `datum ``.
pub fn quasiquote_datum(datum: &Value) -> Value {
    if let Some(expr) = unquoted(datum, "unquote") {
        return expr;
    }
    match datum {
        Value::Pair(_) => quasiquote_list(datum),
        Value::Vector(items) => array_construction(items, true),
        Value::Atom(_) | Value::Null => quote_leaf(datum),
    }
}

/// Like [`quote_list`], with `unquote` and `unquote-splice` evaluated in place.
///
/// ```rust
/// use lisp2js::ast::Value;
/// use lisp2js::quote::quasiquote_list;
/// let unquote = Value::list(vec!["unquote".into(), "x".into()]);
/// let splice = Value::list(vec!["unquote-splice".into(), "ys".into()]);
/// let datum = Value::list(vec!["*".into(), unquote, splice]);
/// assert_eq!(
///     quasiquote_list(&datum).pretty(),
///     "(cons (quote *) (cons x (append ys ())))"
/// );
/// ```
pub fn quasiquote_list(list: &Value) -> Value {
    let (elements, tail) = spine(list);
    let tail = tail.map(quasiquote_datum).unwrap_or_default();
    elements.into_iter().rev().fold(tail, |rest, element| {
        if let Some(expr) = unquoted(element, "unquote") {
            return call("cons", vec![expr, rest]);
        }
        if let Some(expr) = unquoted(element, "unquote-splice") {
            return call("append", vec![expr, rest]);
        }
        let element = match element {
            Value::Pair(_) => quasiquote_list(element),
            Value::Vector(items) => array_construction(items, true),
            Value::Atom(_) | Value::Null => quote_leaf(element),
        };
        call("cons", vec![element, rest])
    })
}

// ============================================================================
// VECTORS
// ============================================================================

/// `(Array e…)` with each element quoted (or quasiquoted) in turn.
fn array_construction(items: &[Value], quasi: bool) -> Value {
    let elements = items.iter().map(|item| match item {
        Value::Vector(inner) => array_construction(inner, quasi),
        Value::Pair(_) if quasi => quasiquote_datum(item),
        Value::Pair(_) => quote_list(item),
        Value::Null => Value::Null,
        Value::Atom(_) => quote_leaf(item),
    });
    call("Array", elements.collect())
}
