//! Clause pattern matching.

use crate::ast::Value;
use std::collections::HashMap;

/// Pattern variables captured by a successful match.
pub type Bindings = HashMap<String, Value>;

/// Matches call arguments against one clause pattern.
///
/// Returns the captured bindings, or `None` when the pattern rejects the
/// arguments. Arity must agree exactly unless the pattern ends in `. rest`.
///
/// ```rust
/// use lisp2js::ast::Value;
/// use lisp2js::macros::match_pattern;
/// let pattern = vec![Value::atom("#to"), "x".into(), ".".into(), "more".into()];
/// let args = vec!["to".into(), "1".into(), "2".into(), "3".into()];
/// let bindings = match_pattern(&pattern, &args).unwrap();
/// assert_eq!(bindings["x"], Value::atom("1"));
/// assert_eq!(bindings["more"].pretty(), "(2 3)");
/// ```
pub fn match_pattern(pattern: &[Value], args: &[Value]) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    match_into(pattern, args, &mut bindings).then_some(bindings)
}

fn match_into(pattern: &[Value], args: &[Value], bindings: &mut Bindings) -> bool {
    let mut i = 0;
    loop {
        let Some(element) = pattern.get(i) else {
            return i == args.len();
        };
        if element.is_atom(".") {
            if let Some(Value::Atom(name)) = pattern.get(i + 1) {
                let rest = args.get(i..).unwrap_or_default().to_vec();
                bindings.insert(name.clone(), Value::list(rest));
            }
            return true;
        }
        let Some(arg) = args.get(i) else {
            return false;
        };

        let matched = match element {
            Value::Vector(items) => match_nested(items, arg, bindings),
            Value::Pair(_) => match_nested(&element.to_vec(), arg, bindings),
            Value::Null => match_nested(&[], arg, bindings),
            Value::Atom(text) => match text.strip_prefix('#') {
                Some(literal) => arg.is_atom(literal),
                None => {
                    bindings.insert(text.clone(), arg.clone());
                    true
                }
            },
        };
        if !matched {
            return false;
        }
        i += 1;
    }
}

/// A nested pattern accepts a list, a vector, or the empty list.
fn match_nested(pattern: &[Value], arg: &Value, bindings: &mut Bindings) -> bool {
    match arg {
        Value::Vector(items) => match_into(pattern, items, bindings),
        Value::Pair(_) | Value::Null => match_into(pattern, &arg.to_vec(), bindings),
        Value::Atom(_) => false,
    }
}
