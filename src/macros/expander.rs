//! Template materialization and stepwise expansion.
//!
//! A `` `template `` is copied with `~x` replaced by the capture (or the
//! value of the unquoted expression) and `~@xs` spliced in place. A
//! `'template` yields its datum unchanged. Any other template is code:
//! when it only combines captures, literals and quoted data with the list
//! primitives (`list`, `cons`, `append`, `car`, `cdr`, ...) the compiler
//! builds the tree it denotes. Code that calls anything else is left to
//! the host evaluator when the session has one, and otherwise has its
//! captured symbols replaced wherever they occur outside quoted data.

use super::matcher::{match_pattern, Bindings};
use super::{MacroClause, MacroDefinition, MacroTable};
use crate::ast::Value;
use crate::errors::{CompileError, ErrorKind};
use crate::names::{atom_text, is_numeric};

// ============================================================================
// MATERIALIZATION
// ============================================================================

/// Instantiates a clause template with the captured bindings.
///
/// ```rust
/// use lisp2js::ast::Value;
/// use lisp2js::macros::{materialize, Bindings};
/// let template = Value::list(vec![
///     "quasiquote".into(),
///     Value::list(vec![
///         "*".into(),
///         Value::list(vec!["unquote".into(), "x".into()]),
///         Value::list(vec!["unquote".into(), "x".into()]),
///     ]),
/// ]);
/// let mut bindings = Bindings::new();
/// bindings.insert("x".into(), "12".into());
/// assert_eq!(materialize(&template, &bindings).pretty(), "(* 12 12)");
/// ```
pub fn materialize(template: &Value, bindings: &Bindings) -> Value {
    evaluate_template(template, bindings).unwrap_or_else(|| substitute(template, bindings))
}

/// The tree a template denotes, when building it needs nothing beyond
/// captures, literals, quoted data and the list primitives.
///
/// ```rust
/// use lisp2js::ast::Value;
/// use lisp2js::macros::{evaluate_template, Bindings};
/// let template = Value::list(vec![
///     "cons".into(),
///     Value::list(vec!["quote".into(), "f".into()]),
///     "xs".into(),
/// ]);
/// let mut bindings = Bindings::new();
/// bindings.insert("xs".into(), Value::list(vec!["1".into(), "2".into()]));
/// assert_eq!(evaluate_template(&template, &bindings).unwrap().pretty(), "(f 1 2)");
/// assert!(evaluate_template(&"unbound".into(), &bindings).is_none());
/// ```
pub fn evaluate_template(template: &Value, bindings: &Bindings) -> Option<Value> {
    match template {
        Value::Null => Some(Value::Null),
        Value::Atom(text) => lookup(text, bindings).or_else(|| literal(text)),
        Value::Vector(items) => items
            .iter()
            .map(|item| evaluate_template(item, bindings))
            .collect::<Option<Vec<_>>>()
            .map(Value::Vector),
        Value::Pair(_) => match template.head_atom()? {
            "quote" => Some(template.second().cloned().unwrap_or_default()),
            "quasiquote" => Some(instantiate(template.second().unwrap_or(&Value::Null), bindings)),
            head => {
                let args = template
                    .rest()
                    .unwrap_or(&Value::Null)
                    .iter()
                    .map(|arg| evaluate_template(arg, bindings))
                    .collect::<Option<Vec<_>>>()?;
                apply_primitive(head, args)
            }
        },
    }
}

/// Self-evaluating atoms. A string literal denotes the symbol it spells.
fn literal(text: &str) -> Option<Value> {
    if is_numeric(text) || matches!(text, "true" | "false") {
        return Some(Value::atom(text));
    }
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    (!inner.contains(['\\', '"'])).then(|| Value::atom(inner))
}

fn apply_primitive(name: &str, mut args: Vec<Value>) -> Option<Value> {
    match (name, args.len()) {
        ("list", _) => Some(Value::list(args)),
        ("Array", _) => Some(Value::Vector(args)),
        ("cons", 2) => {
            let rest = args.pop()?;
            let first = args.pop()?;
            Some(Value::cons(first, rest))
        }
        ("append", 0) => Some(Value::Null),
        ("append", _) => {
            let last = args.pop()?;
            args.into_iter().rev().try_fold(last, |tail, list| match list {
                Value::Vector(items) => Some(Value::improper(items, tail)),
                Value::Pair(_) | Value::Null => Some(Value::improper(list.to_vec(), tail)),
                Value::Atom(_) => None,
            })
        }
        ("car" | "first", 1) => args[0].first().cloned(),
        ("cdr" | "rest", 1) => args[0].rest().cloned(),
        ("second", 1) => args[0].nth(1).cloned(),
        ("third", 1) => args[0].nth(2).cloned(),
        ("fourth", 1) => args[0].nth(3).cloned(),
        _ => None,
    }
}

fn unquoted<'a>(value: &'a Value, tag: &str) -> Option<&'a Value> {
    if value.head_atom() == Some(tag) {
        Some(value.second().unwrap_or(&Value::Null))
    } else {
        None
    }
}

/// Quasiquoted data: copied, with unquotes resolved.
fn instantiate(datum: &Value, bindings: &Bindings) -> Value {
    if let Some(expr) = unquoted(datum, "unquote") {
        return materialize(expr, bindings);
    }
    match datum {
        Value::Atom(_) | Value::Null => datum.clone(),
        Value::Vector(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                instantiate_into(item, bindings, &mut out);
            }
            Value::Vector(out)
        }
        Value::Pair(_) => {
            let mut out = Vec::new();
            let mut cursor = datum;
            let mut tail = Value::Null;
            while let Value::Pair(pair) = cursor {
                if pair.first.is_atom(".") {
                    tail = instantiate(pair.rest.first().unwrap_or(&Value::Null), bindings);
                    break;
                }
                instantiate_into(&pair.first, bindings, &mut out);
                cursor = &pair.rest;
                if !cursor.is_pair() && !cursor.is_null() {
                    tail = cursor.clone();
                }
            }
            Value::improper(out, tail)
        }
    }
}

/// Pushes one instantiated element, splicing `~@` captures.
fn instantiate_into(item: &Value, bindings: &Bindings, out: &mut Vec<Value>) {
    match unquoted(item, "unquote-splice") {
        Some(expr) => match materialize(expr, bindings) {
            Value::Vector(items) => out.extend(items),
            list @ Value::Pair(_) => out.extend(list.iter().cloned()),
            Value::Null => {}
            atom @ Value::Atom(_) => out.push(atom),
        },
        None => out.push(instantiate(item, bindings)),
    }
}

/// Code templates: captured symbols are replaced, quoted data is left alone.
fn substitute(code: &Value, bindings: &Bindings) -> Value {
    match code {
        Value::Null => Value::Null,
        Value::Atom(text) => lookup(text, bindings).unwrap_or_else(|| code.clone()),
        Value::Vector(items) => Value::Vector(items.iter().map(|v| substitute(v, bindings)).collect()),
        Value::Pair(_) => match code.head_atom() {
            Some("quote") => code.clone(),
            Some("quasiquote") => {
                let datum = code.second().unwrap_or(&Value::Null);
                Value::list(vec![Value::atom("quasiquote"), substitute_unquotes(datum, bindings)])
            }
            _ => map_list(code, |item| substitute(item, bindings)),
        },
    }
}

/// Inside a nested quasiquote only the unquoted parts are code.
fn substitute_unquotes(datum: &Value, bindings: &Bindings) -> Value {
    for tag in ["unquote", "unquote-splice"] {
        if let Some(expr) = unquoted(datum, tag) {
            return Value::list(vec![Value::atom(tag), substitute(expr, bindings)]);
        }
    }
    match datum {
        Value::Vector(items) => {
            Value::Vector(items.iter().map(|v| substitute_unquotes(v, bindings)).collect())
        }
        Value::Pair(_) => map_list(datum, |item| substitute_unquotes(item, bindings)),
        _ => datum.clone(),
    }
}

fn lookup(symbol: &str, bindings: &Bindings) -> Option<Value> {
    bindings.get(symbol).cloned().or_else(|| {
        let spelled = atom_text(symbol);
        bindings
            .iter()
            .find(|(name, _)| atom_text(name) == spelled)
            .map(|(_, value)| value.clone())
    })
}

/// Maps the elements of a pair chain, keeping an improper tail.
fn map_list(list: &Value, mut f: impl FnMut(&Value) -> Value) -> Value {
    let items: Vec<Value> = list.iter().map(&mut f).collect();
    let tail = match list.list_tail() {
        Value::Null => Value::Null,
        other => f(other),
    };
    Value::improper(items, tail)
}

// ============================================================================
// EXPANSION
// ============================================================================

/// The first clause that accepts `args`, with its captures.
pub fn select_clause<'d>(
    definition: &'d MacroDefinition,
    args: &Value,
) -> Option<(&'d MacroClause, Bindings)> {
    let args = args.to_vec();
    definition
        .clauses
        .iter()
        .find_map(|clause| match_pattern(&clause.pattern, &args).map(|bindings| (clause, bindings)))
}

/// Rewrites one call with the first clause that accepts `args`.
pub fn expand(definition: &MacroDefinition, args: &Value) -> Option<Value> {
    select_clause(definition, args).map(|(clause, bindings)| materialize(&clause.template, &bindings))
}

/// One rewrite performed by [`expand_trace`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionStep {
    pub macro_name: String,
    pub output: Value,
}

/// Expands `form` while its head names a macro.
///
/// Stops after `limit` rewrites when a limit is given, otherwise at the
/// first form whose head is not a macro. More than `max_depth` rewrites is
/// reported as runaway expansion.
pub fn expand_trace(
    table: &MacroTable,
    form: &Value,
    limit: Option<usize>,
    max_depth: usize,
) -> Result<Vec<ExpansionStep>, CompileError> {
    let mut steps: Vec<ExpansionStep> = Vec::new();
    let mut current = form.clone();
    loop {
        let Some(head) = current.head_atom() else {
            break;
        };
        let name = atom_text(head).into_owned();
        let Some(definition) = table.get(&name) else {
            break;
        };
        if steps.len() >= max_depth {
            return Err(CompileError::new(ErrorKind::MacroRecursionLimit {
                name,
                limit: max_depth,
            }));
        }
        let args = current.rest().unwrap_or(&Value::Null);
        let Some(output) = expand(definition, args) else {
            return Err(CompileError::new(ErrorKind::NoMatchingClause { name }));
        };
        log::debug!("macroexpand step {}: `{}` -> {}", steps.len(), name, output.pretty());
        steps.push(ExpansionStep {
            macro_name: name,
            output: output.clone(),
        });
        if limit.is_some_and(|limit| steps.len() >= limit) {
            break;
        }
        current = output;
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, tokenize};

    fn read(source: &str) -> Value {
        let program = parse(&tokenize(source).unwrap()).unwrap();
        program.forms.first().cloned().unwrap()
    }

    fn bind(pairs: &[(&str, Value)]) -> Bindings {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn table(source: &str) -> MacroTable {
        let form = read(source);
        let name = atom_text(form.second().and_then(Value::as_atom).unwrap());
        let clauses = form.skip(2).unwrap();
        let mut table = MacroTable::new();
        table.define(MacroDefinition::from_clauses(&name, clauses).unwrap());
        table
    }

    #[test]
    fn splices_lists_and_vectors() {
        let template = read("`(do ~@body end)");
        let body = read("((f 1) (g 2))");
        assert_eq!(
            materialize(&template, &bind(&[("body", body)])).pretty(),
            "(do (f 1) (g 2) end)"
        );
        let vector = Value::Vector(vec!["1".into(), "2".into()]);
        assert_eq!(
            materialize(&template, &bind(&[("body", vector)])).pretty(),
            "(do 1 2 end)"
        );
        assert_eq!(
            materialize(&template, &bind(&[("body", Value::Null)])).pretty(),
            "(do end)"
        );
    }

    #[test]
    fn unquoted_expressions_are_substituted_code() {
        let template = read("`(if ~(not c) ~x)");
        let out = materialize(&template, &bind(&[("c", "ok".into()), ("x", "1".into())]));
        assert_eq!(out.pretty(), "(if (not ok) 1)");
    }

    #[test]
    fn quoted_templates_are_literal() {
        let template = read("'(x y)");
        let out = materialize(&template, &bind(&[("x", "1".into())]));
        assert_eq!(out.pretty(), "(x y)");
    }

    #[test]
    fn list_primitives_build_their_tree() {
        let x = bind(&[("x", "12".into())]);
        assert_eq!(materialize(&read("(list '+ x 1)"), &x).pretty(), "(+ 12 1)");
        assert_eq!(materialize(&read("(list 'x x `(x ~x))"), &x).pretty(), "(x 12 (x 12))");

        let xs = bind(&[("xs", read("(1 2)"))]);
        assert_eq!(materialize(&read("(cons 'f xs)"), &xs).pretty(), "(f 1 2)");
        assert_eq!(materialize(&read("(append xs '(3) xs)"), &xs).pretty(), "(1 2 3 1 2)");
        assert_eq!(materialize(&read("(cons (car xs) (cdr (cdr xs)))"), &xs).pretty(), "(1)");
        assert_eq!(materialize(&read("(list \"f\" (second xs))"), &xs).pretty(), "(f 2)");
    }

    #[test]
    fn other_code_templates_skip_quoted_data() {
        let template = read("(f 'x x `(x ~x))");
        let out = materialize(&template, &bind(&[("x", "1".into())]));
        assert_eq!(out.pretty(), "(f (quote x) 1 (quasiquote (x (unquote 1))))");
        assert!(evaluate_template(&template, &bind(&[("x", "1".into())])).is_none());
    }

    #[test]
    fn dotted_quasiquote_tail() {
        let template = read("`(a . ~b)");
        let out = materialize(&template, &bind(&[("b", "c".into())]));
        assert_eq!(out, Value::cons("a".into(), "c".into()));
    }

    #[test]
    fn first_matching_clause_wins() {
        let t = table("(defmacro m [] 0 [x] `(one ~x) [x . r] `(many ~x ~@r))");
        let def = t.get("m").unwrap();
        assert_eq!(expand(def, &Value::Null).unwrap().pretty(), "0");
        assert_eq!(expand(def, &read("(1)")).unwrap().pretty(), "(one 1)");
        assert_eq!(expand(def, &read("(1 2 3)")).unwrap().pretty(), "(many 1 2 3)");
    }

    #[test]
    fn trace_follows_macro_heads() {
        let mut t = table("(defmacro unless [c . body] `(when (not ~c) ~@body))");
        let when = read("(defmacro when [c . body] `(if ~c (do ~@body)))");
        t.define(
            MacroDefinition::from_clauses("when", when.skip(2).unwrap()).unwrap(),
        );

        let steps = expand_trace(&t, &read("(unless ok (f))"), None, 128).unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.macro_name.as_str()).collect();
        assert_eq!(names, vec!["unless", "when"]);
        assert_eq!(steps[1].output.pretty(), "(if (not ok) (do (f)))");

        let one = expand_trace(&t, &read("(unless ok (f))"), Some(1), 128).unwrap();
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn runaway_expansion_is_reported() {
        let t = table("(defmacro loop-forever [x] `(loop-forever ~x))");
        let err = expand_trace(&t, &read("(loop-forever 1)"), None, 16).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MacroRecursionLimit {
                name: "loop_$45_forever".into(),
                limit: 16
            }
        );
    }

    #[test]
    fn unmatched_call_is_reported() {
        let t = table("(defmacro one [x] x)");
        let err = expand_trace(&t, &read("(one)"), None, 16).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NoMatchingClause { .. }));
    }
}
