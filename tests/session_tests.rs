// tests/session_tests.rs
//
// Sessions with a host evaluator attached, the default per-thread session,
// and configuration.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{ok, ScriptedEvaluator};
use lisp2js::{EvaluatorError, OutputBuffer, Session, SessionConfig, Value};

#[test]
fn every_top_level_snippet_reaches_the_host() {
    let (evaluator, transcript) = ScriptedEvaluator::new(vec![]);
    let mut session = Session::new().with_evaluator(Box::new(evaluator));
    session
        .compile("(defn add [{:a 1 :b 2}] (+ a b)) (defmacro m [] 1) (add)", false)
        .unwrap();

    let snippets = transcript.borrow();
    assert_eq!(snippets.len(), 2, "macro definitions produce no snippet");
    assert!(snippets[0].starts_with("function add(__lisp_args__)"));
    assert_eq!(snippets[1], "add();");
}

#[test]
fn keyword_defaults_round_trip_through_the_host() {
    let (evaluator, transcript) = ScriptedEvaluator::new(vec![ok("undefined"), ok("3"), ok("7")]);
    let printed = Rc::new(RefCell::new(OutputBuffer::new()));
    let mut session = Session::new()
        .with_evaluator(Box::new(evaluator))
        .with_output(Box::new(Rc::clone(&printed)));

    session.compile("(defn add [{:a 1 :b 2}] (+ a b))", false).unwrap();
    session.compile("(add)", true).unwrap();
    assert_eq!(session.last_eval_result(), &Value::atom("3"));
    session.compile("(add :a 3 :b 4)", true).unwrap();
    assert_eq!(session.last_eval_result(), &Value::atom("7"));

    assert_eq!(transcript.borrow()[2], "add({a: 3, b: 4});");
    assert_eq!(printed.borrow().as_str(), "3\n7");
}

#[test]
fn printed_lists_use_runtime_notation() {
    let list = Value::list(vec![Value::atom("1"), Value::atom("2")]);
    let (evaluator, _) = ScriptedEvaluator::new(vec![Ok(list)]);
    let printed = Rc::new(RefCell::new(OutputBuffer::new()));
    let mut session = Session::new()
        .with_evaluator(Box::new(evaluator))
        .with_output(Box::new(Rc::clone(&printed)));
    session.compile("(list 1 2)", true).unwrap();
    assert_eq!(printed.borrow().as_str(), "(1, 2)");
}

#[test]
fn host_failures_are_diagnosed_and_compilation_continues() {
    let (evaluator, _) = ScriptedEvaluator::new(vec![
        Err(EvaluatorError::new("ReferenceError: nope is not defined")),
        ok("2"),
    ]);
    let mut session = Session::new().with_evaluator(Box::new(evaluator));
    let out = session.compile("(nope) (def y 2)", false).unwrap();
    assert_eq!(out, "nope();var y = 2;");
    assert_eq!(session.last_eval_result(), &Value::atom("2"));

    let diagnostics = session.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].error_code(), "lisp2js::eval::evaluation_failed");
    assert!(diagnostics[0].to_string().contains("nope is not defined"));
}

#[test]
fn failed_snippet_leaves_undefined_behind() {
    let (evaluator, _) = ScriptedEvaluator::new(vec![Err(EvaluatorError::new("boom"))]);
    let mut session = Session::new().with_evaluator(Box::new(evaluator));
    session.compile("(f)", false).unwrap();
    assert_eq!(session.last_eval_result(), &Value::atom("undefined"));
}

#[test]
fn sessions_are_isolated() {
    let mut a = Session::new();
    let mut b = Session::new();
    a.compile("(defmacro square [x] `(* ~x ~x))", false).unwrap();
    assert_eq!(a.compile("(square 2)", false).unwrap(), "(2 * 2);");
    assert_eq!(b.compile("(square 2)", false).unwrap(), "square(2);");
}

#[test]
fn default_session_can_be_overridden() {
    lisp2js::with_default_session(|session| {
        *session = Session::with_config(SessionConfig {
            max_macro_depth: 4,
            ..SessionConfig::default()
        })
    });
    lisp2js::compile("(defmacro forever [x] `(forever ~x))", false).unwrap();
    assert_eq!(lisp2js::compile("(forever 1)", false).unwrap(), "");
    let code = lisp2js::with_default_session(|session| session.diagnostics()[0].error_code());
    assert_eq!(code, "lisp2js::macro::recursion_limit");
}

#[test]
fn config_names_the_source_in_diagnostics() {
    let config = SessionConfig::from_yaml_str("source_name: main.lisp").unwrap();
    let mut session = Session::with_config(config);
    let err = session.compile("(def x", false).unwrap_err();
    let source = err.source_code.expect("syntax errors carry their source");
    assert_eq!(source.name(), "main.lisp");
}

#[test]
fn templates_beyond_list_primitives_run_on_the_host() {
    let expansion = Value::list(vec![Value::atom("g"), Value::atom("1")]);
    let (evaluator, transcript) = ScriptedEvaluator::new(vec![Ok(expansion), ok("1")]);
    let mut session = Session::new().with_evaluator(Box::new(evaluator));
    session.compile("(defmacro m [x] (make-form x))", false).unwrap();

    assert_eq!(session.compile("(m 1)", false).unwrap(), "g(1);");
    let snippets = transcript.borrow();
    assert_eq!(snippets[0], "(function (x){return make_$45_form(x);})(1)");
    assert_eq!(snippets[1], "g(1);");
}

#[test]
fn overly_nested_forms_are_diagnosed() {
    let config = SessionConfig {
        max_nesting_depth: 6,
        ..SessionConfig::default()
    };
    let mut session = Session::with_config(config);
    let out = session.compile("(f (f (f (f (f (f (f 1))))))) (def y 2)", false).unwrap();
    assert_eq!(out, "var y = 2;");
    assert_eq!(
        session.diagnostics()[0].error_code(),
        "lisp2js::codegen::nesting_too_deep"
    );
}
