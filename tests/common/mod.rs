//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use lisp2js::{Evaluator, EvaluatorError, Session, Value};

/// Compiles `source` in a fresh session.
pub fn compile(source: &str) -> String {
    Session::new()
        .compile(source, false)
        .unwrap_or_else(|e| panic!("`{}` failed to compile: {}", source, e))
}

/// Everything a [`ScriptedEvaluator`] was asked to run.
pub type Transcript = Rc<RefCell<Vec<String>>>;

/// A stand-in host: answers each snippet with the next scripted result and
/// records what it was given. Runs out to `undefined`.
pub struct ScriptedEvaluator {
    replies: VecDeque<Result<Value, EvaluatorError>>,
    transcript: Transcript,
}

impl ScriptedEvaluator {
    pub fn new(replies: Vec<Result<Value, EvaluatorError>>) -> (Self, Transcript) {
        let transcript = Transcript::default();
        let evaluator = Self {
            replies: replies.into(),
            transcript: Rc::clone(&transcript),
        };
        (evaluator, transcript)
    }
}

impl Evaluator for ScriptedEvaluator {
    fn evaluate(&mut self, snippet: &str) -> Result<Value, EvaluatorError> {
        self.transcript.borrow_mut().push(snippet.to_string());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Ok(Value::atom("undefined")))
    }
}

pub fn ok(text: &str) -> Result<Value, EvaluatorError> {
    Ok(Value::atom(text))
}
