//! The host evaluator seam.
//!
//! The compiler only produces text. Running that text, and turning what it
//! returns back into a [`Value`], is the job of an embedding host (a
//! JavaScript engine) that implements [`Evaluator`] and is installed on a
//! session with `Session::with_evaluator`.

use crate::ast::Value;
use miette::Diagnostic;

/// Runs compiled snippets in a persistent host context.
pub trait Evaluator {
    /// Evaluates one top-level snippet. State defined by earlier snippets
    /// stays visible to later ones.
    fn evaluate(&mut self, snippet: &str) -> Result<Value, EvaluatorError>;
}

impl<F> Evaluator for F
where
    F: FnMut(&str) -> Result<Value, EvaluatorError>,
{
    fn evaluate(&mut self, snippet: &str) -> Result<Value, EvaluatorError> {
        self(snippet)
    }
}

/// A failure reported by the host while running a snippet.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(lisp2js::eval::host))]
pub struct EvaluatorError {
    pub message: String,
}

impl EvaluatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_evaluators() {
        let mut seen = Vec::new();
        let mut host = |snippet: &str| -> Result<Value, EvaluatorError> {
            seen.push(snippet.to_string());
            Ok(Value::atom("1"))
        };
        assert_eq!(host.evaluate("1;"), Ok(Value::atom("1")));
        drop(host);
        assert_eq!(seen, vec!["1;"]);
    }
}
