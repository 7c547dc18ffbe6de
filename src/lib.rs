//! lisp2js: compiles a small Lisp dialect to JavaScript source text.
//!
//! ```rust
//! let mut session = lisp2js::Session::new();
//! assert_eq!(session.compile("(def x 12)", false).unwrap(), "var x = 12;");
//! ```

pub use crate::ast::{Pair, Span, Value};
pub use crate::config::SessionConfig;
pub use crate::engine::{compile, last_eval_result, with_default_session, Session};
pub use crate::errors::{CompileError, ErrorKind, SourceContext};
pub use crate::evaluator::{Evaluator, EvaluatorError};
pub use crate::output::{NullSink, OutputBuffer, OutputSink, StdoutSink};

pub mod ast;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod macros;
pub mod names;
pub mod output;
pub mod quote;
pub mod repl;
pub mod runtime;
pub mod syntax;
pub mod test_harness;
