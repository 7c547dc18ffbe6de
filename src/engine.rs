//! Compile sessions.
//!
//! A [`Session`] owns everything that persists between calls to `compile`:
//! the macro table, the recursion-name counter, the diagnostics recorded so
//! far and the last value produced by an evaluation. Independent sessions
//! share nothing, so tests and embedders can run isolated compiles side by
//! side. A per-thread default session backs the free functions
//! [`compile`], [`last_eval_result`] and [`with_default_session`].

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use crate::ast::{Span, Value};
use crate::codegen::{terminate, CodeGenerator, CompileState};
use crate::config::SessionConfig;
use crate::errors::{CompileError, ErrorKind, SourceContext};
use crate::evaluator::Evaluator;
use crate::macros::{expand_trace, ExpansionStep, MacroTable};
use crate::output::{NullSink, OutputSink};
use crate::syntax::{parse, tokenize, ParsedProgram};

// ============================================================================
// SESSION
// ============================================================================

/// The explicit compile context.
pub struct Session {
    state: CompileState,
    config: SessionConfig,
    evaluator: Option<Box<dyn Evaluator>>,
    output: Box<dyn OutputSink>,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_config(SessionConfig::default())
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            state: CompileState::new(),
            config,
            evaluator: None,
            output: Box::new(NullSink),
        }
    }

    /// Installs the host that runs every compiled top-level snippet.
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Where eval-and-print results go.
    pub fn with_output(mut self, output: Box<dyn OutputSink>) -> Self {
        self.output = output;
        self
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        self.evaluator = Some(evaluator);
    }

    pub fn set_output(&mut self, output: Box<dyn OutputSink>) {
        self.output = output;
    }

    /// Name later diagnostics show for the compiled text.
    pub fn set_source_name(&mut self, name: impl Into<String>) {
        self.config.source_name = name.into();
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn macros(&self) -> &MacroTable {
        &self.state.macros
    }

    pub fn last_eval_result(&self) -> &Value {
        &self.state.last_eval_result
    }

    pub fn diagnostics(&self) -> &[CompileError] {
        &self.state.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.state.diagnostics)
    }

    /// An isolated copy of the compile state. The copy has no evaluator and
    /// discards printed output; macros defined afterwards in either session
    /// are invisible to the other.
    pub fn fork(&self) -> Session {
        Session {
            state: self.state.clone(),
            config: self.config.clone(),
            evaluator: None,
            output: Box::new(NullSink),
        }
    }

    // ------------------------------------------------------------------------
    // Compilation
    // ------------------------------------------------------------------------

    /// Compiles a whole program.
    ///
    /// Returns `Err` only when the text does not lex or parse; nothing is
    /// emitted in that case. Any other failure is recorded as a diagnostic
    /// and its top-level form contributes empty text.
    pub fn compile(&mut self, source: &str, evaluate_and_print: bool) -> Result<String, CompileError> {
        // Step 1: Read the source into top-level forms.
        let context = SourceContext::from_file(self.config.source_name.clone(), source);
        let program = read_program(source, &context)?;

        let mut out = String::new();
        for (form, span) in program.iter() {
            // Step 2: Generate text for the form.
            let snippet = terminate(&self.compile_form(form, span, &context));

            // Step 3: Hand the snippet to the host, if there is one.
            if !snippet.is_empty() {
                self.evaluate(&snippet, span, &context, evaluate_and_print);
            }
            out.push_str(&snippet);
        }
        Ok(out)
    }

    /// Compiles the contents of a file, naming diagnostics after its path.
    pub fn compile_file(&mut self, path: &Path, evaluate_and_print: bool) -> Result<String, CompileError> {
        let source = read_file(path)?;
        let previous = std::mem::replace(&mut self.config.source_name, path.display().to_string());
        let result = self.compile(&source, evaluate_and_print);
        self.config.source_name = previous;
        result
    }

    fn compile_form(&mut self, form: &Value, span: Span, context: &SourceContext) -> String {
        let mut generator = CodeGenerator::new(&mut self.state, &self.config, context, span)
            .with_host(self.evaluator.as_deref_mut());
        match generator.compile_top_level(form) {
            Ok(text) => text,
            Err(error) => {
                self.record(error.with_span(span).with_source(context));
                String::new()
            }
        }
    }

    fn evaluate(&mut self, snippet: &str, span: Span, context: &SourceContext, print: bool) {
        let Some(evaluator) = self.evaluator.as_mut() else {
            return;
        };
        match evaluator.evaluate(snippet) {
            Ok(value) => {
                if print {
                    self.output.emit(&value.to_string(), Some(&span));
                }
                self.state.last_eval_result = value;
            }
            Err(failure) => {
                self.state.last_eval_result = Value::atom("undefined");
                let error = CompileError::new(ErrorKind::EvaluationFailed {
                    message: failure.message,
                })
                .with_span(span)
                .with_source(context);
                self.record(error);
            }
        }
    }

    fn record(&mut self, error: CompileError) {
        log::warn!("{}: {}", error.error_code(), error);
        self.state.diagnostics.push(error);
    }

    // ------------------------------------------------------------------------
    // Macro inspection
    // ------------------------------------------------------------------------

    /// Each rewrite of the first form of `source` under this session's
    /// macros, up to `limit` rewrites when given.
    pub fn macro_trace(&self, source: &str, limit: Option<usize>) -> Result<Vec<ExpansionStep>, CompileError> {
        let context = SourceContext::from_file(self.config.source_name.clone(), source);
        let program = read_program(source, &context)?;
        let Some((form, span)) = program.iter().next() else {
            return Ok(Vec::new());
        };
        expand_trace(&self.state.macros, form, limit, self.config.max_macro_depth)
            .map_err(|error| error.with_span(span).with_source(&context))
    }
}

// ============================================================================
// SOURCE SERVICES
// ============================================================================

/// Lexes and parses `source`, attaching `context` to any syntax error.
pub fn read_program(source: &str, context: &SourceContext) -> Result<ParsedProgram, CompileError> {
    let tokens = tokenize(source).map_err(|error| error.with_source(context))?;
    parse(&tokens).map_err(|error| error.with_source(context))
}

/// Reads a source file, reporting unreadable paths as a malformed input.
pub fn read_file(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|error| {
        CompileError::malformed("file", format!("cannot read `{}`: {}", path.display(), error))
    })
}

// ============================================================================
// DEFAULT SESSION
// ============================================================================

thread_local! {
    static DEFAULT_SESSION: RefCell<Session> = RefCell::new(Session::new());
}

/// Runs `f` against this thread's default session, e.g. to install an
/// evaluator or replace it with a differently configured one.
///
/// # Panics
///
/// When called while the default session is already in use, such as from
/// an evaluator it is running. [`compile`] reports that case as an error.
pub fn with_default_session<R>(f: impl FnOnce(&mut Session) -> R) -> R {
    DEFAULT_SESSION.with(|session| f(&mut session.borrow_mut()))
}

/// Compiles with the default session.
///
/// ```rust
/// assert_eq!(lisp2js::compile("(def x 12)", false).unwrap(), "var x = 12;");
/// assert!(lisp2js::compile("(def x 12", false).is_err());
/// ```
pub fn compile(source: &str, evaluate_and_print: bool) -> Result<String, CompileError> {
    DEFAULT_SESSION.with(|session| match session.try_borrow_mut() {
        Ok(mut session) => session.compile(source, evaluate_and_print),
        Err(_) => Err(CompileError::malformed(
            "compile",
            "the default session is already compiling",
        )),
    })
}

/// The default session's last evaluation result.
pub fn last_eval_result() -> Value {
    with_default_session(|session| session.last_eval_result().clone())
}
