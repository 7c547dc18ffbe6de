//! lisp2js error handling
//!
//! One error type, [`CompileError`], carries a [`ErrorKind`] plus whatever
//! source context is known where it was raised. Syntax failures are returned
//! from `compile`; every other kind is recorded as a session diagnostic.

use crate::ast::Span;
use miette::{Diagnostic, LabeledSpan, NamedSource};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// The text being compiled, under the name diagnostics should show for it.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// ERROR KINDS
// ============================================================================

/// Everything that can go wrong while compiling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    // Syntax: the whole compile fails
    #[error("unbalanced delimiters: {}", describe_depth(*depth))]
    UnbalancedDelimiters { depth: i64 },
    #[error("closing delimiter without a matching opener")]
    UnexpectedClose,

    // Macro matching
    #[error("no clause of macro `{name}` matches this call")]
    NoMatchingClause { name: String },
    #[error("macroexpand: `{form}` is not a macro call")]
    NotAMacro { form: String },
    #[error("expansion of macro `{name}` nested deeper than {limit} levels")]
    MacroRecursionLimit { name: String, limit: usize },

    // Construction of output text
    #[error("malformed `{form}` form: {reason}")]
    MalformedForm { form: String, reason: String },
    #[error("invalid parameter list: {reason}")]
    InvalidParameters { reason: String },
    #[error("keyword argument `{keyword}` has no value")]
    InvalidKeywordArguments { keyword: String },
    #[error("class `{class}` declares more than one constructor")]
    DuplicateConstructor { class: String },
    #[error("invalid macro definition `{name}`: {reason}")]
    InvalidMacroDefinition { name: String, reason: String },
    #[error("form nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    // Host evaluator
    #[error("evaluation failed: {message}")]
    EvaluationFailed { message: String },
}

fn describe_depth(depth: i64) -> String {
    if depth > 0 {
        format!("{depth} left open")
    } else {
        format!("{} closed without an opener", -depth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    MacroMatch,
    Construction,
    Evaluator,
}

impl ErrorCategory {
    pub const fn phase(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::MacroMatch => "macro",
            Self::Construction => "codegen",
            Self::Evaluator => "eval",
        }
    }
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnbalancedDelimiters { .. } | Self::UnexpectedClose => ErrorCategory::Syntax,

            Self::NoMatchingClause { .. }
            | Self::NotAMacro { .. }
            | Self::MacroRecursionLimit { .. } => ErrorCategory::MacroMatch,

            Self::MalformedForm { .. }
            | Self::InvalidParameters { .. }
            | Self::InvalidKeywordArguments { .. }
            | Self::DuplicateConstructor { .. }
            | Self::InvalidMacroDefinition { .. }
            | Self::NestingTooDeep { .. } => ErrorCategory::Construction,

            Self::EvaluationFailed { .. } => ErrorCategory::Evaluator,
        }
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnbalancedDelimiters { .. } => "unbalanced_delimiters",
            Self::UnexpectedClose => "unexpected_close",
            Self::NoMatchingClause { .. } => "no_matching_clause",
            Self::NotAMacro { .. } => "not_a_macro",
            Self::MacroRecursionLimit { .. } => "recursion_limit",
            Self::MalformedForm { .. } => "malformed_form",
            Self::InvalidParameters { .. } => "invalid_parameters",
            Self::InvalidKeywordArguments { .. } => "invalid_keyword_arguments",
            Self::DuplicateConstructor { .. } => "duplicate_constructor",
            Self::InvalidMacroDefinition { .. } => "invalid_macro",
            Self::NestingTooDeep { .. } => "nesting_too_deep",
            Self::EvaluationFailed { .. } => "evaluation_failed",
        }
    }

    fn default_help(&self) -> Option<&'static str> {
        match self {
            Self::UnbalancedDelimiters { .. } | Self::UnexpectedClose => {
                Some("every `(`, `[` and `{` needs a matching `)`, `]` or `}`")
            }
            Self::InvalidParameters { .. } => {
                Some("parameters are a vector such as [a :b 1 & rest] or [a {:k 1}]")
            }
            Self::InvalidKeywordArguments { .. } => {
                Some("keyword arguments come in pairs: (f :name value)")
            }
            Self::InvalidMacroDefinition { .. } => {
                Some("write (defmacro name [pattern] template [pattern] template ...)")
            }
            Self::NestingTooDeep { .. } => Some("raise `max_nesting_depth` in the session config"),
            _ => None,
        }
    }

    fn primary_label(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Syntax => "unbalanced here",
            ErrorCategory::MacroMatch => "in this macro call",
            ErrorCategory::Construction => "in this form",
            ErrorCategory::Evaluator => "while evaluating this form",
        }
    }
}

// ============================================================================
// THE ERROR TYPE
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub source_code: Option<Arc<NamedSource<String>>>,
    pub help: Option<String>,
}

impl CompileError {
    pub fn new(kind: ErrorKind) -> Self {
        let help = kind.default_help().map(str::to_string);
        Self {
            kind,
            span: None,
            source_code: None,
            help,
        }
    }

    pub fn malformed(form: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedForm {
            form: form.to_string(),
            reason: reason.into(),
        })
    }

    pub fn invalid_parameters(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameters {
            reason: reason.into(),
        })
    }

    /// Attach a span unless a more precise one is already present.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    pub fn with_source(mut self, source: &SourceContext) -> Self {
        self.source_code = Some(source.to_named_source());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// `lisp2js::<phase>::<kind>`
    pub fn error_code(&self) -> String {
        format!(
            "lisp2js::{}::{}",
            self.category().phase(),
            self.kind.code_suffix()
        )
    }
}

impl Diagnostic for CompileError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.error_code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        self.source_code.as_ref()?;
        let label = LabeledSpan::new_with_span(Some(self.kind.primary_label().into()), span);
        Some(Box::new(std::iter::once(label)))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_deref()
            .map(|source| source as &dyn miette::SourceCode)
    }
}

// ============================================================================
// CONTEXT-AWARE CONSTRUCTION
// ============================================================================

/// Context-aware error creation: a context knows its source and attaches it.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: Option<Span>) -> CompileError;

    fn unbalanced(&self, depth: i64, span: Option<Span>) -> CompileError {
        self.report(ErrorKind::UnbalancedDelimiters { depth }, span)
    }
}

impl ErrorReporting for SourceContext {
    fn report(&self, kind: ErrorKind, span: Option<Span>) -> CompileError {
        let error = CompileError::new(kind).with_source(self);
        match span {
            Some(span) => error.with_span(span),
            None => error,
        }
    }
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a CompileError with full miette diagnostics to stderr.
pub fn print_error(error: CompileError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_phase_and_kind() {
        let err = CompileError::new(ErrorKind::UnexpectedClose);
        assert_eq!(err.error_code(), "lisp2js::syntax::unexpected_close");
        assert_eq!(err.category(), ErrorCategory::Syntax);

        let err = CompileError::new(ErrorKind::NoMatchingClause {
            name: "square".into(),
        });
        assert_eq!(err.error_code(), "lisp2js::macro::no_matching_clause");
        assert_eq!(err.to_string(), "no clause of macro `square` matches this call");
    }

    #[test]
    fn first_span_wins() {
        let err = CompileError::malformed("def", "missing name")
            .with_span(Span::new(1, 2))
            .with_span(Span::new(0, 10));
        assert_eq!(err.span, Some(Span::new(1, 2)));
    }

    #[test]
    fn report_attaches_source_and_label() {
        let ctx = SourceContext::from_file("test.lisp", "(def x");
        let err = ctx.unbalanced(1, Some(Span::new(0, 1)));
        assert!(err.source_code().is_some());
        assert_eq!(err.labels().map(|labels| labels.count()), Some(1));
        assert!(err.help.is_some());
    }
}
