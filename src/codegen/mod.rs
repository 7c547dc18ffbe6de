//! Code generation
//!
//! Turns one parsed form into host text. The generator is a recursive walk
//! whose behaviour at each node depends on a small [`Context`]: whether the
//! node is the last expression of a function body, whether its text must
//! start with `return `, whether it sits where a value is required, and
//! which function a tail `recur` call re-enters.
//!
//! Failures other than syntax errors come back as `Err` from the form that
//! raised them; the session turns them into diagnostics and empty text for
//! the enclosing top-level form. Macro calls that match no clause and
//! duplicate class constructors are reported here directly and only empty
//! the call site.

use std::cell::RefCell;

use crate::ast::{Span, Value};
use crate::config::SessionConfig;
use crate::errors::{CompileError, ErrorKind, SourceContext};
use crate::evaluator::Evaluator;
use crate::macros::MacroTable;
use crate::names::atom_text;

mod calls;
mod control;
mod functions;
mod objects;
mod operators;
mod params;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Prefix of the generated recursion names, `__lisp__recur__$0`, `$3`, ...
pub const RECUR_NAME_PREFIX: &str = "__lisp__recur__$";

/// Distance between consecutive recursion-name suffixes.
pub const RECUR_NAME_STEP: usize = 3;

/// Default bound on how deeply one top-level form may nest.
pub const MAX_NESTING_DEPTH: usize = 200;

/// Operator heads lowered to infix expressions.
pub const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "=", "<", ">", "!=", "<=", ">=", "&&", "||", "&", "|", "and", "or",
    "xor",
];

// ============================================================================
// CONTEXT
// ============================================================================

/// The recursion target shared by every tail position of one function body.
///
/// Starts as the function's known name (if any); the first tail `recur`
/// in an unnamed function fills it with a fresh recursion name.
pub type RecurSlot = RefCell<Option<String>>;

/// Where the node being compiled sits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context<'a> {
    /// Last expression of the enclosing body.
    pub tail: bool,
    /// Target for tail `recur`, when compiling inside a function body.
    pub recur: Option<&'a RecurSlot>,
    /// The text must begin with `return `.
    pub needs_return: bool,
    /// The node's value is used: argument, operand, assigned value.
    pub expression: bool,
    /// Name the enclosing definition binds, used as the recursion target of
    /// an anonymous function value.
    pub fn_name: Option<&'a str>,
}

impl<'a> Context<'a> {
    pub fn statement() -> Self {
        Self::default()
    }

    pub fn expression() -> Self {
        Self {
            expression: true,
            ..Self::default()
        }
    }

    pub(crate) fn return_prefix(&self) -> &'static str {
        if self.needs_return {
            "return "
        } else {
            ""
        }
    }

    /// Context of a branch body in statement lowering (`cond`, `case`, `try`):
    /// still in tail position, and returning whenever the whole form has to
    /// produce a value.
    pub(crate) fn branch(&self) -> Context<'a> {
        Context {
            tail: true,
            recur: self.recur,
            needs_return: self.needs_return || self.expression,
            expression: false,
            fn_name: self.fn_name,
        }
    }
}

// ============================================================================
// COMPILE STATE
// ============================================================================

/// Everything that persists between top-level forms of one session.
#[derive(Debug, Clone, Default)]
pub struct CompileState {
    pub macros: MacroTable,
    pub recur_counter: usize,
    pub diagnostics: Vec<CompileError>,
    pub last_eval_result: Value,
}

impl CompileState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next `__lisp__recur__$<n>` name.
    pub fn next_recur_name(&mut self) -> String {
        let name = format!("{}{}", RECUR_NAME_PREFIX, self.recur_counter);
        self.recur_counter += RECUR_NAME_STEP;
        log::debug!("allocated recursion name {}", name);
        name
    }
}

// ============================================================================
// GENERATOR
// ============================================================================

/// Compiles the forms of one top-level form against a session's state.
pub struct CodeGenerator<'s> {
    state: &'s mut CompileState,
    config: &'s SessionConfig,
    source: &'s SourceContext,
    span: Span,
    macro_depth: usize,
    depth: usize,
    host: Option<&'s mut (dyn Evaluator + 'static)>,
}

impl<'s> CodeGenerator<'s> {
    pub fn new(
        state: &'s mut CompileState,
        config: &'s SessionConfig,
        source: &'s SourceContext,
        span: Span,
    ) -> Self {
        Self {
            state,
            config,
            source,
            span,
            macro_depth: 0,
            depth: 0,
            host: None,
        }
    }

    /// Lets macro templates the compiler cannot build itself run on `host`.
    pub fn with_host(mut self, host: Option<&'s mut (dyn Evaluator + 'static)>) -> Self {
        self.host = host;
        self
    }

    /// Compiles a top-level form in statement position.
    pub fn compile_top_level(&mut self, form: &Value) -> Result<String, CompileError> {
        self.compile(form, Context::statement())
    }

    /// Records a diagnostic against the current top-level form.
    pub(crate) fn report(&mut self, error: CompileError) {
        let error = error.with_span(self.span).with_source(self.source);
        log::warn!("{}: {}", error.error_code(), error);
        self.state.diagnostics.push(error);
    }

    pub fn compile(&mut self, value: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let limit = self.config.max_nesting_depth;
        if self.depth >= limit {
            return Err(CompileError::new(ErrorKind::NestingTooDeep { limit }));
        }
        self.depth += 1;
        let result = self.compile_node(value, ctx);
        self.depth -= 1;
        result
    }

    fn compile_node(&mut self, value: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        match value {
            Value::Null => Ok(format!("{}null", ctx.return_prefix())),
            Value::Atom(text) => Ok(format!("{}{}", ctx.return_prefix(), atom_text(text))),
            Value::Vector(items) => {
                let items = self.compile_expressions(items.iter())?;
                Ok(format!("{}[{}]", ctx.return_prefix(), items.join(", ")))
            }
            Value::Pair(_) => self.compile_form(value, ctx),
        }
    }

    pub(crate) fn compile_expression(&mut self, value: &Value) -> Result<String, CompileError> {
        self.compile(value, Context::expression())
    }

    pub(crate) fn compile_statement(&mut self, value: &Value) -> Result<String, CompileError> {
        self.compile(value, Context::statement())
    }

    pub(crate) fn compile_expressions<'v>(
        &mut self,
        values: impl Iterator<Item = &'v Value>,
    ) -> Result<Vec<String>, CompileError> {
        values.map(|value| self.compile_expression(value)).collect()
    }

    /// Compiles a sequence of forms; only the last one is in tail position
    /// and only the last one returns.
    pub fn compile_body(
        &mut self,
        body: &Value,
        needs_return: bool,
        recur: Option<&RecurSlot>,
    ) -> Result<String, CompileError> {
        let forms: Vec<&Value> = body.iter().collect();
        let mut out = String::new();
        for (index, form) in forms.iter().enumerate() {
            let last = index + 1 == forms.len();
            let ctx = Context {
                tail: last,
                recur,
                needs_return: needs_return && last,
                expression: false,
                fn_name: None,
            };
            let text = self.compile(form, ctx)?;
            out.push_str(&terminate(&text));
        }
        Ok(out)
    }

    fn compile_form(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let Some(head) = form.head_atom() else {
            return self.compile_call(form, ctx);
        };
        match head {
            "def" | ":=" => self.compile_define(form, "var ", ctx),
            "set!" => self.compile_define(form, "", ctx),
            "const" => self.compile_define(form, "const ", ctx),
            "Array" => self.compile_array(form, ctx),
            "Object" => self.compile_object(form, ctx),
            "quote" | "quasiquote" => self.compile_quote(form, ctx),
            "defn" | "fn" | "??" => self.compile_function(form, "function ", ctx),
            "fn*" | "??*" => self.compile_function(form, "function* ", ctx),
            "=>" => self.compile_function(form, "", ctx),
            "let" => self.compile_let(form, ctx),
            "cond" => self.compile_cond(form.rest().unwrap_or(&Value::Null), ctx),
            "if" => self.compile_if(form, ctx),
            "do" => self.compile_do(form, ctx),
            "apply" => self.compile_apply(form, ctx),
            "new" => self.compile_new(form, ctx),
            op if OPERATORS.contains(&op) => self.compile_operator(op, form, ctx),
            "case" => self.compile_case(form, ctx),
            "not" => self.compile_not(form, ctx),
            "instanceof" | "in" => self.compile_binary_keyword(head, form, ctx),
            "get" => self.compile_get(form, ctx),
            "->" => self.compile_chain(form, ctx),
            "loop" => self.compile_loop(form, ctx),
            "try" => self.compile_try(form, ctx),
            "throw" | "yield" => self.compile_throw(head, form, ctx),
            "class" => self.compile_class(form, ctx),
            "defmacro" => self.compile_defmacro(form),
            "macroexpand" => self.compile_macroexpand(form, ctx),
            "cons" if !self.state.macros.contains(head) => self.compile_cons(form, ctx),
            _ => self.compile_call(form, ctx),
        }
    }
}

/// Trims a snippet and ends it with `;` unless it is empty or already does.
///
/// ```rust
/// use lisp2js::codegen::terminate;
/// assert_eq!(terminate(" var x = 1 "), "var x = 1;");
/// assert_eq!(terminate("f();"), "f();");
/// assert_eq!(terminate("   "), "");
/// ```
pub fn terminate(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{};", trimmed)
    }
}

/// Elements after the head of a form.
pub(crate) fn tail_of(form: &Value) -> &Value {
    form.rest().unwrap_or(&Value::Null)
}


#[cfg(test)]
mod tests {
    use super::test_support::compile;
    use super::*;

    #[test]
    fn atoms_vectors_and_null() {
        assert_eq!(compile("x"), "x;");
        assert_eq!(compile("a-b"), "a_$45_b;");
        assert_eq!(compile("\"hi\""), "\"hi\";");
        assert_eq!(compile("()"), "null;");
        assert_eq!(compile("[1 2 (+ 1 2)]"), "[1, 2, (1 + 2)];");
    }

    #[test]
    fn recursion_names_advance_by_three() {
        let mut state = CompileState::new();
        assert_eq!(state.next_recur_name(), "__lisp__recur__$0");
        assert_eq!(state.next_recur_name(), "__lisp__recur__$3");
        assert_eq!(state.recur_counter, 6);
    }

    #[test]
    fn body_returns_only_its_last_form() {
        let mut state = CompileState::new();
        let config = SessionConfig::default();
        let source = SourceContext::from_file("t", "");
        let mut generator = CodeGenerator::new(&mut state, &config, &source, Span::default());
        let body = Value::list(vec![
            Value::list(vec!["f".into()]),
            Value::atom("x"),
        ]);
        assert_eq!(
            generator.compile_body(&body, true, None).unwrap(),
            "f();return x;"
        );
    }

    #[test]
    fn nesting_past_the_limit_is_an_error() {
        let mut state = CompileState::new();
        let config = SessionConfig {
            max_nesting_depth: 8,
            ..SessionConfig::default()
        };
        let source = SourceContext::from_file("t", "");
        let nest = |levels: usize| {
            (0..levels).fold(Value::atom("1"), |inner, _| Value::list(vec!["f".into(), inner]))
        };
        let mut generator = CodeGenerator::new(&mut state, &config, &source, Span::default());

        let err = generator.compile_top_level(&nest(20)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NestingTooDeep { limit: 8 });
        assert_eq!(generator.compile_top_level(&nest(3)).unwrap(), "f(f(f(1)))");
    }

    #[test]
    fn failures_degrade_to_empty_text() {
        assert_eq!(compile("(def)"), "");
        assert_eq!(compile("(def) (def y 2)"), "var y = 2;");
    }
}
