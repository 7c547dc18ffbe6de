//! Calls: ordinary calls, tail `recur`, `super`, macro invocation, `apply`,
//! and the two macro forms `defmacro` and `macroexpand`.

use super::{tail_of, CodeGenerator, Context};
use crate::ast::Value;
use crate::errors::{CompileError, ErrorKind};
use crate::macros::{evaluate_template, expand_trace, materialize, select_clause, Bindings, MacroDefinition};
use crate::names::{atom_text, is_numeric};

const SUPER_REFERENCE: &str = "this.__super__";

/// Arguments of a `.call(this, ...)`: `params` is a formatted `(...)` list.
fn call_with_this(params: &str) -> String {
    match params.strip_prefix('(') {
        Some(")") | None => ")".to_string(),
        Some(rest) => format!(", {}", rest),
    }
}

impl CodeGenerator<'_> {
    pub(crate) fn compile_call(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let head = form.first().unwrap_or(&Value::Null);
        let args = tail_of(form);
        let ret = ctx.return_prefix();
        let callee = self.compile_expression(head)?;

        if callee == "recur" && ctx.tail {
            if let Some(slot) = ctx.recur {
                let target = slot
                    .borrow_mut()
                    .get_or_insert_with(|| self.state.next_recur_name())
                    .clone();
                return Ok(format!("{}{}{}", ret, target, self.format_params(args)?));
            }
        }

        if callee == "super" {
            let params = self.format_params(args)?;
            return Ok(format!(
                "Object.defineProperty(this, '__super__', {{value: this.__proto__.__proto__}}); {}{}.constructor.call(this{}",
                ret,
                SUPER_REFERENCE,
                call_with_this(&params)
            ));
        }
        if let Some(member) = callee.strip_prefix(SUPER_REFERENCE) {
            if member.starts_with(['.', '[']) {
                let params = self.format_params(args)?;
                return Ok(format!(
                    "{}{}{}.call(this{}",
                    ret,
                    SUPER_REFERENCE,
                    member,
                    call_with_this(&params)
                ));
            }
        }

        if let Some(definition) = self.state.macros.get(&callee).cloned() {
            return self.compile_macro_call(&definition, args, ctx);
        }

        let callee = if callee.ends_with('}') || is_numeric(&callee) {
            format!("({})", callee)
        } else {
            callee
        };
        Ok(format!("{}{}{}", ret, callee, self.format_params(args)?))
    }

    /// Expands a macro call and compiles the expansion in the call's place.
    fn compile_macro_call(
        &mut self,
        definition: &MacroDefinition,
        args: &Value,
        ctx: Context<'_>,
    ) -> Result<String, CompileError> {
        if self.macro_depth >= self.config.max_macro_depth {
            return Err(CompileError::new(ErrorKind::MacroRecursionLimit {
                name: definition.name.clone(),
                limit: self.config.max_macro_depth,
            }));
        }
        let Some((clause, bindings)) = select_clause(definition, args) else {
            self.report(CompileError::new(ErrorKind::NoMatchingClause {
                name: definition.name.clone(),
            }));
            return Ok(String::new());
        };
        let expanded = match evaluate_template(&clause.template, &bindings) {
            Some(tree) => tree,
            None if self.host.is_some() => self.run_template_on_host(&clause.template, &bindings)?,
            None => materialize(&clause.template, &bindings),
        };
        log::debug!("expanded `{}` to {}", definition.name, expanded.pretty());
        self.state.last_eval_result = expanded.clone();

        self.macro_depth += 1;
        let result = self.compile(&expanded, ctx);
        self.macro_depth -= 1;
        result
    }

    /// Runs a code template as `((fn [captures…] template) 'value…)` on the
    /// host and takes the tree it returns as the expansion.
    fn run_template_on_host(&mut self, template: &Value, bindings: &Bindings) -> Result<Value, CompileError> {
        let mut names: Vec<&String> = bindings.keys().collect();
        names.sort();
        let params = names.iter().map(|name| Value::atom(name.as_str())).collect();
        let function = Value::list(vec![Value::atom("fn"), Value::Vector(params), template.clone()]);
        let mut call = vec![function];
        call.extend(
            names
                .iter()
                .map(|name| Value::list(vec![Value::atom("quote"), bindings[*name].clone()])),
        );
        let snippet = self.compile_expression(&Value::list(call))?;

        let Some(host) = self.host.as_deref_mut() else {
            return Ok(materialize(template, bindings));
        };
        log::debug!("evaluating macro template on the host: {}", snippet);
        host.evaluate(&snippet).map_err(|failure| {
            CompileError::new(ErrorKind::EvaluationFailed {
                message: failure.message,
            })
        })
    }

    /// `(cons x (cons y … tail))`, written out along the spine without one
    /// nested call per element.
    pub(crate) fn compile_cons(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let mut heads = Vec::new();
        let mut cursor = form;
        while cursor.head_atom() == Some("cons") && cursor.len() == 3 {
            heads.push(cursor.second().unwrap_or(&Value::Null));
            cursor = cursor.third().unwrap_or(&Value::Null);
        }
        if heads.is_empty() {
            return self.compile_call(form, ctx);
        }

        let mut texts = Vec::with_capacity(heads.len());
        for head in heads {
            let text = self.compile_expression(head)?;
            if text.starts_with(':') {
                // keyword arguments take the ordinary call path
                return self.compile_call(form, ctx);
            }
            texts.push(text);
        }
        let tail = self.compile_expression(cursor)?;
        if tail.starts_with(':') {
            return self.compile_call(form, ctx);
        }

        let mut out = String::from(ctx.return_prefix());
        for text in &texts {
            out.push_str("cons(");
            out.push_str(text);
            out.push_str(", ");
        }
        out.push_str(&tail);
        out.push_str(&")".repeat(texts.len()));
        Ok(out)
    }

    /// `(apply f xs)`: `xs` may be a host array or a runtime list.
    pub(crate) fn compile_apply(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let function = form
            .second()
            .ok_or_else(|| CompileError::malformed("apply", "a function is required"))?;
        let function = self.compile_statement(function)?;
        let args = self.compile_expression(form.third().unwrap_or(&Value::Null))?;
        Ok(format!(
            "{}({}).apply(this, (function(){{var temp = {}; return temp instanceof $List ? temp.toArray() : temp}})())",
            ctx.return_prefix(),
            function,
            args
        ))
    }

    /// `(defmacro name pattern template ...)` records the macro and emits nothing.
    pub(crate) fn compile_defmacro(&mut self, form: &Value) -> Result<String, CompileError> {
        let name = match form.second() {
            Some(Value::Atom(name)) => atom_text(name).into_owned(),
            other => {
                return Err(CompileError::new(ErrorKind::InvalidMacroDefinition {
                    name: other.map(Value::pretty).unwrap_or_default(),
                    reason: "the macro name must be a symbol".to_string(),
                }))
            }
        };
        let clauses = form.skip(2).unwrap_or(&Value::Null);
        let definition = MacroDefinition::from_clauses(&name, clauses)?;
        self.state.macros.define(definition);
        Ok(String::new())
    }

    /// `(macroexpand '(m args) n?)`: the expansion of a macro call as a
    /// quoted literal, after `n` rewrites or until the head is no longer a
    /// macro.
    pub(crate) fn compile_macroexpand(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let target = form
            .second()
            .ok_or_else(|| CompileError::malformed("macroexpand", "a form to expand is required"))?;
        let datum = match target.head_atom() {
            Some("quote") | Some("quasiquote") => target.second().cloned().unwrap_or_default(),
            _ => target.clone(),
        };
        let limit = match form.third() {
            None => None,
            Some(Value::Atom(text)) if is_numeric(text) => {
                text.trim().parse::<i64>().ok().filter(|n| *n > 0).map(|n| n as usize)
            }
            Some(other) => {
                return Err(CompileError::malformed(
                    "macroexpand",
                    format!("expansion limit `{}` is not a number", other.pretty()),
                ))
            }
        };

        let is_macro_call = datum
            .head_atom()
            .is_some_and(|head| self.state.macros.contains(&atom_text(head)));
        if !is_macro_call {
            self.report(CompileError::new(ErrorKind::NotAMacro {
                form: datum.pretty(),
            }));
            return Ok(String::new());
        }

        let steps = match expand_trace(&self.state.macros, &datum, limit, self.config.max_macro_depth) {
            Ok(steps) => steps,
            Err(error) if matches!(error.kind, ErrorKind::NoMatchingClause { .. }) => {
                self.report(error);
                return Ok(String::new());
            }
            Err(error) => return Err(error),
        };
        let expanded = steps.last().map(|step| step.output.clone()).unwrap_or(datum);
        self.state.last_eval_result = expanded.clone();

        let quoted = Value::list(vec![Value::atom("quote"), expanded]);
        let ctx = Context {
            needs_return: ctx.needs_return,
            expression: ctx.expression,
            ..Context::default()
        };
        self.compile(&quoted, ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Value;
    use crate::codegen::test_support::{compile, compile_with};
    use crate::codegen::CompileState;
    use crate::errors::ErrorKind;

    #[test]
    fn ordinary_calls() {
        assert_eq!(compile("(add 3 4)"), "add(3, 4);");
        assert_eq!(compile("(x.next)"), "x.next();");
        assert_eq!(compile("((fn [x] x) 1)"), "(function (x){return x;})(1);");
        assert_eq!(compile("(def x (test))"), "var x = test();");
    }

    #[test]
    fn recur_outside_a_function_is_a_plain_call() {
        assert_eq!(compile("(recur 1)"), "recur(1);");
    }

    #[test]
    fn recur_outside_tail_position_is_a_plain_call() {
        assert_eq!(compile("(fn [n] (* n (recur n)))"), "function (n){return (n * recur(n));};");
    }

    #[test]
    fn super_constructor_without_arguments() {
        assert_eq!(
            compile("(super)"),
            "Object.defineProperty(this, '__super__', {value: this.__proto__.__proto__}); this.__super__.constructor.call(this);"
        );
    }

    #[test]
    fn apply_spreads_lists_and_arrays() {
        assert_eq!(
            compile("(apply f xs)"),
            "(f).apply(this, (function(){var temp = xs; return temp instanceof $List ? temp.toArray() : temp})());"
        );
    }

    #[test]
    fn macros_expand_at_call_sites() {
        let mut state = CompileState::new();
        assert_eq!(compile_with(&mut state, "(defmacro square [x] `(* ~x ~x))"), "");
        assert_eq!(compile_with(&mut state, "(square 12)"), "(12 * 12);");
        assert_eq!(
            state.last_eval_result.pretty(),
            "(* 12 12)"
        );
        assert_eq!(
            compile_with(&mut state, "(fn [y] (square y))"),
            "function (y){return (y * y);};"
        );
    }

    #[test]
    fn code_templates_build_the_tree_they_denote() {
        let mut state = CompileState::new();
        compile_with(&mut state, "(defmacro m [x] (list '+ x 1)) (defmacro c [x] (cons 'f x))");
        assert_eq!(compile_with(&mut state, "(m 12)"), "(12 + 1);");
        assert_eq!(compile_with(&mut state, "(c (1 2))"), "f(1, 2);");
        assert_eq!(state.last_eval_result.pretty(), "(f 1 2)");
    }

    #[test]
    fn unknown_calls_in_templates_are_substituted_without_a_host() {
        let mut state = CompileState::new();
        compile_with(&mut state, "(defmacro m [x] (wrap x))");
        assert_eq!(compile_with(&mut state, "(m 5)"), "wrap(5);");
    }

    #[test]
    fn cons_chains_compile_like_nested_calls() {
        assert_eq!(compile("(cons 1 (cons 2 xs))"), "cons(1, cons(2, xs));");
        assert_eq!(compile("(def p (cons a b))"), "var p = cons(a, b);");
        assert_eq!(compile("(cons :k 1)"), "cons({k: 1});");
        assert_eq!(compile("(cons 1)"), "cons(1);");
    }

    #[test]
    fn cons_macros_take_precedence() {
        let mut state = CompileState::new();
        compile_with(&mut state, "(defmacro cons [a b] `(pair ~a ~b))");
        assert_eq!(compile_with(&mut state, "(cons 1 2)"), "pair(1, 2);");
    }

    #[test]
    fn macro_clauses_are_tried_in_order() {
        let mut state = CompileState::new();
        compile_with(&mut state, "(defmacro sq [x] `(* ~x ~x) [x y] `(- ~x ~y))");
        assert_eq!(compile_with(&mut state, "(sq 3 4)"), "(3 - 4);");
        assert_eq!(compile_with(&mut state, "(sq 3)"), "(3 * 3);");
    }

    #[test]
    fn unmatched_macro_call_only_empties_the_call_site() {
        let mut state = CompileState::new();
        compile_with(&mut state, "(defmacro one [x] x)");
        assert_eq!(compile_with(&mut state, "(def y (one 1 2))"), "var y =;");
        assert!(matches!(
            state.diagnostics[0].kind,
            ErrorKind::NoMatchingClause { .. }
        ));
    }

    #[test]
    fn runaway_expansion_is_bounded() {
        let mut state = CompileState::new();
        compile_with(&mut state, "(defmacro forever [x] `(forever ~x))");
        assert_eq!(compile_with(&mut state, "(forever 1)"), "");
    }

    #[test]
    fn macroexpand_quotes_the_expansion() {
        let mut state = CompileState::new();
        compile_with(
            &mut state,
            "(defmacro inc [x] `(+ ~x 1)) (defmacro twice [x] `(inc (inc ~x)))",
        );
        assert_eq!(
            compile_with(&mut state, "(macroexpand '(twice 2))"),
            "cons(\"+\", cons(cons(\"inc\", cons(2, null)), cons(1, null)));"
        );
        assert_eq!(
            compile_with(&mut state, "(macroexpand '(inc 2) 1)"),
            "cons(\"+\", cons(2, cons(1, null)));"
        );
        assert_eq!(
            state.last_eval_result,
            Value::list(vec!["+".into(), "2".into(), "1".into()])
        );
    }

    #[test]
    fn macroexpand_of_a_non_macro_is_reported() {
        let mut state = CompileState::new();
        assert_eq!(compile_with(&mut state, "(macroexpand '(f 1))"), "");
        assert!(matches!(state.diagnostics[0].kind, ErrorKind::NotAMacro { .. }));
    }

    #[test]
    fn invalid_macro_definitions_fail_the_form() {
        let mut state = CompileState::new();
        assert_eq!(compile_with(&mut state, "(defmacro (m) [x] x)"), "");
        assert_eq!(compile_with(&mut state, "(defmacro m [x])"), "");
        assert!(state.macros.is_empty());
    }
}
