//! Control flow: `cond`, `if`, `do`, `case`, `try`, `throw` and `yield`.
//!
//! In statement position these lower to host statements. Where a value is
//! needed they are wrapped in an immediately-invoked function whose
//! branches return.

use super::{tail_of, CodeGenerator, Context};
use crate::ast::Value;
use crate::errors::CompileError;

fn wrap_in_function(body: String) -> String {
    format!("(function(){{{}}})()", body)
}

impl CodeGenerator<'_> {
    fn compile_branch(&mut self, body: Option<&Value>, ctx: Context<'_>) -> Result<String, CompileError> {
        self.compile(body.unwrap_or(&Value::Null), ctx.branch())
    }

    /// `(cond test1 body1 test2 body2 ... else body)`; `clauses` is the list
    /// after the head.
    pub(crate) fn compile_cond(&mut self, clauses: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let clauses = clauses.to_vec();
        let Some(first_test) = clauses.first() else {
            return Err(CompileError::malformed("cond", "at least one clause is required"));
        };

        let mut out = format!("if({}){{", self.compile_expression(first_test)?);
        out.push_str(&self.compile_branch(clauses.get(1), ctx)?);
        out.push('}');

        let mut has_else = false;
        let mut i = 2;
        while i < clauses.len() {
            out.push_str(" else ");
            if clauses[i].is_atom("else") {
                has_else = true;
                out.push('{');
                out.push_str(&self.compile_branch(clauses.get(i + 1), ctx)?);
                out.push('}');
                break;
            }
            out.push_str(&format!("if ({}){{", self.compile_expression(&clauses[i])?));
            out.push_str(&self.compile_branch(clauses.get(i + 1), ctx)?);
            out.push('}');
            i += 2;
        }
        if !has_else && ctx.needs_return {
            out.push_str(" else return null");
        }

        if ctx.expression {
            return Ok(wrap_in_function(out));
        }
        Ok(out)
    }

    /// `(if test then else?)`: a conditional expression where a value is
    /// needed, otherwise a `cond`.
    pub(crate) fn compile_if(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let null = Value::Null;
        let test = form.second().unwrap_or(&null);
        let then = form.third().unwrap_or(&null);
        let otherwise = form.nth(3);

        if ctx.expression {
            let branch_ctx = Context {
                tail: ctx.tail,
                recur: ctx.recur,
                expression: true,
                ..Context::default()
            };
            let test = self.compile_expression(test)?;
            let then = self.compile(then, branch_ctx)?;
            let otherwise = self.compile(otherwise.unwrap_or(&null), branch_ctx)?;
            return Ok(format!("({} ? {} : {})", test, then, otherwise));
        }

        let mut clauses = vec![test.clone(), then.clone()];
        if let Some(otherwise) = otherwise {
            clauses.push(Value::atom("else"));
            clauses.push(otherwise.clone());
        }
        self.compile_cond(&Value::list(clauses), ctx)
    }

    /// `(do forms...)`
    pub(crate) fn compile_do(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let body = tail_of(form);
        if ctx.expression {
            let body = self.compile_body(body, true, None)?;
            return Ok(format!("(function (){{{}}})()", body));
        }
        self.compile_body(body, ctx.needs_return, ctx.recur)
    }

    /// `(case subject value1 body1 ... else body)` as a `switch`.
    pub(crate) fn compile_case(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let subject = form
            .second()
            .ok_or_else(|| CompileError::malformed("case", "a subject is required"))?;
        let subject = self.compile_expression(subject)?;
        let clauses = form.skip(2).map(Value::to_vec).unwrap_or_default();
        let breaks = !(ctx.needs_return || ctx.expression);

        let mut out = format!("switch ({}){{", subject);
        let mut has_default = false;
        let mut i = 0;
        while i < clauses.len() {
            if clauses[i].is_atom("else") {
                has_default = true;
                out.push_str(" default: ");
            } else {
                out.push_str(&format!(" case {}:", self.compile_expression(&clauses[i])?));
            }
            out.push_str(&self.compile_branch(clauses.get(i + 1), ctx)?);
            if !out.ends_with(';') {
                out.push(';');
            }
            if breaks {
                out.push_str(" break;");
            }
            if has_default {
                break;
            }
            i += 2;
        }
        if !has_default && ctx.needs_return {
            out.push_str(" default: return null;");
        }
        out.push('}');

        if ctx.expression {
            return Ok(wrap_in_function(out));
        }
        Ok(out)
    }

    /// `(try body catch e handler finally cleanup)`; both trailing parts are
    /// optional.
    pub(crate) fn compile_try(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let mut out = String::from("try{");
        out.push_str(&self.compile_branch(form.second(), ctx)?);
        out.push('}');

        let mut rest = form.skip(2).unwrap_or(&Value::Null);
        if rest.first().is_some_and(|head| head.is_atom("catch")) {
            let error = rest
                .second()
                .ok_or_else(|| CompileError::malformed("try", "`catch` needs an error name"))?;
            out.push_str(&format!("catch({}){{", self.compile_statement(error)?));
            out.push_str(&self.compile_branch(rest.third(), ctx)?);
            out.push('}');
            rest = rest.skip(3).unwrap_or(&Value::Null);
        }
        if rest.first().is_some_and(|head| head.is_atom("finally")) {
            out.push_str("finally {");
            out.push_str(&self.compile_branch(rest.second(), ctx)?);
            out.push('}');
        }
        Ok(out)
    }

    /// `(throw e)` and `(yield e)`. In return position the statement is
    /// followed by a bare `return;`.
    pub(crate) fn compile_throw(
        &mut self,
        keyword: &str,
        form: &Value,
        ctx: Context<'_>,
    ) -> Result<String, CompileError> {
        let value = self.compile_expression(form.second().unwrap_or(&Value::Null))?;
        let mut out = format!("{} {}", keyword, value);
        if ctx.needs_return {
            out.push_str("; return;");
        }
        Ok(out)
    }
}
