//! Definitions, function literals, `let` and `loop`.

use super::{tail_of, CodeGenerator, Context, RecurSlot};
use crate::ast::Value;
use crate::errors::CompileError;
use crate::names::atom_text;
use std::cell::RefCell;

/// Binding names and values of a `let`/`loop` binding vector.
///
/// An atom in binding position is read one character per name, each bound
/// to nothing; a list binds nothing.
fn binding_pairs(bindings: Option<&Value>) -> Vec<(Value, Option<Value>)> {
    let items: Vec<Value> = match bindings {
        Some(Value::Vector(items)) => items.clone(),
        Some(Value::Atom(text)) => text.chars().map(|c| Value::atom(c.to_string())).collect(),
        _ => Vec::new(),
    };
    items
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair.get(1).cloned()))
        .collect()
}

impl CodeGenerator<'_> {
    /// `(def name value)`, `(def name [params] body...)` and the `:=`,
    /// `set!`, `const` spellings.
    pub(crate) fn compile_define(
        &mut self,
        form: &Value,
        prefix: &str,
        ctx: Context<'_>,
    ) -> Result<String, CompileError> {
        let head = form.head_atom().unwrap_or("def");
        let name = form
            .second()
            .ok_or_else(|| CompileError::malformed(head, "a name is required"))?;
        let value = if form.len() >= 4 {
            Value::cons(Value::atom("fn"), form.skip(2).cloned().unwrap_or_default())
        } else {
            form.third().cloned().unwrap_or_default()
        };

        let name = self.compile_statement(name)?;
        let value_ctx = Context {
            fn_name: Some(&name),
            ..Context::expression()
        };
        let value = self.compile(&value, value_ctx)?;
        let mut out = format!("{}{} = {} ", prefix, name, value);
        if ctx.needs_return {
            out.push_str(&format!("; return {}", name));
        }
        Ok(out)
    }

    /// `(fn name? [params] body...)` under any of its keywords.
    pub(crate) fn compile_function(
        &mut self,
        form: &Value,
        keyword: &str,
        ctx: Context<'_>,
    ) -> Result<String, CompileError> {
        let mut rest = tail_of(form);
        let own_name = match rest.first() {
            Some(Value::Atom(name)) => {
                let name = atom_text(name).into_owned();
                rest = tail_of(rest);
                Some(name)
            }
            _ => None,
        };
        let params = match rest.first() {
            Some(Value::Vector(items)) => items.clone(),
            Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(CompileError::invalid_parameters(format!(
                    "expected a parameter vector, found `{}`",
                    other.pretty()
                )))
            }
            None => return Err(CompileError::invalid_parameters("missing parameter vector")),
        };
        let body = tail_of(rest);

        let fn_name: Option<String> = own_name.clone().or_else(|| ctx.fn_name.map(str::to_string));
        let params = self.compile_param_list(&params)?;
        let slot: RecurSlot = RefCell::new(fn_name.clone());
        let body = self.compile_body(body, true, Some(&slot))?;

        let recursion_name = slot
            .into_inner()
            .filter(|target| Some(target) != fn_name.as_ref())
            .unwrap_or_default();
        let arrow = if keyword.is_empty() { "=>" } else { "" };
        Ok(format!(
            "{ret}{keyword}{recursion_name}{own}({signature}){arrow}{{{prologue}{body}}}",
            ret = ctx.return_prefix(),
            keyword = keyword,
            recursion_name = recursion_name,
            own = own_name.unwrap_or_default(),
            signature = params.signature,
            arrow = arrow,
            prologue = params.prologue,
            body = body,
        ))
    }

    /// `(let [x 1 y 2] body...)` as an immediately-invoked function.
    pub(crate) fn compile_let(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let mut out = String::from("((function(){");
        let mut declared: Vec<String> = Vec::new();
        for (name, value) in binding_pairs(form.second()) {
            let name = self.compile_statement(&name)?;
            let value = match value {
                Some(value) => self.compile_expression(&value)?,
                None => "undefined".to_string(),
            };
            if declared.contains(&name) {
                out.push_str(&format!("{} = {};", name, value));
            } else {
                out.push_str(&format!("var {} = {};", name, value));
                declared.push(name);
            }
        }
        let body = form.skip(2).unwrap_or(&Value::Null);
        out.push_str(&self.compile_body(body, true, None)?);
        out.push_str("})())");
        Ok(format!("{}{}", ctx.return_prefix(), out))
    }

    /// `(loop [i 0 acc 1] body...)` is `((fn [i acc] body...) 0 1)`, so a
    /// tail `recur` in the body re-enters the loop.
    pub(crate) fn compile_loop(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let mut names = Vec::new();
        let mut args = Vec::new();
        for (name, value) in binding_pairs(form.second()) {
            names.push(name);
            args.push(value.unwrap_or_else(|| Value::atom("undefined")));
        }
        let body = form.skip(2).cloned().unwrap_or_default();
        let function = Value::cons(
            Value::atom("fn"),
            Value::cons(Value::Vector(names), body),
        );
        let call = Value::cons(function, Value::list(args));
        self.compile(&call, ctx)
    }
}
