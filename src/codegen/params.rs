//! Argument lists at call sites and parameter lists of function literals.

use super::CodeGenerator;
use crate::ast::Value;
use crate::errors::{CompileError, ErrorKind};

/// A function's parameter vector, lowered.
///
/// `signature` goes between the parentheses; `prologue` opens the body and
/// binds rest, default and keyword parameters.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ParamList {
    pub signature: String,
    pub prologue: String,
}

enum Binding {
    Default { name: String, value: String },
    Keywords,
}

struct Rest {
    name: String,
    as_list: bool,
}

fn is_rest_marker(value: Option<&Value>) -> bool {
    value.is_some_and(|value| value.is_atom("&") || value.is_atom("."))
}

fn missing_keyword_value(keyword: &str) -> CompileError {
    CompileError::new(ErrorKind::InvalidKeywordArguments {
        keyword: keyword.to_string(),
    })
}

impl CodeGenerator<'_> {
    /// `(a, b, {k: v, k2: v2}, c)` from call arguments. A run of `:key value`
    /// arguments becomes one object literal.
    pub(crate) fn format_params(&mut self, args: &Value) -> Result<String, CompileError> {
        let items = args.to_vec();
        let mut out = String::new();
        let mut opened = false;
        let mut i = 0;
        while i < items.len() {
            let text = self.compile_expression(&items[i])?;
            if opened {
                out.push_str(", ");
            } else {
                out.push('(');
                opened = true;
            }
            let Some(key) = text.strip_prefix(':') else {
                out.push_str(&text);
                i += 1;
                continue;
            };
            let value = items.get(i + 1).ok_or_else(|| missing_keyword_value(&text))?;
            let value = self.compile_expression(value)?;
            out.push_str(&format!("{{{}: {}", key, value));
            i += 2;

            loop {
                let Some(next) = items.get(i) else {
                    out.push('}');
                    break;
                };
                let name = self.compile_expression(next)?;
                match name.strip_prefix(':') {
                    Some(key) => {
                        let value = items.get(i + 1).ok_or_else(|| missing_keyword_value(&name))?;
                        let value = self.compile_expression(value)?;
                        out.push_str(&format!(", {}: {}", key, value));
                        i += 2;
                    }
                    None => {
                        out.push_str("}, ");
                        out.push_str(&name);
                        i += 1;
                        break;
                    }
                }
            }
        }
        if opened {
            out.push(')');
        }
        if out.trim().is_empty() {
            return Ok("()".to_string());
        }
        Ok(out)
    }

    /// Lowers a parameter vector such as `[a :b 1 {:k 2} & more]`.
    pub(crate) fn compile_param_list(&mut self, params: &[Value]) -> Result<ParamList, CompileError> {
        let mut signature = String::new();
        let mut bindings: Vec<Binding> = Vec::new();
        // Every keyword object in one parameter list reads from the same table.
        let mut keywords: Vec<(String, String)> = Vec::new();
        let mut rest: Option<Rest> = None;
        let mut count = 0usize;

        let mut i = 0;
        while i < params.len() {
            let param = &params[i];
            if !matches!(param, Value::Atom(_)) {
                if param.head_atom() != Some("Object") {
                    return Err(CompileError::invalid_parameters(format!(
                        "`{}` is neither a name nor a keyword object",
                        param.pretty()
                    )));
                }
                count += 1;
                self.collect_keywords(param, &mut keywords)?;
                signature.push_str("__lisp_args__");
                bindings.push(Binding::Keywords);
            } else {
                let text = self.compile_statement(param)?;
                if text == "&" || text == "." {
                    count += 1;
                    let name = params.get(i + 1).ok_or_else(|| {
                        CompileError::invalid_parameters(format!("`{}` must be followed by a name", text))
                    })?;
                    rest = Some(Rest {
                        name: self.compile_statement(name)?,
                        as_list: text == ".",
                    });
                    break;
                }
                count += 1;
                if let Some(name) = text.strip_prefix(':') {
                    let value = match params.get(i + 1) {
                        Some(value) => self.compile_expression(value)?,
                        None => "undefined".to_string(),
                    };
                    signature.push_str(name);
                    bindings.push(Binding::Default {
                        name: name.to_string(),
                        value,
                    });
                    i += 1;
                } else {
                    signature.push_str(&text);
                }
            }
            if i + 1 < params.len() && !is_rest_marker(params.get(i + 1)) {
                signature.push_str(", ");
            }
            i += 1;
        }

        let mut prologue = String::new();
        if let Some(rest) = rest {
            let offset = count - 1;
            prologue.push_str(&format!(
                "for(var {name} = [], $__0 = {offset}; $__0 < arguments.length; $__0++){name}[$__0 - {offset}] = arguments[$__0];",
                name = rest.name,
                offset = offset
            ));
            if rest.as_list {
                prologue.push_str(&format!("{0} = list.apply(null, {0});", rest.name));
            }
        }
        for binding in &bindings {
            match binding {
                Binding::Default { name, value } => {
                    prologue.push_str(&format!("{0} = ({0} === void 0 ? {1} : {0} );", name, value));
                }
                Binding::Keywords => {
                    prologue.push_str("var __lisp_args_v__;");
                    prologue.push_str("__lisp_args__ = (__lisp_args__ === void 0 ? {} : __lisp_args__); ");
                    for (key, value) in &keywords {
                        prologue.push_str(&format!(
                            "var {0} = ((__lisp_args_v__ = __lisp_args__.{0}) === void 0 ? {1} : __lisp_args_v__); ",
                            key, value
                        ));
                    }
                }
            }
        }

        Ok(ParamList {
            signature,
            prologue,
        })
    }

    fn collect_keywords(
        &mut self,
        object: &Value,
        keywords: &mut Vec<(String, String)>,
    ) -> Result<(), CompileError> {
        let entries = object.rest().map(Value::to_vec).unwrap_or_default();
        for pair in entries.chunks(2) {
            let key = self.compile_statement(&pair[0])?;
            let key = key
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(key.as_str());
            let key = key.strip_prefix(':').unwrap_or(key).to_string();
            let value = pair
                .get(1)
                .ok_or_else(|| missing_keyword_value(&key))?;
            let value = self.compile_expression(value)?;
            match keywords.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => keywords.push((key, value)),
            }
        }
        Ok(())
    }
}
