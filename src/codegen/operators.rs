//! Infix operators, `not`, `instanceof` and `in`.

use super::{tail_of, CodeGenerator, Context};
use crate::ast::Value;
use crate::errors::CompileError;

/// Host spelling of an operator head.
fn host_operator(op: &str) -> &str {
    match op {
        "=" => "===",
        "and" => "&&",
        "or" => "||",
        "xor" => "^",
        other => other,
    }
}

/// Comparisons chain pairwise: `(< a b c)` is `(a < b && b < c)`.
fn is_comparison(op: &str) -> bool {
    matches!(op, "===" | "<" | ">" | "!=" | "<=" | ">=")
}

impl CodeGenerator<'_> {
    pub(crate) fn compile_operator(
        &mut self,
        op: &str,
        form: &Value,
        ctx: Context<'_>,
    ) -> Result<String, CompileError> {
        let operands = self.compile_expressions(tail_of(form).iter())?;
        let ret = ctx.return_prefix();
        let Some((first, rest)) = operands.split_first() else {
            return Err(CompileError::malformed(op, "at least one operand is required"));
        };

        if rest.is_empty() {
            return Ok(match op {
                "+" | "*" | "%" => format!("{}{}", ret, first),
                "-" => format!("{}(-{})", ret, first),
                "/" => format!("{}(1/{})", ret, first),
                _ => format!("{}true", ret),
            });
        }

        let op = host_operator(op);
        let mut out = format!("({}", first);
        for (index, operand) in rest.iter().enumerate() {
            out.push_str(&format!(" {} {}", op, operand));
            if is_comparison(op) && index + 1 < rest.len() {
                out.push_str(&format!(" && {}", operand));
            }
        }
        out.push(')');
        Ok(format!("{}{}", ret, out))
    }

    /// `(not x)`
    pub(crate) fn compile_not(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let operand = self.compile_expression(form.second().unwrap_or(&Value::Null))?;
        Ok(format!("{}(!{})", ctx.return_prefix(), operand))
    }

    /// `(instanceof x Type)` and `(in key object)`.
    pub(crate) fn compile_binary_keyword(
        &mut self,
        keyword: &str,
        form: &Value,
        ctx: Context<'_>,
    ) -> Result<String, CompileError> {
        let (Some(left), Some(right)) = (form.second(), form.third()) else {
            return Err(CompileError::malformed(keyword, "two operands are required"));
        };
        let left = self.compile_expression(left)?;
        let right = self.compile_expression(right)?;
        Ok(format!("{}({} {} {})", ctx.return_prefix(), left, keyword, right))
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::test_support::compile;

    #[test]
    fn arithmetic_and_logic() {
        assert_eq!(compile("(= 1 1)"), "(1 === 1);");
        assert_eq!(compile("(+ 1 2 3)"), "(1 + 2 + 3);");
        assert_eq!(compile("(- 1 2 3)"), "(1 - 2 - 3);");
        assert_eq!(compile("(/ 1 2 3)"), "(1 / 2 / 3);");
        assert_eq!(compile("(* (+ 1 2) (- 3 4))"), "((1 + 2) * (3 - 4));");
        assert_eq!(compile("(&& true false)"), "(true && false);");
        assert_eq!(compile("(|| 1 2)"), "(1 || 2);");
        assert_eq!(compile("(| 1 0x12)"), "(1 | 0x12);");
        assert_eq!(compile("(and true false)"), "(true && false);");
        assert_eq!(compile("(or true false)"), "(true || false);");
        assert_eq!(compile("(xor 1 2)"), "(1 ^ 2);");
    }

    #[test]
    fn comparisons_chain() {
        assert_eq!(compile("(> 1 2 3 4)"), "(1 > 2 && 2 > 3 && 3 > 4);");
        assert_eq!(compile("(<= 1 2 3 4)"), "(1 <= 2 && 2 <= 3 && 3 <= 4);");
        assert_eq!(compile("(= a b c)"), "(a === b && b === c);");
    }

    #[test]
    fn single_operand_forms() {
        assert_eq!(compile("(+ x)"), "x;");
        assert_eq!(compile("(- x)"), "(-x);");
        assert_eq!(compile("(/ x)"), "(1/x);");
        assert_eq!(compile("(< x)"), "true;");
        assert_eq!(compile("(+)"), "");
    }

    #[test]
    fn not_instanceof_and_in() {
        assert_eq!(compile("(not true)"), "(!true);");
        assert_eq!(compile("(instanceof [1 2 3] Array)"), "([1, 2, 3] instanceof Array);");
        assert_eq!(compile("(in 'a {'a 12})"), "(\"a\" in {\"a\": 12});");
    }
}
