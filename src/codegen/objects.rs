//! Literals and object access: arrays, object literals, quoting, property
//! access, method chains, `new` and `class`.

use super::{tail_of, CodeGenerator, Context};
use crate::ast::Value;
use crate::errors::{CompileError, ErrorKind};
use crate::names::{atom_text, format_key, format_key_for_object, is_numeric};
use crate::quote::{quasiquote_datum, quote_datum};

fn is_keyword_atom(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_atom)
        .is_some_and(|text| text.starts_with(':'))
}

/// Key text of an object literal or class body entry, ready to be followed
/// by `: value`.
fn literal_key(key: &str) -> String {
    if let Some(name) = key.strip_prefix(':') {
        format_key(name)
    } else if key.starts_with(['\'', '"']) {
        key.to_string()
    } else {
        format!("[{}]", key)
    }
}

impl CodeGenerator<'_> {
    /// `(Array a b)`, also what `[a b]` reads as outside a vector position.
    pub(crate) fn compile_array(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let items = self.compile_expressions(tail_of(form).iter())?;
        Ok(format!("{}[{}]", ctx.return_prefix(), items.join(", ")))
    }

    /// `{:a 1 "b" 2 c 3 :d}` → `{a: 1, "b": 2, [c]: 3, d}`
    pub(crate) fn compile_object(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let entries = tail_of(form).to_vec();
        let mut out = format!("{}{{", ctx.return_prefix());
        let mut i = 0;
        while i < entries.len() {
            let key = self.compile_expression(&entries[i])?;
            let next = entries.get(i + 1);
            if let Some(name) = key.strip_prefix(':') {
                if next.is_none() || is_keyword_atom(next) {
                    out.push_str(name);
                    if next.is_some() {
                        out.push_str(", ");
                    }
                    i += 1;
                    continue;
                }
            }
            let value = next.ok_or_else(|| {
                CompileError::malformed("Object", format!("key `{}` has no value", key))
            })?;
            let value = self.compile_expression(value)?;
            out.push_str(&literal_key(&key));
            out.push_str(": ");
            out.push_str(&value);
            if i + 2 < entries.len() {
                out.push_str(", ");
            }
            i += 2;
        }
        out.push('}');
        Ok(out)
    }

    /// `'datum` and `` `datum ``
    pub(crate) fn compile_quote(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let ret = ctx.return_prefix();
        let datum = form.second().unwrap_or(&Value::Null);
        match datum {
            Value::Null => Ok(format!("{}null", ret)),
            Value::Atom(text) if is_numeric(text) || text.starts_with('"') => {
                Ok(format!("{}{}", ret, text))
            }
            Value::Atom(text) => Ok(format!("{}\"{}\"", ret, text)),
            _ => {
                let construction = if form.head_atom() == Some("quasiquote") {
                    quasiquote_datum(datum)
                } else {
                    quote_datum(datum)
                };
                let ctx = Context {
                    needs_return: ctx.needs_return,
                    expression: ctx.expression,
                    ..Context::default()
                };
                self.compile(&construction, ctx)
            }
        }
    }

    /// Receiver of `get` and `->`; `super` means the prototype back-reference
    /// installed by a class constructor.
    fn compile_receiver(&mut self, receiver: Option<&Value>, form: &str) -> Result<String, CompileError> {
        let receiver =
            receiver.ok_or_else(|| CompileError::malformed(form, "a receiver is required"))?;
        let text = self.compile_expression(receiver)?;
        Ok(if text == "super" {
            "this.__super__".to_string()
        } else {
            text
        })
    }

    /// `(get obj k1 k2)` → `obj.k1[k2]`
    pub(crate) fn compile_get(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let mut out = self.compile_receiver(form.second(), "get")?;
        for key in form.skip(2).unwrap_or(&Value::Null).iter() {
            let key = self.compile_expression(key)?;
            out.push_str(&format_key_for_object(&key));
        }
        Ok(format!("{}{}", ctx.return_prefix(), out))
    }

    /// `(-> obj .prop (.method args) ...)`
    pub(crate) fn compile_chain(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let mut out = self.compile_receiver(form.second(), "->")?;
        for step in form.skip(2).unwrap_or(&Value::Null).iter() {
            match step {
                Value::Pair(pair) => {
                    let key = self.compile_expression(&pair.first)?;
                    out.push_str(&format_key_for_object(&key));
                    out.push_str(&self.format_params(&pair.rest)?);
                }
                other => {
                    let key = self.compile_expression(other)?;
                    out.push_str(&format_key_for_object(&key));
                }
            }
        }
        Ok(format!("{}{}", ctx.return_prefix(), out))
    }

    /// `(new Type args...)`
    pub(crate) fn compile_new(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let constructor = form
            .second()
            .ok_or_else(|| CompileError::malformed("new", "a constructor is required"))?;
        let constructor = self.compile_statement(constructor)?;
        let args = self.format_params(form.skip(2).unwrap_or(&Value::Null))?;
        Ok(format!("{}(new {}{})", ctx.return_prefix(), constructor, args))
    }

    /// `(class Name extends Super :constructor (fn ...) :method (fn ...))`
    ///
    /// Lowers to a constructor function bound to `Name` and a prototype
    /// object literal. A class without a `:constructor` gets an empty one.
    pub(crate) fn compile_class(&mut self, form: &Value, ctx: Context<'_>) -> Result<String, CompileError> {
        let name = form
            .second()
            .and_then(Value::as_atom)
            .ok_or_else(|| CompileError::malformed("class", "a class name is required"))?;
        let name = atom_text(name).into_owned();
        let mut prototype = format!("{0}.prototype = {{constructor: {0}", name);

        let mut body_start = 2;
        if form.third().is_some_and(|word| word.is_atom("extends")) {
            let parent = form.nth(3).ok_or_else(|| {
                CompileError::malformed("class", "`extends` needs a parent class")
            })?;
            prototype.push_str(&format!(", __proto__: {}.prototype", self.compile_statement(parent)?));
            body_start = 4;
        }

        let entries = form.skip(body_start).map(Value::to_vec).unwrap_or_default();
        let mut constructor: Option<Value> = None;
        for entry in entries.chunks(2) {
            let key = self.compile_expression(&entry[0])?;
            let value = entry.get(1).ok_or_else(|| {
                CompileError::malformed("class", format!("member `{}` has no value", key))
            })?;
            let key = literal_key(&key);
            if key == "constructor" {
                if constructor.is_some() {
                    self.report(CompileError::new(ErrorKind::DuplicateConstructor {
                        class: name.clone(),
                    }));
                    return Ok(String::new());
                }
                constructor = Some(value.clone());
                continue;
            }
            let value = self.compile_expression(value)?;
            prototype.push_str(&format!(", {}: {}", key, value));
        }
        prototype.push_str("};");

        let constructor = constructor.unwrap_or_else(|| {
            Value::list(vec![Value::atom("fn"), Value::Vector(Vec::new())])
        });
        let definition = Value::list(vec![Value::atom("def"), Value::atom(name.clone()), constructor]);
        let out = format!("{};{}", self.compile_statement(&definition)?, prototype);

        if ctx.needs_return {
            return Ok(format!("{}; return {};", out, name));
        }
        if ctx.expression {
            return Ok(format!("(function(){{{} return {};}}())", out, name));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::test_support::{compile, compile_with};
    use crate::codegen::CompileState;
    use crate::errors::ErrorKind;

    #[test]
    fn arrays_and_objects() {
        assert_eq!(compile("(Array 1 2)"), "[1, 2];");
        assert_eq!(compile("{:a 1 :b 2}"), "{a: 1, b: 2};");
        assert_eq!(compile("{:a :b}"), "{a, b};");
        assert_eq!(compile("{\"x\" 1 k 2}"), "{\"x\": 1, [k]: 2};");
        assert_eq!(compile("{:a-b 1}"), "{\"a-b\": 1};");
        assert_eq!(compile("{k}"), "");
    }

    #[test]
    fn quoted_atoms_become_literals() {
        assert_eq!(compile("'abc"), "\"abc\";");
        assert_eq!(compile("'12"), "12;");
        assert_eq!(compile("'\"s\""), "\"s\";");
        assert_eq!(compile("'()"), "null;");
    }

    #[test]
    fn quoted_lists_build_pairs() {
        assert_eq!(compile("'(a 1)"), "cons(\"a\", cons(1, null));");
        assert_eq!(compile("`(a ~x)"), "cons(\"a\", cons(x, null));");
        assert_eq!(compile("`(a ~@xs)"), "cons(\"a\", append(xs, null));");
    }

    #[test]
    fn property_access() {
        assert_eq!(compile("(get \"abcd\" 'length)"), "\"abcd\".length;");
        assert_eq!(compile("(get \"abcd\" length)"), "\"abcd\"[length];");
        assert_eq!(compile("(get console .log)"), "console.log;");
        assert_eq!(compile("(get a 0)"), "a[0];");
        assert_eq!(compile("(get super 'x)"), "this.__super__.x;");
    }

    #[test]
    fn method_chains() {
        assert_eq!(
            compile("(-> console (.log \"Hello World\"))"),
            "console.log(\"Hello World\");"
        );
        assert_eq!(compile("(-> \"i am cool\" .length)"), "\"i am cool\".length;");
        assert_eq!(compile("(-> $ (.post \"a.php\") (.done f))"), "$.post(\"a.php\").done(f);");
    }

    #[test]
    fn new_expressions() {
        assert_eq!(
            compile("(def x (new Array 1 2 3 4))"),
            "var x = (new Array(1, 2, 3, 4));"
        );
        assert_eq!(compile("(new Date)"), "(new Date());");
    }

    #[test]
    fn classes() {
        assert_eq!(
            compile("(class A :constructor (fn [x] (set! this.x x)) :showX (fn [] (console.log this.x)))"),
            "var A = function (x){this.x = x ; return this.x;} ;A.prototype = {constructor: A, showX: function (){return console.log(this.x);}};"
        );
        assert_eq!(
            compile("(class B extends A :constructor (fn [x] (super x)))"),
            "var B = function (x){Object.defineProperty(this, '__super__', {value: this.__proto__.__proto__}); return this.__super__.constructor.call(this, x);} ;B.prototype = {constructor: B, __proto__: A.prototype};"
        );
        assert_eq!(
            compile("(class C)"),
            "var C = function (){} ;C.prototype = {constructor: C};"
        );
    }

    #[test]
    fn super_method_calls() {
        assert_eq!(
            compile("(fn [] (super.showX 1))"),
            "function (){return this.__super__.showX.call(this, 1);};"
        );
    }

    #[test]
    fn duplicate_constructor_is_reported() {
        let mut state = CompileState::new();
        let out = compile_with(
            &mut state,
            "(class A :constructor (fn []) :constructor (fn []))",
        );
        assert_eq!(out, "");
        assert!(matches!(
            state.diagnostics[0].kind,
            ErrorKind::DuplicateConstructor { .. }
        ));
    }
}
