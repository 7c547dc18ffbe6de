//! Pattern-matching macros.
//!
//! `(defmacro name pattern template pattern template …)` records an ordered
//! list of clauses under the validated macro name. A call whose compiled
//! head names a macro is rewritten by the first clause whose pattern
//! accepts the call's arguments; the chosen template is materialized and
//! the result is compiled in place of the call.
//!
//! # Patterns
//! | Element      | Meaning                                                  |
//! |--------------|----------------------------------------------------------|
//! | `x`          | captures one argument                                    |
//! | `#lit`       | argument must be the atom `lit`; captures nothing        |
//! | `. rest`     | captures the remaining arguments as a list               |
//! | `[a b]`      | nested pattern, matched against a list/vector argument   |
//!
//! # Table
//! The table is a persistent map, so cloning a session's table is cheap
//! and the clone evolves independently.

use crate::ast::Value;
use crate::errors::{CompileError, ErrorKind};
use serde::{Deserialize, Serialize};

pub mod expander;
pub mod matcher;

pub use expander::{
    evaluate_template, expand, expand_trace, materialize, select_clause, ExpansionStep,
};
pub use matcher::{match_pattern, Bindings};

/// Default bound on nested expansions before a call is reported as runaway.
pub const MAX_MACRO_RECURSION_DEPTH: usize = 128;

// ============================================================================
// DEFINITIONS
// ============================================================================

/// One `pattern template` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroClause {
    pub pattern: Vec<Value>,
    pub template: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    pub clauses: Vec<MacroClause>,
}

impl MacroDefinition {
    /// Reads the clause list that follows the name in a `defmacro` form.
    ///
    /// ```rust
    /// use lisp2js::ast::Value;
    /// use lisp2js::macros::MacroDefinition;
    /// let clauses = Value::list(vec![
    ///     Value::Vector(vec!["x".into()]),
    ///     "x".into(),
    /// ]);
    /// let def = MacroDefinition::from_clauses("id", &clauses).unwrap();
    /// assert_eq!(def.clauses.len(), 1);
    /// ```
    pub fn from_clauses(name: &str, clauses: &Value) -> Result<Self, CompileError> {
        let invalid = |reason: &str| {
            CompileError::new(ErrorKind::InvalidMacroDefinition {
                name: name.to_string(),
                reason: reason.to_string(),
            })
        };

        let items = clauses.to_vec();
        if items.is_empty() {
            return Err(invalid("no clauses"));
        }
        if items.len() % 2 != 0 {
            return Err(invalid("a pattern has no template"));
        }

        let clauses = items
            .chunks(2)
            .map(|chunk| {
                let pattern = match &chunk[0] {
                    Value::Vector(items) => items.clone(),
                    Value::Pair(_) => chunk[0].to_vec(),
                    Value::Null => Vec::new(),
                    Value::Atom(text) => {
                        return Err(invalid(&format!("pattern `{text}` is not a vector")))
                    }
                };
                Ok(MacroClause {
                    pattern,
                    template: chunk[1].clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            clauses,
        })
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Macro definitions by validated name.
///
/// # Example
/// ```rust
/// use lisp2js::ast::Value;
/// use lisp2js::macros::{MacroDefinition, MacroTable};
/// let mut table = MacroTable::new();
/// let clauses = Value::list(vec![Value::Null, "1".into()]);
/// table.define(MacroDefinition::from_clauses("one", &clauses).unwrap());
/// assert!(table.contains("one"));
/// let snapshot = table.clone();
/// table.remove("one");
/// assert!(snapshot.contains("one"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTable {
    macros: im::HashMap<String, MacroDefinition>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a definition, returning the one it replaced.
    pub fn define(&mut self, definition: MacroDefinition) -> Option<MacroDefinition> {
        log::debug!(
            "defined macro `{}` with {} clause(s)",
            definition.name,
            definition.clauses.len()
        );
        self.macros.insert(definition.name.clone(), definition)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<MacroDefinition> {
        self.macros.remove(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.macros.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
