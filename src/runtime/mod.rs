//! Host runtime support.
//!
//! Compiled output calls `cons`, `list`, `append` and friends, and tests
//! values against `$List`. A host evaluates [`PRELUDE`] once before running
//! compiled snippets so those names resolve.

/// JavaScript source of the list runtime.
pub const PRELUDE: &str = include_str!("prelude.js");

/// Names the prelude defines at top level.
pub const PRELUDE_NAMES: &[&str] = &[
    "List", "$List", "cons", "car", "cdr", "first", "rest", "second", "third", "fourth", "list",
    "append",
];

/// `code` preceded by the runtime, ready to run in a fresh host.
pub fn with_prelude(code: &str) -> String {
    let mut out = String::with_capacity(PRELUDE.len() + code.len() + 1);
    out.push_str(PRELUDE);
    if !PRELUDE.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(code);
    out
}
