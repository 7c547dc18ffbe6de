//! Handles all user-facing output for the CLI.
//!
//! Pretty-printing, colouring, diffs and JSON live here so every command
//! prints the same way.

use crate::ast::Value;
use crate::errors::CompileError;
use crate::macros::ExpansionStep;
use crate::syntax::Token;
use difference::{Changeset, Difference};
use serde::Serialize;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn header(stdout: &mut StandardStream, text: &str) {
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
    let _ = writeln!(stdout, "{}", text);
    let _ = stdout.reset();
}

/// Prints `form`, then every expansion step as a word diff against the
/// step before it.
pub fn print_trace(form: &Value, steps: &[ExpansionStep]) {
    let mut stdout = StandardStream::stdout(color_choice());
    header(&mut stdout, "--- Input ---");
    let mut last = form.pretty();
    let _ = writeln!(stdout, "{}", last);

    for (i, step) in steps.iter().enumerate() {
        header(&mut stdout, &format!("--- Step {}: {} ---", i + 1, step.macro_name));
        let current = step.output.pretty();
        let changeset = Changeset::new(&last, &current, " ");
        print_diff(&mut stdout, &changeset.diffs);
        last = current;
    }
    if steps.is_empty() {
        let _ = writeln!(stdout, "(no macro call to expand)");
    }
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    let mut first = true;
    for diff in diffs {
        if !first {
            let _ = write!(stdout, " ");
        }
        first = false;
        match diff {
            Difference::Same(x) => {
                let _ = stdout.reset();
                let _ = write!(stdout, "{}", x);
            }
            Difference::Add(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                let _ = write!(stdout, "{}", x);
            }
            Difference::Rem(x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                let _ = write!(stdout, "{}", x);
            }
        }
    }
    let _ = stdout.reset();
    let _ = writeln!(stdout);
}

pub fn print_tokens(tokens: &[Token]) {
    for token in tokens {
        println!("{:<24} {}..{}", token.text(), token.span.start, token.span.end);
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints non-fatal diagnostics to stderr.
pub fn print_diagnostics(diagnostics: Vec<CompileError>) {
    for diagnostic in diagnostics {
        let report = miette::Report::new(diagnostic);
        eprintln!("{report:?}");
    }
}
