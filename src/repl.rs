//! lisp2js REPL
//!
//! Compiles each entered expression in one persistent session and prints
//! the generated JavaScript. Macros defined at the prompt stay available.

use std::io::{self, Write};

use crate::cli::output::print_diagnostics;
use crate::config::SessionConfig;
use crate::engine::Session;
use crate::errors::print_error;

/// REPL state that persists across inputs
pub struct ReplState {
    session: Session,
    config: SessionConfig,
    line_number: usize,
}

impl ReplState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::with_config(config.clone()),
            config,
            line_number: 1,
        }
    }

    /// Compiles one complete input and returns the generated text.
    pub fn compile_line(&mut self, input: &str) -> Option<String> {
        let name = format!("<repl:{}>", self.line_number);
        self.line_number += 1;
        self.session.set_source_name(name);
        let result = self.session.compile(input, false);
        self.session.set_source_name(self.config.source_name.clone());

        print_diagnostics(self.session.take_diagnostics());
        match result {
            Ok(code) => Some(code),
            Err(e) => {
                print_error(e);
                None
            }
        }
    }

    fn reset(&mut self) {
        self.session = Session::with_config(self.config.clone());
    }
}

/// Main REPL entry point
pub fn run_repl(config: SessionConfig) {
    println!("lisp2js REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit, :clear to forget macros");
    println!();

    let mut repl_state = ReplState::new(config);
    let mut input_buffer = String::new();

    loop {
        if input_buffer.is_empty() {
            print!("lisp> ");
        } else {
            print!("   -> ");
        }
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl+D)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();

                if input_buffer.is_empty() && line.starts_with(':') {
                    match handle_repl_command(line, &mut repl_state) {
                        ReplCommand::Continue => continue,
                        ReplCommand::Quit => break,
                    }
                }

                if !input_buffer.is_empty() {
                    input_buffer.push('\n');
                }
                input_buffer.push_str(line);

                // An empty line forces an incomplete expression through, so
                // the syntax error is shown instead of waiting forever.
                if is_complete_expression(&input_buffer) || line.is_empty() {
                    if let Some(code) = repl_state.compile_line(&input_buffer) {
                        if !code.is_empty() {
                            println!("{}", code);
                        }
                    }
                    input_buffer.clear();
                }
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }
}

enum ReplCommand {
    Continue,
    Quit,
}

fn handle_repl_command(command: &str, state: &mut ReplState) -> ReplCommand {
    match command.to_ascii_lowercase().as_str() {
        ":help" | ":h" => {
            println!("lisp2js REPL Commands:");
            println!("  :help, :h     Show this help");
            println!("  :quit, :q     Exit the REPL");
            println!("  :clear, :c    Forget all macros and start a new session");
            println!("  :macros, :m   List the macros defined so far");
            println!();
            println!("Enter expressions to see the JavaScript they compile to.");
            println!("Multi-line expressions are supported.");
            ReplCommand::Continue
        }
        ":quit" | ":q" => ReplCommand::Quit,
        ":clear" | ":c" => {
            state.reset();
            println!("Session cleared.");
            ReplCommand::Continue
        }
        ":macros" | ":m" => {
            let mut names = state.session.macros().names();
            names.sort_unstable();
            println!("{}", names.join(" "));
            ReplCommand::Continue
        }
        _ => {
            println!(
                "Unknown command: {}. Type :help for available commands.",
                command
            );
            ReplCommand::Continue
        }
    }
}

/// True once every `(`, `[` and `{` outside a string literal is closed.
fn is_complete_expression(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in trimmed.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '(' | '[' | '{' if !in_string => depth += 1,
            ')' | ']' | '}' if !in_string => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_complete_expression() {
        assert!(is_complete_expression("42"));
        assert!(is_complete_expression("(+ 1 2)"));
        assert!(is_complete_expression("(def x [1 2 {:a 3}])"));
        assert!(is_complete_expression("\"hello (world\""));

        assert!(!is_complete_expression("(+ 1"));
        assert!(!is_complete_expression("(def x [1 2"));
        assert!(!is_complete_expression("\"unclosed string"));
        assert!(!is_complete_expression(""));
    }

    #[test]
    fn macros_persist_between_lines() {
        let mut repl = ReplState::new(SessionConfig::default());
        assert_eq!(
            repl.compile_line("(defmacro square [x] `(* ~x ~x))"),
            Some(String::new())
        );
        assert_eq!(repl.compile_line("(square 2)"), Some("(2 * 2);".to_string()));
        assert_eq!(repl.compile_line("(square 2"), None);
    }
}
