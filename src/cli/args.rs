//! Defines the command-line arguments and subcommands for the lisp2js CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "lisp2js",
    version,
    about = "Compiles a small Lisp dialect to JavaScript."
)]
pub struct Lisp2JsArgs {
    /// YAML session configuration (`max_macro_depth`, `source_name`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile files (directories are searched for `*.lisp`) and print the JavaScript.
    Compile {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print the runtime prelude before the compiled code.
        #[arg(long)]
        prelude: bool,
    },
    /// Print the token stream after the surface rewrites.
    Tokens {
        #[arg(required = true)]
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the parsed top-level forms.
    Ast {
        #[arg(required = true)]
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List the macros a file defines.
    Macros {
        #[arg(required = true)]
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show each expansion step of a form, using the macros a file defines.
    Macrotrace {
        #[arg(required = true)]
        file: PathBuf,
        /// The form to expand, e.g. "(square 12)".
        #[arg(required = true)]
        form: String,
        /// Stop after this many rewrites.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run the YAML golden suites.
    Test {
        #[arg(default_value = "tests/suites")]
        path: PathBuf,
        /// Only run cases whose name contains this text.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Start an interactive session.
    Repl,
}
