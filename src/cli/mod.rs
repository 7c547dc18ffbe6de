//! The lisp2js command-line interface.
//!
//! A thin layer over [`Session`]: argument parsing lives in [`args`], all
//! printing in [`output`].

use crate::cli::args::{Command, Lisp2JsArgs};
use crate::config::{ConfigError, SessionConfig};
use crate::engine::{read_file, read_program, Session};
use crate::errors::{CompileError, SourceContext};
use crate::runtime::PRELUDE;
use crate::syntax::tokenize;
use crate::test_harness::{run_all_tests, TestConfig};
use clap::Parser;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use std::process;
use walkdir::WalkDir;

pub mod args;
pub mod output;

/// Anything that stops a command.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
    #[error("could not write JSON")]
    #[diagnostic(code(lisp2js::cli::json))]
    Json(#[from] serde_json::Error),
    #[error("{failed} suite case(s) failed")]
    #[diagnostic(code(lisp2js::cli::test))]
    TestsFailed { failed: usize },
}

/// The main entry point for the CLI.
pub fn run() {
    let args = Lisp2JsArgs::parse();

    let result = load_config(args.config.as_deref()).and_then(|config| dispatch(args.command, config));

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig, CliError> {
    match path {
        Some(path) => Ok(SessionConfig::load(path)?),
        None => Ok(SessionConfig::default()),
    }
}

fn dispatch(command: Command, config: SessionConfig) -> Result<(), CliError> {
    match command {
        Command::Compile { paths, prelude } => handle_compile(&paths, prelude, config),
        Command::Tokens { file, json } => handle_tokens(&file, json),
        Command::Ast { file, json } => handle_ast(&file, json),
        Command::Macros { file, json } => handle_macros(&file, json, config),
        Command::Macrotrace { file, form, limit } => handle_macrotrace(&file, &form, limit, config),
        Command::Test { path, filter } => handle_test(&path, filter.as_deref()),
        Command::Repl => {
            crate::repl::run_repl(config);
            Ok(())
        }
    }
}

/// Files named on the command line, with directories replaced by the
/// `*.lisp` files under them.
fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.file_type().is_file()
                            && e.path().extension().is_some_and(|ext| ext == "lisp")
                    })
                    .map(|e| e.path().to_path_buf()),
            );
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Compiles every file in one session, so macros defined by earlier files
/// are available to later ones.
fn handle_compile(paths: &[PathBuf], prelude: bool, config: SessionConfig) -> Result<(), CliError> {
    let mut session = Session::with_config(config);
    if prelude {
        println!("{}", PRELUDE);
    }
    for file in collect_sources(paths) {
        log::info!("compiling {}", file.display());
        let code = session.compile_file(&file, false)?;
        output::print_diagnostics(session.take_diagnostics());
        println!("{}", code);
    }
    Ok(())
}

fn handle_tokens(path: &Path, json: bool) -> Result<(), CliError> {
    let source = read_file(path)?;
    let context = SourceContext::from_file(path.display().to_string(), source.as_str());
    let tokens = tokenize(&source).map_err(|e| e.with_source(&context))?;
    if json {
        output::print_json(&tokens)?;
    } else {
        output::print_tokens(&tokens);
    }
    Ok(())
}

fn handle_ast(path: &Path, json: bool) -> Result<(), CliError> {
    let source = read_file(path)?;
    let context = SourceContext::from_file(path.display().to_string(), source.as_str());
    let program = read_program(&source, &context)?;
    let forms = program.forms.to_vec();
    if json {
        output::print_json(&forms)?;
    } else {
        for form in &forms {
            println!("{}", form.pretty());
        }
    }
    Ok(())
}

fn handle_macros(path: &Path, json: bool, config: SessionConfig) -> Result<(), CliError> {
    let mut session = Session::with_config(config);
    session.compile_file(path, false)?;
    output::print_diagnostics(session.take_diagnostics());
    let names = session.macros().names();
    if json {
        output::print_json(&names)?;
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

fn handle_macrotrace(
    path: &Path,
    form: &str,
    limit: Option<usize>,
    config: SessionConfig,
) -> Result<(), CliError> {
    let mut session = Session::with_config(config);
    session.compile_file(path, false)?;
    output::print_diagnostics(session.take_diagnostics());

    let steps = session.macro_trace(form, limit)?;
    let context = SourceContext::from_file("<form>", form);
    let program = read_program(form, &context)?;
    let input = program.forms.first().cloned().unwrap_or_default();
    output::print_trace(&input, &steps);
    Ok(())
}

fn handle_test(path: &Path, filter: Option<&str>) -> Result<(), CliError> {
    let config = TestConfig {
        test_root: path.display().to_string(),
        ..TestConfig::default()
    };
    let (_passed, failed, _skipped) = run_all_tests(filter, &config);
    if failed > 0 {
        return Err(CliError::TestsFailed { failed });
    }
    Ok(())
}
