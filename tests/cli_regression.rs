// Regression tests for the command-line wrapper.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn lisp2js() -> Command {
    let mut cmd = Command::cargo_bin("lisp2js").unwrap();
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn compile_prints_javascript() {
    lisp2js()
        .args(["compile", "tests/fixtures/square.lisp"])
        .assert()
        .success()
        .stdout(contains("var sixteen = (4 * 4);"));
}

#[test]
fn compile_can_prepend_the_prelude() {
    lisp2js()
        .args(["compile", "--prelude", "tests/fixtures/square.lisp"])
        .assert()
        .success()
        .stdout(contains("function cons(").and(contains("var sixteen")));
}

#[test]
fn syntax_errors_exit_with_a_miette_report() {
    lisp2js()
        .args(["compile", "tests/fixtures/unbalanced.lisp"])
        .assert()
        .failure()
        .stderr(contains("lisp2js::syntax").or(contains("help:")));
}

#[test]
fn macros_lists_definitions_as_json() {
    lisp2js()
        .args(["macros", "--json", "tests/fixtures/square.lisp"])
        .assert()
        .success()
        .stdout(contains("\"inc\"").and(contains("\"square\"")).and(contains("\"twice\"")));
}

#[test]
fn macrotrace_shows_each_step() {
    lisp2js()
        .args(["macrotrace", "tests/fixtures/square.lisp", "(twice 2)"])
        .assert()
        .success()
        .stdout(contains("Step 1: twice").and(contains("Step 2: inc")));
}

#[test]
fn ast_prints_source_forms() {
    lisp2js()
        .args(["ast", "tests/fixtures/square.lisp"])
        .assert()
        .success()
        .stdout(contains("(def sixteen (square 4))"));
}

#[test]
fn tokens_as_json() {
    lisp2js()
        .args(["tokens", "--json", "tests/fixtures/square.lisp"])
        .assert()
        .success()
        .stdout(contains("\"Atom\": \"defmacro\""));
}

#[test]
fn tokens_reject_unbalanced_input() {
    lisp2js()
        .args(["tokens", "tests/fixtures/unbalanced.lisp"])
        .assert()
        .failure()
        .stderr(contains("lisp2js::syntax"));
}

#[test]
fn missing_config_file_is_reported() {
    lisp2js()
        .args(["--config", "tests/fixtures/absent.yaml", "ast", "tests/fixtures/square.lisp"])
        .assert()
        .failure()
        .stderr(contains("lisp2js::config::io"));
}
