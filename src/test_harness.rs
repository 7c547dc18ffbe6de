//! YAML golden-suite harness.
//!
//! Discovers YAML files under a root directory, compiles each case in a
//! fresh [`Session`] and compares the generated text (or the reported error)
//! with what the case expects.
//!
//! # Test Format
//!
//! ```yaml
//! - name: "square macro"
//!   setup: "(defmacro square [x] `(* ~x ~x))"  # compiled first, output ignored
//!   input: "(square 12)"
//!   expected: "(12 * 12);"                      # for success tests
//!   expect_error: "no clause"                   # substring of an error message
//!   expect_error_code: "lisp2js::macro::no_matching_clause"
//!   skip: false
//!   only: false
//! ```
//!
//! An error expectation is met by the syntax error `compile` returns or by
//! any diagnostic the session recorded while compiling `input`.
//!
//! ```rust,no_run
//! use lisp2js::test_harness::{run_all_tests, TestConfig};
//!
//! let config = TestConfig::default();
//! let (_passed, failed, _skipped) = run_all_tests(None, &config);
//! if failed > 0 {
//!     std::process::exit(1);
//! }
//! ```

use crate::engine::Session;
use crate::errors::CompileError;
use difference::{Changeset, Difference};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// =============================================================================
// CORE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Pass {
        file: String,
        name: String,
    },
    Fail {
        file: String,
        name: String,
        error: String,
        /// Generated text and expected text, when the failure is a mismatch.
        mismatch: Option<(String, String)>,
    },
    Skipped {
        file: String,
        name: String,
        reason: String,
    },
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub setup: Option<String>,
    pub input: String,
    pub expected: Option<String>,
    pub expect_error: Option<String>,
    pub expect_error_code: Option<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub only: bool,
}

impl TestCase {
    fn expects_error(&self) -> bool {
        self.expect_error.is_some() || self.expect_error_code.is_some()
    }
}

pub struct TestConfig {
    pub test_root: String,
    pub use_colors: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            test_root: "tests/suites".to_string(),
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

impl TestConfig {
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

// =============================================================================
// TEST DISCOVERY AND LOADING
// =============================================================================

/// All `.yaml`/`.yml` files under `root`, in a stable order.
pub fn discover_yaml_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_yaml::from_str::<Vec<TestCase>>(&content)
        .map_err(|e| format!("Failed to parse YAML in {}: {}", path.display(), e))
}

pub fn skip_reason(case: &TestCase, has_only: bool, filter: Option<&str>) -> Option<String> {
    if has_only && !case.only {
        return Some("Not marked 'only' in 'only' mode".to_string());
    }
    if case.skip {
        return Some("Marked 'skip'".to_string());
    }
    if let Some(f) = filter {
        if !case.name.to_lowercase().contains(&f.to_lowercase()) {
            return Some(format!("Filtered out by substring: {}", f));
        }
    }
    None
}

// =============================================================================
// EXECUTION
// =============================================================================

fn error_matches(error: &CompileError, case: &TestCase) -> bool {
    if let Some(code) = case.expect_error_code.as_deref() {
        if error.error_code() != code {
            return false;
        }
    }
    if let Some(text) = case.expect_error.as_deref() {
        if !error.to_string().contains(text) {
            return false;
        }
    }
    true
}

fn describe_expected_error(case: &TestCase) -> String {
    match (case.expect_error_code.as_deref(), case.expect_error.as_deref()) {
        (Some(code), Some(text)) => format!("error {} containing '{}'", code, text),
        (Some(code), None) => format!("error {}", code),
        (None, Some(text)) => format!("error containing '{}'", text),
        (None, None) => "no error".to_string(),
    }
}

/// Compiles one case in a fresh session and judges the outcome.
pub fn run_test_case(file: String, case: TestCase) -> TestResult {
    let fail = |error: String, mismatch: Option<(String, String)>| TestResult::Fail {
        file: file.clone(),
        name: case.name.clone(),
        error,
        mismatch,
    };

    // Step 1: Compile the setup forms; their text is not compared.
    let mut session = Session::new();
    if let Some(setup) = case.setup.as_deref() {
        if let Err(e) = session.compile(setup, false) {
            return fail(format!("Setup failed: {}", e), None);
        }
        session.take_diagnostics();
    }

    // Step 2: Compile the input.
    let result = session.compile(&case.input, false);
    let mut errors = session.take_diagnostics();
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            errors.push(e);
            String::new()
        }
    };

    // Step 3: Compare.
    if case.expects_error() {
        return match errors.iter().find(|e| error_matches(e, &case)) {
            Some(_) => TestResult::Pass {
                file: file.clone(),
                name: case.name.clone(),
            },
            None => {
                let actual: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{} ({})", e, e.error_code()))
                    .collect();
                fail(
                    format!(
                        "Expected {} but got [{}] with output: {}",
                        describe_expected_error(&case),
                        actual.join(", "),
                        output
                    ),
                    None,
                )
            }
        };
    }

    let expected = case.expected.as_deref().unwrap_or("").trim();
    if output.trim() == expected {
        TestResult::Pass {
            file: file.clone(),
            name: case.name.clone(),
        }
    } else {
        fail(
            "Output did not match expected".to_string(),
            Some((expected.to_string(), output.trim().to_string())),
        )
    }
}

// =============================================================================
// REPORTING AND OUTPUT
// =============================================================================

pub fn partition_results(results: &[TestResult]) -> (usize, usize, usize) {
    let passed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Pass { .. }))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Fail { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r, TestResult::Skipped { .. }))
        .count();
    (passed, failed, skipped)
}

pub fn report_results(results: &[TestResult], config: &TestConfig) {
    let (passed, failed, skipped) = partition_results(results);

    for r in results {
        match r {
            TestResult::Pass { file, name } => {
                println!("{}: {} [{}]", config.colorize("PASS", GREEN), name, file)
            }
            TestResult::Fail { .. } => print_failure(r, config),
            TestResult::Skipped { file, name, reason } => println!(
                "{}: {} [{}] ({})",
                config.colorize("SKIP", YELLOW),
                name,
                file,
                reason
            ),
        }
    }

    println!(
        "\nTest summary: total {}, {} {}, {} {}, {} {}",
        results.len(),
        config.colorize("passed", GREEN),
        passed,
        config.colorize("failed", RED),
        failed,
        config.colorize("skipped", YELLOW),
        skipped,
    );

    if failed > 0 {
        eprintln!("\nFailed tests:");
        for r in results {
            if let TestResult::Fail { name, file, .. } = r {
                eprintln!("  - {} [{}]", name, file);
            }
        }
    }
}

pub fn print_failure(r: &TestResult, config: &TestConfig) {
    if let TestResult::Fail {
        file,
        name,
        error,
        mismatch,
    } = r
    {
        eprintln!("{}: {} [{}]", config.colorize("FAIL", RED), name, file);
        eprintln!("  Error: {}", error);
        if let Some((expected, actual)) = mismatch {
            eprintln!("  Expected: {}", expected);
            eprintln!("  Actual:   {}", actual);
            eprintln!("  Diff:     {}", render_diff(expected, actual, config));
        }
    }
}

/// Character-level diff: removed text in red, added text in green.
pub fn render_diff(expected: &str, actual: &str, config: &TestConfig) -> String {
    let changeset = Changeset::new(expected, actual, "");
    let mut out = String::new();
    for diff in &changeset.diffs {
        match diff {
            Difference::Same(text) => out.push_str(text),
            Difference::Rem(text) => out.push_str(&config.colorize(&format!("[-{}-]", text), RED)),
            Difference::Add(text) => out.push_str(&config.colorize(&format!("{{+{}+}}", text), GREEN)),
        }
    }
    out
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Runs every case under `config.test_root` and returns (passed, failed, skipped).
/// A file that cannot be read or parsed counts as one failure.
pub fn run_all_tests(filter: Option<&str>, config: &TestConfig) -> (usize, usize, usize) {
    let results = collect_results(filter, config);
    report_results(&results, config);
    partition_results(&results)
}

pub fn collect_results(filter: Option<&str>, config: &TestConfig) -> Vec<TestResult> {
    let mut results = Vec::new();
    let mut all_cases = Vec::new();
    for path in discover_yaml_files(&config.test_root) {
        let file = path.display().to_string();
        match load_test_cases(&path) {
            Ok(cases) => all_cases.extend(cases.into_iter().map(|case| (file.clone(), case))),
            Err(error) => results.push(TestResult::Fail {
                name: "<load>".to_string(),
                file,
                error,
                mismatch: None,
            }),
        }
    }
    let has_only = all_cases.iter().any(|(_, case)| case.only);

    for (file, case) in all_cases {
        if let Some(reason) = skip_reason(&case, has_only, filter) {
            results.push(TestResult::Skipped {
                file,
                name: case.name,
                reason,
            });
            continue;
        }
        log::debug!("running suite case {} [{}]", case.name, file);
        results.push(run_test_case(file, case));
    }
    results
}
