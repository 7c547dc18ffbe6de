// tests/suite_runner.rs
//
// Runs every YAML golden suite under tests/suites.

use lisp2js::test_harness::{collect_results, partition_results, print_failure, TestConfig, TestResult};

#[test]
fn yaml_suites_pass() {
    let config = TestConfig {
        test_root: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/suites").to_string(),
        use_colors: false,
    };
    let results = collect_results(None, &config);
    for result in &results {
        if matches!(result, TestResult::Fail { .. }) {
            print_failure(result, &config);
        }
    }
    let (passed, failed, _skipped) = partition_results(&results);
    assert!(passed > 0, "no suite cases were found under {}", config.test_root);
    assert_eq!(failed, 0);
}
