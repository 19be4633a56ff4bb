//! End-to-end verification of Python solutions
//!
//! Each test skips with a notice when `python3` is not installed.

use solvebox::config::VerifierSettings;
use solvebox::judge::find_on_path;
use solvebox::literal;
use solvebox::observability::metrics::get_metrics;
use solvebox::verdict::ListOrder;
use solvebox::verify::VerifyRequest;
use solvebox::{CallFailure, CaseOutcome, RawTestCase, Verifier};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const TWO_SUM: &str = "\
class Solution:
    def twoSum(self, nums: List[int], target: int) -> List[int]:
        seen = {}
        for i, n in enumerate(nums):
            if target - n in seen:
                return [seen[target - n], i]
            seen[n] = i
        return []
";

fn python_verifier(configure: impl FnOnce(&mut VerifierSettings)) -> Option<(Verifier, TempDir)> {
    if find_on_path("python3").is_none() {
        println!("python3 not found; skipping");
        return None;
    }
    let root = tempfile::tempdir().unwrap();
    let mut settings = VerifierSettings {
        workspace_root: Some(root.path().to_path_buf()),
        ..VerifierSettings::default()
    };
    configure(&mut settings);
    Some((Verifier::from_settings(settings).unwrap(), root))
}

#[test]
fn test_two_sum_passes() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let cases = vec![RawTestCase::new("nums = [2,7,11,15], target = 9", "[0,1]")];

    let report = verifier.verify(TWO_SUM, "python3", &cases).unwrap();

    assert!(report.syntax_valid);
    assert_eq!(report.outcomes, vec![CaseOutcome::Passed]);
    assert_eq!(report.passed_count, 1);
    assert_eq!(report.total_count, 1);
    assert!(report.all_passed());
    let signature = report.signature.unwrap();
    assert_eq!(signature.name, "twoSum");
    assert_eq!(signature.container.as_deref(), Some("Solution"));
}

#[test]
fn test_missing_colon_is_syntax_rejection() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "def twoSum(nums, target)\n    return []\n";
    let cases = vec![RawTestCase::new("nums = [1], target = 1", "[]")];

    let report = verifier.verify(source, "python", &cases).unwrap();

    assert!(!report.syntax_valid);
    assert!(report.outcomes.is_empty());
    assert!(!report.all_passed());
    match report.failure {
        Some(CallFailure::Syntax(diag)) => assert_eq!(diag.line, Some(1)),
        other => panic!("expected syntax failure, got {:?}", other),
    }
}

#[test]
fn test_raising_case_does_not_abort_siblings() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "\
class Solution:
    def divide(self, a: int, b: int) -> int:
        return a // b
";
    let cases = vec![
        RawTestCase::new("a = 6, b = 3", "2"),
        RawTestCase::new("a = 1, b = 0", "0"),
    ];

    let report = verifier.verify(source, "python3", &cases).unwrap();

    assert_eq!(report.passed_count, 1);
    assert_eq!(report.total_count, 2);
    assert_eq!(report.outcomes[0], CaseOutcome::Passed);
    match &report.outcomes[1] {
        CaseOutcome::RuntimeFailure { message } => {
            assert!(message.starts_with("ZeroDivisionError"), "{}", message)
        }
        other => panic!("expected runtime failure, got {:?}", other),
    }
}

#[test]
fn test_wrong_order_is_mismatch() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "def pair(x):\n    return [1, 2]\n";
    let cases = vec![RawTestCase::new("0", "[2,1]")];

    let report = verifier.verify(source, "python3", &cases).unwrap();

    match &report.outcomes[0] {
        CaseOutcome::Mismatch { actual, expected } => {
            assert_eq!(actual.to_string(), "[1,2]");
            assert_eq!(expected.to_string(), "[2,1]");
        }
        other => panic!("expected mismatch, got {:?}", other),
    }
}

#[test]
fn test_unordered_lists_accept_permutation() {
    let Some((verifier, _root)) = python_verifier(|s| s.list_order = ListOrder::Unordered) else {
        return;
    };
    let source = "def pair(x):\n    return [1, 2]\n";
    let cases = vec![RawTestCase::new("0", "[2,1]")];

    let report = verifier.verify(source, "python3", &cases).unwrap();
    assert!(report.all_passed());
}

#[test]
fn test_debug_prints_do_not_corrupt_result() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "def add(a, b):\n    print('debug', a, b)\n    return a + b\n";
    let cases = vec![RawTestCase::new("a = 1\nb = 2", "3")];

    let report = verifier.verify(source, "python3", &cases).unwrap();
    assert!(report.all_passed(), "{:?}", report.outcomes);
}

#[test]
fn test_top_level_prints_do_not_corrupt_result() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "\
print('loading solution')

class Solution:
    def twoSum(self, nums, target):
        seen = {}
        for i, n in enumerate(nums):
            if target - n in seen:
                return [seen[target - n], i]
            seen[n] = i
        return []

print(Solution().twoSum([3, 3], 6))
";
    let cases = vec![RawTestCase::new("nums = [2,7,11,15], target = 9", "[0,1]")];

    let report = verifier.verify(source, "python3", &cases).unwrap();
    assert_eq!(report.outcomes, vec![CaseOutcome::Passed]);
}

#[test]
fn test_results_beyond_i64_are_compared_exactly() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "def power(n):\n    return 2 ** n\n";
    let cases = vec![
        RawTestCase::new("n = 64", "0"),
        RawTestCase::new("n = 64", "18446744073709551616"),
        RawTestCase::new("n = 3", "8"),
    ];

    let report = verifier.verify(source, "python3", &cases).unwrap();

    match &report.outcomes[0] {
        CaseOutcome::Mismatch { actual, .. } => {
            assert_eq!(actual.to_string(), "18446744073709551616")
        }
        other => panic!("expected mismatch, got {:?}", other),
    }
    assert_eq!(report.outcomes[1], CaseOutcome::Passed);
    assert_eq!(report.outcomes[2], CaseOutcome::Passed);
}

#[test]
fn test_integer_sets_are_printed_in_numeric_order() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "def distinct(nums):\n    return set(nums)\n";
    let cases = vec![RawTestCase::new("nums = [10, 2, 10, 2]", "[2,10]")];

    let report = verifier.verify(source, "python3", &cases).unwrap();
    assert_eq!(report.outcomes, vec![CaseOutcome::Passed]);
}

#[test]
fn test_float_result_matches_integer_expectation() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let source = "def half(n):\n    return n / 2\n";
    let cases = vec![RawTestCase::new("n = 4", "2"), RawTestCase::new("n = 3", "1.5")];

    let report = verifier.verify(source, "python3", &cases).unwrap();
    assert!(report.all_passed(), "{:?}", report.outcomes);
}

#[test]
fn test_missing_callable_is_extraction_rejection() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let cases = vec![RawTestCase::new("x = 1", "1")];

    let report = verifier.verify("x = 1\n", "python3", &cases).unwrap();

    assert!(!report.syntax_valid);
    assert!(matches!(report.failure, Some(CallFailure::Extraction { .. })));
    assert!(report.outcomes.is_empty());
}

#[test]
fn test_arity_mismatch_is_extraction_rejection() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let cases = vec![RawTestCase::new("a = 1, b = 2", "1")];

    let report = verifier
        .verify("def ident(a):\n    return a\n", "python3", &cases)
        .unwrap();
    assert!(matches!(report.failure, Some(CallFailure::Extraction { .. })));
}

#[test]
fn test_infinite_loop_times_out() {
    let Some((verifier, _root)) = python_verifier(|s| s.execution_timeout_ms = 500) else {
        return;
    };
    let source = "def spin(n):\n    while True:\n        pass\n";
    let cases = vec![RawTestCase::new("n = 1", "1")];

    let started = Instant::now();
    let report = verifier.verify(source, "python3", &cases).unwrap();

    assert_eq!(report.outcomes, vec![CaseOutcome::Timeout { limit_millis: 500 }]);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "took {:?}",
        started.elapsed()
    );
}

#[test]
fn test_repeated_runs_are_identical() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let cases = vec![
        RawTestCase::new("nums = [2,7,11,15], target = 9", "[0,1]"),
        RawTestCase::new("nums = [3,2,4], target = 6", "[0,2]"),
    ];

    let first = verifier.verify(TWO_SUM, "python3", &cases).unwrap();
    let second = verifier.verify(TWO_SUM, "python3", &cases).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.outcomes[1],
        CaseOutcome::Mismatch {
            actual: literal::parse("[1,2]").unwrap(),
            expected: literal::parse("[0,2]").unwrap(),
        }
    );
}

#[test]
fn test_parallel_cases_keep_input_order() {
    let Some((verifier, _root)) = python_verifier(|s| s.case_workers = 4) else {
        return;
    };
    let source = "import time\n\ndef slow_echo(n):\n    time.sleep(0.05 * (5 - n))\n    return n\n";
    let cases: Vec<RawTestCase> = (0..5)
        .map(|n| RawTestCase::new(format!("n = {}", n), n.to_string()))
        .collect();

    let report = verifier.verify(source, "python3", &cases).unwrap();
    assert_eq!(report.outcomes, vec![CaseOutcome::Passed; 5]);
}

#[test]
fn test_verify_many_returns_results_in_request_order() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let requests = vec![
        VerifyRequest {
            source: "def f(x):\n    return x\n".to_string(),
            language: "python3".to_string(),
            cases: vec![RawTestCase::new("x = 1", "1")],
        },
        VerifyRequest {
            source: "def f(x)\n".to_string(),
            language: "python3".to_string(),
            cases: vec![RawTestCase::new("x = 1", "1")],
        },
        VerifyRequest {
            source: String::new(),
            language: "brainfuck".to_string(),
            cases: Vec::new(),
        },
    ];

    let results = verifier.verify_many(&requests);

    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().all_passed());
    assert!(!results[1].as_ref().unwrap().syntax_valid);
    assert!(results[2].is_err());
}

#[test]
fn test_metrics_export_counts_verifications() {
    let Some((verifier, _root)) = python_verifier(|_| {}) else {
        return;
    };
    let before = get_metrics().verifications_total.get();
    let cases = vec![RawTestCase::new("nums = [3,3], target = 6", "[0,1]")];

    verifier.verify(TWO_SUM, "python3", &cases).unwrap();

    let metrics = get_metrics();
    assert!(metrics.verifications_total.get() > before);
    let exported = metrics.export_prometheus();
    assert!(exported.contains("# TYPE solvebox_verifications_total counter"));
    assert!(exported.contains("solvebox_cases_by_outcome{outcome=\"passed\"}"));
    assert!(exported.contains("solvebox_case_duration_seconds_bucket"));
}
