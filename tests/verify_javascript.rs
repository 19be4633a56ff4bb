//! End-to-end verification of JavaScript solutions
//!
//! Each test skips with a notice when `node` is not installed.

use solvebox::config::VerifierSettings;
use solvebox::judge::find_on_path;
use solvebox::{CallFailure, CaseOutcome, RawTestCase, Verifier};
use tempfile::TempDir;

fn node_verifier() -> Option<(Verifier, TempDir)> {
    if find_on_path("node").is_none() {
        println!("node not found; skipping");
        return None;
    }
    let root = tempfile::tempdir().unwrap();
    let settings = VerifierSettings {
        workspace_root: Some(root.path().to_path_buf()),
        ..VerifierSettings::default()
    };
    Some((Verifier::from_settings(settings).unwrap(), root))
}

#[test]
fn test_two_sum_function_passes() {
    let Some((verifier, _root)) = node_verifier() else {
        return;
    };
    let source = "\
/**
 * @param {number[]} nums
 * @param {number} target
 * @return {number[]}
 */
var twoSum = function(nums, target) {
    const seen = new Map();
    for (let i = 0; i < nums.length; i++) {
        if (seen.has(target - nums[i])) return [seen.get(target - nums[i]), i];
        seen.set(nums[i], i);
    }
    return [];
};
";
    let cases = vec![
        RawTestCase::new("nums = [2,7,11,15], target = 9", "[0,1]"),
        RawTestCase::new("nums = [3,3], target = 6", "[0,1]"),
    ];

    let report = verifier.verify(source, "javascript", &cases).unwrap();

    assert!(report.all_passed(), "{:?}", report.outcomes);
    assert_eq!(report.signature.unwrap().name, "twoSum");
}

#[test]
fn test_syntax_error_is_rejected() {
    let Some((verifier, _root)) = node_verifier() else {
        return;
    };
    let source = "function broken(a {\n  return a;\n}\n";
    let cases = vec![RawTestCase::new("a = 1", "1")];

    let report = verifier.verify(source, "js", &cases).unwrap();

    assert!(!report.syntax_valid);
    assert!(report.outcomes.is_empty());
    assert!(matches!(report.failure, Some(CallFailure::Syntax(_))));
}

#[test]
fn test_thrown_error_and_console_output() {
    let Some((verifier, _root)) = node_verifier() else {
        return;
    };
    let source = "\
function check(n) {
    console.log('checking', n);
    if (n < 0) throw new RangeError('negative input');
    return n * 2;
}
";
    let cases = vec![RawTestCase::new("n = 2", "4"), RawTestCase::new("n = -1", "0")];

    let report = verifier.verify(source, "javascript", &cases).unwrap();

    assert_eq!(report.outcomes[0], CaseOutcome::Passed);
    assert_eq!(
        report.outcomes[1],
        CaseOutcome::RuntimeFailure {
            message: "RangeError: negative input".to_string()
        }
    );
    assert_eq!(report.passed_count, 1);
}

#[test]
fn test_top_level_console_output_is_ignored() {
    let Some((verifier, _root)) = node_verifier() else {
        return;
    };
    let source = "\
console.log('loading solution');
function add(a, b) {
    return a + b;
}
console.log(add(40, 2));
";
    let cases = vec![RawTestCase::new("a = 1, b = 2", "3")];

    let report = verifier.verify(source, "javascript", &cases).unwrap();
    assert_eq!(report.outcomes, vec![CaseOutcome::Passed]);
}

#[test]
fn test_async_solution_is_awaited() {
    let Some((verifier, _root)) = node_verifier() else {
        return;
    };
    let source = "const later = async (x) => {\n  await null;\n  return [x, x];\n};\n";
    let cases = vec![RawTestCase::new("x = \"a\"", "[\"a\",\"a\"]")];

    let report = verifier.verify(source, "javascript", &cases).unwrap();
    assert!(report.all_passed(), "{:?}", report.outcomes);
}

#[test]
fn test_whole_number_float_expectation() {
    let Some((verifier, _root)) = node_verifier() else {
        return;
    };
    // JavaScript prints 2, never 2.0
    let source = "function half(n) { return n / 2; }\n";
    let cases = vec![RawTestCase::new("n = 4", "2.0"), RawTestCase::new("n = 3", "1.5")];

    let report = verifier.verify(source, "javascript", &cases).unwrap();
    assert!(report.all_passed(), "{:?}", report.outcomes);
}
