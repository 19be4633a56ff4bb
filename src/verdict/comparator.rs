//! Case outcome classification
//!
//! Pure functions over one execution result and the expected value; the
//! same inputs always yield the same outcome.

use crate::config::types::{CaseOutcome, ExecutionResult, OutputIntegrity};
use crate::judge::last_line;
use crate::literal::{self, LiteralValue};
use serde::{Deserialize, Serialize};

/// How top-level lists are compared
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Element-wise, order-sensitive
    #[default]
    Strict,
    /// Top-level lists compare as multisets; nested lists stay ordered
    Unordered,
}

/// Compare harness stdout against the expected value.
///
/// Only the last non-empty line is the result; anything the candidate
/// managed to write before it is ignored.
pub fn compare(stdout: &str, expected: &LiteralValue, order: ListOrder) -> CaseOutcome {
    let printed = last_line(stdout).unwrap_or("");
    let actual = match literal::parse(printed) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Harness output did not parse: {}", e);
            return CaseOutcome::RuntimeFailure {
                message: format!("unparsable output: {}", printed),
            };
        }
    };

    if values_match(&actual, expected, order) {
        CaseOutcome::Passed
    } else {
        CaseOutcome::Mismatch {
            actual,
            expected: expected.clone(),
        }
    }
}

/// Classify a whole execution into a case outcome.
///
/// Precedence: timeout, then abnormal termination, then truncated output,
/// then value comparison.
pub fn classify(
    execution: &ExecutionResult,
    expected: &LiteralValue,
    order: ListOrder,
    limit_millis: u64,
) -> CaseOutcome {
    if execution.timed_out {
        return CaseOutcome::Timeout { limit_millis };
    }

    if let Some(signal) = execution.signal {
        return CaseOutcome::RuntimeFailure {
            message: last_stderr_line(&execution.stderr)
                .unwrap_or_else(|| format!("terminated by signal {}", signal)),
        };
    }

    match execution.exit_code {
        Some(0) => {}
        Some(code) => {
            return CaseOutcome::RuntimeFailure {
                message: last_stderr_line(&execution.stderr)
                    .unwrap_or_else(|| format!("exited with status {}", code)),
            };
        }
        None => {
            return CaseOutcome::RuntimeFailure {
                message: "exited without a status".to_string(),
            };
        }
    }

    if execution.output_integrity != OutputIntegrity::Complete {
        return CaseOutcome::RuntimeFailure {
            message: format!("output incomplete ({})", execution.output_integrity),
        };
    }

    compare(&execution.stdout, expected, order)
}

fn values_match(actual: &LiteralValue, expected: &LiteralValue, order: ListOrder) -> bool {
    match (order, actual, expected) {
        (ListOrder::Unordered, LiteralValue::List(a), LiteralValue::List(b)) => {
            same_multiset(a, b)
        }
        _ => actual == expected,
    }
}

// Values have no total order (floats), so match greedily by equality.
fn same_multiset(actual: &[LiteralValue], expected: &[LiteralValue]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    let mut used = vec![false; expected.len()];
    actual.iter().all(|item| {
        let slot = expected
            .iter()
            .enumerate()
            .position(|(i, candidate)| !used[i] && candidate == item);
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Last non-empty stderr line: the `Type: message` line harnesses emit,
/// without tracebacks or temp paths.
fn last_stderr_line(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
