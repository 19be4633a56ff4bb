//! Core types and error taxonomy for the solvebox verifier

use crate::literal::LiteralValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which side of a test case a malformed literal came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestDataField {
    Input,
    Expected,
}

impl fmt::Display for TestDataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestDataField::Input => write!(f, "input"),
            TestDataField::Expected => write!(f, "expected"),
        }
    }
}

#[derive(Error, Debug)]
pub enum VerifyError {
    /// Candidate source is not well-formed in its language
    #[error("Syntax error{}: {message}", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    Syntax { message: String, line: Option<u32> },

    /// Callable could not be located or its parameters counted
    #[error("Signature extraction error: {0}")]
    Extraction(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Malformed literal in the test data (not the candidate source)
    #[error("Test case {case_index} has malformed {field} data: {message}")]
    TestData {
        case_index: usize,
        field: TestDataField,
        message: String,
    },

    /// Literal notation parse failure
    #[error("Literal parse error at offset {offset}: {message}")]
    Literal { offset: usize, message: String },

    /// Interpreter or toolchain binary could not be launched
    #[error("Runtime '{program}' is not available: {reason}")]
    RuntimeUnavailable { program: String, reason: String },

    #[error("Process error: {0}")]
    Process(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifyError {
    pub(crate) fn literal(offset: usize, message: impl Into<String>) -> Self {
        VerifyError::Literal {
            offset,
            message: message.into(),
        }
    }

    /// Shift a literal error's offset so it points into an enclosing text.
    pub(crate) fn shifted(self, base: usize) -> Self {
        match self {
            VerifyError::Literal { offset, message } => VerifyError::Literal {
                offset: offset + base,
                message,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;

/// Output collection integrity classification
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputIntegrity {
    #[default]
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "truncated_by_limit")]
    TruncatedByLimit,
    #[serde(rename = "collection_timed_out")]
    CollectionTimedOut,
}

impl fmt::Display for OutputIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputIntegrity::Complete => write!(f, "complete"),
            OutputIntegrity::TruncatedByLimit => write!(f, "truncated_by_limit"),
            OutputIntegrity::CollectionTimedOut => write!(f, "collection_timed_out"),
        }
    }
}

/// Opaque process description handed to the sandbox runner
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub environment: Vec<(String, String)>,
    pub workdir: Option<std::path::PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    /// Render as a shell-like argv string for logs
    pub fn display_argv(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of one sandboxed process execution
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was killed (timeout or signal)
    pub exit_code: Option<i32>,
    /// Terminating signal, if any
    pub signal: Option<i32>,
    pub timed_out: bool,
    pub wall_clock_millis: u64,
    pub output_integrity: OutputIntegrity,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Name and arity of the callable a harness must invoke
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallableSignature {
    pub name: String,
    pub parameter_count: usize,
    /// Declared parameter names, receiver excluded
    pub parameter_names: Vec<String>,
    /// Enclosing class when the callable is a method
    pub container: Option<String>,
}

impl CallableSignature {
    pub fn function(name: impl Into<String>, parameter_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameter_count: parameter_names.len(),
            parameter_names,
            container: None,
        }
    }

    pub fn method(
        container: impl Into<String>,
        name: impl Into<String>,
        parameter_names: Vec<String>,
    ) -> Self {
        Self {
            container: Some(container.into()),
            ..Self::function(name, parameter_names)
        }
    }
}

/// Syntax error location reported by a language toolchain
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyntaxDiagnostic {
    pub message: String,
    pub line: Option<u32>,
}

/// Outcome of a single test case
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Mismatch {
        actual: LiteralValue,
        expected: LiteralValue,
    },
    RuntimeFailure {
        message: String,
    },
    Timeout {
        limit_millis: u64,
    },
}

impl CaseOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }

    /// Short status label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            CaseOutcome::Passed => "passed",
            CaseOutcome::Mismatch { .. } => "mismatch",
            CaseOutcome::RuntimeFailure { .. } => "runtime_failure",
            CaseOutcome::Timeout { .. } => "timeout",
        }
    }
}

/// Call-level failure that stopped a verification before any case ran
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallFailure {
    Syntax(SyntaxDiagnostic),
    Extraction { message: String },
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::Syntax(diag) => match diag.line {
                Some(line) => write!(f, "syntax error on line {}: {}", line, diag.message),
                None => write!(f, "syntax error: {}", diag.message),
            },
            CallFailure::Extraction { message } => write!(f, "extraction error: {}", message),
        }
    }
}

/// Terminal artifact of one verification call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VerificationReport {
    pub language: String,
    pub syntax_valid: bool,
    pub failure: Option<CallFailure>,
    pub signature: Option<CallableSignature>,
    pub outcomes: Vec<CaseOutcome>,
    pub passed_count: usize,
    pub total_count: usize,
}

impl VerificationReport {
    /// Early-exit report for a call rejected before any case ran
    pub fn rejected(language: impl Into<String>, failure: CallFailure) -> Self {
        Self {
            language: language.into(),
            syntax_valid: false,
            failure: Some(failure),
            signature: None,
            outcomes: Vec::new(),
            passed_count: 0,
            total_count: 0,
        }
    }

    pub fn completed(
        language: impl Into<String>,
        signature: CallableSignature,
        outcomes: Vec<CaseOutcome>,
    ) -> Self {
        let passed_count = outcomes.iter().filter(|o| o.is_passed()).count();
        let total_count = outcomes.len();
        Self {
            language: language.into(),
            syntax_valid: true,
            failure: None,
            signature: Some(signature),
            outcomes,
            passed_count,
            total_count,
        }
    }

    /// Gate used by persistence: valid source, at least one case, every case passed
    pub fn all_passed(&self) -> bool {
        self.syntax_valid && self.total_count > 0 && self.passed_count == self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display_includes_line() {
        let err = VerifyError::Syntax {
            message: "expected ':'".to_string(),
            line: Some(3),
        };
        assert_eq!(err.to_string(), "Syntax error on line 3: expected ':'");

        let err = VerifyError::Syntax {
            message: "unexpected end of input".to_string(),
            line: None,
        };
        assert_eq!(err.to_string(), "Syntax error: unexpected end of input");
    }

    #[test]
    fn test_shifted_only_touches_literal_errors() {
        let err = VerifyError::literal(2, "bad token").shifted(10);
        assert!(matches!(err, VerifyError::Literal { offset: 12, .. }));

        let err = VerifyError::Config("x".to_string()).shifted(10);
        assert!(matches!(err, VerifyError::Config(_)));
    }

    #[test]
    fn test_report_counts_and_gate() {
        let sig = CallableSignature::function("f", vec!["a".to_string()]);
        let report = VerificationReport::completed(
            "python3",
            sig.clone(),
            vec![
                CaseOutcome::Passed,
                CaseOutcome::RuntimeFailure {
                    message: "boom".to_string(),
                },
            ],
        );
        assert_eq!(report.passed_count, 1);
        assert_eq!(report.total_count, 2);
        assert!(!report.all_passed());

        let report = VerificationReport::completed("python3", sig, Vec::new());
        assert!(!report.all_passed(), "zero cases never passes the gate");
    }

    #[test]
    fn test_rejected_report_is_empty() {
        let report = VerificationReport::rejected(
            "javascript",
            CallFailure::Extraction {
                message: "no function".to_string(),
            },
        );
        assert!(!report.syntax_valid);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.total_count, 0);
    }

    #[test]
    fn test_command_spec_builder() {
        let spec = CommandSpec::new("python3").arg("-B").args(["x.py"]).env("A", "1");
        assert_eq!(spec.display_argv(), "python3 -B x.py");
        assert_eq!(spec.environment, vec![("A".to_string(), "1".to_string())]);
    }
}
