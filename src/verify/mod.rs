//! Verification orchestrator
//!
//! Drives one call end to end: resolve the language adapter, parse the test
//! data, check syntax, extract the callable, run every case in a fresh
//! workspace and assemble a [`VerificationReport`].

pub mod pipeline;
pub mod pool;

use crate::config::settings::VerifierSettings;
use crate::config::types::{
    CallFailure, Result, SyntaxDiagnostic, TestDataField, VerificationReport, VerifyError,
};
use crate::config::validator::validate_settings;
use crate::judge::registry::adapter_for;
use crate::literal::{self, CaseInputs, LiteralValue};
use crate::observability::events::{EventContext, EventKind};
use crate::observability::metrics::{get_metrics, GaugeGuard};
use crate::safety::{Sandbox, Workspace};
use pipeline::{CasePolicy, Verification};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

/// Test case as supplied by the caller, still in literal notation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTestCase {
    pub input: String,
    pub expected: String,
}

impl RawTestCase {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
        }
    }
}

/// Parsed test case; the raw input is kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub inputs: CaseInputs,
    pub expected: LiteralValue,
    pub raw_input: String,
}

impl TestCase {
    /// Parse a raw case; `case_index` locates errors in the caller's data.
    pub fn parse(case_index: usize, raw: &RawTestCase) -> Result<Self> {
        let inputs = literal::parse_case_input(&raw.input).map_err(|e| VerifyError::TestData {
            case_index,
            field: TestDataField::Input,
            message: e.to_string(),
        })?;
        let expected = literal::parse(&raw.expected).map_err(|e| VerifyError::TestData {
            case_index,
            field: TestDataField::Expected,
            message: e.to_string(),
        })?;
        Ok(Self {
            inputs,
            expected,
            raw_input: raw.input.clone(),
        })
    }
}

/// One independent request for [`Verifier::verify_many`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub source: String,
    pub language: String,
    pub cases: Vec<RawTestCase>,
}

/// Group positional test-data lines into per-case inputs.
///
/// Each case takes `per_case` consecutive non-blank lines; an incomplete
/// trailing group is dropped.
pub fn group_raw_lines<S: AsRef<str>>(lines: &[S], per_case: usize) -> Vec<String> {
    if per_case == 0 {
        return Vec::new();
    }
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() % per_case != 0 {
        log::warn!(
            "Dropping {} trailing test-data line(s) that do not form a full case",
            lines.len() % per_case
        );
    }
    lines
        .chunks_exact(per_case)
        .map(|group| group.join("\n"))
        .collect()
}

/// Keep the first case of every distinct canonical input.
fn dedupe(cases: Vec<TestCase>) -> Vec<TestCase> {
    let mut seen = HashSet::new();
    let before = cases.len();
    let kept: Vec<TestCase> = cases
        .into_iter()
        .filter(|case| seen.insert(case.inputs.canonical_key()))
        .collect();
    if kept.len() != before {
        log::info!("Skipped {} duplicate test case(s)", before - kept.len());
    }
    kept
}

/// Turn a stage rejection into a report failure; anything else is a real error.
fn rejection(error: VerifyError) -> std::result::Result<CallFailure, VerifyError> {
    match error {
        VerifyError::Syntax { message, line } => {
            Ok(CallFailure::Syntax(SyntaxDiagnostic { message, line }))
        }
        VerifyError::Extraction(message) => Ok(CallFailure::Extraction { message }),
        other => Err(other),
    }
}

/// Solution verifier
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    settings: VerifierSettings,
}

impl Verifier {
    /// Build a verifier from settings, rejecting values that fail validation.
    ///
    /// This is the only public constructor besides `Default`.
    pub fn from_settings(settings: VerifierSettings) -> Result<Self> {
        validate_settings(&settings)?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    /// Verify `source` against `cases`.
    ///
    /// Unknown languages and malformed test data are errors. Candidate syntax
    /// and extraction failures are reported through
    /// [`VerificationReport::failure`].
    pub fn verify(
        &self,
        source: &str,
        language: &str,
        cases: &[RawTestCase],
    ) -> Result<VerificationReport> {
        let adapter = adapter_for(language, &self.settings)?;

        let mut parsed = cases
            .iter()
            .enumerate()
            .map(|(index, raw)| TestCase::parse(index, raw))
            .collect::<Result<Vec<_>>>()?;
        if self.settings.dedupe_inputs {
            parsed = dedupe(parsed);
        }

        let metrics = get_metrics();
        let _active = GaugeGuard::new(&metrics.active_verifications);
        let started = Instant::now();

        let slug = adapter.language().slug();
        let events = EventContext::new(slug, source);
        events.emit(EventKind::CallStarted {
            case_count: parsed.len(),
        });
        log::info!(
            "Verifying {} solution against {} case(s) (call {})",
            adapter.info().display_name,
            parsed.len(),
            events.call_id()
        );

        let workspace = Workspace::create(&self.settings.workspace_root())?;
        let sandbox = Sandbox::new(
            self.settings.runner(),
            workspace,
            self.settings.execution_timeout(),
            self.settings.syntax_timeout(),
        );

        let outcome = Verification::new(&*adapter, &sandbox, source, &events)
            .check_syntax()
            .and_then(|checked| checked.extract_signature(&parsed))
            .map(|extracted| {
                extracted.run_cases(
                    &parsed,
                    CasePolicy {
                        list_order: self.settings.list_order,
                        workers: self.settings.case_workers,
                    },
                )
            });

        let report = match outcome {
            Ok(report) => report,
            Err(error) => match rejection(error) {
                Ok(failure) => {
                    match &failure {
                        CallFailure::Syntax(diag) => events.emit(EventKind::SyntaxRejected {
                            message: diag.message.clone(),
                            line: diag.line,
                        }),
                        CallFailure::Extraction { message } => {
                            events.emit(EventKind::ExtractionRejected {
                                message: message.clone(),
                            })
                        }
                    }
                    log::info!("Solution rejected: {}", failure);
                    VerificationReport::rejected(slug, failure)
                }
                Err(error) => {
                    if matches!(error, VerifyError::RuntimeUnavailable { .. }) {
                        metrics.runtime_unavailable.inc();
                    }
                    log::error!("Verification call {} failed: {}", events.call_id(), error);
                    return Err(error);
                }
            },
        };

        let elapsed = started.elapsed();
        metrics.record_report(&report, elapsed);
        events.call_finished(&report, elapsed.as_millis() as u64);
        log::info!(
            "Call {} finished: {}/{} case(s) passed",
            events.call_id(),
            report.passed_count,
            report.total_count
        );
        Ok(report)
    }

    /// Verify independent requests on a bounded worker pool.
    ///
    /// Results are returned in request order.
    pub fn verify_many(&self, requests: &[VerifyRequest]) -> Vec<Result<VerificationReport>> {
        pool::run_ordered(requests, self.settings.call_workers, |_, request| {
            self.verify(&request.source, &request.language, &request.cases)
        })
    }
}
