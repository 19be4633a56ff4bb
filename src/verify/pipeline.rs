use crate::config::types::{CallableSignature, CaseOutcome, Result, VerificationReport};
use crate::judge::{check_arity, LanguageAdapter};
use crate::observability::events::{EventContext, EventKind};
use crate::observability::metrics::get_metrics;
use crate::safety::Sandbox;
use crate::verdict::{classify, ListOrder};
use crate::verify::pool::run_ordered;
use crate::verify::TestCase;
use std::time::Instant;

// A verification call is a type-state chain so stages cannot be skipped or
// reordered:
//
//   Verification<Init> -> Verification<SyntaxChecked>
//     -> Verification<SignatureExtracted> -> VerificationReport
//
// Each step consumes the prior state. Syntax and extraction failures come
// back as `VerifyError::Syntax` / `VerifyError::Extraction`; the caller turns
// them into rejected reports.

/// Type-state marker: nothing checked yet
pub struct Init;

/// Type-state marker: the toolchain accepted the source
pub struct SyntaxChecked;

/// Type-state marker: callable located and arity matched against every case
pub struct SignatureExtracted {
    signature: CallableSignature,
}

/// Per-case execution knobs
#[derive(Debug, Clone, Copy)]
pub struct CasePolicy {
    pub list_order: ListOrder,
    pub workers: usize,
}

/// One verification call in state `S`
pub struct Verification<'a, S> {
    adapter: &'a dyn LanguageAdapter,
    sandbox: &'a Sandbox,
    source: &'a str,
    events: &'a EventContext,
    state: S,
}

impl<'a> Verification<'a, Init> {
    pub fn new(
        adapter: &'a dyn LanguageAdapter,
        sandbox: &'a Sandbox,
        source: &'a str,
        events: &'a EventContext,
    ) -> Self {
        Self {
            adapter,
            sandbox,
            source,
            events,
            state: Init,
        }
    }

    pub fn check_syntax(self) -> Result<Verification<'a, SyntaxChecked>> {
        self.adapter.check_syntax(self.source, self.sandbox)?;
        log::debug!("{} source accepted by syntax check", self.adapter.info().display_name);
        Ok(Verification {
            adapter: self.adapter,
            sandbox: self.sandbox,
            source: self.source,
            events: self.events,
            state: SyntaxChecked,
        })
    }
}

impl<'a> Verification<'a, SyntaxChecked> {
    pub fn extract_signature(self, cases: &[TestCase]) -> Result<Verification<'a, SignatureExtracted>> {
        let signature = self.adapter.extract_signature(self.source)?;
        for case in cases {
            check_arity(&signature, &case.inputs)?;
        }

        self.events.emit(EventKind::SignatureExtracted {
            name: signature.name.clone(),
            parameter_count: signature.parameter_count,
        });
        Ok(Verification {
            adapter: self.adapter,
            sandbox: self.sandbox,
            source: self.source,
            events: self.events,
            state: SignatureExtracted { signature },
        })
    }
}

impl<'a> Verification<'a, SignatureExtracted> {
    pub fn signature(&self) -> &CallableSignature {
        &self.state.signature
    }

    /// Run every case and assemble the report.
    ///
    /// Cases are independent: one case's failure never aborts its siblings.
    pub fn run_cases(self, cases: &[TestCase], policy: CasePolicy) -> VerificationReport {
        let outcomes = run_ordered(cases, policy.workers, |index, case| {
            self.run_case(index, case, policy.list_order)
        });
        VerificationReport::completed(self.adapter.language().slug(), self.state.signature, outcomes)
    }

    fn run_case(&self, index: usize, case: &TestCase, order: ListOrder) -> CaseOutcome {
        let started = Instant::now();
        let outcome = match self.execute_case(index, case, order) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Case {} could not be executed: {}", index, e);
                CaseOutcome::RuntimeFailure {
                    message: e.to_string(),
                }
            }
        };

        let elapsed = started.elapsed();
        get_metrics().record_case(&outcome, elapsed);
        self.events
            .case_finished(index, &outcome, elapsed.as_millis() as u64);
        log::debug!("Case {} ({}): {}", index, case.raw_input.trim(), outcome.label());
        outcome
    }

    fn execute_case(&self, index: usize, case: &TestCase, order: ListOrder) -> Result<CaseOutcome> {
        let harness = self
            .adapter
            .build_harness(self.source, &self.state.signature, &case.inputs)?;
        let staged = self.sandbox.stage(
            &format!("case_{}.{}", index, self.adapter.info().extension),
            &harness,
        )?;
        let execution = self
            .sandbox
            .run(&self.adapter.run_command(&staged.path_string()))?;

        let limit_millis = self.sandbox.exec_timeout().as_millis() as u64;
        Ok(classify(&execution, &case.expected, order, limit_millis))
    }
}
