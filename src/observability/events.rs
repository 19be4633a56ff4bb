//! Structured verification events
//!
//! Every event carries the call id, language and a digest of the candidate
//! source so log lines from concurrent calls can be told apart without
//! logging the source itself. Events go out as JSON on the
//! `solvebox::audit` log target.

use crate::config::types::{CaseOutcome, VerificationReport};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AUDIT_TARGET: &str = "solvebox::audit";

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    CallStarted {
        case_count: usize,
    },
    SyntaxRejected {
        message: String,
        line: Option<u32>,
    },
    ExtractionRejected {
        message: String,
    },
    SignatureExtracted {
        name: String,
        parameter_count: usize,
    },
    CaseFinished {
        case_index: usize,
        status: String,
        elapsed_millis: u64,
    },
    CallFinished {
        passed_count: usize,
        total_count: usize,
        all_passed: bool,
        elapsed_millis: u64,
    },
}

/// One structured log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationEvent {
    /// RFC 3339, UTC
    pub timestamp: String,
    pub call_id: String,
    pub language: String,
    pub source_digest: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Correlation data shared by all events of one call
#[derive(Debug, Clone)]
pub struct EventContext {
    call_id: String,
    language: String,
    source_digest: String,
}

impl EventContext {
    pub fn new(language: &str, source: &str) -> Self {
        Self {
            call_id: Uuid::new_v4().to_string(),
            language: language.to_string(),
            source_digest: source_digest(source),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn event(&self, kind: EventKind) -> VerificationEvent {
        VerificationEvent {
            timestamp: chrono::Utc::now().to_rfc3339(),
            call_id: self.call_id.clone(),
            language: self.language.clone(),
            source_digest: self.source_digest.clone(),
            kind,
        }
    }

    pub fn emit(&self, kind: EventKind) {
        if !log::log_enabled!(target: AUDIT_TARGET, log::Level::Info) {
            return;
        }
        match serde_json::to_string(&self.event(kind)) {
            Ok(line) => log::info!(target: AUDIT_TARGET, "{}", line),
            Err(e) => log::warn!("Failed to serialize verification event: {}", e),
        }
    }

    pub fn case_finished(&self, case_index: usize, outcome: &CaseOutcome, elapsed_millis: u64) {
        self.emit(EventKind::CaseFinished {
            case_index,
            status: outcome.label().to_string(),
            elapsed_millis,
        });
    }

    pub fn call_finished(&self, report: &VerificationReport, elapsed_millis: u64) {
        self.emit(EventKind::CallFinished {
            passed_count: report.passed_count,
            total_count: report.total_count,
            all_passed: report.all_passed(),
            elapsed_millis,
        });
    }
}

/// Hex SHA-256 of the candidate source
pub fn source_digest(source: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_digest_is_stable_hex() {
        let digest = source_digest("");
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(source_digest("a"), source_digest("b"));
    }

    #[test]
    fn test_event_json_shape() {
        let ctx = EventContext::new("python3", "def f(): pass\n");
        let event = ctx.event(EventKind::CaseFinished {
            case_index: 1,
            status: "passed".to_string(),
            elapsed_millis: 42,
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "case_finished");
        assert_eq!(json["case_index"], 1);
        assert_eq!(json["language"], "python3");
        assert_eq!(json["call_id"], ctx.call_id());
        assert_eq!(json["source_digest"].as_str().unwrap().len(), 64);
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_call_ids_are_unique() {
        let a = EventContext::new("javascript", "x");
        let b = EventContext::new("javascript", "x");
        assert_ne!(a.call_id(), b.call_id());
    }
}
