//! solvebox: a language-polymorphic solution verifier
//! Runs a candidate solution against literal test cases in a child process and
//! reports a per-case outcome.
//!
//! # Architecture
//!
//! ## Literal Values ([`literal`])
//! - [`literal::parser`]: Literal notation parser (lists, maps, strings, numbers, keywords)
//! - [`literal::CaseInputs`]: Ordered named arguments of one test case
//!
//! ## Language Adapters ([`judge`])
//! - [`judge::LanguageAdapter`]: Syntax check, signature extraction, harness synthesis
//! - [`judge::registry`]: Language slug to adapter resolution
//! - [`judge::languages`]: Python, JavaScript and TypeScript adapters
//!
//! ## Execution Control ([`exec`])
//! - [`exec::runner`]: Time-bounded process-group execution with SIGTERM/SIGKILL escalation
//!
//! ## Verdict ([`verdict`])
//! - [`verdict::comparator`]: Output parsing, value comparison and case classification
//!
//! ## Orchestration ([`verify`])
//! - [`verify::pipeline`]: Type-state ordered verification stages
//! - [`verify::Verifier`]: Public entry point (`verify`, `verify_many`)
//!
//! ## Safety & Cleanup ([`safety`])
//! - [`safety::workspace`]: Run-scoped workspace and staged files removed on drop
//!
//! ## Observability ([`observability`])
//! - [`observability::events`]: Structured verification events
//! - [`observability::metrics`]: Prometheus metrics export
//!
//! ## Configuration ([`config`])
//! - [`config::settings`]: Settings loading
//! - [`config::validator`]: Settings validation
//! - [`config::types`]: Shared type definitions and error taxonomy
//!
//! ## Utilities ([`utils`])
//! - [`utils::output`]: Bounded output collection
//!
//! # Design Principles
//!
//! 1. **Candidate code never runs in-process** - Every check and case is a child process
//! 2. **Every wait is bounded** - Timeouts kill the whole process group
//! 3. **Types prevent errors** - Stages cannot run out of order
//! 4. **Reports are deterministic** - No timings or paths in a report

// Literal Values
pub mod literal;

// Language adapters
pub mod judge;

// Execution Control
pub mod exec;

// Verdict
pub mod verdict;

// Orchestration
pub mod verify;

// Safety & Cleanup
pub mod safety;

// Observability
pub mod observability;

// Configuration
pub mod config;

// Utilities
pub mod utils;

// CLI entrypoint wiring for the solvebox binary.
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
pub use verify::{RawTestCase, Verifier};
