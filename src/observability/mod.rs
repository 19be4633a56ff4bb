//! Observability
//!
//! Structured verification events and metrics for operational visibility.

pub mod events;
pub mod metrics;
