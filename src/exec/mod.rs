//! Execution control
//!
//! Runs harness processes in their own process group under a wall-clock limit.

pub mod runner;

pub use runner::{KillReport, SandboxRunner};
