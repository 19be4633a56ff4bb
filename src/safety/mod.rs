//! Safety and cleanup
//!
//! Run-scoped workspaces and drop guards for staged harness files.

pub mod workspace;

pub use workspace::{Sandbox, StagedFile, Workspace};
