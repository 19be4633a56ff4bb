//! Run-scoped workspace for harness files
//!
//! Every verification call gets its own directory named by a v4 UUID, and
//! every staged file is removed when its guard drops, on success, error,
//! timeout or unwind alike.

use crate::config::types::{CommandSpec, ExecutionResult, Result, VerifyError};
use crate::exec::SandboxRunner;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Directory owned by one verification call
#[derive(Debug)]
pub struct Workspace {
    run_id: String,
    run_dir: PathBuf,
}

impl Workspace {
    /// Create a fresh run directory under `root`.
    pub fn create(root: &Path) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let run_dir = root.join(format!("solvebox-{}", run_id));

        fs::create_dir_all(&run_dir).map_err(|e| {
            VerifyError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create workspace directory {}: {}", run_dir.display(), e),
            ))
        })?;
        log::debug!("Created workspace {}", run_dir.display());

        Ok(Self { run_id, run_dir })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write `contents` to `file_name` inside the run directory.
    pub fn stage(&self, file_name: &str, contents: &str) -> Result<StagedFile> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(VerifyError::Process(format!(
                "refusing to stage file with unsafe name `{}`",
                file_name
            )));
        }

        let path = self.run_dir.join(file_name);
        fs::write(&path, contents).map_err(|e| {
            VerifyError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", path.display(), e),
            ))
        })?;
        Ok(StagedFile { path })
    }

    /// Remove the run directory (idempotent)
    pub fn cleanup(&self) {
        if !self.run_dir.exists() {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.run_dir) {
            log::warn!(
                "Failed to remove workspace directory {}: {}",
                self.run_dir.display(),
                e
            );
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// File that exists exactly as long as this guard
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove staged file {}: {}", self.path.display(), e),
        }
    }
}

/// Runner, workspace and time limits handed to language adapters
#[derive(Debug)]
pub struct Sandbox {
    runner: SandboxRunner,
    workspace: Workspace,
    exec_timeout: Duration,
    syntax_timeout: Duration,
}

impl Sandbox {
    pub fn new(
        runner: SandboxRunner,
        workspace: Workspace,
        exec_timeout: Duration,
        syntax_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            workspace,
            exec_timeout,
            syntax_timeout,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn exec_timeout(&self) -> Duration {
        self.exec_timeout
    }

    pub fn syntax_timeout(&self) -> Duration {
        self.syntax_timeout
    }

    pub fn stage(&self, file_name: &str, contents: &str) -> Result<StagedFile> {
        self.workspace.stage(file_name, contents)
    }

    /// Run a harness under the execution timeout
    pub fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        self.runner.execute(spec, self.exec_timeout)
    }

    /// Run a toolchain syntax check under the (longer) syntax timeout
    pub fn run_check(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        self.runner.execute(spec, self.syntax_timeout)
    }
}
