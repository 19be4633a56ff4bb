//! Time-bounded subprocess execution
//!
//! Each command runs as the leader of a fresh process group with stdin
//! closed. On deadline the whole group gets SIGTERM, then SIGKILL after the
//! grace period, so helpers forked by the candidate die with it.

use crate::config::types::{CommandSpec, ExecutionResult, Result, VerifyError};
use crate::utils::output::{OutputCollector, OutputLimits};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::ErrorKind;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What the runner did to stop a process group
#[derive(Clone, Debug, Default)]
pub struct KillReport {
    pub term_sent: bool,
    pub kill_sent: bool,
    pub waited_ms: u64,
    pub notes: Vec<String>,
}

/// Runs commands in their own process group with a wall-clock limit
#[derive(Clone, Debug)]
pub struct SandboxRunner {
    limits: OutputLimits,
    kill_grace: Duration,
}

impl Default for SandboxRunner {
    fn default() -> Self {
        Self::new(OutputLimits::default(), Duration::from_millis(200))
    }
}

impl SandboxRunner {
    pub fn new(limits: OutputLimits, kill_grace: Duration) -> Self {
        Self { limits, kill_grace }
    }

    pub fn kill_grace(&self) -> Duration {
        self.kill_grace
    }

    /// Execute `spec`, killing its process group once `timeout` elapses.
    pub fn execute(&self, spec: &CommandSpec, timeout: Duration) -> Result<ExecutionResult> {
        if spec.program.is_empty() {
            return Err(VerifyError::Process("empty command".to_string()));
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
        for (key, value) in &spec.environment {
            cmd.env(key, value);
        }
        if let Some(dir) = &spec.workdir {
            cmd.current_dir(dir);
        }

        log::debug!("Spawning `{}` (timeout {:?})", spec.display_argv(), timeout);
        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| spawn_error(&spec.program, e))?;

        let collector = OutputCollector::new(self.limits.clone());
        let pending = collector.start(child.stdout.take(), child.stderr.take());

        let (status, timed_out) = match self.wait_with_deadline(&mut child, timeout, started) {
            Ok(outcome) => outcome,
            Err(e) => {
                terminate_group(child.id(), Duration::ZERO);
                let _ = child.wait();
                return Err(e);
            }
        };
        let wall_clock_millis = started.elapsed().as_millis() as u64;

        // Leftover background members of the group would hold the pipes open.
        sweep_group(child.id());
        let output = pending.finish();

        Ok(ExecutionResult {
            stdout: output.stdout_lossy(),
            stderr: output.stderr_lossy(),
            exit_code: if timed_out { None } else { status.code() },
            signal: if timed_out { None } else { status.signal() },
            timed_out,
            wall_clock_millis,
            output_integrity: output.integrity,
        })
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        timeout: Duration,
        started: Instant,
    ) -> Result<(ExitStatus, bool)> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok((status, false)),
                Ok(None) if started.elapsed() >= timeout => {
                    let report = terminate_group(child.id(), self.kill_grace);
                    log::debug!(
                        "Process group {} timed out after {:?}: {:?}",
                        child.id(),
                        timeout,
                        report
                    );
                    let status = child
                        .wait()
                        .map_err(|e| VerifyError::Process(format!("wait after kill: {}", e)))?;
                    return Ok((status, true));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(VerifyError::Process(format!("wait: {}", e))),
            }
        }
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> VerifyError {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => VerifyError::RuntimeUnavailable {
            program: program.to_string(),
            reason: e.to_string(),
        },
        _ => VerifyError::Process(format!("spawn `{}`: {}", program, e)),
    }
}

/// SIGTERM the group, give it `grace` to exit, then SIGKILL whatever is left.
fn terminate_group(pgid: u32, grace: Duration) -> KillReport {
    let mut report = KillReport::default();
    let start = Instant::now();
    let group = Pid::from_raw(pgid as i32);

    match killpg(group, Signal::SIGTERM) {
        Ok(()) => report.term_sent = true,
        Err(Errno::ESRCH) => report.notes.push("group already gone at SIGTERM".to_string()),
        Err(e) => report.notes.push(format!("group SIGTERM failed: {}", e)),
    }

    std::thread::sleep(grace);

    match killpg(group, Signal::SIGKILL) {
        Ok(()) => report.kill_sent = true,
        Err(Errno::ESRCH) => {}
        Err(e) => report.notes.push(format!("group SIGKILL failed: {}", e)),
    }

    report.waited_ms = start.elapsed().as_millis() as u64;
    report
}

fn sweep_group(pgid: u32) {
    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) => log::debug!("Killed leftover members of process group {}", pgid),
        Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("Failed to sweep process group {}: {}", pgid, e),
    }
}
