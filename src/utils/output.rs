//! Bounded stdout/stderr collection for harness processes
//!
//! Reader threads are started right after spawn so a chatty child can never
//! block on a full pipe while the runner waits for it. Bytes past the limit
//! are drained and discarded.

use crate::config::types::OutputIntegrity;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::io::Read;
use std::thread;
use std::time::{Duration, Instant};

/// Output limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLimits {
    /// Per-stream stdout limit (bytes)
    pub stdout_limit: usize,
    /// Per-stream stderr limit (bytes)
    pub stderr_limit: usize,
    /// How long to wait for readers after the process is gone (milliseconds)
    pub collection_timeout_ms: u64,
}

impl Default for OutputLimits {
    fn default() -> Self {
        OutputLimits {
            stdout_limit: 8 * 1024 * 1024,
            stderr_limit: 1024 * 1024,
            collection_timeout_ms: 2000,
        }
    }
}

/// Output collection result
#[derive(Debug, Clone, Default)]
pub struct OutputResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub integrity: OutputIntegrity,
}

impl OutputResult {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

type StreamMessage = (Vec<u8>, OutputIntegrity);

/// Output collector with bounded collection
pub struct OutputCollector {
    limits: OutputLimits,
}

/// Reader threads in flight for one process
pub struct PendingOutput {
    stdout: Option<Receiver<StreamMessage>>,
    stderr: Option<Receiver<StreamMessage>>,
    collection_timeout: Duration,
}

impl OutputCollector {
    pub fn new(limits: OutputLimits) -> Self {
        OutputCollector { limits }
    }

    pub fn limits(&self) -> &OutputLimits {
        &self.limits
    }

    /// Start one reader thread per present stream.
    pub fn start<O, E>(&self, stdout: Option<O>, stderr: Option<E>) -> PendingOutput
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        PendingOutput {
            stdout: stdout.map(|s| spawn_reader(s, self.limits.stdout_limit)),
            stderr: stderr.map(|s| spawn_reader(s, self.limits.stderr_limit)),
            collection_timeout: Duration::from_millis(self.limits.collection_timeout_ms),
        }
    }
}

impl PendingOutput {
    /// Wait for both readers, sharing a single collection deadline.
    ///
    /// A reader that misses the deadline (a grandchild still holding the
    /// pipe open, for example) is abandoned and its stream reported empty.
    pub fn finish(self) -> OutputResult {
        let deadline = Instant::now() + self.collection_timeout;
        let (stdout, out_integrity) = receive_until(self.stdout, deadline);
        let (stderr, err_integrity) = receive_until(self.stderr, deadline);

        OutputResult {
            stdout,
            stderr,
            integrity: combine(out_integrity, err_integrity),
        }
    }
}

fn combine(a: OutputIntegrity, b: OutputIntegrity) -> OutputIntegrity {
    use OutputIntegrity::*;
    match (a, b) {
        (CollectionTimedOut, _) | (_, CollectionTimedOut) => CollectionTimedOut,
        (TruncatedByLimit, _) | (_, TruncatedByLimit) => TruncatedByLimit,
        _ => Complete,
    }
}

fn receive_until(rx: Option<Receiver<StreamMessage>>, deadline: Instant) -> StreamMessage {
    let Some(rx) = rx else {
        return (Vec::new(), OutputIntegrity::Complete);
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(message) => message,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("Output reader did not finish within collection timeout");
            (Vec::new(), OutputIntegrity::CollectionTimedOut)
        }
        Err(RecvTimeoutError::Disconnected) => {
            log::warn!("Output reader exited without reporting");
            (Vec::new(), OutputIntegrity::CollectionTimedOut)
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, limit: usize) -> Receiver<StreamMessage> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let _ = tx.send(collect_stream(stream, limit));
    });
    rx
}

/// Collect from a single stream with limit
fn collect_stream<R: Read>(mut stream: R, limit: usize) -> StreamMessage {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut integrity = OutputIntegrity::Complete;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buffer.len());
                if n > room {
                    buffer.extend_from_slice(&chunk[..room]);
                    integrity = OutputIntegrity::TruncatedByLimit;
                } else {
                    buffer.extend_from_slice(&chunk[..n]);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Output stream read failed: {}", e);
                break;
            }
        }
    }

    (buffer, integrity)
}
