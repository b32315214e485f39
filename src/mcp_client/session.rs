//! One-shot child process session.
//!
//! Spawns the tool server, feeds it a single request line, and captures
//! stdout/stderr until it exits or the time budget runs out. The child never
//! outlives the session: every exit path either observes its exit status or
//! kills and reaps it, and `kill_on_drop` covers cancellation of the session
//! future itself.

use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::errors::McpError;
use super::types::{CapturedOutput, LaunchSpec};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Default budget for the whole exchange (write + wait).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(60);

/// How long to wait for the capture tasks to hit EOF after the child exits.
///
/// A grandchild that inherited the pipes can keep them open indefinitely.
/// Never extends past the session deadline.
const CAPTURE_DRAIN_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 4096;

// ─── Capture Buffers ─────────────────────────────────────────────────────────

/// Byte buffer shared between a capture task and the session.
#[derive(Clone, Default)]
struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    fn append(&self, bytes: &[u8]) {
        let mut buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buf.extend_from_slice(bytes);
    }

    fn snapshot(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Drain `stream` into `buffer` until EOF or a read error.
fn spawn_capture<R>(stream: R, buffer: CaptureBuffer, label: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut stream = stream;
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer.append(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(stream = label, error = %e, "capture read failed");
                    break;
                }
            }
        }
    })
}

/// Both capture tasks for one child.
struct Captures {
    stdout: CaptureBuffer,
    stderr: CaptureBuffer,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

impl Captures {
    /// Wait for both streams to reach EOF, at most until the grace period or
    /// `deadline` runs out, whichever comes first.
    async fn drain(&mut self, deadline: Instant) {
        let limit = deadline.min(Instant::now() + CAPTURE_DRAIN_GRACE);
        let both = async {
            let _ = tokio::join!(&mut self.stdout_task, &mut self.stderr_task);
        };
        if tokio::time::timeout_at(limit, both).await.is_err() {
            tracing::warn!("output pipe still open after child exit; keeping partial capture");
        }
    }

    fn stop(&self) {
        self.stdout_task.abort();
        self.stderr_task.abort();
    }
}

// ─── ProcessSession ──────────────────────────────────────────────────────────

/// Runs one child process for exactly one request/response exchange.
#[derive(Debug, Clone)]
pub struct ProcessSession {
    launch: LaunchSpec,
    timeout: Duration,
}

impl ProcessSession {
    pub fn new(launch: LaunchSpec) -> Self {
        Self {
            launch,
            timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Launch the child, send `request_line`, and capture everything it says.
    ///
    /// A timeout is reported through `CapturedOutput::timed_out`, not as an
    /// error. Errors are reserved for launch and stdin failures.
    pub async fn run(&self, request_line: &str) -> Result<CapturedOutput, McpError> {
        let deadline = Instant::now() + self.timeout;
        let mut child = self.spawn()?;

        tracing::debug!(
            program = %self.launch.program,
            pid = ?child.id(),
            "tool server spawned"
        );

        let Some(stdin) = child.stdin.take() else {
            terminate(&mut child).await;
            return Err(McpError::LaunchFailure {
                reason: "failed to capture stdin".into(),
            });
        };
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            terminate(&mut child).await;
            return Err(McpError::LaunchFailure {
                reason: "failed to capture stdout/stderr".into(),
            });
        };

        let stdout_buf = CaptureBuffer::default();
        let stderr_buf = CaptureBuffer::default();
        let mut captures = Captures {
            stdout_task: spawn_capture(stdout, stdout_buf.clone(), "stdout"),
            stderr_task: spawn_capture(stderr, stderr_buf.clone(), "stderr"),
            stdout: stdout_buf,
            stderr: stderr_buf,
        };

        let exchange = async {
            write_request(stdin, request_line).await?;
            child.wait().await.map_err(|e| McpError::LaunchFailure {
                reason: format!("failed to wait for server process: {e}"),
            })
        };

        match tokio::time::timeout_at(deadline, exchange).await {
            Ok(Ok(status)) => {
                captures.drain(deadline).await;
                captures.stop();
                let captured = CapturedOutput {
                    stdout: captures.stdout.snapshot(),
                    stderr: captures.stderr.snapshot(),
                    exit_code: status.code(),
                    timed_out: false,
                };
                tracing::debug!(
                    exit_code = ?captured.exit_code,
                    succeeded = captured.succeeded(),
                    stdout_bytes = captured.stdout.len(),
                    stderr_bytes = captured.stderr.len(),
                    "tool server exited"
                );
                Ok(captured)
            }
            Ok(Err(e)) => {
                terminate(&mut child).await;
                captures.stop();
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "tool server timed out; killing"
                );
                terminate(&mut child).await;
                captures.stop();
                Ok(CapturedOutput {
                    stdout: captures.stdout.snapshot(),
                    stderr: captures.stderr.snapshot(),
                    exit_code: None,
                    timed_out: true,
                })
            }
        }
    }

    fn spawn(&self) -> Result<Child, McpError> {
        let mut cmd = Command::new(&self.launch.program);
        cmd.args(&self.launch.args);

        for (key, value) in &self.launch.env {
            cmd.env(key, value.expose());
        }

        // Windows: prevent console window from appearing for child processes
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        cmd.spawn().map_err(|e| McpError::LaunchFailure {
            reason: format!("failed to spawn '{}': {e}", self.launch.program),
        })
    }
}

/// Write the request, then close stdin so the server sees EOF.
async fn write_request(mut stdin: ChildStdin, request_line: &str) -> Result<(), McpError> {
    let written = async {
        stdin.write_all(request_line.as_bytes()).await?;
        stdin.flush().await
    }
    .await;

    match written {
        Ok(()) => Ok(()),
        // The server exited without reading; its exit status tells the story.
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("tool server closed stdin before reading the request");
            Ok(())
        }
        Err(e) => Err(McpError::LaunchFailure {
            reason: format!("failed to write request to stdin: {e}"),
        }),
    }
}

/// Kill the child (best effort) and reap it.
async fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "kill failed (process may have already exited)");
    }
    if let Err(e) = child.wait().await {
        tracing::warn!(error = %e, "failed to reap tool server process");
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
