//! # Run a single attempt of a program and report its lifecycle.
//!
//! One [`ProcessRunner`] lives for exactly one child process attempt. A
//! restart is a fresh runner sharing the same [`Bus`].
//!
//! ## Event flow
//! ```text
//! [backoff sleep]            (restarts only; cancellable)
//! spawn ──Err──► log + Exited(127, reason)
//!   │
//!   Ok ──► Starting(pid)
//!          ├─ relay stdout ─► "[key]: line" on stderr   (own task)
//!          ├─ relay stderr ─► "[key]: line" on stderr   (own task)
//!          │
//!          select (biased):
//!            child exits      ──► Exited(code)
//!            grace elapses    ──► Running(pid), keep waiting   (only if grace > 0)
//!            token cancelled  ──► kill child, keep waiting
//! ```
//!
//! ## Rules
//! - Exactly one `Exited` per runner, always last.
//! - `Running` is never sent after the child exited: the grace timer lives
//!   in the same `select!` as `wait()` and is dropped with it.
//! - `grace == 0` never produces `Running`.
//! - A kill request suppresses a pending `Running`.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::SpawnError;
use crate::events::{Bus, Event, EventKind};
use crate::programs::ProgramSpec;

/// Exit code reported when the OS refuses to spawn the command.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Exit code reported when an attempt was cancelled before it spawned or
/// the exit status could not be collected.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// How long output relays may keep draining after the child exited.
const RELAY_DRAIN: Duration = Duration::from_secs(1);

/// One launch of one program.
pub struct ProcessRunner {
    /// Program to run.
    pub spec: Arc<ProgramSpec>,
    /// 1-based attempt number for this program.
    pub attempt: u32,
    /// Wait before spawning (restart backoff).
    pub delay: Duration,
    /// Interpreter prefix, e.g. `["sh", "-c"]`.
    pub shell: Arc<[String]>,
    /// Event channel to the orchestrator.
    pub bus: Bus,
}

impl ProcessRunner {
    /// Runs the attempt to completion. Always ends by publishing `Exited`.
    pub async fn run(self, token: CancellationToken) {
        if !self.delay.is_zero() {
            select! {
                _ = time::sleep(self.delay) => {}
                _ = token.cancelled() => {
                    self.publish_exit(UNKNOWN_EXIT_CODE, Some("cancelled before spawn"))
                        .await;
                    return;
                }
            }
        }

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!(program = %self.spec.key(), label = err.as_label(), "{err}");
                self.publish_exit(SPAWN_FAILURE_EXIT_CODE, Some(&err.to_string()))
                    .await;
                return;
            }
        };

        let pid = child.id();
        debug!(program = %self.spec.key(), attempt = self.attempt, ?pid, "spawned");
        if !self.publish(EventKind::Starting, pid).await {
            debug!(program = %self.spec.key(), "orchestrator gone, dropping child");
            return;
        }

        let key = self.spec.key_arc();
        let relays = [
            spawn_relay(child.stdout.take(), Arc::clone(key)),
            spawn_relay(child.stderr.take(), Arc::clone(key)),
        ];

        let (code, reason) = match self.supervise(&mut child, pid, &token).await {
            Ok(status) => (exit_code(status), None),
            Err(e) => (UNKNOWN_EXIT_CODE, Some(format!("wait failed: {e}"))),
        };
        self.publish_exit(code, reason.as_deref()).await;

        for mut relay in relays {
            if time::timeout(RELAY_DRAIN, &mut relay).await.is_err() {
                relay.abort();
            }
        }
    }

    /// Waits for the child, emitting `Running` once the grace period passes
    /// and killing it on cancellation.
    async fn supervise(
        &self,
        child: &mut Child,
        pid: Option<u32>,
        token: &CancellationToken,
    ) -> io::Result<ExitStatus> {
        let grace = self.spec.grace();
        let timer = time::sleep(grace);
        tokio::pin!(timer);
        let mut promoted = grace.is_zero();
        let mut killing = false;

        loop {
            select! {
                biased;
                status = child.wait() => return status,
                _ = token.cancelled(), if !killing => {
                    killing = true;
                    debug!(program = %self.spec.key(), "killing on shutdown");
                    if let Err(e) = child.start_kill() {
                        debug!(program = %self.spec.key(), "kill failed: {e}");
                    }
                }
                _ = &mut timer, if !promoted && !killing => {
                    promoted = true;
                    self.publish(EventKind::Running, pid).await;
                }
            }
        }
    }

    fn spawn(&self) -> Result<Child, SpawnError> {
        let Some((program, prefix)) = self.shell.split_first() else {
            return Err(SpawnError {
                program: self.spec.key().to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty shell"),
            });
        };

        Command::new(program)
            .args(prefix)
            .arg(self.spec.command())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError {
                program: self.spec.key().to_string(),
                source,
            })
    }

    async fn publish(&self, kind: EventKind, pid: Option<u32>) -> bool {
        self.bus
            .publish(
                Event::new(kind)
                    .with_program(Arc::clone(self.spec.key_arc()))
                    .with_pid(pid)
                    .with_attempt(self.attempt),
            )
            .await
    }

    async fn publish_exit(&self, code: i32, reason: Option<&str>) {
        let mut ev = Event::new(EventKind::Exited)
            .with_program(Arc::clone(self.spec.key_arc()))
            .with_exit_code(code)
            .with_attempt(self.attempt);
        if let Some(r) = reason {
            ev = ev.with_reason(r);
        }
        self.bus.publish(ev).await;
    }
}

/// Relays each line of `stream` to stderr as `[key]: line`.
fn spawn_relay(
    stream: Option<impl AsyncRead + Unpin + Send + 'static>,
    key: Arc<str>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(stream) = stream else { return };
        if let Err(e) = relay_lines(stream, &key, tokio::io::stderr()).await {
            debug!(program = %key, "output relay stopped: {e}");
        }
    })
}

/// Copies `reader` to `out` line by line, each prefixed with `[key]: `.
///
/// Bytes are decoded lossily and a missing final newline is added, so the
/// reader is drained until EOF whatever the child writes. Write errors on
/// `out` drop the line but keep draining; only a read error stops the loop.
async fn relay_lines<R, W>(reader: R, key: &str, mut out: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut line = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let text = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let text = text.strip_suffix(b"\r").unwrap_or(text);

        line.clear();
        line.extend_from_slice(format!("[{key}]: ").as_bytes());
        line.extend_from_slice(String::from_utf8_lossy(text).as_bytes());
        line.push(b'\n');
        if out.write_all(&line).await.is_ok() {
            let _ = out.flush().await;
        }
    }
}

/// Exit code, or `128 + signal` for signal-terminated children on unix.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    UNKNOWN_EXIT_CODE
}
