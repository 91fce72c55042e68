// ABOUTME: Subprocess execution with buffered combined output, timeouts, and signals.
// ABOUTME: Toolchains run build scripts and version queries through ProcessRunner.

mod error;
mod signal;

pub use error::{ProcessError, ProcessErrorKind};
pub use signal::forward_signals;

use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use parking_lot::Mutex;
use snafu::ResultExt;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use error::{DeliverSnafu, SpawnSnafu, WaitSnafu};

/// Description of a process to run.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    /// Emit the captured output even when the process succeeds.
    pub verbose: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Run `script` through `sh -c`.
    pub fn shell(script: &str) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Overlay `KEY=VALUE` pairs on the inherited environment.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// A zero duration means no timeout.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Human-readable rendering of the command line.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Combined stdout/stderr of a finished process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub output: String,
}

/// Runs subprocesses and tracks the live child so signals can be forwarded to it.
///
/// Clones share the tracked child, so a clone handed to [`forward_signals`]
/// reaches whatever process the original is currently running.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    child: Arc<Mutex<Option<Pid>>>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a process to completion, buffering its combined output.
    ///
    /// On failure the buffer is always written to `sink` before the error is
    /// returned. On success it is written only when `spec.verbose` is set.
    pub async fn run<W>(&self, spec: &CommandSpec, sink: &mut W) -> Result<ProcessOutput, ProcessError>
    where
        W: Write + Send + ?Sized,
    {
        tracing::debug!(program = %spec.program, args = ?spec.args, "spawning process");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // own process group so a timeout or forwarded signal reaches grandchildren
            .process_group(0)
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().context(SpawnSnafu {
            program: spec.program.clone(),
        })?;
        let pid = child
            .id()
            .and_then(|id| i32::try_from(id).ok())
            .map(Pid::from_raw);
        *self.child.lock() = pid;

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let stdout_task = child.stdout.take().map(|s| collect_lines(s, buffer.clone()));
        let stderr_task = child.stderr.take().map(|s| collect_lines(s, buffer.clone()));

        let waited = match spec.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => Some(status),
                Err(_) => {
                    tracing::debug!(program = %spec.program, ?limit, "process timed out");
                    if let Some(pid) = pid {
                        let _ = killpg(pid, Signal::SIGKILL);
                    }
                    let _ = child.kill().await;
                    None
                }
            },
            None => Some(child.wait().await),
        };
        self.child.lock().take();

        for task in [stdout_task, stderr_task].into_iter().flatten() {
            let _ = task.await;
        }
        let captured = std::mem::take(&mut *buffer.lock());

        let result = match waited {
            None => Err(ProcessError::Timeout {
                program: spec.program.clone(),
                timeout: spec.timeout.unwrap_or_default(),
            }),
            Some(Err(source)) => Err::<(), _>(source).context(WaitSnafu {
                program: spec.program.clone(),
            }),
            Some(Ok(status)) if status.success() => Ok(()),
            Some(Ok(status)) => match status.signal() {
                Some(raw) => Err(ProcessError::Signalled {
                    program: spec.program.clone(),
                    signal: Signal::try_from(raw).unwrap_or(Signal::SIGKILL),
                }),
                None => Err(ProcessError::NonZeroExit {
                    program: spec.program.clone(),
                    code: status.code().unwrap_or(-1),
                }),
            },
        };

        if result.is_err() || spec.verbose {
            let _ = sink.write_all(&captured);
            let _ = sink.flush();
        }

        result.map(|()| ProcessOutput {
            output: String::from_utf8_lossy(&captured).into_owned(),
        })
    }

    /// Forward `signal` to the live child, if any.
    ///
    /// Returns `Ok(false)` when no child is running.
    pub fn signal(&self, signal: Signal) -> Result<bool, ProcessError> {
        let Some(pid) = *self.child.lock() else {
            return Ok(false);
        };
        tracing::debug!(%pid, signal = signal.as_str(), "forwarding signal to child");
        killpg(pid, signal).context(DeliverSnafu { signal })?;
        Ok(true)
    }

    /// True while a child started by this runner is still being waited on.
    pub fn is_running(&self) -> bool {
        self.child.lock().is_some()
    }
}

fn collect_lines<R>(reader: R, buffer: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        // output is not required to be UTF-8
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => buffer.lock().extend_from_slice(&line),
                Err(e) => {
                    tracing::debug!("stopped reading process output: {e}");
                    break;
                }
            }
        }
    })
}
