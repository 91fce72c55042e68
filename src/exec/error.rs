// ABOUTME: Subprocess error types with SNAFU pattern.
// ABOUTME: Distinguishes spawn failures, timeouts, signal termination, and non-zero exits.

use nix::sys::signal::Signal;
use snafu::Snafu;
use std::time::Duration;

/// Failure of a single subprocess run.
///
/// Display strings keep the words `killed` and `interrupt` so callers that only
/// see the rendered message can still tell a Ctrl-C apart from a real failure.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProcessError {
    #[snafu(display("failed to start '{program}': {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display(
        "error during execution process (killed: exceeded timeout of {}s)",
        timeout.as_secs()
    ))]
    Timeout { program: String, timeout: Duration },

    #[snafu(display(
        "error during execution process ({}: {})",
        signal_word(*signal),
        signal.as_str()
    ))]
    Signalled { program: String, signal: Signal },

    #[snafu(display("error during execution process (exit code: {code})"))]
    NonZeroExit { program: String, code: i32 },

    #[snafu(display("failed while waiting for '{program}': {source}"))]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("failed to deliver {} to child process: {source}", signal.as_str()))]
    Deliver {
        signal: Signal,
        source: nix::errno::Errno,
    },
}

fn signal_word(signal: Signal) -> &'static str {
    if signal == Signal::SIGINT {
        "interrupt"
    } else {
        "killed"
    }
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessErrorKind {
    /// The program could not be started at all.
    Spawn,
    /// The deadline passed before the process exited.
    Timeout,
    /// The process was terminated by a delivered signal.
    Signalled,
    /// The process ran and exited unsuccessfully.
    NonZeroExit,
    /// Waiting on or signalling the child failed.
    Io,
}

impl ProcessError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ProcessErrorKind {
        match self {
            ProcessError::Spawn { .. } => ProcessErrorKind::Spawn,
            ProcessError::Timeout { .. } => ProcessErrorKind::Timeout,
            ProcessError::Signalled { .. } => ProcessErrorKind::Signalled,
            ProcessError::NonZeroExit { .. } => ProcessErrorKind::NonZeroExit,
            ProcessError::Wait { .. } | ProcessError::Deliver { .. } => ProcessErrorKind::Io,
        }
    }

    /// True when the child stopped because the user interrupted it.
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            ProcessError::Signalled {
                signal: Signal::SIGINT,
                ..
            }
        )
    }

    /// Exit code of the child, when it exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}
