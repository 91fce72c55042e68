// ABOUTME: Background listener that forwards SIGINT and SIGTERM to the running child.
// ABOUTME: Runs on its own task so the caller keeps waiting on the process normally.

use nix::sys::signal::Signal;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;

use super::ProcessRunner;

/// Spawn a task that forwards interrupt/terminate signals to `runner`'s child.
///
/// A signal that arrives while no child is running exits the process with the
/// conventional `128 + signo` status, since nothing else is listening for it.
pub fn forward_signals(runner: ProcessRunner) -> std::io::Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => Signal::SIGINT,
                Some(()) = terminate.recv() => Signal::SIGTERM,
                else => break,
            };

            match runner.signal(received) {
                Ok(true) => tracing::info!("{} forwarded to child process", received.as_str()),
                Ok(false) => std::process::exit(128 + received as i32),
                Err(e) => tracing::warn!("{e}"),
            }
        }
    }))
}
