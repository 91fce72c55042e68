// ABOUTME: LIFO stack of compensating actions run only when an operation fails.
// ABOUTME: The deploy orchestrator uses it to remove a service it created.

use futures::future::BoxFuture;
use std::future::Future;

use crate::diagnostics::{Diagnostics, Warning};

pub type UndoError = Box<dyn std::error::Error + Send + Sync>;

/// A deferred compensating action.
pub struct UndoAction<'a> {
    description: String,
    action: Box<dyn FnOnce() -> BoxFuture<'a, Result<(), UndoError>> + Send + 'a>,
}

impl<'a> UndoAction<'a> {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub async fn run(self) -> Result<(), UndoError> {
        (self.action)().await
    }
}

impl std::fmt::Debug for UndoAction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoAction")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Outcome of unwinding the stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndoReport {
    pub ran: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct UndoStack<'a> {
    actions: Vec<UndoAction<'a>>,
}

impl<'a> UndoStack<'a> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Push an action. Actions run in reverse push order.
    pub fn push<F, Fut, E>(&mut self, description: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
        E: Into<UndoError> + 'a,
    {
        self.actions.push(UndoAction {
            description: description.into(),
            action: Box::new(move || Box::pin(async move { action().await.map_err(Into::into) })),
        });
    }

    /// Remove and return the most recently pushed action without running it.
    pub fn pop(&mut self) -> Option<UndoAction<'a>> {
        self.actions.pop()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Unwind the stack if `err` is set; otherwise drop every action unrun.
    ///
    /// A failing action is recorded in `diag` and the remaining actions still run.
    pub async fn run_if_error<E>(self, err: Option<&E>, diag: &mut Diagnostics) -> UndoReport
    where
        E: std::fmt::Display + ?Sized,
    {
        let mut report = UndoReport::default();
        let Some(err) = err else {
            return report;
        };

        tracing::info!(actions = self.actions.len(), "rolling back after error: {err}");
        for action in self.actions.into_iter().rev() {
            let description = action.description.clone();
            report.ran += 1;
            if let Err(e) = action.run().await {
                report.failed += 1;
                diag.warn(Warning::undo_failure(format!("{description}: {e}")));
            } else {
                tracing::debug!("undo step completed: {description}");
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording_stack<'a>(log: &Arc<Mutex<Vec<u32>>>, ids: &[u32]) -> UndoStack<'a> {
        let mut stack = UndoStack::new();
        for &id in ids {
            let log = log.clone();
            stack.push(format!("step {id}"), move || async move {
                log.lock().push(id);
                Ok::<(), UndoError>(())
            });
        }
        stack
    }

    #[tokio::test]
    async fn no_error_runs_nothing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = recording_stack(&log, &[1, 2, 3]);
        let mut diag = Diagnostics::default();

        let report = stack.run_if_error::<str>(None, &mut diag).await;

        assert_eq!(report, UndoReport::default());
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn error_runs_actions_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = recording_stack(&log, &[1, 2, 3]);
        let mut diag = Diagnostics::default();

        let report = stack.run_if_error(Some("boom"), &mut diag).await;

        assert_eq!(report.ran, 3);
        assert_eq!(*log.lock(), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn failing_action_is_recorded_and_unwinding_continues() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = recording_stack(&log, &[1]);
        stack.push("delete service", || async {
            Err::<(), UndoError>("service busy".into())
        });
        let mut diag = Diagnostics::default();

        let report = stack.run_if_error(Some("boom"), &mut diag).await;

        assert_eq!(report, UndoReport { ran: 2, failed: 1 });
        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(diag.warnings().len(), 1);
        assert!(diag.warnings()[0].message.contains("delete service: service busy"));
    }

    #[tokio::test]
    async fn pop_removes_latest_action() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = recording_stack(&log, &[1, 2]);

        let popped = stack.pop().unwrap();
        assert_eq!(popped.description(), "step 2");
        assert_eq!(stack.len(), 1);
    }
}
