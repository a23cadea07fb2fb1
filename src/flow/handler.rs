use super::configuration::FlowConfiguration;
use super::state::{EventSender, FlowEvent, FlowStateKind, Transition};
use crate::error::{FlowError, Result};
use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error};

/// The capability every flow state implementation provides.
///
/// A handler is entered once, then receives the events of the flow in the
/// order they were delivered until it returns a transition that moves the
/// flow elsewhere. Each handler declares its own legal successors; there is
/// no global transition table.
pub trait FlowStateHandler: Send {
    fn state(&self) -> FlowStateKind;

    /// Activates the handler. Asynchronous work must be spawned and report
    /// back through `events`; this method never blocks.
    fn enter(&mut self, configuration: &FlowConfiguration, events: &EventSender) -> Result<()>;

    fn handle_event(&mut self, _event: FlowEvent) -> Transition {
        Transition::Stay
    }

    fn is_terminal(&self) -> bool {
        false
    }

    /// States this handler may advance to.
    fn allowed_transitions(&self) -> &'static [FlowStateKind] {
        &[]
    }

    /// Releases pending asynchronous work. Safe to call more than once.
    fn cancel(&mut self) {}
}

/// Shared bookkeeping composed into the concrete handlers.
///
/// Enforces single entry, remembers whether a terminal transition was
/// returned and owns the handles of spawned work so it can be aborted.
#[derive(Debug)]
pub struct SimpleFlowStateHandler {
    kind: FlowStateKind,
    entered: bool,
    terminal: bool,
    pending: Vec<PendingWork>,
}

/// A spawned piece of work and the task watching it.
#[derive(Debug)]
struct PendingWork {
    work: AbortHandle,
    watcher: JoinHandle<()>,
}

impl PendingWork {
    fn is_finished(&self) -> bool {
        self.watcher.is_finished()
    }

    fn abort(&self) {
        self.work.abort();
        self.watcher.abort();
    }
}

impl SimpleFlowStateHandler {
    pub fn new(kind: FlowStateKind) -> Self {
        Self {
            kind,
            entered: false,
            terminal: false,
            pending: Vec::new(),
        }
    }

    pub fn kind(&self) -> FlowStateKind {
        self.kind
    }

    pub fn mark_entered(&mut self) -> Result<()> {
        if self.entered {
            return Err(FlowError::illegal_state(format!(
                "handler for state {} has already been entered",
                self.kind
            )));
        }
        self.entered = true;
        Ok(())
    }

    pub fn has_entered(&self) -> bool {
        self.entered
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Records `transition` as the handler's answer.
    ///
    /// Once a terminal transition went out every further answer is `Stay`.
    pub fn settle(&mut self, transition: Transition) -> Transition {
        if self.terminal {
            return Transition::Stay;
        }
        if transition.is_terminal() {
            self.terminal = true;
            self.release();
        }
        transition
    }

    /// Runs `task` on the current tokio runtime and keeps its handle.
    ///
    /// Should `task` panic, a [`FlowEvent::WorkFailed`] is sent on `events` so
    /// the flow fails instead of waiting for an answer that never comes.
    /// Aborted work stays silent.
    pub fn spawn<F>(&mut self, events: &EventSender, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| {
            FlowError::illegal_state(format!(
                "state {} needs a running tokio runtime to start its work",
                self.kind
            ))
        })?;
        self.pending.retain(|pending| !pending.is_finished());

        let work = runtime.spawn(task);
        let abort = work.abort_handle();
        let kind = self.kind;
        let events = events.clone();
        let watcher = runtime.spawn(async move {
            if let Err(join_error) = work.await
                && join_error.is_panic()
            {
                error!(state = %kind, "background work panicked");
                let error =
                    FlowError::illegal_state(format!("background work of state {kind} panicked"));
                if events.send(FlowEvent::WorkFailed { state: kind, error }).is_err() {
                    debug!(state = %kind, "panic reported after the flow went away");
                }
            }
        });
        self.pending.push(PendingWork {
            work: abort,
            watcher,
        });
        Ok(())
    }

    pub fn pending_tasks(&self) -> usize {
        self.pending.iter().filter(|pending| !pending.is_finished()).count()
    }

    pub fn release(&mut self) {
        for pending in self.pending.drain(..) {
            pending.abort();
        }
    }
}

impl Drop for SimpleFlowStateHandler {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::flow::state::FlowState;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[test]
    fn test_mark_entered_only_once() {
        let mut base = SimpleFlowStateHandler::new(FlowStateKind::MethodLoading);
        assert!(!base.has_entered());
        base.mark_entered().unwrap();
        assert!(base.has_entered());

        let err = base.mark_entered().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidState);
    }

    #[test]
    fn test_settle_tracks_terminal_transitions() {
        let mut base = SimpleFlowStateHandler::new(FlowStateKind::Confirmation);
        assert_eq!(base.settle(Transition::Stay), Transition::Stay);
        assert!(!base.is_terminal());

        assert_eq!(base.settle(Transition::Complete), Transition::Complete);
        assert!(base.is_terminal());

        // Nothing leaves a settled handler anymore.
        let after = base.settle(Transition::Advance(FlowState::MethodLoading));
        assert_eq!(after, Transition::Stay);
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let mut base = SimpleFlowStateHandler::new(FlowStateKind::MethodLoading);
        let (events, _received) = mpsc::unbounded_channel();
        let err = base.spawn(&events, async {}).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidState);
    }

    #[tokio::test]
    async fn test_release_aborts_pending_work() {
        let mut base = SimpleFlowStateHandler::new(FlowStateKind::MethodLoading);
        let (events, mut received) = mpsc::unbounded_channel();
        base.spawn(&events, tokio::time::sleep(Duration::from_secs(60))).unwrap();
        assert_eq!(base.pending_tasks(), 1);

        base.release();
        base.release();
        assert_eq!(base.pending_tasks(), 0);

        // Aborting is not a failure.
        drop(events);
        assert_eq!(received.recv().await, None);
    }

    #[tokio::test]
    async fn test_panicking_work_is_reported() {
        let mut base = SimpleFlowStateHandler::new(FlowStateKind::Confirmation);
        let (events, mut received) = mpsc::unbounded_channel();
        base.spawn(&events, async { panic!("api client bug") }).unwrap();

        match received.recv().await {
            Some(FlowEvent::WorkFailed { state, error }) => {
                assert_eq!(state, FlowStateKind::Confirmation);
                assert_eq!(error.category(), ErrorCategory::InvalidState);
                assert!(error.message().contains("confirmation"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
