use crate::domain::ports::PaymentFlowContainer;
use crate::error::{FlowError, Result};
use crate::flow::configuration::FlowConfiguration;
use crate::flow::handler::FlowStateHandler;
use crate::flow::handlers::handler_for;
use crate::flow::state::{
    EventReceiver, EventSender, FlowEvent, FlowOutcome, FlowState, Transition,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Drives one payment flow from method loading to completion or failure.
///
/// `FlowCoordinator` owns the active handler and the event channel. Events
/// are processed one at a time in the order they were delivered, whether
/// they come from a handler's asynchronous work or from the host through
/// [`FlowCoordinator::events`].
pub struct FlowCoordinator {
    configuration: FlowConfiguration,
    events_tx: EventSender,
    events_rx: EventReceiver,
    container: Box<dyn PaymentFlowContainer>,
    state: FlowState,
    handler: Option<Box<dyn FlowStateHandler>>,
    started: bool,
    outcome: Option<FlowOutcome>,
}

impl FlowCoordinator {
    /// Creates a coordinator for `configuration`.
    ///
    /// The container for the flow's views is created right away; nothing else
    /// happens until [`FlowCoordinator::start`].
    pub fn new(configuration: FlowConfiguration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let container = configuration.container_factory().create();
        Self {
            configuration,
            events_tx,
            events_rx,
            container,
            state: FlowState::MethodLoading,
            handler: None,
            started: false,
            outcome: None,
        }
    }

    /// A sender the host uses to feed user input into the flow.
    pub fn events(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn configuration(&self) -> &FlowConfiguration {
        &self.configuration
    }

    pub fn current_state(&self) -> &FlowState {
        &self.state
    }

    pub fn outcome(&self) -> Option<&FlowOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Notifies the delegate and enters the start state.
    ///
    /// Must run inside a tokio runtime since handlers spawn their work on it.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(FlowError::illegal_state("the flow has already been started"));
        }
        self.started = true;

        info!(space_id = self.configuration.api_client().space_id(), "payment flow started");
        if let Some(delegate) = self.configuration.delegate() {
            delegate.flow_started();
        }
        self.activate(FlowState::MethodLoading);
        Ok(())
    }

    /// Waits for the next event and processes it.
    ///
    /// Returns the outcome once the flow has finished.
    pub async fn step(&mut self) -> Result<Option<FlowOutcome>> {
        if !self.started {
            return Err(FlowError::illegal_state("the flow has not been started"));
        }
        if self.outcome.is_none() {
            // The coordinator holds a sender itself, so the channel never closes.
            if let Some(event) = self.events_rx.recv().await {
                self.dispatch(event);
            }
        }
        Ok(self.outcome.clone())
    }

    /// Starts the flow if necessary and processes events until it finishes.
    pub async fn run(&mut self) -> Result<FlowOutcome> {
        if !self.started {
            self.start()?;
        }
        loop {
            if let Some(outcome) = self.step().await? {
                return Ok(outcome);
            }
        }
    }

    /// Tears the flow down on behalf of the host. Has no effect once finished.
    pub fn cancel(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        info!(state = %self.state.kind(), "payment flow cancelled");
        self.teardown();
        self.outcome = Some(FlowOutcome::Cancelled);
        if let Some(delegate) = self.configuration.delegate() {
            delegate.flow_cancelled();
        }
    }

    fn dispatch(&mut self, event: FlowEvent) {
        let event = match event {
            FlowEvent::Cancel => {
                self.cancel();
                return;
            }
            FlowEvent::WorkFailed { state, error } => {
                if state == self.state.kind() {
                    self.fail(error);
                } else {
                    debug!(%state, "failure of a previous state dropped");
                }
                return;
            }
            event => event,
        };
        let Some(handler) = self.handler.as_mut() else {
            debug!(?event, "no active handler, event dropped");
            return;
        };

        let allowed = handler.allowed_transitions();
        let transition = handler.handle_event(event);
        match transition {
            Transition::Stay => {}
            Transition::Advance(next) => {
                if allowed.contains(&next.kind()) {
                    info!(from = %self.state.kind(), to = %next.kind(), "advancing flow");
                    self.teardown();
                    self.activate(next);
                } else {
                    warn!(from = %self.state.kind(), to = %next.kind(), "undeclared transition");
                    self.fail(FlowError::illegal_state(format!(
                        "state {} may not advance to {}",
                        self.state.kind(),
                        next.kind()
                    )));
                }
            }
            Transition::Fail(error) => self.fail(error),
            Transition::Complete => self.complete(),
        }
    }

    fn activate(&mut self, state: FlowState) {
        let Some(mut handler) = handler_for(&state) else {
            self.fail(FlowError::illegal_state(format!(
                "state {} cannot be entered",
                state.kind()
            )));
            return;
        };

        self.state = state;
        let view = self.configuration.view_factory().build_state_view(&self.state);
        self.container.display(view);
        if let Some(delegate) = self.configuration.delegate() {
            delegate.flow_state_changed(&self.state);
        }

        match handler.enter(&self.configuration, &self.events_tx) {
            Ok(()) => self.handler = Some(handler),
            Err(error) => self.fail(error),
        }
    }

    fn fail(&mut self, error: FlowError) {
        if self.outcome.is_some() {
            return;
        }
        warn!(state = %self.state.kind(), error = %error, "payment flow failed");
        self.teardown();
        self.state = FlowState::Failed;
        let view = self.configuration.view_factory().build_failure_view(&error);
        self.container.display(view);
        if let Some(delegate) = self.configuration.delegate() {
            delegate.flow_failed(&error);
        }
        self.outcome = Some(FlowOutcome::Failed(error));
    }

    fn complete(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        info!("payment flow completed");
        self.teardown();
        self.state = FlowState::Completed;
        let view = self.configuration.view_factory().build_state_view(&self.state);
        self.container.display(view);
        if let Some(delegate) = self.configuration.delegate() {
            delegate.flow_completed();
        }
        self.outcome = Some(FlowOutcome::Completed);
    }

    fn teardown(&mut self) {
        if let Some(mut handler) = self.handler.take() {
            handler.cancel();
        }
    }
}

impl Drop for FlowCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
