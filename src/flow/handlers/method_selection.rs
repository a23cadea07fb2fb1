use crate::domain::payment_method::PaymentMethodConfiguration;
use crate::error::Result;
use crate::flow::configuration::FlowConfiguration;
use crate::flow::handler::{FlowStateHandler, SimpleFlowStateHandler};
use crate::flow::state::{EventSender, FlowEvent, FlowState, FlowStateKind, Transition};
use tracing::{debug, warn};

/// Waits for the buyer to pick one of the loaded payment methods.
///
/// Icons of the offered methods are prefetched in the background while the
/// selection is pending.
pub struct PaymentMethodSelectionStateHandler {
    base: SimpleFlowStateHandler,
    methods: Vec<PaymentMethodConfiguration>,
}

impl PaymentMethodSelectionStateHandler {
    pub fn new(methods: Vec<PaymentMethodConfiguration>) -> Self {
        Self {
            base: SimpleFlowStateHandler::new(FlowStateKind::MethodSelection),
            methods,
        }
    }

    pub fn methods(&self) -> &[PaymentMethodConfiguration] {
        &self.methods
    }
}

impl FlowStateHandler for PaymentMethodSelectionStateHandler {
    fn state(&self) -> FlowStateKind {
        self.base.kind()
    }

    fn enter(&mut self, configuration: &FlowConfiguration, events: &EventSender) -> Result<()> {
        self.base.mark_entered()?;
        let with_icons: Vec<PaymentMethodConfiguration> = self
            .methods
            .iter()
            .filter(|method| method.image_resource_path.is_some())
            .cloned()
            .collect();
        if with_icons.is_empty() {
            return Ok(());
        }

        let icon_cache = configuration.icon_cache().clone();
        self.base.spawn(events, async move {
            for method in &with_icons {
                match icon_cache.fetch(method).await {
                    Ok(_) => debug!(method_id = method.id, "icon prefetched"),
                    Err(err) => warn!(method_id = method.id, error = %err, "icon prefetch failed"),
                }
            }
        })
    }

    fn handle_event(&mut self, event: FlowEvent) -> Transition {
        let transition = match event {
            FlowEvent::PaymentMethodSelected(id) => {
                match self.methods.iter().find(|method| method.id == id) {
                    Some(method) => Transition::Advance(FlowState::DataCollection {
                        method: method.clone(),
                    }),
                    None => {
                        warn!(method_id = id, "selected payment method is not offered");
                        Transition::Stay
                    }
                }
            }
            _ => Transition::Stay,
        };
        self.base.settle(transition)
    }

    fn is_terminal(&self) -> bool {
        self.base.is_terminal()
    }

    fn allowed_transitions(&self) -> &'static [FlowStateKind] {
        &[FlowStateKind::DataCollection]
    }

    fn cancel(&mut self) {
        self.base.release();
    }
}
