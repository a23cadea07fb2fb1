//! Console adapters used by the command line driver.

use crate::domain::ports::{PaymentFlowContainer, PaymentFlowContainerFactory, PaymentFlowDelegate};
use crate::domain::view::PaymentView;
use crate::error::FlowError;
use crate::flow::state::FlowState;
use std::io::{self, Write};

/// Renders views as plain text on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleContainerFactory;

impl PaymentFlowContainerFactory for ConsoleContainerFactory {
    fn create(&self) -> Box<dyn PaymentFlowContainer> {
        Box::new(ConsoleContainer)
    }
}

#[derive(Debug)]
pub struct ConsoleContainer;

/// Text shown for `view`.
pub fn render(view: &PaymentView) -> String {
    match view {
        PaymentView::Loading { message } => format!("{message}..."),
        PaymentView::PaymentMethodList { methods } => {
            let mut text = String::from("Available payment methods:");
            for method in methods {
                text.push_str(&format!("\n  [{}] {}", method.id, method.name));
                if let Some(description) = &method.description {
                    text.push_str(&format!(" - {description}"));
                }
            }
            text
        }
        PaymentView::PaymentForm { method } => format!("Payment form for {}", method.name),
        PaymentView::Confirmation { method } => {
            format!("Confirming payment with {}...", method.name)
        }
        PaymentView::Success => "Payment completed".to_string(),
        PaymentView::Failure { error } => format!("Payment failed: {error}"),
    }
}

impl PaymentFlowContainer for ConsoleContainer {
    fn display(&mut self, view: PaymentView) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        // A closed stdout must not take the flow down with it.
        let _ = writeln!(out, "{}", render(&view));
    }
}

/// Reports lifecycle notifications on stderr.
#[derive(Debug, Default)]
pub struct ConsoleDelegate;

impl PaymentFlowDelegate for ConsoleDelegate {
    fn flow_started(&self) {
        eprintln!("flow started");
    }

    fn flow_state_changed(&self, state: &FlowState) {
        eprintln!("flow state: {}", state.kind());
    }

    fn flow_completed(&self) {
        eprintln!("flow completed");
    }

    fn flow_failed(&self, error: &FlowError) {
        eprintln!("flow failed [{}]: {}", error.code(), error);
    }

    fn flow_cancelled(&self) {
        eprintln!("flow cancelled");
    }
}
