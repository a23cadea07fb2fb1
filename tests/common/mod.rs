#![allow(dead_code)]

use chrono::{Duration, Utc};
use payflow::domain::credentials::{Credentials, CredentialsProvider};
use payflow::domain::payment_method::PaymentMethodConfiguration;
use payflow::domain::ports::PaymentFlowDelegate;
use payflow::domain::transaction::{TransactionState, TransactionSummary};
use payflow::error::FlowError;
use payflow::flow::state::FlowState;
use payflow::infrastructure::in_memory::StaticCredentialsFetcher;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const SPACE_ID: u64 = 42;
pub const TRANSACTION_ID: u64 = 1001;

pub fn provider(space_id: u64) -> CredentialsProvider {
    let credentials = Credentials::new(
        SPACE_ID,
        TRANSACTION_ID,
        "test-token",
        Utc::now() + Duration::hours(1),
    )
    .unwrap();
    CredentialsProvider::new(space_id, Arc::new(StaticCredentialsFetcher::new(credentials)))
}

pub fn method(id: u64, name: &str, sort_order: i32) -> PaymentMethodConfiguration {
    PaymentMethodConfiguration {
        id,
        space_id: SPACE_ID,
        name: name.to_string(),
        description: None,
        image_resource_path: None,
        sort_order,
    }
}

pub fn transaction(state: TransactionState) -> TransactionSummary {
    TransactionSummary {
        id: TRANSACTION_ID,
        state,
        authorization_amount: dec!(49.90),
        currency: "CHF".to_string(),
    }
}

/// Records every lifecycle notification as a short string.
#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<String>>,
}

impl RecordingDelegate {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl PaymentFlowDelegate for RecordingDelegate {
    fn flow_started(&self) {
        self.record("started".to_string());
    }

    fn flow_state_changed(&self, state: &FlowState) {
        self.record(format!("state:{}", state.kind()));
    }

    fn flow_completed(&self) {
        self.record("completed".to_string());
    }

    fn flow_failed(&self, error: &FlowError) {
        self.record(format!("failed:{}", error.code()));
    }

    fn flow_cancelled(&self) {
        self.record("cancelled".to_string());
    }
}

pub fn write_methods_csv(path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["id", "name", "description", "sort_order"])?;
    wtr.write_record(["7", "Visa", "Credit card", "2"])?;
    wtr.write_record(["3", "TWINT", "", "1"])?;

    wtr.flush()?;
    Ok(())
}
