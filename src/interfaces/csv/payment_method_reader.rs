use crate::domain::payment_method::PaymentMethodConfiguration;
use crate::error::{FlowError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct PaymentMethodRecord {
    id: u64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sort_order: i32,
    #[serde(default)]
    image_resource_path: Option<String>,
}

/// Reads payment method fixtures from a CSV source.
///
/// Expected header: `id, name, description, sort_order, image_resource_path`;
/// everything after `name` may be left empty. Whitespace is trimmed and
/// short records are accepted.
pub struct PaymentMethodReader<R: Read> {
    reader: csv::Reader<R>,
    space_id: u64,
}

impl<R: Read> PaymentMethodReader<R> {
    /// Creates a reader whose methods are attributed to `space_id`.
    pub fn new(source: R, space_id: u64) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader, space_id }
    }

    /// Lazily reads and converts the records.
    pub fn payment_methods(self) -> impl Iterator<Item = Result<PaymentMethodConfiguration>> {
        let space_id = self.space_id;
        self.reader
            .into_deserialize::<PaymentMethodRecord>()
            .map(move |result| {
                let record = result.map_err(FlowError::from)?;
                Ok(PaymentMethodConfiguration {
                    id: record.id,
                    space_id,
                    name: record.name,
                    description: record.description.filter(|text| !text.is_empty()),
                    image_resource_path: record.image_resource_path.filter(|path| !path.is_empty()),
                    sort_order: record.sort_order,
                })
            })
    }
}
