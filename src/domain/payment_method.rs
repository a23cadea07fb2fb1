use serde::Deserialize;

/// A payment method the buyer can choose for the current transaction.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodConfiguration {
    pub id: u64,
    #[serde(default)]
    pub space_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_resource_path: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Downloaded icon of a payment method.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PaymentMethodIcon {
    pub method_id: u64,
    pub mime_type: String,
    pub data: Vec<u8>,
}
