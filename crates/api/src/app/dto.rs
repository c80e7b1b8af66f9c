use serde::Deserialize;

use stockbook_inventory::ItemSnapshot;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub initial_balance: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    pub item_id: String,
    pub quantity: i64,
    /// Raw wire direction: "in" or "out".
    #[serde(rename = "type")]
    pub kind: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: &ItemSnapshot) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.to_string(),
        "name": item.name,
        "balance": item.balance,
    })
}
