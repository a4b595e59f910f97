//! Wire types for batch ingestion
//!
//! Terminals replay their outbox against `/sync/push` with at-least-once
//! delivery, so every item carries the client-generated `entity_uuid` the
//! idempotency ledger keys on. The JSON shape is fixed; field names match
//! what terminals already send.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Per-item failure taxonomy
///
/// Nothing here is fatal to the batch: the coordinator catches these,
/// rolls back the item's transaction and reports the error string.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unknown entity_type: {0}")]
    UnknownEntityType(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The closed set of entity kinds terminals may push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Order,
    Refund,
    Shift,
    CashEvent,
}

impl EntityKind {
    /// Parse the wire tag; anything else is a classified failure, not a crash
    pub fn parse(tag: &str) -> Result<Self, SyncError> {
        match tag {
            "order" => Ok(EntityKind::Order),
            "refund" => Ok(EntityKind::Refund),
            "shift" => Ok(EntityKind::Shift),
            "cash_event" => Ok(EntityKind::CashEvent),
            other => Err(SyncError::UnknownEntityType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Order => "order",
            EntityKind::Refund => "refund",
            EntityKind::Shift => "shift",
            EntityKind::CashEvent => "cash_event",
        }
    }

    /// Which side is authoritative when the same entity is seen twice.
    ///
    /// All transactional kinds are client-wins; catalog master data is
    /// server-wins and is never writable through the ingestion path at all.
    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy::ClientWins
    }
}

/// Conflict rule naming which side's data is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    ClientWins,
    ServerWins,
}

/// Mutation operation carried by an outbox item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

impl Operation {
    pub fn parse(tag: &str) -> Result<Self, SyncError> {
        match tag {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            other => Err(SyncError::UnknownOperation(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
        }
    }
}

/// One outbox item from a terminal
///
/// `entity_type` and `operation` stay as strings here so a bad tag fails
/// that item alone instead of the whole batch deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncItem {
    /// Client-side outbox row id, echoed back verbatim
    #[serde(default)]
    pub outbox_id: Value,
    pub entity_type: String,
    pub entity_uuid: String,
    pub operation: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub terminal_id: Option<String>,
}

/// Push request body
#[derive(Debug, Clone, Deserialize)]
pub struct PushRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub terminal_id: Option<String>,
    #[serde(default)]
    pub batch: Vec<SyncItem>,
}

/// A successfully applied (or deduplicated) item
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedItem {
    pub outbox_id: Value,
    pub entity_uuid: String,
    pub server_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
}

/// An item whose transaction rolled back
#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub outbox_id: Value,
    pub entity_uuid: String,
    pub error: String,
}

/// Push response: best-effort partition of the batch, in input order
#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    pub processed: Vec<ProcessedItem>,
    pub failed: Vec<FailedItem>,
}

// ---------------------------------------------------------------------------
// Reducer payloads

fn default_customer() -> String {
    "Walk-in".to_string()
}

fn default_refund_status() -> String {
    "processed".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPayload {
    #[serde(default)]
    pub order: OrderFields,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub payments: Vec<PaymentLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderFields {
    #[serde(default)]
    pub shift_id: Option<String>,
    #[serde(default)]
    pub cashier_name: Option<String>,
    #[serde(default = "default_customer")]
    pub customer: String,
    /// Order timestamp as recorded on the terminal
    #[serde(default)]
    pub created_at_local: Option<String>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub total: f64,
    /// Omitted on the wire means "leave the stored status alone"; creates
    /// without it default to `completed`
    #[serde(default)]
    pub status: Option<String>,
}

impl Default for OrderFields {
    fn default() -> Self {
        OrderFields {
            shift_id: None,
            cashier_name: None,
            customer: default_customer(),
            created_at_local: None,
            subtotal: 0.0,
            discount_amount: 0.0,
            tax_amount: 0.0,
            total: 0.0,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub product_uuid: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub qty: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub line_discount: f64,
    #[serde(default)]
    pub line_total: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLine {
    #[serde(default = "PaymentLine::default_method")]
    pub method: String,
    #[serde(default)]
    pub amount: f64,
}

impl PaymentLine {
    fn default_method() -> String {
        "cash".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundPayload {
    /// Client uuid of the order being refunded; the order may not have
    /// synced yet, in which case the server-side linkage stays unresolved
    pub order_uuid: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_refund_status")]
    pub status: String,
    #[serde(default)]
    pub created_at_local: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftPayload {
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub opened_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub float_amount: f64,
    #[serde(default)]
    pub expected_cash: Option<f64>,
    #[serde(default)]
    pub counted_cash: Option<f64>,
    #[serde(default)]
    pub variance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CashEventPayload {
    #[serde(default)]
    pub shift_id: Option<String>,
    /// "in" or "out"; anything else is treated as "out"
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub created_at_local: Option<String>,
}
