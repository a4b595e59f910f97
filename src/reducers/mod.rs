//! Entity reducers
//!
//! One reducer per mutation kind. A reducer normalizes an outbox payload
//! into store writes on the coordinator's transaction and returns the server
//! id for the entity. Reducers are not individually idempotent for creates;
//! the coordinator's ledger short-circuit is what makes retries safe.

pub mod cash_event;
pub mod order;
pub mod refund;
pub mod shift;

use serde_json::Value;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::sync::types::{EntityKind, Operation, SyncError};

/// Everything a reducer needs besides its payload
#[derive(Debug)]
pub struct ReducerContext<'a> {
    pub client_uuid: &'a str,
    pub operation: Operation,
    pub device_id: &'a str,
    /// Server id already assigned to this client uuid, per the ledger
    pub existing: Option<String>,
}

/// Dispatch to the reducer for a kind
pub async fn apply(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    ctx: &ReducerContext<'_>,
    payload: &Value,
) -> Result<String, SyncError> {
    match kind {
        EntityKind::Order => order::apply(conn, ctx, payload).await,
        EntityKind::Refund => refund::apply(conn, ctx, payload).await,
        EntityKind::Shift => shift::apply(conn, ctx, payload).await,
        EntityKind::CashEvent => cash_event::apply(conn, ctx, payload).await,
    }
}

/// Generate a server id: fixed prefix plus a short uppercase token
pub(crate) fn new_server_id(prefix: &str) -> String {
    let token = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("{}-{}", prefix, token)
}
