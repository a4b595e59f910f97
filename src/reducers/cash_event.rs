//! Cash event reducer
//!
//! Cash movements are append-only: insert if absent, and a retried create
//! for the same client uuid leaves the original row untouched.

use chrono::Utc;
use serde_json::Value;
use sqlx::SqliteConnection;

use crate::sync::types::{CashEventPayload, SyncError};

use super::{new_server_id, ReducerContext};

pub async fn apply(
    conn: &mut SqliteConnection,
    ctx: &ReducerContext<'_>,
    payload: &Value,
) -> Result<String, SyncError> {
    if let Some(server_id) = &ctx.existing {
        return Ok(server_id.clone());
    }

    let payload: CashEventPayload = serde_json::from_value(payload.clone())?;

    let server_id = new_server_id("CSH");
    let now = Utc::now().to_rfc3339();
    let event_date = payload.created_at_local.clone().unwrap_or_else(|| now.clone());
    let event_type = match payload.event_type.as_deref() {
        Some("in") => "in",
        _ => "out",
    };

    sqlx::query(
        r#"
        INSERT INTO cash_events (
            server_id, client_uuid, device_id, shift_uuid, event_type,
            amount, reason, event_date, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&server_id)
    .bind(ctx.client_uuid)
    .bind(ctx.device_id)
    .bind(&payload.shift_id)
    .bind(event_type)
    .bind(payload.amount)
    .bind(&payload.reason)
    .bind(&event_date)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(server_id)
}
