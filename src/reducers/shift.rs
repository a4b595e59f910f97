//! Shift reducer
//!
//! First sight of a client uuid inserts the shift; a later payload with
//! status "closed" overwrites the closing fields. A second close after
//! closed overwrites again — the client's last close report is
//! authoritative, consistent with the client-wins policy.

use chrono::Utc;
use serde_json::Value;
use sqlx::SqliteConnection;

use crate::sync::types::{ShiftPayload, SyncError};

use super::{new_server_id, ReducerContext};

pub async fn apply(
    conn: &mut SqliteConnection,
    ctx: &ReducerContext<'_>,
    payload: &Value,
) -> Result<String, SyncError> {
    let payload: ShiftPayload = serde_json::from_value(payload.clone())?;
    let now = Utc::now().to_rfc3339();
    let closing = payload.status.as_deref() == Some("closed");

    if let Some(server_id) = &ctx.existing {
        if closing {
            let closed_at = payload.closed_at.clone().unwrap_or_else(|| now.clone());
            sqlx::query(
                r#"
                UPDATE shifts SET
                    status = 'closed',
                    closed_at = ?,
                    expected_cash = ?,
                    counted_cash = ?,
                    variance = ?,
                    updated_at = ?
                WHERE server_id = ?
                "#,
            )
            .bind(&closed_at)
            .bind(payload.expected_cash)
            .bind(payload.counted_cash)
            .bind(payload.variance)
            .bind(&now)
            .bind(server_id)
            .execute(&mut *conn)
            .await?;
        }

        return Ok(server_id.clone());
    }

    let server_id = new_server_id("SHF");
    let opened_at = payload.opened_at.clone().unwrap_or_else(|| now.clone());
    let status = if closing { "closed" } else { "open" };
    let closed_at = if closing {
        Some(payload.closed_at.clone().unwrap_or_else(|| now.clone()))
    } else {
        None
    };

    sqlx::query(
        r#"
        INSERT INTO shifts (
            server_id, client_uuid, device_id, cashier_id, status,
            opened_at, closed_at, float_amount, expected_cash, counted_cash,
            variance, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&server_id)
    .bind(ctx.client_uuid)
    .bind(ctx.device_id)
    .bind(&payload.cashier_id)
    .bind(status)
    .bind(&opened_at)
    .bind(&closed_at)
    .bind(payload.float_amount)
    .bind(payload.expected_cash)
    .bind(payload.counted_cash)
    .bind(payload.variance)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(server_id)
}
