//! Refund reducer
//!
//! A refund references its order by the order's client uuid. If that order
//! has already synced, the refund links to it by server id and flips the
//! order's status to `refunded`. If not, the refund is stored with a NULL
//! linkage — a refund arriving before its order is valid state, not an
//! error, and the linkage is never repaired when the order shows up later.

use chrono::Utc;
use serde_json::Value;
use sqlx::SqliteConnection;

use crate::sync::ledger;
use crate::sync::types::{EntityKind, RefundPayload, SyncError};

use super::{new_server_id, ReducerContext};

pub async fn apply(
    conn: &mut SqliteConnection,
    ctx: &ReducerContext<'_>,
    payload: &Value,
) -> Result<String, SyncError> {
    if let Some(server_id) = &ctx.existing {
        return Ok(server_id.clone());
    }

    let payload: RefundPayload = serde_json::from_value(payload.clone())?;

    let server_id = new_server_id("REF");
    let now = Utc::now().to_rfc3339();
    let refund_date = payload.created_at_local.clone().unwrap_or_else(|| now.clone());

    let order_server_id =
        ledger::lookup_for_kind(conn, &payload.order_uuid, EntityKind::Order).await?;

    if order_server_id.is_none() {
        tracing::info!(
            refund_uuid = %ctx.client_uuid,
            order_uuid = %payload.order_uuid,
            "Refund references an order not yet synced; storing unresolved"
        );
    }

    sqlx::query(
        r#"
        INSERT INTO refunds (
            server_id, client_uuid, device_id, order_uuid, order_server_id,
            reason, amount, status, refund_date, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&server_id)
    .bind(ctx.client_uuid)
    .bind(ctx.device_id)
    .bind(&payload.order_uuid)
    .bind(&order_server_id)
    .bind(&payload.reason)
    .bind(payload.amount)
    .bind(&payload.status)
    .bind(&refund_date)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    if let Some(order_id) = &order_server_id {
        sqlx::query("UPDATE orders SET status = 'refunded', updated_at = ? WHERE server_id = ?")
            .bind(&now)
            .bind(order_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(server_id)
}
