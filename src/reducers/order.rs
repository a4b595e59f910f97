//! Order reducer
//!
//! A create writes the order header, its item lines and its payment lines as
//! one write set, with a freshly sequenced receipt number. An update (or a
//! replayed non-create) only overwrites the status, and only when the payload
//! actually carries one; an omitted status leaves the stored value alone.

use chrono::{Datelike, Utc};
use serde_json::Value;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::sync::receipt;
use crate::sync::types::{OrderPayload, SyncError};

use super::{new_server_id, ReducerContext};

pub async fn apply(
    conn: &mut SqliteConnection,
    ctx: &ReducerContext<'_>,
    payload: &Value,
) -> Result<String, SyncError> {
    let payload: OrderPayload = serde_json::from_value(payload.clone())?;

    if let Some(server_id) = &ctx.existing {
        // Only the status is mutable after creation, and only when the
        // client actually supplied one; a payload without it must not
        // clobber a status the refund reducer has since flipped
        if let Some(status) = &payload.order.status {
            let now = Utc::now().to_rfc3339();
            sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE server_id = ?")
                .bind(status)
                .bind(&now)
                .bind(server_id)
                .execute(&mut *conn)
                .await?;
        }

        return Ok(server_id.clone());
    }

    let server_id = new_server_id("ORD");
    let now = Utc::now();
    let now_str = now.to_rfc3339();

    // Same transaction as the header insert: a rollback releases the number
    let year = now.year();
    let seq = receipt::next_sequence(conn, year).await?;
    let receipt_number = receipt::format_receipt(year, seq);

    let order_date = payload
        .order
        .created_at_local
        .clone()
        .unwrap_or_else(|| now_str.clone());

    tracing::debug!(
        client_uuid = %ctx.client_uuid,
        server_id = %server_id,
        receipt_number = %receipt_number,
        "Creating order"
    );

    sqlx::query(
        r#"
        INSERT INTO orders (
            server_id, client_uuid, device_id, receipt_number, shift_uuid,
            cashier_name, customer, order_date, subtotal, discount_amount,
            tax_amount, total, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&server_id)
    .bind(ctx.client_uuid)
    .bind(ctx.device_id)
    .bind(&receipt_number)
    .bind(&payload.order.shift_id)
    .bind(&payload.order.cashier_name)
    .bind(&payload.order.customer)
    .bind(&order_date)
    .bind(payload.order.subtotal)
    .bind(payload.order.discount_amount)
    .bind(payload.order.tax_amount)
    .bind(payload.order.total)
    .bind(payload.order.status.as_deref().unwrap_or("completed"))
    .bind(&now_str)
    .bind(&now_str)
    .execute(&mut *conn)
    .await?;

    for item in &payload.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_server_id, product_uuid, product_name,
                qty, unit_price, line_discount, line_total
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&server_id)
        .bind(&item.product_uuid)
        .bind(&item.product_name)
        .bind(item.qty)
        .bind(item.unit_price)
        .bind(item.line_discount)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await?;
    }

    for pmt in &payload.payments {
        sqlx::query(
            "INSERT INTO order_payments (id, order_server_id, method, amount) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&server_id)
        .bind(&pmt.method)
        .bind(pmt.amount)
        .execute(&mut *conn)
        .await?;
    }

    Ok(server_id)
}
