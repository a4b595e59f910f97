//! Idempotency ledger
//!
//! Maps a client-generated entity uuid to the server id that was assigned
//! when the create was first applied. Exactly one server id is ever assigned
//! per client uuid. Everything here takes the caller's transaction
//! connection so ledger writes commit or roll back with the entity write.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::types::{EntityKind, Operation};

/// Look up the server id previously assigned to a client uuid
pub async fn lookup(
    conn: &mut SqliteConnection,
    client_uuid: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT server_id FROM sync_records WHERE client_uuid = ?")
            .bind(client_uuid)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|(server_id,)| server_id))
}

/// Look up a server id constrained to a particular entity kind
///
/// Used by the refund reducer to resolve an order reference without
/// accidentally matching some other entity's uuid.
pub async fn lookup_for_kind(
    conn: &mut SqliteConnection,
    client_uuid: &str,
    kind: EntityKind,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT server_id FROM sync_records WHERE client_uuid = ? AND entity_type = ?",
    )
    .bind(client_uuid)
    .bind(kind.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(server_id,)| server_id))
}

/// Record an applied mutation, keyed by client uuid
///
/// Replaying the same client uuid overwrites the ledger row (operation,
/// device, timestamp), never the entity it points at.
pub async fn record(
    conn: &mut SqliteConnection,
    entity_type: EntityKind,
    client_uuid: &str,
    server_id: &str,
    device_id: &str,
    operation: Operation,
) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO sync_records (client_uuid, entity_type, server_id, device_id, operation, synced_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(client_uuid) DO UPDATE SET
            entity_type = excluded.entity_type,
            server_id = excluded.server_id,
            device_id = excluded.device_id,
            operation = excluded.operation,
            synced_at = excluded.synced_at
        "#,
    )
    .bind(client_uuid)
    .bind(entity_type.as_str())
    .bind(server_id)
    .bind(device_id)
    .bind(operation.as_str())
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
