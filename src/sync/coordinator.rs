//! Batch ingestion coordinator
//!
//! Drives a heterogeneous batch of outbox items through the ledger and the
//! reducers. Every item gets its own transaction; a failure rolls back that
//! item alone and the batch continues. There is no cross-item atomicity: the
//! response is a best-effort partition into processed/failed, in input order.

use sqlx::SqlitePool;

use crate::reducers::{self, ReducerContext};
use crate::sync::ledger;
use crate::sync::types::{
    EntityKind, FailedItem, Operation, ProcessedItem, PushRequest, PushResponse, SyncError,
    SyncItem,
};

struct ItemOutcome {
    server_id: String,
    duplicate: bool,
}

/// Process a full push batch
pub async fn process_batch(pool: &SqlitePool, request: PushRequest) -> PushResponse {
    let mut processed = Vec::new();
    let mut failed = Vec::new();
    let fallback_device = request.device_id.clone().unwrap_or_default();

    for item in &request.batch {
        match process_item(pool, item, &fallback_device).await {
            Ok(outcome) => {
                processed.push(ProcessedItem {
                    outbox_id: item.outbox_id.clone(),
                    entity_uuid: item.entity_uuid.clone(),
                    server_id: outcome.server_id,
                    status: "ok",
                    duplicate: outcome.duplicate.then_some(true),
                });
            }
            Err(e) => {
                tracing::warn!(
                    entity_type = %item.entity_type,
                    entity_uuid = %item.entity_uuid,
                    error = %e,
                    "Sync item failed"
                );
                failed.push(FailedItem {
                    outbox_id: item.outbox_id.clone(),
                    entity_uuid: item.entity_uuid.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        processed = processed.len(),
        failed = failed.len(),
        "Processed push batch"
    );

    PushResponse { processed, failed }
}

/// Apply one item inside its own transaction
///
/// Any error after `begin` drops the transaction, which rolls it back; no
/// partial write is ever visible to readers.
async fn process_item(
    pool: &SqlitePool,
    item: &SyncItem,
    fallback_device: &str,
) -> Result<ItemOutcome, SyncError> {
    let kind = EntityKind::parse(&item.entity_type)?;
    let operation = Operation::parse(&item.operation)?;
    let device_id = item.device_id.as_deref().unwrap_or(fallback_device);

    let mut tx = pool.begin().await?;

    let existing = ledger::lookup(&mut tx, &item.entity_uuid).await?;

    if let Some(server_id) = existing.clone() {
        if operation == Operation::Create {
            // Already applied: return the assigned id, no reducer side
            // effects. This is what makes blind terminal retries safe.
            tx.commit().await?;
            return Ok(ItemOutcome {
                server_id,
                duplicate: true,
            });
        }
    }

    let ctx = ReducerContext {
        client_uuid: &item.entity_uuid,
        operation,
        device_id,
        existing,
    };
    let server_id = reducers::apply(&mut tx, kind, &ctx, &item.payload).await?;

    ledger::record(&mut tx, kind, &item.entity_uuid, &server_id, device_id, operation).await?;

    tx.commit().await?;

    Ok(ItemOutcome {
        server_id,
        duplicate: false,
    })
}
