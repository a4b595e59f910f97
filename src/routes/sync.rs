//! Sync push endpoint

use axum::{extract::State, routing::post, Json, Router};

use crate::state::AppState;
use crate::sync::{self, PushRequest, PushResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/push", post(push))
}

/// Ingest a batch of outbox items from a terminal
///
/// Always 200: per-item outcomes are reported in the body, and a failed
/// item never aborts its siblings.
async fn push(State(state): State<AppState>, Json(request): Json<PushRequest>) -> Json<PushResponse> {
    tracing::debug!(
        device_id = request.device_id.as_deref().unwrap_or(""),
        items = request.batch.len(),
        "Received push batch"
    );

    Json(sync::process_batch(state.db(), request).await)
}
