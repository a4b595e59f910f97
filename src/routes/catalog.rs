//! Catalog endpoints: terminal pull and admin bulk upsert

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::catalog::{
    watermark, CatalogRepository, CategoryUpsert, ProductUpsert, PullResponse, UpsertResponse,
};
use crate::error::{AppError, Result};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/pull", get(pull))
}

/// Admin-side catalog writes, mounted under /admin/catalog
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/products", post(upsert_products))
        .route("/categories", post(upsert_categories))
}

#[derive(Debug, Deserialize)]
struct PullParams {
    since: Option<String>,
}

/// Incremental catalog delta since the client's checkpoint
async fn pull(
    State(state): State<AppState>,
    Query(params): Query<PullParams>,
) -> Result<Json<PullResponse>> {
    let since = match &params.since {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| AppError::BadRequest(format!("Invalid since timestamp: {}", e)))?;
            watermark(parsed.with_timezone(&Utc))
        }
        None => watermark(DateTime::<Utc>::UNIX_EPOCH),
    };

    // Captured before the reads: a row committed while the queries run
    // lands at or after this checkpoint and is redelivered on the next pull
    let updated_at = watermark(Utc::now());

    let repo = CatalogRepository::new(state.db());
    let products = repo.products_since(&since).await?;
    let categories = repo.categories_since(&since).await?;
    let count = products.len();

    Ok(Json(PullResponse {
        products,
        categories,
        updated_at,
        count,
    }))
}

async fn upsert_products(
    State(state): State<AppState>,
    Json(products): Json<Vec<ProductUpsert>>,
) -> Result<Json<UpsertResponse>> {
    let count = CatalogRepository::new(state.db())
        .upsert_products(&products)
        .await?;

    Ok(Json(UpsertResponse { ok: true, count }))
}

async fn upsert_categories(
    State(state): State<AppState>,
    Json(categories): Json<Vec<CategoryUpsert>>,
) -> Result<Json<UpsertResponse>> {
    let count = CatalogRepository::new(state.db())
        .upsert_categories(&categories)
        .await?;

    Ok(Json(UpsertResponse { ok: true, count }))
}
