//! Admin endpoints: order listing and summary report

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reports::{OrderWithLines, ReportsRepository, SummaryReport};
use crate::routes::catalog;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/summary", get(summary))
        .nest("/catalog", catalog::admin_router())
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Serialize)]
struct OrderListing {
    orders: Vec<OrderWithLines>,
    total: i64,
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderListing>> {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    let offset = params.offset.unwrap_or(0).max(0);

    let repo = ReportsRepository::new(state.db());
    let orders = repo.list_orders(limit, offset).await?;
    let total = repo.count_orders().await?;

    Ok(Json(OrderListing { orders, total }))
}

async fn summary(State(state): State<AppState>) -> Result<Json<SummaryReport>> {
    let report = ReportsRepository::new(state.db()).summary().await?;
    Ok(Json(report))
}
