//! HTTP routing
//!
//! The liveness probe is open; everything else sits behind the bearer-token
//! middleware, which rejects before any handler runs.

pub mod admin;
pub mod catalog;
pub mod health;
pub mod sync;

use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::state::AppState;

/// Assemble the full application router
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/sync", sync::router())
        .nest("/catalog", catalog::router())
        .nest("/admin", admin::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .nest("/health", health::router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
