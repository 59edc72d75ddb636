//! Counter endpoint routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use gcounter_engine::{Count, Snapshot};

use crate::error::Result;
use crate::handlers::{handle_count, handle_increment, handle_reset, handle_values};
use crate::AppState;

/// Create counter routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gcounter/count", get(count_handler))
        .route("/gcounter/values", get(values_handler))
        .route("/gcounter/increment", get(increment_handler))
        .route("/gcounter/reset", post(reset_handler))
}

/// GET /gcounter/count - Total across the cluster, after a sync.
async fn count_handler(State(state): State<AppState>) -> Json<Count> {
    Json(handle_count(&state).await)
}

/// GET /gcounter/values - Local slots, no sync.
async fn values_handler(State(state): State<AppState>) -> Json<Snapshot> {
    Json(handle_values(&state.store))
}

/// GET /gcounter/increment - Bump this node's slot.
async fn increment_handler(State(state): State<AppState>) -> StatusCode {
    handle_increment(&state.store);
    StatusCode::OK
}

/// POST /gcounter/reset - Debug reset.
async fn reset_handler(State(state): State<AppState>) -> Result<Json<Snapshot>> {
    Ok(Json(handle_reset(&state)?))
}
