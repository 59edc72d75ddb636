//! Health check endpoint.

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use gcounter_engine::NodeId;
use serde::Serialize;

use crate::peers::PeerHealth;
use crate::AppState;

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub node_id: NodeId,
    pub peers: BTreeMap<NodeId, Option<PeerHealth>>,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.sync.health();
    let peers = state
        .sync
        .peers()
        .into_iter()
        .map(|peer| {
            let entry = health.get(&peer);
            (peer, entry)
        })
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        node_id: state.store.node_id().to_string(),
        peers,
        last_sync: state.sync.last_sync(),
    })
}

/// Root handler.
async fn root() -> &'static str {
    "Hello World GCounter Node\n"
}
