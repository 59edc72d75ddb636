//! GCounter Server - one node of a replicated grow-only counter.
//!
//! Each node increments only its own slot and serves its local view on
//! `GET /gcounter/values`. Reading the total (`GET /gcounter/count`) first
//! pulls every peer's view and folds it in, so reads reflect a best-effort
//! global count without any coordination between nodes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod peers;
pub mod routes;
pub mod state;
pub mod sync;

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::peers::{HttpPeerClient, PeerClient, PeerSource, StaticPeers};
use crate::state::CounterStore;
use crate::sync::SyncEngine;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<CounterStore>,
    pub sync: Arc<SyncEngine>,
}

impl AppState {
    /// Assemble state from explicit peer collaborators.
    pub fn new(config: Config, peers: Arc<dyn PeerSource>, client: Arc<dyn PeerClient>) -> Self {
        Self {
            store: CounterStore::new_shared(config.node_id.clone()),
            sync: Arc::new(SyncEngine::new(peers, client)),
            config: Arc::new(config),
        }
    }

    /// Static peers from the config, reached over HTTP.
    pub fn from_config(config: Config) -> Result<Self> {
        let peers = Arc::new(StaticPeers::new(config.peers.clone()));
        let client = Arc::new(HttpPeerClient::from_config(&config)?);
        Ok(Self::new(config, peers, client))
    }
}

/// Build the router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
