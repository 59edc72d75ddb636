//! Configuration management for the node.

use std::env;
use std::time::Duration;

use gcounter_engine::{NodeId, DEFAULT_NODE_ID};

use crate::peers::parse_peer_list;

/// Default port for both serving and reaching peers.
pub const DEFAULT_PORT: u16 = 8080;

/// Default per-peer fetch timeout.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Node configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// This node's identifier, owner of its counter slot
    pub node_id: NodeId,
    /// Peer identifiers to pull from: a host name, `host:port`, an IPv6
    /// literal, or `[v6]:port`
    pub peers: Vec<NodeId>,
    /// DNS suffix appended to peer identifiers
    pub network: Option<String>,
    /// Port peers listen on
    pub peer_port: u16,
    /// Upper bound on a single peer fetch
    pub peer_timeout: Duration,
    /// Period of the background sync task, disabled when unset
    pub sync_interval: Option<Duration>,
    /// Expose the reset route
    pub debug_routes: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Missing or blank values fall back to defaults; a missing peer list is
    /// a valid single-node setup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;

        let node_id = var("MY_NODE")
            .map(|node| node.trim().to_string())
            .unwrap_or_else(|| DEFAULT_NODE_ID.to_string());

        let peers = var("PEERS")
            .map(|list| parse_peer_list(&list))
            .unwrap_or_default();

        let network = var("NETWORK").map(|network| network.trim().to_string());
        let peer_port = parse_or(var("PEER_PORT"), "PEER_PORT", DEFAULT_PORT)?;

        let peer_timeout = match var("PEER_TIMEOUT_SECS") {
            Some(value) => seconds(&value, "PEER_TIMEOUT_SECS")?,
            None => DEFAULT_PEER_TIMEOUT,
        };

        let sync_interval = var("SYNC_INTERVAL_SECS")
            .map(|value| seconds(&value, "SYNC_INTERVAL_SECS"))
            .transpose()?;

        let debug_routes = parse_or(var("ENABLE_DEBUG_ROUTES"), "ENABLE_DEBUG_ROUTES", false)?;

        Ok(Self {
            host,
            port,
            node_id,
            peers,
            network,
            peer_port,
            peer_timeout,
            sync_interval,
            debug_routes,
        })
    }

    /// Defaults for a single node listening on an ephemeral local port.
    pub fn for_node(node_id: impl Into<NodeId>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            node_id: node_id.into(),
            peers: Vec::new(),
            network: None,
            peer_port: DEFAULT_PORT,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            sync_interval: None,
            debug_routes: false,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}

fn seconds(value: &str, var: &'static str) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(Some(value.to_string()), var, 0)?;
    if secs == 0 {
        return Err(ConfigError::ZeroDuration { var });
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var} value: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    ZeroDuration { var: &'static str },
}
