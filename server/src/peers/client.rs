//! Outbound peer fetch.

use std::time::Duration;

use async_trait::async_trait;
use gcounter_engine::Snapshot;
use reqwest::StatusCode;

use crate::config::Config;

/// Path every node serves its local snapshot on.
pub const VALUES_PATH: &str = "/gcounter/values";

/// Why a peer could not contribute to a sync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    #[error("empty peer provided")]
    EmptyPeer,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("received invalid http response status: {0}")]
    Status(u16),

    #[error("malformed snapshot: {0}")]
    Malformed(String),
}

/// Fetches a peer's serialized counter.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn fetch(&self, peer: &str) -> Result<Snapshot, PeerError>;
}

/// [`PeerClient`] speaking plain HTTP to `GET /gcounter/values`.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
    network: Option<String>,
    port: u16,
    timeout: Duration,
}

impl HttpPeerClient {
    /// Create a client; every request is bounded by `timeout`.
    pub fn new(
        network: Option<String>,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            network,
            port,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(config.network.clone(), config.peer_port, config.peer_timeout)
    }

    /// URL of a peer's values endpoint.
    ///
    /// `peer` is resolved as `<peer>.<network>:<port>`. An identifier that
    /// already carries a port (`host:port` or `[v6]:port`) is used as is. A
    /// bare IPv6 literal is bracketed and gets the configured port.
    pub fn values_url(&self, peer: &str) -> String {
        if has_explicit_port(peer) {
            return format!("http://{}{}", peer, VALUES_PATH);
        }
        if peer.contains(':') {
            return format!("http://[{}]:{}{}", peer, self.port, VALUES_PATH);
        }

        match &self.network {
            Some(network) => format!("http://{}.{}:{}{}", peer, network, self.port, VALUES_PATH),
            None => format!("http://{}:{}{}", peer, self.port, VALUES_PATH),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> PeerError {
        if err.is_timeout() {
            PeerError::Timeout(self.timeout)
        } else {
            PeerError::Transport(err.to_string())
        }
    }
}

/// Whether `peer` is `host:port` or `[v6]:port`.
fn has_explicit_port(peer: &str) -> bool {
    let Some((host, port)) = peer.rsplit_once(':') else {
        return false;
    };
    if host.is_empty() || port.parse::<u16>().is_err() {
        return false;
    }
    !host.contains(':') || (host.starts_with('[') && host.ends_with(']'))
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch(&self, peer: &str) -> Result<Snapshot, PeerError> {
        if peer.is_empty() {
            return Err(PeerError::EmptyPeer);
        }

        let url = self.values_url(peer);
        tracing::trace!(peer = %peer, url = %url, "fetching peer values");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() != StatusCode::OK {
            return Err(PeerError::Status(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        Snapshot::from_slice(&body).map_err(|e| PeerError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(network: Option<&str>) -> HttpPeerClient {
        HttpPeerClient::new(network.map(String::from), 8080, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn url_with_network_suffix() {
        assert_eq!(
            client(Some("gcounter-net")).values_url("node-2"),
            "http://node-2.gcounter-net:8080/gcounter/values"
        );
    }

    #[test]
    fn url_without_network_suffix() {
        assert_eq!(
            client(None).values_url("node-2"),
            "http://node-2:8080/gcounter/values"
        );
    }

    #[test]
    fn url_with_explicit_port() {
        assert_eq!(
            client(Some("ignored")).values_url("127.0.0.1:9001"),
            "http://127.0.0.1:9001/gcounter/values"
        );
    }

    #[test]
    fn url_with_ipv6_peer() {
        assert_eq!(
            client(Some("ignored")).values_url("fe80::1"),
            "http://[fe80::1]:8080/gcounter/values"
        );
        assert_eq!(
            client(None).values_url("[::1]:9001"),
            "http://[::1]:9001/gcounter/values"
        );
    }

    #[test]
    fn explicit_port_detection() {
        assert!(has_explicit_port("node-2:9001"));
        assert!(has_explicit_port("[fe80::1]:80"));
        assert!(!has_explicit_port("node-2"));
        assert!(!has_explicit_port("node-2:http"));
        assert!(!has_explicit_port("::1"));
        assert!(!has_explicit_port("fe80::1:80"));
    }

    #[tokio::test]
    async fn empty_peer_is_rejected() {
        assert_eq!(client(None).fetch("").await, Err(PeerError::EmptyPeer));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            PeerError::Status(500).to_string(),
            "received invalid http response status: 500"
        );
        assert_eq!(
            PeerError::Timeout(Duration::from_secs(5)).to_string(),
            "request timed out after 5s"
        );
    }
}
