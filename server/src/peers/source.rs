//! Peer enumeration.

use gcounter_engine::NodeId;

/// Something that can list the peers to synchronize with.
pub trait PeerSource: Send + Sync {
    /// Current peer identifiers, in the order they should be tried.
    fn peers(&self) -> Vec<NodeId>;
}

/// A fixed peer list, usually taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPeers {
    peers: Vec<NodeId>,
}

impl StaticPeers {
    pub fn new(peers: Vec<NodeId>) -> Self {
        Self { peers }
    }

    /// Build from a comma separated list such as `"node-2,node-3"`.
    pub fn parse(list: &str) -> Self {
        Self::new(parse_peer_list(list))
    }
}

impl PeerSource for StaticPeers {
    fn peers(&self) -> Vec<NodeId> {
        self.peers.clone()
    }
}

/// Split a comma separated peer list, trimming entries and dropping blanks.
pub fn parse_peer_list(list: &str) -> Vec<NodeId> {
    list.split(',')
        .map(str::trim)
        .filter(|peer| !peer.is_empty())
        .map(str::to_string)
        .collect()
}
