//! Everything the node needs to know about its peers.
//!
//! - [`PeerSource`] enumerates peer identifiers.
//! - [`PeerClient`] fetches a peer's serialized counter.
//! - [`PeerHealthTable`] remembers how each peer behaved lately.

mod client;
mod health;
mod source;

pub use client::{HttpPeerClient, PeerClient, PeerError};
pub use health::{PeerHealth, PeerHealthTable};
pub use source::{parse_peer_list, PeerSource, StaticPeers};
