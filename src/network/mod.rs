//! Peer-to-peer networking
//!
//! This module handles the gossip transport between nodes: the welcome
//! handshake that spreads known hosts, newline-delimited JSON framing, live
//! link tracking and broadcast. [`GossipNode`] relays chat on top of it.

pub mod connections;
pub mod gossip;
pub mod host;
pub mod message;
pub mod transport;

pub use connections::{ConnectionRegistry, Direction};
pub use gossip::{ChatMessage, GossipNode};
pub use host::{Host, KnownHosts};
pub use message::WireMessage;
pub use transport::{PeerHandler, PeerTransport};
