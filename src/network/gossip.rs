use crate::config::NodeSettings;
use crate::error::Result;
use crate::network::message::WireMessage;
use crate::network::{PeerHandler, PeerTransport};
use log::{error, info, warn};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// A chat line received from a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Address the link came from
    pub peer: SocketAddr,
    /// Listening port the sender advertised
    pub port: u16,
    pub text: String,
}

/// Turns `message` payloads into [`ChatMessage`]s on a channel
struct ChatRelay {
    inbox: Sender<ChatMessage>,
}

impl PeerHandler for ChatRelay {
    fn on_connection(&self, peer: SocketAddr) {
        info!("New connection from {peer}");
    }

    fn on_data(&self, peer: SocketAddr, message: &Value) {
        if let Some(WireMessage::Message { message, my_port }) = WireMessage::from_value(message) {
            let chat = ChatMessage {
                peer,
                port: my_port,
                text: message,
            };
            if self.inbox.send(chat).is_err() {
                warn!("Dropping chat message from {peer}: nobody is reading");
            }
        }
    }
}

/// A chat node on top of a [`PeerTransport`]. Ledger objects are not gossiped.
pub struct GossipNode {
    transport: PeerTransport,
}

impl GossipNode {
    /// Listen on the configured port and dial every configured peer. Received
    /// chat lines arrive on the returned channel.
    pub fn start(settings: &NodeSettings) -> Result<(GossipNode, Receiver<ChatMessage>)> {
        let (inbox, messages) = mpsc::channel();
        let relay = Arc::new(ChatRelay { inbox });
        let transport = PeerTransport::listen(settings.port, relay, settings)?;
        let node = GossipNode { transport };

        for peer in &settings.peers {
            if let Err(e) = node.connect(peer) {
                error!("Skipping peer {peer}: {e}");
            }
        }

        Ok((node, messages))
    }

    pub fn connect(&self, address: &str) -> Result<()> {
        self.transport.connect_to(address, true, false)
    }

    /// Broadcast one chat line. Blank input is not sent.
    pub fn broadcast_chat(&self, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        self.transport.broadcast_message(&WireMessage::Message {
            message: text.to_string(),
            my_port: self.transport.listen_port(),
        })
    }

    pub fn transport(&self) -> &PeerTransport {
        &self.transport
    }
}
