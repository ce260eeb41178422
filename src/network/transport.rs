use crate::config::NodeSettings;
use crate::error::{BlockchainError, Result};
use crate::network::connections::{write_frame, ConnectionRegistry, Direction, LinkWriter};
use crate::network::message::{decode_frame, encode_frame, FrameReader, WireMessage};
use crate::network::{Host, KnownHosts};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Application side of a transport, supplied when the transport is created.
///
/// Both hooks run on the connection's own thread.
pub trait PeerHandler: Send + Sync {
    /// A link was accepted or dialed successfully
    fn on_connection(&self, peer: SocketAddr);

    /// A frame arrived and parsed as JSON. Handshake messages are delivered
    /// here too, before the transport acts on them.
    fn on_data(&self, peer: SocketAddr, message: &Value);
}

struct Shared {
    listen_port: u16,
    known_hosts: KnownHosts,
    connections: ConnectionRegistry,
    handler: Arc<dyn PeerHandler>,
    connect_timeout: Option<Duration>,
}

/// Peer transport: accepts links, dials peers, runs the welcome handshake and
/// broadcasts newline-delimited JSON.
///
/// Every link is read on its own thread. Cloning is cheap and clones share
/// the same registries.
#[derive(Clone)]
pub struct PeerTransport {
    shared: Arc<Shared>,
}

impl PeerTransport {
    /// Bind `port` (0 picks a free one) and start accepting links in the background
    pub fn listen(
        port: u16,
        handler: Arc<dyn PeerHandler>,
        settings: &NodeSettings,
    ) -> Result<PeerTransport> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to port {port}: {e}")))?;
        let listen_port = listener.local_addr()?.port();
        info!("Listening on port: {listen_port}");

        let transport = PeerTransport {
            shared: Arc::new(Shared {
                listen_port,
                known_hosts: KnownHosts::new(),
                connections: ConnectionRegistry::new(),
                handler,
                connect_timeout: settings.connect_timeout(),
            }),
        };

        let acceptor = transport.clone();
        thread::spawn(move || acceptor.accept_loop(listener));

        Ok(transport)
    }

    /// The port advertised to peers as `myPort`
    pub fn listen_port(&self) -> u16 {
        self.shared.listen_port
    }

    pub fn known_hosts(&self) -> Result<Vec<Host>> {
        self.shared.known_hosts.get_hosts()
    }

    pub fn connection_count(&self) -> Result<usize> {
        self.shared.connections.get_connected_count()
    }

    pub fn outbound_count(&self) -> Result<usize> {
        self.shared.connections.get_outbound_count()
    }

    /// Dial `address` (`host:port`) in the background.
    ///
    /// Only the address is checked before returning; a failed dial is logged
    /// and not retried.
    pub fn connect_to(
        &self,
        address: &str,
        announce_known_hosts: bool,
        loopback: bool,
    ) -> Result<()> {
        let host = Host::parse(address)?;
        let transport = self.clone();
        thread::spawn(move || {
            if let Err(e) = transport.dial(&host, announce_known_hosts, loopback) {
                error!("Failed to connect to {host}: {e}");
            }
        });
        Ok(())
    }

    /// Send `payload` over every live dialed link. Closed links are skipped
    /// and forgotten. Returns the number of links written.
    pub fn broadcast_message<T: Serialize>(&self, payload: &T) -> Result<usize> {
        let frame = encode_frame(payload)?;
        self.shared.connections.broadcast(&frame)
    }

    fn accept_loop(&self, listener: TcpListener) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let transport = self.clone();
                    thread::spawn(move || {
                        if let Err(e) = transport.serve(stream, peer_addr, Direction::Inbound) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }
    }

    fn open_stream(&self, host: &Host) -> Result<TcpStream> {
        let addrs = (host.host.as_str(), host.port)
            .to_socket_addrs()
            .map_err(|e| BlockchainError::Network(format!("Failed to resolve {host}: {e}")))?;

        let mut last_error = None;
        for addr in addrs {
            let attempt = match self.shared.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => BlockchainError::Network(format!("Failed to connect to {host}: {e}")),
            None => BlockchainError::Network(format!("No addresses found for {host}")),
        })
    }

    /// Connect, greet, register, then keep reading on this thread. The welcome
    /// goes out before the link is read from or used for broadcast.
    fn dial(&self, host: &Host, announce_known_hosts: bool, loopback: bool) -> Result<()> {
        let stream = self.open_stream(host)?;
        let peer_addr = stream.peer_addr()?;
        info!("Connected to {host}");

        let welcome = WireMessage::Welcome {
            my_port: self.shared.listen_port,
            loopback,
            known_hosts: if announce_known_hosts {
                self.shared.known_hosts.get_hosts()?
            } else {
                vec![]
            },
        };
        let frame = encode_frame(&welcome)?;

        self.serve_with(stream, peer_addr, Direction::Outbound, Some(frame))
    }

    fn serve(&self, stream: TcpStream, peer_addr: SocketAddr, direction: Direction) -> Result<()> {
        self.serve_with(stream, peer_addr, direction, None)
    }

    fn serve_with(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        direction: Direction,
        greeting: Option<Vec<u8>>,
    ) -> Result<()> {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to disable Nagle on link to {peer_addr}: {e}");
        }
        let writer: LinkWriter = Arc::new(Mutex::new(stream.try_clone()?));

        // The greeting must be on the wire before broadcast can see this link
        if let Some(frame) = greeting {
            write_frame(&writer, &frame)?;
        }

        let id = self
            .shared
            .connections
            .record_connection(peer_addr, direction, Arc::clone(&writer))?;

        self.shared.handler.on_connection(peer_addr);

        let result = self.read_loop(stream, peer_addr);

        self.shared.connections.record_disconnection(id)?;
        result
    }

    fn read_loop(&self, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        let mut frames = FrameReader::new(BufReader::new(stream));

        while let Some(frame) = frames.next_frame()? {
            // One bad message must not take the link down
            let value = match decode_frame(&frame) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Error handling data from {peer_addr}: {e}");
                    continue;
                }
            };

            self.shared.handler.on_data(peer_addr, &value);

            if let Some(WireMessage::Welcome {
                my_port,
                loopback,
                known_hosts,
            }) = WireMessage::from_value(&value)
            {
                self.handle_welcome(peer_addr, my_port, loopback, known_hosts);
            }
        }

        Ok(())
    }

    fn handle_welcome(
        &self,
        peer_addr: SocketAddr,
        my_port: u16,
        loopback: bool,
        known_hosts: Vec<Host>,
    ) {
        for host in known_hosts {
            self.connect_to_new_known_host(&host);
        }

        let sender = Host::new(&peer_addr.ip().to_string(), my_port);
        if let Err(e) = self.shared.known_hosts.add_host(sender.clone()) {
            error!("Failed to record known host {sender}: {e}");
        }

        // Close the loop so the sender hears from us on a link we dialed
        if !loopback {
            if let Err(e) = self.connect_to(&sender.address(), true, true) {
                error!("Failed to connect back to {sender}: {e}");
            }
        }
    }

    fn connect_to_new_known_host(&self, host: &Host) {
        if host.is_local_listener(self.shared.listen_port) {
            return;
        }
        match self.shared.known_hosts.is_known(host) {
            Ok(true) => {}
            Ok(false) => {
                if let Err(e) = self.connect_to(&host.address(), true, false) {
                    error!("Failed to connect to advertised host {host}: {e}");
                }
            }
            Err(e) => error!("Failed to check known host {host}: {e}"),
        }
    }
}
