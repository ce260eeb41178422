use crate::error::{BlockchainError, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Which side opened the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Accepted by our listener; we only read from it
    Inbound,
    /// Dialed by us; broadcasts go out over these
    Outbound,
}

/// Write half of a link. Each link has its own lock so a slow peer never
/// blocks the registry.
pub type LinkWriter = Arc<Mutex<TcpStream>>;

struct Link {
    peer: SocketAddr,
    direction: Direction,
    writer: LinkWriter,
}

/// Live links of one transport
///
/// Every critical section is a plain map operation; socket writes happen on
/// snapshots taken outside the lock.
pub struct ConnectionRegistry {
    links: RwLock<HashMap<u64, Link>>,
    next_id: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            links: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Record a live link and return its id
    pub fn record_connection(
        &self,
        peer: SocketAddr,
        direction: Direction,
        writer: LinkWriter,
    ) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut links = self
            .links
            .write()
            .map_err(|e| BlockchainError::Network(format!("Failed to acquire link lock: {e}")))?;
        links.insert(
            id,
            Link {
                peer,
                direction,
                writer,
            },
        );
        info!("Connected to peer: {peer} ({direction:?})");
        Ok(id)
    }

    /// Record a closed link
    pub fn record_disconnection(&self, id: u64) -> Result<()> {
        let mut links = self
            .links
            .write()
            .map_err(|e| BlockchainError::Network(format!("Failed to acquire link lock: {e}")))?;
        if let Some(link) = links.remove(&id) {
            info!("Disconnected from peer: {}", link.peer);
        }
        Ok(())
    }

    pub fn get_connected_count(&self) -> Result<usize> {
        let links = self
            .links
            .read()
            .map_err(|e| BlockchainError::Network(format!("Failed to acquire link lock: {e}")))?;
        Ok(links.len())
    }

    pub fn get_outbound_count(&self) -> Result<usize> {
        let links = self
            .links
            .read()
            .map_err(|e| BlockchainError::Network(format!("Failed to acquire link lock: {e}")))?;
        Ok(links
            .values()
            .filter(|link| link.direction == Direction::Outbound)
            .count())
    }

    fn outbound_writers(&self) -> Result<Vec<(u64, LinkWriter)>> {
        let links = self
            .links
            .read()
            .map_err(|e| BlockchainError::Network(format!("Failed to acquire link lock: {e}")))?;
        Ok(links
            .iter()
            .filter(|(_, link)| link.direction == Direction::Outbound)
            .map(|(id, link)| (*id, Arc::clone(&link.writer)))
            .collect())
    }

    /// Write `frame` to every outbound link. Links that fail the write are
    /// dropped without surfacing an error. Returns how many links took the frame.
    pub fn broadcast(&self, frame: &[u8]) -> Result<usize> {
        let mut delivered = 0;
        for (id, writer) in self.outbound_writers()? {
            if write_frame(&writer, frame).is_ok() {
                delivered += 1;
            } else {
                debug!("Dropping closed link {id}");
                self.record_disconnection(id)?;
            }
        }
        Ok(delivered)
    }
}

/// Write one whole frame while holding the link's writer lock
pub fn write_frame(writer: &LinkWriter, frame: &[u8]) -> Result<()> {
    let mut stream = writer
        .lock()
        .map_err(|e| BlockchainError::Network(format!("Failed to acquire writer lock: {e}")))?;
    stream.write_all(frame)?;
    stream.flush()?;
    Ok(())
}
