//! # Gossip Chain - My Toy Ledger and Gossip Swarm
//!
//! This is a small proof-of-work ledger plus a peer transport that spreads
//! itself across a swarm by gossiping known hosts. When I come back to this
//! code, here's what I need to remember:
//!
//! ## What I Built
//! - **Ledger**: Signed transfers, a pending pool and proof-of-work sealed blocks
//! - **Balances**: Derived by replaying every mined transaction
//! - **Wallet**: secp256k1 keys; the hex public key is the account address
//! - **Gossip Transport**: TCP links carrying newline-delimited JSON, with a
//!   welcome handshake that lets every node learn every other node
//! - **Chat Node**: Broadcasts typed lines to the whole swarm
//!
//! ## How I Organized My Code
//! - `core/`: Transactions, blocks, proof-of-work and the chain itself
//! - `wallet/`: Key management and transaction signing
//! - `network/`: Host bookkeeping, framing, links, transport and chat
//! - `config/`: Layered settings (defaults, TOML file, environment)
//! - `utils/`: Hashing, signing helpers and timestamps
//! - `cli/`: Argument parsing and the interactive ledger menu
//!
//! ## Key Design Decisions I Made
//! - Everything is in memory; a restarted node starts from genesis
//! - Only dialed links carry broadcasts so each pair of nodes hears a message once
//! - Settings are passed by value, nothing is global
//! - Mining can be cancelled between nonce batches through an `AtomicBool`
//!
//! ## When I Need to Understand Something
//! 1. Start with `main.rs` to see the CLI commands
//! 2. Look at `core/blockchain.rs` for submission, mining and validation
//! 3. Check `network/transport.rs` for the handshake and read loop

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, LedgerMenu, Opt};
pub use config::{LedgerSettings, NodeSettings, Settings};
pub use core::{Block, Blockchain, ProofOfWork, Transaction, GENESIS_PREVIOUS_HASH};
pub use error::{BlockchainError, Result};
pub use network::{
    ChatMessage, GossipNode, Host, KnownHosts, PeerHandler, PeerTransport, WireMessage,
};
pub use utils::{current_timestamp, secp256k1_sign, secp256k1_verify, sha256_digest, sha256_hex};
pub use wallet::Wallet;
