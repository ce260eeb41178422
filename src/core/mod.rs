//! Core ledger functionality
//!
//! This module contains the ledger integrity engine: signed transactions,
//! blocks, proof-of-work sealing and the chain with its pending pool.

pub mod block;
pub mod blockchain;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use blockchain::Blockchain;
pub use proof_of_work::ProofOfWork;
pub use transaction::Transaction;
