use crate::core::block::hash_with_nonce;
use crate::core::Block;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};

/// Nonce search for one block.
///
/// The block content (everything but the nonce) is serialized once up front.
/// `advance` tries a single nonce, so callers can drive the search themselves;
/// `run` and `run_with_cancel` are the two loops built on top of it.
pub struct ProofOfWork {
    prefix: String,
    difficulty: usize,
    nonce: u64,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: &Block, difficulty: usize) -> Result<ProofOfWork> {
        Ok(ProofOfWork {
            prefix: block.hash_prefix()?,
            difficulty,
            nonce: block.get_nonce(),
        })
    }

    /// True when the first `difficulty` hex characters of `hash` are all `'0'`.
    pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
        hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Validate proof-of-work for an already sealed block
    pub fn validate(block: &Block, difficulty: usize) -> bool {
        match block.calculate_hash() {
            Ok(hash) => hash == block.get_hash() && Self::meets_difficulty(&hash, difficulty),
            Err(_) => false,
        }
    }

    /// Hash the current nonce. Returns the sealed `(nonce, hash)` if it meets the
    /// target, otherwise moves on to the next nonce.
    pub fn advance(&mut self) -> Option<(u64, String)> {
        let hash = hash_with_nonce(&self.prefix, self.nonce);
        if Self::meets_difficulty(&hash, self.difficulty) {
            return Some((self.nonce, hash));
        }
        self.nonce = self.nonce.wrapping_add(1);
        None
    }

    pub fn run(mut self) -> (u64, String) {
        loop {
            if let Some(sealed) = self.advance() {
                return sealed;
            }
        }
    }

    /// Like `run`, but gives up with `None` once `cancel` is raised.
    pub fn run_with_cancel(mut self, cancel: &AtomicBool) -> Option<(u64, String)> {
        loop {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(sealed) = self.advance() {
                return Some(sealed);
            }
        }
    }
}
