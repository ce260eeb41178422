use crate::core::{ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, sha256_hex};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;

pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    timestamp: i64,
    transactions: Vec<Transaction>,
    previous_hash: String,
    hash: String,
    nonce: u64,
}

/// Fingerprint of a block given its serialized content and a nonce. Sealing and
/// validation both go through here.
pub(crate) fn hash_with_nonce(prefix: &str, nonce: u64) -> String {
    sha256_hex(format!("{prefix}{nonce}").as_bytes())
}

impl Block {
    pub fn new_block(
        timestamp: i64,
        transactions: Vec<Transaction>,
        previous_hash: String,
    ) -> Result<Block> {
        let mut block = Block {
            timestamp,
            transactions,
            previous_hash,
            hash: String::new(),
            nonce: 0,
        };
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    pub fn genesis() -> Result<Block> {
        Block::new_block(
            current_timestamp()?,
            vec![],
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    /// previousHash, timestamp and transaction JSON, concatenated
    pub(crate) fn hash_prefix(&self) -> Result<String> {
        let transactions = serde_json::to_string(&self.transactions)?;
        Ok(format!(
            "{}{}{}",
            self.previous_hash, self.timestamp, transactions
        ))
    }

    pub fn calculate_hash(&self) -> Result<String> {
        Ok(hash_with_nonce(&self.hash_prefix()?, self.nonce))
    }

    /// Search nonces until the hash has `difficulty` leading zeros. Never gives up.
    pub fn seal(&mut self, difficulty: usize) -> Result<()> {
        let pow = ProofOfWork::new_proof_of_work(self, difficulty)?;
        let (nonce, hash) = pow.run();
        self.nonce = nonce;
        self.hash = hash;
        info!("Block sealed: {} (nonce {nonce})", self.hash);
        Ok(())
    }

    /// Same as `seal`, checking `cancel` before every attempt. The block is left
    /// untouched when cancelled.
    pub fn seal_with_cancel(&mut self, difficulty: usize, cancel: &AtomicBool) -> Result<()> {
        let pow = ProofOfWork::new_proof_of_work(self, difficulty)?;
        let (nonce, hash) = pow
            .run_with_cancel(cancel)
            .ok_or(BlockchainError::MiningCancelled)?;
        self.nonce = nonce;
        self.hash = hash;
        info!("Block sealed: {} (nonce {nonce})", self.hash);
        Ok(())
    }

    /// Stops at the first invalid transaction. An unsigned transaction counts as invalid.
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions.iter().all(|tx| match tx.is_valid() {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Transaction {} failed verification: {e}", tx.calculate_hash());
                false
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.transactions
    }

    #[cfg(test)]
    pub(crate) fn set_previous_hash(&mut self, previous_hash: &str) {
        self.previous_hash = previous_hash.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn reward_block() -> Block {
        let reward = Transaction::new_reward("miner", 50);
        Block::new_block(1_700_000_000_000, vec![reward], "abc".to_string()).unwrap()
    }

    #[test]
    fn test_new_block_hash_matches_recalculation() {
        let block = reward_block();
        assert_eq!(block.get_nonce(), 0);
        assert_eq!(block.get_hash(), block.calculate_hash().unwrap());
    }

    #[test]
    fn test_hash_covers_every_field() {
        let block = reward_block();
        let other_prev =
            Block::new_block(block.get_timestamp(), vec![], "abd".to_string()).unwrap();
        let other_time = Block::new_block(
            block.get_timestamp() + 1,
            block.get_transactions().to_vec(),
            "abc".to_string(),
        )
        .unwrap();

        assert_ne!(block.get_hash(), other_prev.get_hash());
        assert_ne!(block.get_hash(), other_time.get_hash());
    }

    #[test]
    fn test_seal_meets_difficulty() {
        for difficulty in 0..=3 {
            let mut block = reward_block();
            block.seal(difficulty).unwrap();

            assert!(block.get_hash().starts_with(&"0".repeat(difficulty)));
            assert_eq!(block.get_hash(), block.calculate_hash().unwrap());
        }
    }

    #[test]
    fn test_cancelled_seal_leaves_block_untouched() {
        let mut block = reward_block();
        let before = block.clone();
        let cancel = AtomicBool::new(true);

        let result = block.seal_with_cancel(10, &cancel);
        assert_eq!(result, Err(BlockchainError::MiningCancelled));
        assert_eq!(block, before);
    }

    #[test]
    fn test_genesis() {
        let genesis = Block::genesis().unwrap();
        assert_eq!(genesis.get_previous_hash(), GENESIS_PREVIOUS_HASH);
        assert!(genesis.get_transactions().is_empty());
    }

    #[test]
    fn test_has_valid_transactions() {
        let wallet = Wallet::new();
        let payment = wallet.create_transaction("bob", 5).unwrap();
        let mut block = Block::new_block(
            1,
            vec![payment, Transaction::new_reward("miner", 50)],
            "0".to_string(),
        )
        .unwrap();
        assert!(block.has_valid_transactions());

        block
            .transactions_mut()
            .push(Transaction::new(wallet.get_public_key(), "bob", 1));
        assert!(!block.has_valid_transactions());
    }
}
