// This is the ledger - an in-memory chain of sealed blocks plus the pending pool
// Balances are derived by replaying every mined transaction; nothing is cached
// The chain only grows: there is no fork resolution and no persistence

use crate::config::LedgerSettings;
use crate::core::{Block, ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::current_timestamp;
use log::info;
use std::sync::atomic::AtomicBool;

pub struct Blockchain {
    chain: Vec<Block>,                      // Genesis first, tip last
    difficulty: usize,                      // Leading hex zeros required on sealed blocks
    mining_reward: u64,                     // Paid to the miner of each block
    batch_size: usize,                      // Max pending transactions per mined block
    pending_transactions: Vec<Transaction>, // Oldest first
}

impl Blockchain {
    // When I want a ledger with the default constants (difficulty 4, reward 50)
    pub fn new() -> Result<Blockchain> {
        Self::with_settings(&LedgerSettings::default())
    }

    pub fn with_settings(settings: &LedgerSettings) -> Result<Blockchain> {
        settings.validate()?;
        let genesis = Block::genesis()?;
        info!("Created genesis block {}", genesis.get_hash());

        Ok(Blockchain {
            chain: vec![genesis],
            difficulty: settings.difficulty,
            mining_reward: settings.mining_reward,
            batch_size: settings.batch_size,
            pending_transactions: vec![],
        })
    }

    pub fn get_blocks(&self) -> &[Block] {
        self.chain.as_slice()
    }

    pub fn get_latest_block(&self) -> &Block {
        // The chain always holds at least the genesis block
        &self.chain[self.chain.len() - 1]
    }

    pub fn get_pending_transactions(&self) -> &[Transaction] {
        self.pending_transactions.as_slice()
    }

    pub fn get_difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn get_mining_reward(&self) -> u64 {
        self.mining_reward
    }

    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }

    // When someone hands me a signed transaction to include in a future block
    pub fn submit_transaction(&mut self, transaction: Transaction) -> Result<()> {
        let Some(from) = transaction.get_from_address() else {
            return Err(BlockchainError::Validation(
                "Transaction must include from and to address".to_string(),
            ));
        };
        if from.is_empty() || transaction.get_to_address().is_empty() {
            return Err(BlockchainError::Validation(
                "Transaction must include from and to address".to_string(),
            ));
        }

        // A missing signature surfaces as its own error
        if !transaction.is_valid()? {
            return Err(BlockchainError::Validation(
                "Cannot add invalid transaction to chain".to_string(),
            ));
        }

        // I only look at mined blocks here, so two pending spends can overdraw
        let available = self.balance_of(from);
        let required = transaction.get_amount();
        if available < i128::from(required) {
            return Err(BlockchainError::InsufficientBalance {
                required,
                available,
            });
        }

        self.pending_transactions.push(transaction);
        info!(
            "Transaction added to pending transactions ({} pending)",
            self.pending_transactions.len()
        );
        Ok(())
    }

    // When I want to mine the next block and pay the reward to `reward_address`
    pub fn mine(&mut self, reward_address: &str) -> Result<Block> {
        self.mine_internal(reward_address, None)
    }

    // Same as mine, but someone else can stop the search by raising `cancel`
    pub fn mine_with_cancel(
        &mut self,
        reward_address: &str,
        cancel: &AtomicBool,
    ) -> Result<Block> {
        self.mine_internal(reward_address, Some(cancel))
    }

    fn mine_internal(
        &mut self,
        reward_address: &str,
        cancel: Option<&AtomicBool>,
    ) -> Result<Block> {
        // I take the oldest transactions first; the rest wait for the next round
        let batch = self.pending_transactions.len().min(self.batch_size);
        let mut transactions = self.pending_transactions[..batch].to_vec();
        transactions.push(Transaction::new_reward(reward_address, self.mining_reward));

        info!(
            "Mining block {} with {} transactions (difficulty: {})",
            self.chain.len(),
            transactions.len(),
            self.difficulty
        );

        let mut block = Block::new_block(
            current_timestamp()?,
            transactions,
            self.get_latest_block().get_hash().to_string(),
        )?;
        match cancel {
            Some(cancel) => block.seal_with_cancel(self.difficulty, cancel)?,
            None => block.seal(self.difficulty)?,
        }

        // Only a sealed block touches the pool, so a cancelled round loses nothing
        self.pending_transactions.drain(..batch);
        self.chain.push(block.clone());
        info!("Successfully mined block: {}", block.get_hash());

        Ok(block)
    }

    // Replays every mined transaction; pending ones never count
    pub fn balance_of(&self, address: &str) -> i128 {
        let mut balance: i128 = 0;

        for block in &self.chain {
            for tx in block.get_transactions() {
                if tx.get_from_address() == Some(address) {
                    balance -= i128::from(tx.get_amount());
                }
                if tx.get_to_address() == address {
                    balance += i128::from(tx.get_amount());
                }
            }
        }

        balance
    }

    /// Walks the chain from the first block after genesis and stops at the
    /// first broken link, stale hash or invalid transaction.
    pub fn is_valid(&self) -> bool {
        for pair in self.chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);

            if !current.has_valid_transactions() {
                return false;
            }

            match current.calculate_hash() {
                Ok(hash) if hash == current.get_hash() => {}
                _ => return false,
            }

            if current.get_previous_hash() != previous.get_hash() {
                return false;
            }
        }
        true
    }

    /// `is_valid` plus the difficulty target on every non-genesis block
    pub fn is_valid_with_work(&self) -> bool {
        self.is_valid()
            && self
                .chain
                .iter()
                .skip(1)
                .all(|block| ProofOfWork::validate(block, self.difficulty))
    }
}
