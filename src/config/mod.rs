//! Configuration management
//!
//! This module handles node and ledger settings: listening port, startup peers,
//! dial timeout, difficulty, mining reward and batch size.
//!
//! Settings are plain values handed to whoever needs them; there is no
//! process-wide configuration.

pub mod settings;

pub use settings::{
    LedgerSettings, NodeSettings, Settings, DEFAULT_BATCH_SIZE, DEFAULT_DIFFICULTY,
    DEFAULT_MINING_REWARD,
};
