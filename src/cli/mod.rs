//! Command-line interface
//!
//! This module contains argument parsing and the interactive ledger menu.

pub mod commands;
pub mod menu;

pub use commands::{Command, Opt};
pub use menu::LedgerMenu;
