//! Wallet and key management
//!
//! A wallet owns one secp256k1 key pair and signs transactions on behalf of
//! its public key.

#[allow(clippy::module_inception)]
pub mod wallet;

pub use wallet::Wallet;
