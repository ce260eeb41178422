//! Utility functions and helpers
//!
//! This module contains hashing, secp256k1 signing helpers and timestamps
//! used throughout the ledger.

pub mod crypto;

pub use crypto::{
    current_timestamp, new_signing_key, public_key_hex, secp256k1_sign, secp256k1_verify,
    sha256_digest, sha256_hex, signing_key_from_bytes,
};
