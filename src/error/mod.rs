//! Error handling for the ledger and the gossip transport
//!
//! Every fallible operation in the crate returns [`BlockchainError`] through the
//! [`Result`] alias.

use std::fmt;

/// Result type alias for ledger and network operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error kinds raised by the ledger, the wallet and the peer transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Peer address is not in `host:port` form
    AddressFormat(String),
    /// Signing a transaction with a key that does not own the sender identity
    Authorization(String),
    /// Verifying a transaction that was never signed
    MissingSignature,
    /// Submitting a structurally or cryptographically invalid transaction
    Validation(String),
    /// Sender cannot cover the submitted amount
    InsufficientBalance { required: u64, available: i128 },
    /// Sealing was stopped through its cancellation flag
    MiningCancelled,
    /// Key or signature handling errors
    Crypto(String),
    /// Network communication errors
    Network(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File and socket I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::AddressFormat(addr) => {
                write!(f, "Invalid host address {addr}. Expected host:port")
            }
            BlockchainError::Authorization(msg) => write!(f, "Authorization error: {msg}"),
            BlockchainError::MissingSignature => {
                write!(f, "No signature in this transaction")
            }
            BlockchainError::Validation(msg) => write!(f, "Validation error: {msg}"),
            BlockchainError::InsufficientBalance {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient balance: required {required}, available {available}"
                )
            }
            BlockchainError::MiningCancelled => write!(f, "Mining was cancelled"),
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_message() {
        let err = BlockchainError::InsufficientBalance {
            required: 10,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: required 10, available 0"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BlockchainError = io.into();
        assert!(matches!(err, BlockchainError::Io(_)));
    }
}
