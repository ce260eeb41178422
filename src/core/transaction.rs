// A transaction moves `amount` from one public key to another.
// Mining rewards are system-issued: they have no sender and carry no signature.
// The serde field order below is part of the block hash, so I never reorder it.

use crate::error::{BlockchainError, Result};
use crate::utils::{public_key_hex, secp256k1_sign, secp256k1_verify, sha256_hex};
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    from_address: Option<String>, // None means system-issued (mining reward)
    to_address: String,
    amount: u64,
    signature: String, // Hex DER signature, empty until signed
}

impl Transaction {
    // When a wallet wants to pay someone - the transaction starts unsigned
    pub fn new(from_address: &str, to_address: &str, amount: u64) -> Transaction {
        Transaction {
            from_address: Some(from_address.to_string()),
            to_address: to_address.to_string(),
            amount,
            signature: String::new(),
        }
    }

    // When the ledger pays a miner - nobody signs these
    pub fn new_reward(to_address: &str, amount: u64) -> Transaction {
        Transaction {
            from_address: None,
            to_address: to_address.to_string(),
            amount,
            signature: String::new(),
        }
    }

    pub fn get_from_address(&self) -> Option<&str> {
        self.from_address.as_deref()
    }

    pub fn get_to_address(&self) -> &str {
        self.to_address.as_str()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_signature(&self) -> &str {
        self.signature.as_str()
    }

    pub fn is_system_issued(&self) -> bool {
        self.from_address.is_none()
    }

    /// Fingerprint over sender, recipient and amount. The signature is not part
    /// of it, so signing does not change the fingerprint.
    pub fn calculate_hash(&self) -> String {
        let payload = format!(
            "{}{}{}",
            self.from_address.as_deref().unwrap_or_default(),
            self.to_address,
            self.amount
        );
        sha256_hex(payload.as_bytes())
    }

    /// Sign with `signing_key`, which must own the sender identity.
    pub fn sign(&mut self, signing_key: &SigningKey) -> Result<()> {
        let public_key = public_key_hex(signing_key);
        match self.from_address.as_deref() {
            Some(from) if from == public_key => {}
            Some(_) => {
                return Err(BlockchainError::Authorization(
                    "You cannot sign transactions for other wallets".to_string(),
                ))
            }
            None => {
                return Err(BlockchainError::Authorization(
                    "System-issued transactions cannot be signed".to_string(),
                ))
            }
        }

        let hash = self.calculate_hash();
        self.signature = secp256k1_sign(signing_key, hash.as_bytes());
        Ok(())
    }

    /// `Ok(false)` for a wrong or malformed signature; only a missing one is an error.
    pub fn is_valid(&self) -> Result<bool> {
        let Some(from) = self.from_address.as_deref() else {
            return Ok(true);
        };

        if self.signature.is_empty() {
            return Err(BlockchainError::MissingSignature);
        }

        let hash = self.calculate_hash();
        Ok(secp256k1_verify(from, &self.signature, hash.as_bytes()))
    }
}
