use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{new_signing_key, public_key_hex, signing_key_from_bytes};
use k256::ecdsa::SigningKey;

/// A secp256k1 key pair held in memory. The public key hex is the wallet's
/// identity on the ledger.
pub struct Wallet {
    signing_key: SigningKey,
    public_key: String,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    pub fn new() -> Wallet {
        Self::from_signing_key(new_signing_key())
    }

    /// Rebuild a wallet from a 32-byte secret scalar
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Wallet> {
        Ok(Self::from_signing_key(signing_key_from_bytes(secret)?))
    }

    fn from_signing_key(signing_key: SigningKey) -> Wallet {
        let public_key = public_key_hex(&signing_key);
        Wallet {
            signing_key,
            public_key,
        }
    }

    pub fn get_public_key(&self) -> &str {
        self.public_key.as_str()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Build and sign a payment from this wallet. Whether the wallet can
    /// afford it is checked by the ledger on submission.
    pub fn create_transaction(&self, to_address: &str, amount: u64) -> Result<Transaction> {
        let mut transaction = Transaction::new(&self.public_key, to_address, amount);
        transaction.sign(self.signing_key())?;
        Ok(transaction)
    }
}
