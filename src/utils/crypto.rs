use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use ring::digest::{Context, SHA256};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Crypto(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(BlockchainError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// Lowercase hex SHA-256, the fingerprint format for blocks and transactions
pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(sha256_digest(data).as_slice())
}

pub fn new_signing_key() -> SigningKey {
    SigningKey::random(&mut rand::thread_rng())
}

pub fn signing_key_from_bytes(secret: &[u8]) -> Result<SigningKey> {
    SigningKey::from_slice(secret)
        .map_err(|e| BlockchainError::Crypto(format!("Invalid secp256k1 secret key: {e}")))
}

/// Uncompressed SEC1 public key of `key`, hex encoded
pub fn public_key_hex(key: &SigningKey) -> String {
    let point = key.verifying_key().to_encoded_point(false);
    HEXLOWER.encode(point.as_bytes())
}

/// DER signature over `message`, hex encoded
pub fn secp256k1_sign(key: &SigningKey, message: &[u8]) -> String {
    let signature: Signature = key.sign(message);
    HEXLOWER.encode(signature.to_der().as_bytes())
}

/// Undecodable keys or signatures verify as false rather than erroring.
pub fn secp256k1_verify(public_key_hex: &str, signature_hex: &str, message: &[u8]) -> bool {
    let Ok(public_key) = HEXLOWER_PERMISSIVE.decode(public_key_hex.as_bytes()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&public_key) else {
        return false;
    };
    let Ok(signature_bytes) = HEXLOWER_PERMISSIVE.decode(signature_hex.as_bytes()) else {
        return false;
    };
    let Ok(signature) = Signature::from_der(&signature_bytes) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}
