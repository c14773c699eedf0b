//! Symmetric key material.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::random_bytes;
use crate::error::{CryptoError, CryptoResult};

/// 256-bit key with automatic zeroization on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; 32],
}

impl SymmetricKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { key: bytes }
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self {
            key: random_bytes(),
        }
    }

    /// Parse a hex-encoded 32-byte key.
    pub fn from_hex(encoded: &str) -> CryptoResult<Self> {
        let mut decoded =
            hex::decode(encoded.trim()).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        if decoded.len() != 32 {
            let len = decoded.len();
            decoded.zeroize();
            return Err(CryptoError::InvalidKey(format!(
                "Expected 32 bytes, got {}",
                len
            )));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self { key })
    }

    /// Hex encoding of the key bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
