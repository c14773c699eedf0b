//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Protocol version of a sealed string is not supported.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// Sealed string is not in `version:nonce:ciphertext:aad` form.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Key material has the wrong length or encoding.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed - wrong key or corrupted data.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Authenticated data does not belong to the item being opened.
    #[error("Authentication failed - payload bound to another item")]
    Authentication,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
