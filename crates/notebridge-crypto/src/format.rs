//! Sealed-string format of protocol `004`:
//! `004:<nonce hex>:<ciphertext b64>:<authenticated data b64>[:<additional data b64>]`.
//!
//! The authenticated-data component is kept as the exact base64 text it
//! arrived in, because that text (not the decoded JSON) is what the AEAD
//! binds.

use base64::Engine;

use crate::cipher::NONCE_LEN;
use crate::error::{CryptoError, CryptoResult};

/// Protocol version written by this crate.
pub const PROTOCOL_VERSION: &str = "004";

/// Additional data written on new strings: base64 of `{}`.
pub const EMPTY_ADDITIONAL_DATA: &str = "e30=";

/// Encode bytes as base64.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(data: &str) -> CryptoResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| CryptoError::InvalidFormat(format!("Invalid base64: {}", e)))
}

/// Parsed components of a sealed string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedString {
    pub version: String,
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    /// Base64 text, used verbatim as associated data.
    pub authenticated_data: String,
    /// Unauthenticated trailer; absent on older strings.
    pub additional_data: Option<String>,
}

impl SealedString {
    /// Parse a sealed string, rejecting unknown versions.
    pub fn parse(input: &str) -> CryptoResult<Self> {
        let parts: Vec<&str> = input.split(':').collect();
        if !(4..=5).contains(&parts.len()) {
            return Err(CryptoError::InvalidFormat(format!(
                "expected 4 or 5 components, got {}",
                parts.len()
            )));
        }

        if parts[0] != PROTOCOL_VERSION {
            return Err(CryptoError::UnsupportedVersion(parts[0].to_string()));
        }

        let nonce_bytes = hex::decode(parts[1])
            .map_err(|e| CryptoError::InvalidFormat(format!("Invalid nonce hex: {}", e)))?;
        let nonce: [u8; NONCE_LEN] = nonce_bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidFormat(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce_bytes.len()
            ))
        })?;

        base64_decode(parts[3])?;

        Ok(Self {
            version: parts[0].to_string(),
            nonce,
            ciphertext: base64_decode(parts[2])?,
            authenticated_data: parts[3].to_string(),
            additional_data: parts.get(4).map(|s| s.to_string()),
        })
    }

    /// Decoded JSON bytes of the authenticated data.
    pub fn authenticated_json(&self) -> CryptoResult<Vec<u8>> {
        base64_decode(&self.authenticated_data)
    }
}

impl std::fmt::Display for SealedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.version,
            hex::encode(self.nonce),
            base64_encode(&self.ciphertext),
            self.authenticated_data
        )?;
        if let Some(additional) = &self.additional_data {
            write!(f, ":{}", additional)?;
        }
        Ok(())
    }
}
