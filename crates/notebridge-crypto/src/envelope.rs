//! Seal and open payloads bound to an item.
//!
//! The authenticated data names the item UUID and protocol version, so a
//! sealed payload copied onto another item fails to open even under the
//! right key. Items keys sealed under a root key also carry the account key
//! parameters (`kp`); they are authenticated but not compared here.

use serde::{Deserialize, Serialize};

use crate::cipher::{decrypt, encrypt, random_bytes};
use crate::error::{CryptoError, CryptoResult};
use crate::format::{base64_encode, SealedString, EMPTY_ADDITIONAL_DATA, PROTOCOL_VERSION};
use crate::key::SymmetricKey;

/// Authenticated (unencrypted) data attached to every sealed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedData {
    #[serde(rename = "kp", default, skip_serializing_if = "Option::is_none")]
    pub key_params: Option<serde_json::Value>,
    #[serde(rename = "u")]
    pub uuid: String,
    #[serde(rename = "v")]
    pub version: String,
}

impl AuthenticatedData {
    pub fn for_item(uuid: impl Into<String>) -> Self {
        Self {
            key_params: None,
            uuid: uuid.into(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    fn same_item(&self, other: &Self) -> bool {
        self.uuid == other.uuid && self.version == other.version
    }
}

/// Encrypt `plaintext` under `key` and return the sealed string.
pub fn seal(key: &SymmetricKey, plaintext: &[u8], aad: &AuthenticatedData) -> CryptoResult<String> {
    let authenticated_data = base64_encode(&serde_json::to_vec(aad)?);
    let nonce = random_bytes();
    let ciphertext = encrypt(
        key.as_bytes(),
        &nonce,
        plaintext,
        authenticated_data.as_bytes(),
    )?;

    Ok(SealedString {
        version: PROTOCOL_VERSION.to_string(),
        nonce,
        ciphertext,
        authenticated_data,
        additional_data: Some(EMPTY_ADDITIONAL_DATA.to_string()),
    }
    .to_string())
}

/// Open a sealed string, checking it belongs to the item in `expected`.
pub fn open(key: &SymmetricKey, sealed: &str, expected: &AuthenticatedData) -> CryptoResult<Vec<u8>> {
    let parsed = SealedString::parse(sealed)?;

    let aad: AuthenticatedData = serde_json::from_slice(&parsed.authenticated_json()?)?;
    if !aad.same_item(expected) {
        return Err(CryptoError::Authentication);
    }

    decrypt(
        key.as_bytes(),
        &parsed.nonce,
        &parsed.ciphertext,
        parsed.authenticated_data.as_bytes(),
    )
}
