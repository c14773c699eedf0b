//! Wire types for the note backend HTTP API.

use serde::{Deserialize, Serialize};

use notebridge_core::defaults::{PROTOCOL_VERSION, PW_NONCE_MIN_LEN};
use notebridge_core::{ContentType, EncryptedItem, Error, Result};

// =============================================================================
// AUTH
// =============================================================================

/// Key-derivation parameters the backend publishes for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    pub identifier: String,
    pub pw_nonce: String,
    pub version: String,
}

impl AuthParams {
    /// Reject parameters that are malformed or do not belong to `email`.
    pub fn integrity_check(&self, email: &str) -> Result<()> {
        if self.version != PROTOCOL_VERSION {
            return Err(Error::Auth(format!(
                "unsupported protocol version {:?}",
                self.version
            )));
        }
        if self.pw_nonce.len() < PW_NONCE_MIN_LEN {
            return Err(Error::Auth("password nonce too short".to_string()));
        }
        if !self.identifier.eq_ignore_ascii_case(email) {
            return Err(Error::Auth(
                "auth params identifier does not match email".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub api: String,
    pub email: String,
    /// Hex-encoded server password, never the account password.
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionBody {
    pub access_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInResponse {
    #[serde(default)]
    pub session: Option<SessionBody>,
    /// Legacy single-token field.
    #[serde(default)]
    pub token: Option<String>,
}

impl SignInResponse {
    pub fn access_token(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .or(self.token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Error body returned by the backend on failed requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// SYNC
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncRequest {
    pub api: String,
    pub items: Vec<EncryptedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_token: Option<String>,
    /// Restricts retrieval to one content type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub compute_integrity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Item the backend refused to save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConflict {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub server_item: Option<EncryptedItem>,
    #[serde(default)]
    pub unsaved_item: Option<EncryptedItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub retrieved_items: Vec<EncryptedItem>,
    #[serde(default)]
    pub saved_items: Vec<EncryptedItem>,
    #[serde(default)]
    pub conflicts: Vec<SyncConflict>,
    #[serde(default)]
    pub sync_token: Option<String>,
    #[serde(default)]
    pub cursor_token: Option<String>,
    #[serde(default)]
    pub integrity_hash: Option<String>,
}
