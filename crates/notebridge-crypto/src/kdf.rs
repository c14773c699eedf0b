//! Password stretching using Argon2id.
//!
//! The 64-byte Argon2id output is split in two: the first half is the master
//! key that seals items keys, the second half is the server password sent
//! at sign-in. The backend therefore never sees material that can decrypt
//! anything.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;

/// Argon2id parameters. The live backend's values are
/// `notebridge_core::defaults::KDF_*`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Salt bound to the account: the first 16 bytes (32 hex characters) of
/// `SHA-256("<identifier>:<nonce>")`.
pub fn password_salt(identifier: &str, nonce: &str) -> [u8; SALT_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hasher.update(b":");
    hasher.update(nonce.as_bytes());
    let digest = hasher.finalize();

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&digest[..SALT_LEN]);
    salt
}

/// Keys derived from the account password.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RootKey {
    master_key: SymmetricKey,
    server_password: [u8; 32],
}

impl RootKey {
    /// Key that seals and opens items keys.
    pub fn master_key(&self) -> &SymmetricKey {
        &self.master_key
    }

    /// Hex-encoded server password, the only derived value sent to the backend.
    pub fn server_password(&self) -> String {
        hex::encode(self.server_password)
    }
}

impl std::fmt::Debug for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootKey")
            .field("master_key", &"[REDACTED]")
            .field("server_password", &"[REDACTED]")
            .finish()
    }
}

/// Derive the root key from a password using Argon2id.
pub fn derive_root_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> CryptoResult<RootKey> {
    if password.is_empty() {
        return Err(CryptoError::KeyDerivation("empty password".to_string()));
    }

    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(64),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut output = [0u8; 64];
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let mut master = [0u8; 32];
    let mut server_password = [0u8; 32];
    master.copy_from_slice(&output[..32]);
    server_password.copy_from_slice(&output[32..]);
    output.zeroize();

    let root = RootKey {
        master_key: SymmetricKey::from_bytes(master),
        server_password,
    };
    master.zeroize();
    server_password.zeroize();
    Ok(root)
}
