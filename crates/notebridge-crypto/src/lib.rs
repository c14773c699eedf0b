//! # notebridge-crypto
//!
//! Envelope encryption for items stored in the note backend.
//!
//! ## Cryptographic Primitives
//!
//! - **Password stretching**: Argon2id, 64-byte output split into master key
//!   and server password
//! - **Symmetric cipher**: XChaCha20-Poly1305 (AEAD), 24-byte nonces
//! - **Salt**: first 16 bytes of SHA-256 over the account identifier and
//!   server nonce
//! - **Random generation**: thread-local CSPRNG
//!
//! ## Key Hierarchy
//!
//! ```text
//! password ──Argon2id──► master key ──seals──► items key ──seals──► item key ──seals──► payload
//!                    └─► server password (sent at sign-in)
//! ```
//!
//! ## Sealed String Format
//!
//! ```text
//! 004:<nonce hex>:<ciphertext+tag b64>:<authenticated data b64>:<additional data b64>
//! ```
//!
//! The authenticated data is base64 JSON `{"u": <uuid>, "v": "004"}`, and its
//! base64 text is the AEAD associated data.
//!
//! ## Example
//!
//! ```rust
//! use notebridge_crypto::{open, seal, AuthenticatedData, SymmetricKey};
//!
//! let key = SymmetricKey::generate();
//! let aad = AuthenticatedData::for_item("5f0e3c9a-1111-4c22-9a33-0123456789ab");
//!
//! let sealed = seal(&key, b"{\"title\":\"hello\"}", &aad).unwrap();
//! let opened = open(&key, &sealed, &aad).unwrap();
//! assert_eq!(opened, b"{\"title\":\"hello\"}");
//! ```

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod format;
pub mod kdf;
pub mod key;

// Re-export commonly used types
pub use envelope::{open, seal, AuthenticatedData};
pub use error::{CryptoError, CryptoResult};
pub use format::{SealedString, PROTOCOL_VERSION};
pub use kdf::{derive_root_key, password_salt, KdfParams, RootKey, SALT_LEN};
pub use key::SymmetricKey;

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Full key hierarchy: password -> master key -> items key -> item key -> payload.
    #[test]
    fn test_key_hierarchy_workflow() {
        let params = KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        let salt = password_salt("me@example.com", "0123456789abcdef0123");
        let root = derive_root_key(b"correct horse", &salt, &params).unwrap();

        // Items key sealed under the master key
        let items_key = SymmetricKey::generate();
        let items_key_aad = AuthenticatedData::for_item("items-key-1");
        let sealed_items_key =
            seal(root.master_key(), items_key.to_hex().as_bytes(), &items_key_aad).unwrap();

        // Item key sealed under the items key, payload under the item key
        let item_key = SymmetricKey::generate();
        let note_aad = AuthenticatedData::for_item("note-1");
        let enc_item_key = seal(&items_key, item_key.to_hex().as_bytes(), &note_aad).unwrap();
        let content = seal(&item_key, b"{\"title\":\"Hello\"}", &note_aad).unwrap();

        // Re-derive from the password and walk back down
        let root_again = derive_root_key(b"correct horse", &salt, &params).unwrap();
        let items_key_hex = open(root_again.master_key(), &sealed_items_key, &items_key_aad).unwrap();
        let items_key_again =
            SymmetricKey::from_hex(std::str::from_utf8(&items_key_hex).unwrap()).unwrap();
        let item_key_hex = open(&items_key_again, &enc_item_key, &note_aad).unwrap();
        let item_key_again =
            SymmetricKey::from_hex(std::str::from_utf8(&item_key_hex).unwrap()).unwrap();

        let payload = open(&item_key_again, &content, &note_aad).unwrap();
        assert_eq!(payload, b"{\"title\":\"Hello\"}");

        // A different password cannot open the items key
        let wrong = derive_root_key(b"wrong horse", &salt, &params).unwrap();
        assert!(open(wrong.master_key(), &sealed_items_key, &items_key_aad).is_err());
    }
}
