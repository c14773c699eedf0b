//! # notebridge-sync
//!
//! Client for the encrypted note backend.
//!
//! [`NoteStore`] is the entry point: it logs in, loads the account's items
//! keys, and creates notes linked to tags in a single sync push. Items are
//! sealed with `notebridge-crypto` before they leave this crate and unsealed
//! as soon as they arrive.
//!
//! ## Features
//!
//! - `fake-server`: in-process fake backend ([`fake::FakeSyncServer`]) for
//!   tests in this and dependent crates.

pub mod client;
pub mod item;
pub mod keychain;
pub mod store;
pub mod tag_cache;
pub mod types;

#[cfg(feature = "fake-server")]
pub mod fake;

// Re-export commonly used types
pub use client::{Retrieved, SyncClient};
pub use item::{seal_item, unseal_item};
pub use keychain::KeyChain;
pub use notebridge_crypto::KdfParams;
pub use store::{NoteStore, SyncConfig};
pub use tag_cache::TagCache;
pub use types::{AuthParams, SyncConflict, SyncRequest, SyncResponse};
