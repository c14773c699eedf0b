//! # notebridge-core
//!
//! Core types, traits, and abstractions shared by the notebridge crates.
//!
//! This crate provides the item model exchanged with the encrypted note
//! backend, the article model produced by link extraction, the error
//! taxonomy, and centralized defaults.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ErrorKind, ExtractionError, Result, ResultExt};
pub use models::*;
pub use traits::*;
