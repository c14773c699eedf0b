//! # notebridge-extract
//!
//! Turns a link into readable markdown plus page metadata.
//!
//! The pipeline is fetch, Readability content detection, then
//! HTML-to-markdown conversion with links made absolute. Repository pages
//! on a configured code host short-circuit the conversion and use the raw
//! README from the first branch that serves one.

pub mod extractor;
pub mod markdown;
pub mod readability;
pub mod readme;

// Re-export commonly used types
pub use extractor::{ArticleExtractor, ExtractorConfig};
pub use readability::ReadableContent;
pub use readme::RepoRef;
