//! Seams between the message orchestrator and its collaborators.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Article;

/// Resolves a URL into readable article content.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch `url` and return its main content as markdown plus page metadata.
    async fn extract(&self, url: &str) -> Result<Article>;
}
