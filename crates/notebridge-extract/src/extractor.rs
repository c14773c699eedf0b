//! Article extractor: URL in, markdown and page metadata out.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use notebridge_core::defaults::{
    CODE_HOSTS, EXTRACT_TIMEOUT_SECS, EXTRACT_USER_AGENT, RAW_CONTENT_BASE, README_BRANCHES,
};
use notebridge_core::{Article, ArticleSource, Error, ExtractionError, Result};

use crate::markdown::to_markdown;
use crate::readability;
use crate::readme::{fetch_readme, RepoRef};

/// Configuration for [`ArticleExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Upper bound on each fetch.
    pub timeout: Duration,
    pub user_agent: String,
    /// Hosts whose repository pages use the README fast path.
    pub code_hosts: Vec<String>,
    /// Base URL serving raw repository files.
    pub raw_content_base: String,
    /// Branches probed for a README, in order.
    pub readme_branches: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(EXTRACT_TIMEOUT_SECS),
            user_agent: EXTRACT_USER_AGENT.to_string(),
            code_hosts: CODE_HOSTS.iter().map(|h| h.to_string()).collect(),
            raw_content_base: RAW_CONTENT_BASE.to_string(),
            readme_branches: README_BRANCHES.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// Fetches pages and turns their main content into markdown.
pub struct ArticleExtractor {
    client: Client,
    config: ExtractorConfig,
}

impl ArticleExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(ExtractorConfig::default())
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the article behind `url`.
    ///
    /// Readability runs on every page so metadata is always available; for
    /// repository pages on a code host the body is replaced by the raw
    /// README when one can be found.
    #[instrument(
        skip(self),
        fields(subsystem = "extract", component = "article_extractor", op = "extract")
    )]
    pub async fn extract_article(&self, url: &str) -> std::result::Result<Article, ExtractionError> {
        let start = Instant::now();
        let parsed = parse_url(url)?;

        let html = self.fetch_page(&parsed).await?;
        let readable = readability::extract(&html, &parsed).ok_or_else(|| {
            ExtractionError::FetchFailed(format!("no readable content at {}", parsed))
        })?;

        if let Some(repo) = RepoRef::from_url(&parsed, &self.config.code_hosts) {
            if let Some(readme) = fetch_readme(
                &self.client,
                &repo,
                &self.config.raw_content_base,
                &self.config.readme_branches,
            )
            .await
            {
                info!(
                    url = %parsed,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Extracted repository README"
                );
                return Ok(Article {
                    markdown: readme,
                    meta: readable.meta,
                });
            }
            debug!(url = %parsed, "No README found, converting page");
        }

        let markdown = to_markdown(&readable.html);
        info!(
            url = %parsed,
            length = readable.meta.length,
            duration_ms = start.elapsed().as_millis() as u64,
            "Extracted article"
        );
        Ok(Article {
            markdown,
            meta: readable.meta,
        })
    }

    async fn fetch_page(&self, url: &Url) -> std::result::Result<String, ExtractionError> {
        let response = self
            .client
            .get(url.as_str())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.2",
            )
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::FetchFailed(format!(
                "{}: status {}",
                url, status
            )));
        }

        response.text().await.map_err(|e| fetch_error(url, e))
    }
}

#[async_trait]
impl ArticleSource for ArticleExtractor {
    async fn extract(&self, url: &str) -> Result<Article> {
        Ok(self.extract_article(url).await?)
    }
}

fn parse_url(url: &str) -> std::result::Result<Url, ExtractionError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ExtractionError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        scheme => Err(ExtractionError::InvalidUrl(format!(
            "{}: unsupported scheme {:?}",
            url, scheme
        ))),
    }
}

fn fetch_error(url: &Url, e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::Timeout(url.to_string())
    } else {
        ExtractionError::FetchFailed(format!("{}: {}", url, e))
    }
}
