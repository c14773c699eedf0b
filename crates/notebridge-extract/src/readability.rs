//! Main content detection.
//!
//! A thin layer over `dom_smoothie`, a port of Mozilla's Readability: the
//! content block comes back cleaned with its links and images resolved
//! against the page URL, together with the page metadata.

use dom_smoothie::Readability;
use tracing::debug;
use url::Url;

use notebridge_core::PageMeta;

/// Main content of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadableContent {
    /// Cleaned HTML of the content block, links absolute.
    pub html: String,
    pub meta: PageMeta,
}

/// Find the main content of `html`. Returns `None` when the page has no
/// readable text at all.
pub fn extract(html: &str, base: &Url) -> Option<ReadableContent> {
    let mut readability = match Readability::new(html, Some(base.as_str()), None) {
        Ok(readability) => readability,
        Err(e) => {
            debug!(url = %base, error = %e, "Page could not be parsed");
            return None;
        }
    };
    let article = match readability.parse() {
        Ok(article) => article,
        Err(e) => {
            debug!(url = %base, error = %e, "No readable content found");
            return None;
        }
    };

    let length = article.text_content.trim().chars().count();
    if length == 0 {
        return None;
    }

    Some(ReadableContent {
        html: article.content.to_string(),
        meta: PageMeta {
            title: article.title.trim().to_string(),
            length,
            site_name: non_empty(article.site_name),
            image: non_empty(article.image).map(|src| resolve(base, &src)),
        },
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Absolute form of `reference`; unparseable references are kept as given.
fn resolve(base: &Url, reference: &str) -> String {
    base.join(reference)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| reference.to_string())
}
