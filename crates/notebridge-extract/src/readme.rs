//! Repository README fast path for code-hosting links.

use reqwest::Client;
use tracing::debug;
use url::Url;

/// Owner and repository named by a code-hosting URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Repository behind `url` if its host is one of `hosts` and the path
    /// names at least an owner and a repository.
    pub fn from_url(url: &Url, hosts: &[String]) -> Option<Self> {
        let host = url.host_str()?;
        if !hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            return None;
        }
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?.to_string();
        let repo = segments.next()?.trim_end_matches(".git").to_string();
        if repo.is_empty() {
            return None;
        }
        Some(Self { owner, repo })
    }

    pub fn readme_url(&self, raw_base: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/{}/README.md",
            raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            branch
        )
    }
}

/// Probe `branches` in order and return the first README served with a
/// success status and a non-empty body.
pub async fn fetch_readme(
    client: &Client,
    repo: &RepoRef,
    raw_base: &str,
    branches: &[String],
) -> Option<String> {
    for branch in branches {
        let url = repo.readme_url(raw_base, branch);
        let response = match client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %url, error = %e, "README probe failed");
                continue;
            }
        };
        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "No README on branch");
            continue;
        }
        match response.text().await {
            Ok(body) if !body.trim().is_empty() => {
                debug!(url = %url, branch = %branch, "README found");
                return Some(body);
            }
            Ok(_) => debug!(url = %url, "Empty README"),
            Err(e) => debug!(url = %url, error = %e, "README body unreadable"),
        }
    }
    None
}
