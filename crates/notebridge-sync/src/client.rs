//! HTTP client for the note backend.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use notebridge_core::defaults::{
    SYNC_API_VERSION, SYNC_ENDPOINT, SYNC_MAX_PAGES, SYNC_TIMEOUT_SECS,
};
use notebridge_core::{ContentType, EncryptedItem, Error, Result};

use crate::types::*;

/// Thin wrapper over the backend's auth and sync endpoints.
///
/// Holds no session state; callers pass the access token explicitly.
#[derive(Debug, Clone)]
pub struct SyncClient {
    http: Client,
    endpoint: String,
}

impl SyncClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid backend endpoint {:?}: {}", endpoint, e)))?
            .to_string()
            .trim_end_matches('/')
            .to_string();

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, endpoint })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(SYNC_ENDPOINT, Duration::from_secs(SYNC_TIMEOUT_SECS))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Fetch the key-derivation parameters for `email`.
    pub async fn auth_params(&self, email: &str) -> Result<AuthParams> {
        let response = self
            .http
            .get(self.url("/auth/params"))
            .query(&[("email", email), ("api", SYNC_API_VERSION)])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                    Error::Auth(format!("no auth params for account: {}", message))
                }
                _ => Error::Sync(format!("backend returned {}: {}", status, message)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed auth params: {}", e)))
    }

    /// Exchange the server password for an access token.
    pub async fn sign_in(&self, email: &str, server_password: String) -> Result<String> {
        let request = SignInRequest {
            api: SYNC_API_VERSION.to_string(),
            email: email.to_string(),
            password: server_password,
        };

        let response = self
            .http
            .post(self.url("/auth/sign_in"))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::Auth(format!("invalid email or password: {}", message))
                }
                _ => Error::Sync(format!("backend returned {}: {}", status, message)),
            });
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed sign-in response: {}", e)))?;

        body.access_token()
            .map(str::to_string)
            .ok_or_else(|| Error::Auth("sign-in response carried no access token".to_string()))
    }

    /// Terminate the session behind `token`.
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/sign_out"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "api": SYNC_API_VERSION }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(Error::Sync(format!(
                "sign out returned {}: {}",
                status, message
            )));
        }
        Ok(())
    }

    /// Run one sync round trip.
    pub async fn sync(&self, token: &str, request: &SyncRequest) -> Result<SyncResponse> {
        debug!(
            item_count = request.items.len(),
            content_type = ?request.content_type,
            has_cursor = request.cursor_token.is_some(),
            "Sync request"
        );

        let response = self
            .http
            .post(self.url("/items/sync"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    Error::Auth(format!("session rejected: {}", message))
                }
                _ => Error::Sync(format!("backend returned {}: {}", status, message)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Sync(format!("Failed to parse sync response: {}", e)))
    }

    /// Retrieve every item of `content_type`, following cursor tokens.
    pub async fn retrieve_all(
        &self,
        token: &str,
        content_type: ContentType,
        page_limit: u32,
        compute_integrity: bool,
    ) -> Result<Retrieved> {
        let mut retrieved = Retrieved::default();
        let mut cursor_token = None;

        for page in 0..SYNC_MAX_PAGES {
            let request = SyncRequest {
                api: SYNC_API_VERSION.to_string(),
                items: Vec::new(),
                sync_token: None,
                cursor_token: cursor_token.take(),
                content_type: Some(content_type),
                compute_integrity,
                limit: Some(page_limit),
            };

            let response = self.sync(token, &request).await?;
            retrieved.items.extend(response.retrieved_items);
            if response.sync_token.is_some() {
                retrieved.sync_token = response.sync_token;
            }
            if response.integrity_hash.is_some() {
                retrieved.integrity_hash = response.integrity_hash;
            }

            match response.cursor_token.filter(|c| !c.is_empty()) {
                Some(next) => cursor_token = Some(next),
                None => {
                    debug!(
                        content_type = %content_type,
                        pages = page + 1,
                        item_count = retrieved.items.len(),
                        "Retrieval complete"
                    );
                    return Ok(retrieved);
                }
            }
        }

        Err(Error::Sync(format!(
            "retrieval of {} items did not finish within {} pages",
            content_type, SYNC_MAX_PAGES
        )))
    }
}

/// Items accumulated across the pages of one retrieval.
#[derive(Debug, Clone, Default)]
pub struct Retrieved {
    pub items: Vec<EncryptedItem>,
    pub sync_token: Option<String>,
    pub integrity_hash: Option<String>,
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Sync(format!("backend request timed out: {}", e))
    } else {
        Error::Sync(format!("backend unreachable: {}", e))
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) if !body.error.message.is_empty() => body.error.message,
        _ => {
            if !text.is_empty() {
                warn!(body_len = text.len(), "Backend error without structured message");
            }
            "Unknown error".to_string()
        }
    }
}
