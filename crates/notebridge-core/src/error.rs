//! Error types for notebridge.

use thiserror::Error;

/// Result type alias using notebridge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds of the link-to-article pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// URL could not be parsed or uses an unsupported scheme
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Page fetch exceeded the configured bound
    #[error("timed out: {0}")]
    Timeout(String),

    /// Page could not be fetched or no readable content was found
    #[error("fetch failed: {0}")]
    FetchFailed(String),
}

impl ExtractionError {
    fn map_message(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            ExtractionError::InvalidUrl(m) => ExtractionError::InvalidUrl(f(m)),
            ExtractionError::Timeout(m) => ExtractionError::Timeout(f(m)),
            ExtractionError::FetchFailed(m) => ExtractionError::FetchFailed(f(m)),
        }
    }
}

/// Core error type for notebridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad credentials or auth parameters that failed the integrity check
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Backend unreachable or batch rejected
    #[error("Sync error: {0}")]
    Sync(String),

    /// Article extraction failed
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Item could not be encrypted under the current key chain
    #[error("Seal error: {0}")]
    Seal(String),

    /// Item could not be decrypted (key chain mismatch or corrupted item)
    #[error("Unseal error: {0}")]
    Unseal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fieldless discriminant of [`Error`], for matching on the kind of failure
/// without caring about the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Sync,
    Extraction,
    Seal,
    Unseal,
    Config,
    Request,
    Serialization,
    InvalidInput,
    Internal,
}

impl Error {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth(_) => ErrorKind::Auth,
            Error::Sync(_) => ErrorKind::Sync,
            Error::Extraction(_) => ErrorKind::Extraction,
            Error::Seal(_) => ErrorKind::Seal,
            Error::Unseal(_) => ErrorKind::Unseal,
            Error::Config(_) => ErrorKind::Config,
            Error::Request(_) => ErrorKind::Request,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Prefix the message with the name of the operation that failed.
    ///
    /// The variant is preserved, so wrapping never changes the kind.
    pub fn within(self, op: &str) -> Self {
        let prefix = |m: String| format!("{}: {}", op, m);
        match self {
            Error::Auth(m) => Error::Auth(prefix(m)),
            Error::Sync(m) => Error::Sync(prefix(m)),
            Error::Extraction(e) => Error::Extraction(e.map_message(prefix)),
            Error::Seal(m) => Error::Seal(prefix(m)),
            Error::Unseal(m) => Error::Unseal(prefix(m)),
            Error::Config(m) => Error::Config(prefix(m)),
            Error::Request(m) => Error::Request(prefix(m)),
            Error::Serialization(m) => Error::Serialization(prefix(m)),
            Error::InvalidInput(m) => Error::InvalidInput(prefix(m)),
            Error::Internal(m) => Error::Internal(prefix(m)),
        }
    }
}

/// Attach an operation name to the error of a `Result`.
pub trait ResultExt<T> {
    fn within(self, op: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn within(self, op: &str) -> Result<T> {
        self.map_err(|e| e.within(op))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
