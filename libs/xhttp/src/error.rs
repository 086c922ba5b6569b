use std::time::Duration;
use thiserror::Error;

/// Boxed error used for hook failures and transport causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Classification of URL validation failures.
///
/// Provides programmatic matching for different failure modes without
/// relying on unstable error message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// URL could not be parsed (malformed syntax)
    ParseError,
    /// URL is missing required host/authority component
    MissingAuthority,
    /// URL is missing required scheme (http/https)
    MissingScheme,
}

/// Pipeline stage an [`HttpError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A pre-request hook failed
    Hook,
    /// The outbound request could not be assembled
    RequestConstruction,
    /// Network, TLS, timeout or cancellation failure
    Transport,
    /// The response body could not be streamed
    BodyRead,
    /// The response body could not be decoded into the result target
    Decode,
    /// Finishing the response stream failed
    Close,
}

/// Failure to place a response body into the caller's result target.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// Body was valid JSON but did not match the target's shape
    #[error("JSON decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Body was not JSON and the target cannot hold raw text
    #[error("result must be a string")]
    NotString,

    /// Target refused the raw text assignment
    #[error("result can not set")]
    Unsettable,
}

/// HTTP client error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// A pre-request hook returned an error; no request was sent
    #[error("before-request hook failed for '{url}': {source}")]
    Hook {
        /// URL of the record when the hook ran
        url: String,
        #[source]
        source: BoxError,
    },

    /// Request building failed
    #[error("Failed to build {method} request to '{url}': {source}")]
    RequestBuild {
        method: http::Method,
        url: String,
        #[source]
        source: http::Error,
    },

    /// Invalid header name
    #[error("Invalid header name '{name}': {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },

    /// Invalid header value
    #[error("Invalid value for header '{name}': {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },

    /// Invalid URL (failed to parse)
    ///
    /// Use the `kind` field for programmatic matching. The `reason` field contains
    /// a diagnostic message intended for logging only.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        /// The URL that failed to parse
        url: String,
        /// Structured failure classification for programmatic matching
        kind: InvalidUriKind,
        /// Diagnostic message (unstable format, for logging only)
        reason: String,
    },

    /// URL scheme other than http/https
    #[error("URL scheme '{scheme}' not allowed: only http:// and https:// are supported")]
    InvalidScheme {
        /// The URL scheme that was rejected
        scheme: String,
    },

    /// Transport error (network, connection, etc)
    #[error("Transport error for '{url}': {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// TLS configuration error
    #[error("TLS error: {0}")]
    Tls(#[source] BoxError),

    /// Round trip (send, body read and close) exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's cancellation token fired
    #[error("Request cancelled")]
    Cancelled,

    /// Reading the response body failed
    #[error("Failed to read response body: {0}")]
    BodyRead(#[source] BoxError),

    /// Response body could not be decoded into the result target
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] DecodeError),

    /// Finishing the response stream failed, possibly after an earlier error
    #[error("{}", close_message(.source, .prior.as_deref()))]
    Close {
        #[source]
        source: BoxError,
        /// Error that was already pending when the stream was finished
        prior: Option<Box<HttpError>>,
    },
}

fn close_message(source: &BoxError, prior: Option<&HttpError>) -> String {
    match prior {
        Some(prior) => format!("response body close failed: {source} (after: {prior})"),
        None => format!("response body close failed: {source}"),
    }
}

impl HttpError {
    /// Pipeline stage this error came from
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::Hook { .. } => ErrorKind::Hook,
            HttpError::RequestBuild { .. }
            | HttpError::InvalidHeaderName { .. }
            | HttpError::InvalidHeaderValue { .. }
            | HttpError::InvalidUri { .. }
            | HttpError::InvalidScheme { .. } => ErrorKind::RequestConstruction,
            HttpError::Transport { .. }
            | HttpError::Tls(_)
            | HttpError::Timeout(_)
            | HttpError::Cancelled => ErrorKind::Transport,
            HttpError::BodyRead(_) => ErrorKind::BodyRead,
            HttpError::Decode(_) => ErrorKind::Decode,
            HttpError::Close { .. } => ErrorKind::Close,
        }
    }

    /// Error that was pending when a [`HttpError::Close`] occurred
    #[must_use]
    pub fn prior(&self) -> Option<&HttpError> {
        match self {
            HttpError::Close { prior, .. } => prior.as_deref(),
            _ => None,
        }
    }

    /// Combine the outcome of the pipeline with the outcome of finishing the stream.
    pub(crate) fn with_close(
        outcome: Result<(), HttpError>,
        closed: Result<(), BoxError>,
    ) -> Result<(), HttpError> {
        match (outcome, closed) {
            (outcome, Ok(())) => outcome,
            (Ok(()), Err(source)) => Err(HttpError::Close {
                source,
                prior: None,
            }),
            (Err(prior), Err(source)) => Err(HttpError::Close {
                source,
                prior: Some(Box::new(prior)),
            }),
        }
    }
}
