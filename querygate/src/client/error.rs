use thiserror::Error;

use super::config::ConfigError;

/// Errors raised by the request pipeline.
///
/// Business failures are not errors: a well-formed `Failure` envelope is
/// returned to the caller as a value, whatever the HTTP status. These
/// variants cover transport faults and contract violations only.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, timeout, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status and no envelope.
    #[error("HTTP {status} without a response envelope")]
    Status { status: u16, body: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Contract ────────────────────────────────────────────────────
    /// The body is not a `{status, messages, data}` envelope.
    #[error("Invalid response shape: {message}")]
    InvalidResponseShape { message: String, body: String },

    /// The envelope is well formed but its `data` does not match the
    /// expected type.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The request payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The bearer token contains characters not allowed in a header.
    #[error("Bearer token is not a valid header value")]
    InvalidToken,

    /// The client configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    // ── Control flow ────────────────────────────────────────────────
    /// Every attempt failed with a transient error.
    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    /// The caller cancelled the request before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether the request may have reached the server, so a write could
    /// have been applied even though the call failed.
    pub fn may_have_reached_server(&self) -> bool {
        !matches!(
            self,
            Self::InvalidUrl(_) | Self::InvalidToken | Self::Serialization(_) | Self::Config(_)
        )
    }

    /// The last error behind a `RetriesExhausted`, or `self`.
    pub fn root(&self) -> &Self {
        match self {
            Self::RetriesExhausted { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Trim a response body for error messages.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
