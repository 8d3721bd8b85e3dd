//! Error types for the HTTP adapter

use sync_engine::RemoteError;
use thiserror::Error;

/// Errors produced while talking to the cloud API or the editor host
#[derive(Debug, Error)]
pub enum HttpAdapterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("No API token available")]
    MissingToken,
}

impl From<HttpAdapterError> for RemoteError {
    fn from(err: HttpAdapterError) -> Self {
        match err {
            HttpAdapterError::Http(e) => RemoteError::Transport(e.to_string()),
            HttpAdapterError::Status { status, body } => RemoteError::Http { status, body },
            HttpAdapterError::Decode(msg) => RemoteError::Decode(msg),
            HttpAdapterError::Rejected(msg) => RemoteError::Rejected(msg),
            HttpAdapterError::MissingToken => RemoteError::rejected("no API token available"),
        }
    }
}

/// Turn a non-success response into [`HttpAdapterError::Status`]
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, HttpAdapterError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(HttpAdapterError::Status { status, body })
}
