//! Error types for the sync engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that terminate a sync attempt
///
/// Every remote-call failure is mapped to exactly one of these at the
/// orchestrator level. None of them are retried automatically.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No credential available
    #[error("Not authenticated: log in before syncing")]
    Unauthenticated,

    /// Remote-side validation rejected the local graph
    #[error("Prompt is not valid: {0}")]
    InvalidPrompt(String),

    /// Could not create the remote workflow record
    #[error("Failed to create workflow: {0}")]
    WorkflowCreateFailed(String),

    /// Could not retrieve the remote snapshot
    #[error("Failed to retrieve workflow from cloud: {0}")]
    FetchRemoteFailed(String),

    /// Dependency upload or the resulting sync task failed
    #[error("Failed to sync dependencies: {0}")]
    DependencySyncFailed(String),

    /// Pushing the local graph to the remote workflow record failed
    #[error("Failed to upload workflow: {0}")]
    UploadFailed(String),

    /// The run request was refused
    #[error("Failed to create run: {0}")]
    RunCreationFailed(String),

    /// The sync task did not reach a terminal state in time
    #[error("Timed out waiting for sync task '{task_id}' after {waited_ms}ms")]
    PollTimeout { task_id: String, waited_ms: u64 },

    /// Engine misuse (e.g. diffing an empty local snapshot)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A sync is already in flight on this orchestrator
    #[error("A sync is already in progress")]
    SyncInProgress,

    /// The user aborted the sync
    #[error("Sync cancelled")]
    Cancelled,
}

/// Discriminant of [`SyncError`], used by the UI layer and in events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    Unauthenticated,
    InvalidPrompt,
    WorkflowCreateFailed,
    FetchRemoteFailed,
    DependencySyncFailed,
    UploadFailed,
    RunCreationFailed,
    PollTimeout,
    InvalidArgument,
    SyncInProgress,
    Cancelled,
}

impl SyncError {
    /// The kind of this error
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            Self::Unauthenticated => SyncErrorKind::Unauthenticated,
            Self::InvalidPrompt(_) => SyncErrorKind::InvalidPrompt,
            Self::WorkflowCreateFailed(_) => SyncErrorKind::WorkflowCreateFailed,
            Self::FetchRemoteFailed(_) => SyncErrorKind::FetchRemoteFailed,
            Self::DependencySyncFailed(_) => SyncErrorKind::DependencySyncFailed,
            Self::UploadFailed(_) => SyncErrorKind::UploadFailed,
            Self::RunCreationFailed(_) => SyncErrorKind::RunCreationFailed,
            Self::PollTimeout { .. } => SyncErrorKind::PollTimeout,
            Self::InvalidArgument(_) => SyncErrorKind::InvalidArgument,
            Self::SyncInProgress => SyncErrorKind::SyncInProgress,
            Self::Cancelled => SyncErrorKind::Cancelled,
        }
    }

    /// Create an invalid argument error with a message
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Error returned by every remote collaborator
///
/// Transport crates convert their native errors into this type so the
/// orchestrator never depends on a particular HTTP client.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The remote answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never completed (connection refused, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The remote answered successfully but refused the operation
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(serde_json::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(serde_json::Error),
}
