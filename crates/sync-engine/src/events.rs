//! Event types for streaming sync progress
//!
//! The orchestrator never touches the UI. It emits discrete events that a
//! consumer (see [`crate::ui_adapter::UiEventAdapter`]) turns into button and
//! message updates.

use serde::{Deserialize, Serialize};

use crate::error::SyncErrorKind;
use crate::state::SyncState;
use crate::types::{DependencyBundle, TaskStatus};

/// Trait for sending sync events
///
/// This abstracts over the transport mechanism (UI adapter, channel, etc.)
/// so the orchestrator can run in different hosts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: SyncEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted during a sync attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
    /// A sync attempt started and the trigger should be disabled
    #[serde(rename_all = "camelCase")]
    Started { sync_id: String },

    /// The state machine moved to a new state
    #[serde(rename_all = "camelCase")]
    StateChanged {
        sync_id: String,
        state: SyncState,
        message: String,
    },

    /// No credential is present; the login flow should be shown
    #[serde(rename_all = "camelCase")]
    AuthRequired { sync_id: String },

    /// Dependencies were classified and are about to be uploaded
    #[serde(rename_all = "camelCase")]
    DependenciesResolved {
        sync_id: String,
        bundle: DependencyBundle,
    },

    /// Progress report for the server-side sync task
    #[serde(rename_all = "camelCase")]
    TaskProgress {
        sync_id: String,
        task_id: String,
        status: TaskStatus,
        progress: Option<f32>,
        message: Option<String>,
    },

    /// The run was queued
    #[serde(rename_all = "camelCase")]
    Completed {
        sync_id: String,
        workflow_id: String,
        version: i64,
        link: String,
    },

    /// The attempt failed
    #[serde(rename_all = "camelCase")]
    Failed {
        sync_id: String,
        kind: SyncErrorKind,
        error: String,
    },

    /// The attempt is over (success or failure); always the last event
    #[serde(rename_all = "camelCase")]
    Finished { sync_id: String },
}

impl SyncEvent {
    /// Create a state change event carrying the state's status message
    pub fn state_changed(sync_id: &str, state: SyncState) -> Self {
        Self::StateChanged {
            sync_id: sync_id.to_string(),
            state,
            message: state.status_message().to_string(),
        }
    }

    /// The sync attempt this event belongs to
    pub fn sync_id(&self) -> &str {
        match self {
            Self::Started { sync_id }
            | Self::StateChanged { sync_id, .. }
            | Self::AuthRequired { sync_id }
            | Self::DependenciesResolved { sync_id, .. }
            | Self::TaskProgress { sync_id, .. }
            | Self::Completed { sync_id, .. }
            | Self::Failed { sync_id, .. }
            | Self::Finished { sync_id } => sync_id,
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: SyncEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<SyncEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// States visited, in order
    pub fn states(&self) -> Vec<SyncState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SyncEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: SyncEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}
