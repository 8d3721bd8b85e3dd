//! Sync Engine - Workflow synchronization and dependency resolution
//!
//! This crate pushes a locally edited node graph to a remote execution
//! service and queues a run of it. It provides:
//!
//! - A directional structural diff between the local graph and its last-synced copy
//! - Classification of changed nodes into models, input files and custom node packages
//! - A sequential sync state machine with one-at-a-time and cancellation semantics
//! - A fixed-interval poller for the server-side dependency sync task
//!
//! # Architecture
//!
//! The engine never performs I/O itself. Every side effect goes through a
//! collaborator trait (see [`collaborators`]), and progress is reported as
//! [`SyncEvent`]s through an [`EventSink`]. The `sync-http-adapter` crate
//! provides HTTP implementations of the remote collaborators.
//!
//! # Example
//!
//! ```ignore
//! use sync_engine::{SyncConfig, SyncOrchestrator, SyncServices};
//!
//! let orchestrator = SyncOrchestrator::with_ui(services, SyncConfig::default(), ui);
//! let report = orchestrator.run_sync().await?;
//! println!("queued at {}", report.link);
//! ```

pub mod classify;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod diff;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod poller;
pub mod state;
pub mod types;
pub mod ui_adapter;

// Re-export key types
pub use classify::{ClassifyReport, DependencyClassifier};
pub use collaborators::{
    AuthStore, CustomNodeMap, CustomNodeRegistry, DependencyUploader, GraphHost, RemoteResult,
    RunApi, TaskStatusApi, UiSink, ValidationService, WorkflowNamePrompt, WorkflowRemote,
};
pub use config::SyncConfig;
pub use diff::diff;
pub use error::{ConfigError, RemoteError, Result, SyncError, SyncErrorKind};
pub use events::{EventError, EventSink, NullEventSink, SyncEvent, VecEventSink};
pub use orchestrator::{SyncOrchestrator, SyncReport, SyncServices};
pub use poller::{PollOutcome, TaskPoller};
pub use state::SyncState;
pub use types::{
    DependencyBundle, DiffSet, GraphSnapshot, MetadataNodeId, NodeDescriptor, NodeError, NodeId,
    TaskReport, TaskStatus, UpdateAck, UploadAck, ValidationReport, WorkflowMetadata,
};
pub use ui_adapter::UiEventAdapter;
