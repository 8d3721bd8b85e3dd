//! Interfaces of the collaborators the engine drives
//!
//! The engine never talks to the editor, the network or the screen
//! directly. Each concern is a trait so the orchestrator can be run against
//! the real host (see the `sync-http-adapter` crate) or against mocks.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{
    DependencyBundle, GraphSnapshot, MetadataNodeId, TaskReport, UpdateAck, UploadAck,
    ValidationReport, WorkflowMetadata,
};

/// Result type for collaborator calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Source of the API credential
pub trait AuthStore: Send + Sync {
    /// Current token, if the user is logged in
    fn token(&self) -> Option<String>;

    /// Ask the host to show its login flow
    fn request_login(&self);
}

/// Access to the live graph in the editor
///
/// Metadata reads and writes go through a handle to the metadata node
/// instead of positional widget access.
#[async_trait]
pub trait GraphHost: Send + Sync {
    /// Serialize the current graph in API format
    ///
    /// The metadata node is virtual and never appears in the snapshot.
    async fn capture_snapshot(&self) -> RemoteResult<GraphSnapshot>;

    /// Locate the designated metadata node, if the graph has one
    fn find_metadata_node(&self) -> Option<MetadataNodeId>;

    /// Add a metadata node carrying `name` to the graph
    fn create_metadata_node(&self, name: &str) -> RemoteResult<MetadataNodeId>;

    fn read_metadata(&self, node: &MetadataNodeId) -> RemoteResult<WorkflowMetadata>;

    fn write_metadata(&self, node: &MetadataNodeId, metadata: &WorkflowMetadata) -> RemoteResult<()>;
}

/// Blocking user input for the name of a new workflow
#[async_trait]
pub trait WorkflowNamePrompt: Send + Sync {
    /// Returns `None` if the user dismissed the dialog
    async fn request_workflow_name(&self) -> Option<String>;
}

/// Remote-side graph validity check
#[async_trait]
pub trait ValidationService: Send + Sync {
    async fn validate(&self, snapshot: &GraphSnapshot) -> RemoteResult<ValidationReport>;
}

/// Remote workflow records
#[async_trait]
pub trait WorkflowRemote: Send + Sync {
    /// Create a workflow and return its ID
    async fn create_workflow(&self, name: &str) -> RemoteResult<String>;

    /// Fetch the stored graph for a workflow version
    ///
    /// A workflow that has never been updated returns an empty snapshot.
    async fn fetch_workflow(&self, workflow_id: &str, version: i64) -> RemoteResult<GraphSnapshot>;

    /// Replace the stored graph and metadata
    ///
    /// `dependencies` is what this sync resolved for the changed nodes, so the
    /// record knows which assets the graph needs.
    async fn update_workflow(
        &self,
        workflow_id: &str,
        snapshot: &GraphSnapshot,
        metadata: &WorkflowMetadata,
        dependencies: &DependencyBundle,
    ) -> RemoteResult<UpdateAck>;
}

/// Uploads assets referenced by the graph
#[async_trait]
pub trait DependencyUploader: Send + Sync {
    async fn upload(&self, workflow_id: &str, bundle: &DependencyBundle) -> RemoteResult<UploadAck>;
}

/// Status of asynchronous sync tasks
#[async_trait]
pub trait TaskStatusApi: Send + Sync {
    async fn status(&self, task_id: &str) -> RemoteResult<TaskReport>;
}

/// Run creation
#[async_trait]
pub trait RunApi: Send + Sync {
    async fn create_run(&self, workflow_id: &str, version: i64) -> RemoteResult<()>;
}

/// Mapping from custom node package name to the class types it provides
pub type CustomNodeMap = HashMap<String, Vec<String>>;

/// Registry of custom node packages installed on the execution host
#[async_trait]
pub trait CustomNodeRegistry: Send + Sync {
    async fn custom_nodes(&self) -> RemoteResult<CustomNodeMap>;
}

/// Presentation surface for sync feedback
pub trait UiSink: Send + Sync {
    fn set_status_message(&self, text: &str);

    fn set_busy(&self, busy: bool);

    fn show_result(&self, title: &str, message: &str);

    fn show_error(&self, title: &str, message: &str);
}
