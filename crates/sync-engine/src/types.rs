//! Core types for workflow synchronization
//!
//! These types describe the local graph snapshot, the workflow identity
//! persisted inside the graph, and the values derived from them during a
//! sync attempt (diff, dependency bundle, sync task state).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Unique identifier for a node in the graph
pub type NodeId = String;

/// Name of an input on a node
pub type InputName = String;

/// One node of the editor's API-format graph
///
/// Input values are kept as raw JSON: scalars, file references (strings)
/// and links to other nodes (`["4", 0]`) all compare structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Node type as registered in the execution engine (e.g. "KSampler")
    pub class_type: String,
    /// Input values keyed by input name
    #[serde(default)]
    pub inputs: BTreeMap<InputName, serde_json::Value>,
}

impl NodeDescriptor {
    /// Create a descriptor with no inputs
    pub fn new(class_type: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            inputs: BTreeMap::new(),
        }
    }

    /// Add an input value
    pub fn with_input(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    /// Get an input as a string, if it is one
    pub fn input_str(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).and_then(|v| v.as_str())
    }
}

/// Point-in-time serialization of the graph's structure and inputs
///
/// Captured once per sync attempt and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphSnapshot {
    nodes: BTreeMap<NodeId, NodeDescriptor>,
}

impl GraphSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning the snapshot (builder style)
    pub fn with_node(mut self, id: impl Into<NodeId>, node: NodeDescriptor) -> Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Find a node by ID
    pub fn get(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.get(id)
    }

    /// Iterate over nodes in ID order
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeDescriptor)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<(NodeId, NodeDescriptor)> for GraphSnapshot {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeDescriptor)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Entries of a local snapshot that are missing from (or differ in) the remote one
///
/// Empty means the remote workflow is up to date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffSet {
    entries: BTreeMap<NodeId, NodeDescriptor>,
}

impl DiffSet {
    pub(crate) fn insert(&mut self, id: NodeId, node: NodeDescriptor) {
        self.entries.insert(id, node);
    }

    /// Get the changed descriptor of a node
    pub fn get(&self, id: &str) -> Option<&NodeDescriptor> {
        self.entries.get(id)
    }

    /// Iterate over changed nodes in ID order
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeDescriptor)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there is nothing to sync
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(NodeId, NodeDescriptor)> for DiffSet {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeDescriptor)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Workflow identity stored on the graph's metadata node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// User-chosen workflow name
    pub workflow_name: String,
    /// Remote workflow ID; empty until the first successful create
    #[serde(default)]
    pub workflow_id: String,
    /// Remote version last pushed from this graph
    #[serde(default)]
    pub version: i64,
}

impl WorkflowMetadata {
    /// Metadata for a workflow that has never been synced
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            workflow_id: String::new(),
            version: 0,
        }
    }

    /// Whether the remote workflow record already exists
    pub fn is_synced(&self) -> bool {
        !self.workflow_id.is_empty()
    }
}

/// Handle to the designated metadata node, owned by the graph host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataNodeId(pub String);

impl MetadataNodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Assets that must exist remotely before a run can execute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyBundle {
    /// Model weight files (relative to the models directory)
    #[serde(rename = "modelsToUpload")]
    pub models_to_upload: BTreeSet<String>,
    /// Input files (relative to the input directory)
    #[serde(rename = "filesToUpload")]
    pub files_to_upload: BTreeSet<String>,
    /// Custom node packages
    #[serde(rename = "nodesToUpload")]
    pub nodes_to_upload: BTreeSet<String>,
}

impl DependencyBundle {
    /// True when all three sets are empty
    pub fn is_empty(&self) -> bool {
        self.models_to_upload.is_empty()
            && self.files_to_upload.is_empty()
            && self.nodes_to_upload.is_empty()
    }

    /// Total number of assets across all categories
    pub fn len(&self) -> usize {
        self.models_to_upload.len() + self.files_to_upload.len() + self.nodes_to_upload.len()
    }
}

/// Status of a server-side sync task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Succeeded and Failed are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One status report for a sync task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub status: TaskStatus,
    /// Progress fraction in 0..=1, when the server reports one
    #[serde(default)]
    pub progress: Option<f32>,
    /// Free-form stage description (e.g. "hashing")
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskReport {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            progress: None,
            message: None,
        }
    }
}

/// Validation error attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeError {
    pub node_id: NodeId,
    #[serde(default)]
    pub class_type: Option<String>,
    pub message: String,
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.class_type {
            Some(class_type) => write!(f, "{} ({}): {}", self.node_id, class_type, self.message),
            None => write!(f, "{}: {}", self.node_id, self.message),
        }
    }
}

/// Result of remote-side prompt validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<NodeError>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<NodeError>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }
}

/// Answer to a dependency upload request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadAck {
    /// Present when the upload continues as an asynchronous task
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Answer to a workflow update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAck {
    /// New remote version of the workflow
    pub version: i64,
}
