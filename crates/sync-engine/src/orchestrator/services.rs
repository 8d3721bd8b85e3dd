//! Collaborator bundle and attempt summary

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collaborators::{
    AuthStore, CustomNodeRegistry, DependencyUploader, GraphHost, RunApi, TaskStatusApi,
    ValidationService, WorkflowNamePrompt, WorkflowRemote,
};
use crate::types::DependencyBundle;

/// Every collaborator a sync attempt talks to
///
/// Cheap to clone; the same service may back several fields (e.g. one HTTP
/// client implementing both `WorkflowRemote` and `RunApi`).
#[derive(Clone)]
pub struct SyncServices {
    pub auth: Arc<dyn AuthStore>,
    pub graph: Arc<dyn GraphHost>,
    pub name_prompt: Arc<dyn WorkflowNamePrompt>,
    pub validation: Arc<dyn ValidationService>,
    pub workflows: Arc<dyn WorkflowRemote>,
    pub uploader: Arc<dyn DependencyUploader>,
    pub tasks: Arc<dyn TaskStatusApi>,
    pub runs: Arc<dyn RunApi>,
    pub registry: Arc<dyn CustomNodeRegistry>,
}

/// Summary of a successful sync attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub sync_id: String,
    pub workflow_id: String,
    /// Remote version the run was queued against
    pub version: i64,
    /// True if this attempt created the remote workflow record
    pub created_workflow: bool,
    /// Number of nodes that differed from the remote copy
    pub changed_nodes: usize,
    pub bundle: DependencyBundle,
    /// Custom class types that could not be resolved to a package
    pub unresolved_nodes: BTreeSet<String>,
    /// Server-side task that carried the dependency upload, if any
    pub task_id: Option<String>,
    /// Dashboard deep link for the queued run
    pub link: String,
}

impl SyncReport {
    /// True if the remote workflow was already up to date
    pub fn was_up_to_date(&self) -> bool {
        self.changed_nodes == 0
    }
}
