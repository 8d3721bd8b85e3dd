//! Request and response payloads of the cloud API and the editor host

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sync_engine::{
    DependencyBundle, GraphSnapshot, NodeError, TaskReport, TaskStatus, ValidationReport,
};

#[derive(Debug, Serialize)]
pub(crate) struct CreateWorkflowRequest<'a> {
    pub workflow_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateWorkflowRequest<'a> {
    pub workflow_name: &'a str,
    pub workflow_id: &'a str,
    pub workflow_api: &'a GraphSnapshot,
    pub dependencies: &'a DependencyBundle,
}

/// Answer to create and update
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRecord {
    pub workflow_id: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct FetchWorkflowRequest {
    pub version: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FetchWorkflowResponse {
    /// Null until the workflow has been updated once
    #[serde(default)]
    pub workflow_api: Option<GraphSnapshot>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunRequest<'a> {
    pub workflow_id: &'a str,
    pub version: i64,
    pub inputs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidatePromptRequest<'a> {
    pub workflow_api: &'a GraphSnapshot,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatePromptResponse {
    pub is_valid: bool,
    /// `{node_id: {errors: [{message, details}], class_type}}`, or an empty list
    #[serde(default)]
    pub node_errors: serde_json::Value,
}

impl ValidatePromptResponse {
    pub fn into_report(self) -> ValidationReport {
        let errors = parse_node_errors(&self.node_errors);
        if self.is_valid {
            ValidationReport {
                is_valid: true,
                errors,
            }
        } else {
            ValidationReport::invalid(errors)
        }
    }
}

fn parse_node_errors(value: &serde_json::Value) -> Vec<NodeError> {
    let Some(nodes) = value.as_object() else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    for (node_id, entry) in nodes {
        let class_type = entry
            .get("class_type")
            .and_then(|c| c.as_str())
            .map(str::to_string);

        let messages: Vec<String> = entry
            .get("errors")
            .and_then(|e| e.as_array())
            .map(|list| list.iter().filter_map(error_message).collect())
            .unwrap_or_default();

        if messages.is_empty() {
            errors.push(NodeError {
                node_id: node_id.clone(),
                class_type,
                message: "invalid node".to_string(),
            });
            continue;
        }

        for message in messages {
            errors.push(NodeError {
                node_id: node_id.clone(),
                class_type: class_type.clone(),
                message,
            });
        }
    }
    errors
}

fn error_message(error: &serde_json::Value) -> Option<String> {
    let message = error.get("message").and_then(|m| m.as_str())?;
    match error.get("details").and_then(|d| d.as_str()) {
        Some(details) if !details.is_empty() => Some(format!("{}: {}", message, details)),
        _ => Some(message.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomNodesResponse {
    #[serde(default)]
    pub custom_nodes: HashMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadRequest<'a> {
    pub workflow_id: &'a str,
    pub endpoint: &'a str,
    #[serde(flatten)]
    pub bundle: &'a DependencyBundle,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Upload task as reported by the editor host
#[derive(Debug, Deserialize)]
pub(crate) struct UploadStatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadStatusResponse {
    pub fn into_report(self) -> TaskReport {
        let stage = self.status.to_ascii_lowercase();
        let status = task_status(&stage);
        let message = self.message.filter(|m| !m.is_empty()).or_else(|| {
            matches!(stage.as_str(), "hashing" | "uploading").then(|| capitalize(&stage))
        });

        TaskReport {
            status,
            progress: progress_fraction(&self.progress),
            message,
        }
    }
}

/// Map a host task status string onto [`TaskStatus`]
pub(crate) fn task_status(stage: &str) -> TaskStatus {
    match stage {
        "completed" | "succeeded" | "success" => TaskStatus::Succeeded,
        "error" | "failed" | "failure" => TaskStatus::Failed,
        "hashing" | "uploading" | "running" => TaskStatus::Running,
        _ => TaskStatus::Pending,
    }
}

/// Progress as a fraction; hosts report either 0..=1 or a percentage
fn progress_fraction(value: &serde_json::Value) -> Option<f32> {
    let raw = value.as_f64()?;
    let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
    Some(fraction.clamp(0.0, 1.0) as f32)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
