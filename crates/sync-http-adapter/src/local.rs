//! Editor host client
//!
//! The editor host runs next to the user's graph and exposes prompt
//! validation, the installed custom node list, and the dependency upload task
//! under `/comfy-cloud/*`.

use async_trait::async_trait;
use sync_engine::{
    CustomNodeMap, CustomNodeRegistry, DependencyBundle, DependencyUploader, GraphSnapshot,
    RemoteResult, TaskReport, TaskStatusApi, UploadAck, ValidationReport, ValidationService,
};

use crate::config::HttpAdapterConfig;
use crate::constants::{join, local};
use crate::error::{check_status, HttpAdapterError};
use crate::wire::{
    CustomNodesResponse, UploadRequest, UploadResponse, UploadStatusResponse,
    ValidatePromptRequest, ValidatePromptResponse,
};

/// Client for the editor host's sync routes
pub struct LocalHostClient {
    http_client: reqwest::Client,
    base_url: String,
    /// Cloud endpoint the host uploads dependencies to
    endpoint: String,
}

impl LocalHostClient {
    pub fn new(config: &HttpAdapterConfig) -> Result<Self, HttpAdapterError> {
        Ok(Self::with_client(
            config.build_client()?,
            &config.local_url,
            &config.endpoint,
        ))
    }

    pub fn with_client(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            endpoint: endpoint.into(),
        }
    }

    fn status_url(&self, task_id: &str) -> String {
        format!("{}/{}", join(&self.base_url, local::UPLOAD_STATUS), task_id)
    }

    async fn validate_prompt(
        &self,
        snapshot: &GraphSnapshot,
    ) -> Result<ValidationReport, HttpAdapterError> {
        let url = join(&self.base_url, local::VALIDATE_PROMPT);
        let response = self
            .http_client
            .post(&url)
            .json(&ValidatePromptRequest {
                workflow_api: snapshot,
            })
            .send()
            .await?;

        let body: ValidatePromptResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| HttpAdapterError::Decode(e.to_string()))?;

        Ok(body.into_report())
    }

    async fn list_custom_nodes(&self) -> Result<CustomNodeMap, HttpAdapterError> {
        let url = join(&self.base_url, local::CUSTOM_NODES);
        let response = self.http_client.get(&url).send().await?;

        let body: CustomNodesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| HttpAdapterError::Decode(e.to_string()))?;

        log::debug!("Editor host reports {} custom node packages", body.custom_nodes.len());
        Ok(body.custom_nodes)
    }

    async fn start_upload(
        &self,
        workflow_id: &str,
        bundle: &DependencyBundle,
    ) -> Result<UploadAck, HttpAdapterError> {
        let url = join(&self.base_url, local::UPLOAD);
        let request = UploadRequest {
            workflow_id,
            endpoint: &self.endpoint,
            bundle,
        };

        log::info!(
            "Uploading {} dependencies for workflow {}",
            bundle.len(),
            workflow_id
        );
        let response = self.http_client.post(&url).json(&request).send().await?;

        // failures come back as 500 with `{success: false, message}`
        let status = response.status();
        let text = response.text().await?;
        let body: UploadResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(HttpAdapterError::Status {
                    status: status.as_u16(),
                    body: text,
                })
            }
            Err(e) => return Err(HttpAdapterError::Decode(e.to_string())),
        };

        if !body.success {
            return Err(HttpAdapterError::Rejected(
                body.message
                    .unwrap_or_else(|| format!("upload refused with status {}", status)),
            ));
        }

        Ok(UploadAck {
            task_id: body.task_id,
        })
    }

    async fn upload_status(&self, task_id: &str) -> Result<TaskReport, HttpAdapterError> {
        let response = self.http_client.get(self.status_url(task_id)).send().await?;

        let body: UploadStatusResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| HttpAdapterError::Decode(e.to_string()))?;

        Ok(body.into_report())
    }
}

#[async_trait]
impl ValidationService for LocalHostClient {
    async fn validate(&self, snapshot: &GraphSnapshot) -> RemoteResult<ValidationReport> {
        Ok(self.validate_prompt(snapshot).await?)
    }
}

#[async_trait]
impl CustomNodeRegistry for LocalHostClient {
    async fn custom_nodes(&self) -> RemoteResult<CustomNodeMap> {
        Ok(self.list_custom_nodes().await?)
    }
}

#[async_trait]
impl DependencyUploader for LocalHostClient {
    async fn upload(&self, workflow_id: &str, bundle: &DependencyBundle) -> RemoteResult<UploadAck> {
        Ok(self.start_upload(workflow_id, bundle).await?)
    }
}

#[async_trait]
impl TaskStatusApi for LocalHostClient {
    async fn status(&self, task_id: &str) -> RemoteResult<TaskReport> {
        Ok(self.upload_status(task_id).await?)
    }
}
