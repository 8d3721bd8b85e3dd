//! Cloud API client
//!
//! Workflow records and run creation. Every request carries the user's API
//! token as a bearer credential.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sync_engine::{
    AuthStore, DependencyBundle, GraphSnapshot, RemoteResult, RunApi, UpdateAck,
    WorkflowMetadata, WorkflowRemote,
};

use crate::config::HttpAdapterConfig;
use crate::constants::{cloud, join};
use crate::error::{check_status, HttpAdapterError};
use crate::wire::{
    CreateWorkflowRequest, FetchWorkflowRequest, FetchWorkflowResponse, RunRequest,
    UpdateWorkflowRequest, WorkflowRecord,
};

/// Client for the cloud workflow API
pub struct CloudClient {
    http_client: reqwest::Client,
    endpoint: String,
    auth: Arc<dyn AuthStore>,
}

impl CloudClient {
    pub fn new(config: &HttpAdapterConfig, auth: Arc<dyn AuthStore>) -> Result<Self, HttpAdapterError> {
        Ok(Self::with_client(config.build_client()?, &config.endpoint, auth))
    }

    /// Use an existing HTTP client (shared connection pool)
    pub fn with_client(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        auth: Arc<dyn AuthStore>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            auth,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn workflow_url(&self, workflow_id: &str) -> String {
        format!("{}/{}", join(&self.endpoint, cloud::WORKFLOW), workflow_id)
    }

    fn token(&self) -> Result<String, HttpAdapterError> {
        self.auth
            .token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(HttpAdapterError::MissingToken)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, HttpAdapterError> {
        let token = self.token()?;

        log::debug!("POST {}", url);
        let response = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        check_status(response).await
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, HttpAdapterError> {
        self.post(url, body)
            .await?
            .json()
            .await
            .map_err(|e| HttpAdapterError::Decode(e.to_string()))
    }

    async fn create(&self, name: &str) -> Result<WorkflowRecord, HttpAdapterError> {
        let url = join(&self.endpoint, cloud::WORKFLOW);
        let record: WorkflowRecord = self
            .post_json(&url, &CreateWorkflowRequest { workflow_name: name })
            .await?;

        if record.workflow_id.is_empty() {
            return Err(HttpAdapterError::Decode(
                "workflow created without an ID".to_string(),
            ));
        }
        Ok(record)
    }

    async fn fetch(
        &self,
        workflow_id: &str,
        version: i64,
    ) -> Result<GraphSnapshot, HttpAdapterError> {
        let response: FetchWorkflowResponse = self
            .post_json(&self.workflow_url(workflow_id), &FetchWorkflowRequest { version })
            .await?;

        Ok(response.workflow_api.unwrap_or_default())
    }

    async fn update(
        &self,
        workflow_id: &str,
        snapshot: &GraphSnapshot,
        metadata: &WorkflowMetadata,
        dependencies: &DependencyBundle,
    ) -> Result<WorkflowRecord, HttpAdapterError> {
        let url = join(&self.endpoint, cloud::WORKFLOW);
        let request = UpdateWorkflowRequest {
            workflow_name: &metadata.workflow_name,
            workflow_id,
            workflow_api: snapshot,
            dependencies,
        };
        self.post_json(&url, &request).await
    }

    async fn run(&self, workflow_id: &str, version: i64) -> Result<(), HttpAdapterError> {
        let url = join(&self.endpoint, cloud::RUN);
        let request = RunRequest {
            workflow_id,
            version,
            inputs: serde_json::Map::new(),
        };
        self.post(&url, &request).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowRemote for CloudClient {
    async fn create_workflow(&self, name: &str) -> RemoteResult<String> {
        let record = self.create(name).await?;
        log::info!("Cloud workflow '{}' created as {}", name, record.workflow_id);
        Ok(record.workflow_id)
    }

    async fn fetch_workflow(&self, workflow_id: &str, version: i64) -> RemoteResult<GraphSnapshot> {
        Ok(self.fetch(workflow_id, version).await?)
    }

    async fn update_workflow(
        &self,
        workflow_id: &str,
        snapshot: &GraphSnapshot,
        metadata: &WorkflowMetadata,
        dependencies: &DependencyBundle,
    ) -> RemoteResult<UpdateAck> {
        let record = self
            .update(workflow_id, snapshot, metadata, dependencies)
            .await?;
        if record.workflow_id != workflow_id {
            log::warn!(
                "Update of workflow {} answered for {}",
                workflow_id,
                record.workflow_id
            );
        }
        Ok(UpdateAck {
            version: record.version,
        })
    }
}

#[async_trait]
impl RunApi for CloudClient {
    async fn create_run(&self, workflow_id: &str, version: i64) -> RemoteResult<()> {
        Ok(self.run(workflow_id, version).await?)
    }
}
