//! Scripted in-memory stand-ins for every sync collaborator

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sync_engine::{
    AuthStore, CustomNodeMap, CustomNodeRegistry, DependencyBundle, DependencyUploader,
    GraphHost, GraphSnapshot, MetadataNodeId, RemoteError, RemoteResult, RunApi, SyncServices,
    TaskReport, TaskStatus, TaskStatusApi, UiSink, UpdateAck, UploadAck, ValidationReport,
    ValidationService, WorkflowMetadata, WorkflowNamePrompt, WorkflowRemote,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A call received by the fake, with the arguments that matter to the tests
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CaptureSnapshot,
    CreateMetadataNode(String),
    WriteMetadata(WorkflowMetadata),
    RequestWorkflowName,
    Validate,
    CreateWorkflow(String),
    FetchWorkflow(String, i64),
    UpdateWorkflow {
        workflow_id: String,
        snapshot: GraphSnapshot,
        metadata: WorkflowMetadata,
        dependencies: DependencyBundle,
    },
    Upload(String, DependencyBundle),
    Status(String),
    CreateRun(String, i64),
    CustomNodes,
}

/// Which remote call should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nowhere,
    Validate,
    CreateWorkflow,
    FetchWorkflow,
    Upload,
    Status,
    UpdateWorkflow,
    CreateRun,
    CustomNodes,
}

pub struct FakeCloud {
    pub token: Mutex<Option<String>>,
    pub login_requests: AtomicUsize,
    pub local: Mutex<GraphSnapshot>,
    pub metadata: Mutex<Option<WorkflowMetadata>>,
    pub workflow_name: Mutex<Option<String>>,
    pub validation: Mutex<ValidationReport>,
    pub remote: Mutex<GraphSnapshot>,
    pub next_version: Mutex<i64>,
    pub upload_task: Mutex<Option<String>>,
    /// Status answers, in order; the last one repeats
    pub statuses: Mutex<Vec<TaskReport>>,
    pub registry: Mutex<CustomNodeMap>,
    pub fail_at: Mutex<FailAt>,
    calls: Mutex<Vec<Call>>,
    status_calls: AtomicUsize,
}

impl FakeCloud {
    pub fn new(local: GraphSnapshot) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some("api-token".to_string())),
            login_requests: AtomicUsize::new(0),
            local: Mutex::new(local),
            metadata: Mutex::new(None),
            workflow_name: Mutex::new(Some("My workflow".to_string())),
            validation: Mutex::new(ValidationReport::valid()),
            remote: Mutex::new(GraphSnapshot::new()),
            next_version: Mutex::new(1),
            upload_task: Mutex::new(Some("task-42".to_string())),
            statuses: Mutex::new(vec![TaskReport::new(TaskStatus::Succeeded)]),
            registry: Mutex::new(CustomNodeMap::new()),
            fail_at: Mutex::new(FailAt::Nowhere),
            calls: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
        })
    }

    pub fn bound_to(self: Arc<Self>, workflow_id: &str, version: i64) -> Arc<Self> {
        *self.metadata.lock().unwrap() = Some(WorkflowMetadata {
            workflow_name: "My workflow".to_string(),
            workflow_id: workflow_id.to_string(),
            version,
        });
        self
    }

    pub fn services(self: &Arc<Self>) -> SyncServices {
        SyncServices {
            auth: self.clone(),
            graph: self.clone(),
            name_prompt: self.clone(),
            validation: self.clone(),
            workflows: self.clone(),
            uploader: self.clone(),
            tasks: self.clone(),
            runs: self.clone(),
            registry: self.clone(),
        }
    }

    pub fn fail_at(&self, at: FailAt) {
        *self.fail_at.lock().unwrap() = at;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn metadata(&self) -> Option<WorkflowMetadata> {
        self.metadata.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, at: FailAt) -> RemoteResult<()> {
        if *self.fail_at.lock().unwrap() == at {
            return Err(RemoteError::Http {
                status: 500,
                body: format!("{:?} exploded", at),
            });
        }
        Ok(())
    }
}

impl AuthStore for FakeCloud {
    fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn request_login(&self) {
        self.login_requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphHost for FakeCloud {
    async fn capture_snapshot(&self) -> RemoteResult<GraphSnapshot> {
        self.record(Call::CaptureSnapshot);
        Ok(self.local.lock().unwrap().clone())
    }

    fn find_metadata_node(&self) -> Option<MetadataNodeId> {
        self.metadata
            .lock()
            .unwrap()
            .as_ref()
            .map(|_| MetadataNodeId::new("99"))
    }

    fn create_metadata_node(&self, name: &str) -> RemoteResult<MetadataNodeId> {
        self.record(Call::CreateMetadataNode(name.to_string()));
        *self.metadata.lock().unwrap() = Some(WorkflowMetadata::new(name));
        Ok(MetadataNodeId::new("99"))
    }

    fn read_metadata(&self, _node: &MetadataNodeId) -> RemoteResult<WorkflowMetadata> {
        self.metadata()
            .ok_or_else(|| RemoteError::rejected("metadata node missing"))
    }

    fn write_metadata(&self, _node: &MetadataNodeId, metadata: &WorkflowMetadata) -> RemoteResult<()> {
        self.record(Call::WriteMetadata(metadata.clone()));
        *self.metadata.lock().unwrap() = Some(metadata.clone());
        Ok(())
    }
}

#[async_trait]
impl WorkflowNamePrompt for FakeCloud {
    async fn request_workflow_name(&self) -> Option<String> {
        self.record(Call::RequestWorkflowName);
        self.workflow_name.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValidationService for FakeCloud {
    async fn validate(&self, _snapshot: &GraphSnapshot) -> RemoteResult<ValidationReport> {
        self.record(Call::Validate);
        self.check(FailAt::Validate)?;
        Ok(self.validation.lock().unwrap().clone())
    }
}

#[async_trait]
impl WorkflowRemote for FakeCloud {
    async fn create_workflow(&self, name: &str) -> RemoteResult<String> {
        self.record(Call::CreateWorkflow(name.to_string()));
        self.check(FailAt::CreateWorkflow)?;
        Ok("wf_new".to_string())
    }

    async fn fetch_workflow(&self, workflow_id: &str, version: i64) -> RemoteResult<GraphSnapshot> {
        self.record(Call::FetchWorkflow(workflow_id.to_string(), version));
        self.check(FailAt::FetchWorkflow)?;
        Ok(self.remote.lock().unwrap().clone())
    }

    async fn update_workflow(
        &self,
        workflow_id: &str,
        snapshot: &GraphSnapshot,
        metadata: &WorkflowMetadata,
        dependencies: &DependencyBundle,
    ) -> RemoteResult<UpdateAck> {
        self.record(Call::UpdateWorkflow {
            workflow_id: workflow_id.to_string(),
            snapshot: snapshot.clone(),
            metadata: metadata.clone(),
            dependencies: dependencies.clone(),
        });
        self.check(FailAt::UpdateWorkflow)?;
        Ok(UpdateAck {
            version: *self.next_version.lock().unwrap(),
        })
    }
}

#[async_trait]
impl DependencyUploader for FakeCloud {
    async fn upload(&self, workflow_id: &str, bundle: &DependencyBundle) -> RemoteResult<UploadAck> {
        self.record(Call::Upload(workflow_id.to_string(), bundle.clone()));
        self.check(FailAt::Upload)?;
        Ok(UploadAck {
            task_id: self.upload_task.lock().unwrap().clone(),
        })
    }
}

#[async_trait]
impl TaskStatusApi for FakeCloud {
    async fn status(&self, task_id: &str) -> RemoteResult<TaskReport> {
        self.record(Call::Status(task_id.to_string()));
        self.check(FailAt::Status)?;
        let n = self.status_calls.fetch_add(1, Ordering::SeqCst);
        let statuses = self.statuses.lock().unwrap();
        let report = statuses
            .get(n)
            .or_else(|| statuses.last())
            .cloned()
            .unwrap_or_else(|| TaskReport::new(TaskStatus::Pending));
        Ok(report)
    }
}

#[async_trait]
impl RunApi for FakeCloud {
    async fn create_run(&self, workflow_id: &str, version: i64) -> RemoteResult<()> {
        self.record(Call::CreateRun(workflow_id.to_string(), version));
        self.check(FailAt::CreateRun)
    }
}

#[async_trait]
impl CustomNodeRegistry for FakeCloud {
    async fn custom_nodes(&self) -> RemoteResult<CustomNodeMap> {
        self.record(Call::CustomNodes);
        self.check(FailAt::CustomNodes)?;
        Ok(self.registry.lock().unwrap().clone())
    }
}

/// UI surface that records what was shown
#[derive(Default)]
pub struct RecordingUi {
    pub messages: Mutex<Vec<String>>,
    pub busy: Mutex<Vec<bool>>,
    pub results: Mutex<Vec<(String, String)>>,
    pub errors: Mutex<Vec<(String, String)>>,
}

impl UiSink for RecordingUi {
    fn set_status_message(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }

    fn set_busy(&self, busy: bool) {
        self.busy.lock().unwrap().push(busy);
    }

    fn show_result(&self, title: &str, message: &str) {
        self.results
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    fn show_error(&self, title: &str, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}
