//! Sync orchestrator
//!
//! Drives one sync attempt through the [`SyncState`] machine:
//!
//! ```text
//! Idle -> CheckingAuth -> ValidatingPrompt -> EnsuringWorkflow -> Diffing
//!      -> UploadingDependencies -> PollingTask -> UpdatingWorkflow -> CreatingRun -> Done
//! ```
//!
//! An empty diff jumps from `Diffing` straight to `CreatingRun`; an upload
//! without a server-side task skips `PollingTask`. Any failing step ends the
//! attempt in `Failed` with exactly one [`SyncError`]. Nothing is retried.
//!
//! Progress is reported as [`SyncEvent`]s. Whatever way `run_sync` exits
//! (success, error, cancellation or the future being dropped), the last
//! event of an attempt is `Finished`.

mod services;

pub use services::{SyncReport, SyncServices};

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::classify::DependencyClassifier;
use crate::collaborators::{RemoteResult, UiSink};
use crate::config::SyncConfig;
use crate::diff::diff;
use crate::error::{Result, SyncError};
use crate::events::{EventSink, SyncEvent};
use crate::poller::{PollOutcome, TaskPoller};
use crate::state::SyncState;
use crate::types::{DependencyBundle, GraphSnapshot, MetadataNodeId, WorkflowMetadata};
use crate::ui_adapter::UiEventAdapter;

/// Runs sync attempts, one at a time
pub struct SyncOrchestrator {
    services: SyncServices,
    config: SyncConfig,
    events: Arc<dyn EventSink>,
    running: AtomicBool,
    current: Mutex<Option<CancellationToken>>,
}

/// Per-attempt state threaded through the steps
struct Attempt {
    sync_id: String,
    state: SyncState,
    cancel: CancellationToken,
}

impl Attempt {
    /// Await `fut` unless the attempt is cancelled first
    async fn until_cancelled<T>(&self, fut: impl Future<Output = T>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SyncError::Cancelled),
            value = fut => Ok(value),
        }
    }

    /// Await a collaborator call, mapping its failure with `on_error`
    async fn call<T>(
        &self,
        fut: impl Future<Output = RemoteResult<T>>,
        on_error: fn(String) -> SyncError,
    ) -> Result<T> {
        self.until_cancelled(fut)
            .await?
            .map_err(|e| on_error(e.to_string()))
    }
}

/// Releases the orchestrator when an attempt ends
struct AttemptGuard<'a> {
    orchestrator: &'a SyncOrchestrator,
    sync_id: String,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator.emit(SyncEvent::Finished {
            sync_id: std::mem::take(&mut self.sync_id),
        });
        let mut current = self.orchestrator.current.lock();
        *current = None;
        self.orchestrator.running.store(false, Ordering::SeqCst);
    }
}

impl SyncOrchestrator {
    pub fn new(services: SyncServices, config: SyncConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            services,
            config,
            events,
            running: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    /// Create an orchestrator whose events drive `ui` directly
    pub fn with_ui(services: SyncServices, config: SyncConfig, ui: Arc<dyn UiSink>) -> Self {
        Self::new(services, config, Arc::new(UiEventAdapter::new(ui)))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether an attempt is in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Abort the attempt in flight, if any
    ///
    /// Returns `false` when there was nothing to cancel. `current` and
    /// `running` only change together under the `current` lock, so an
    /// attempt that has started is always cancellable. The aborted
    /// `run_sync` call returns [`SyncError::Cancelled`].
    pub fn cancel(&self) -> bool {
        match self.current.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run one sync attempt to completion
    ///
    /// Rejected with [`SyncError::SyncInProgress`] (and no events) while
    /// another attempt is in flight on this orchestrator.
    pub async fn run_sync(&self) -> Result<SyncReport> {
        // claim and publish the token under one lock so `cancel` never misses it
        let cancel = {
            let mut current = self.current.lock();
            if self.running.swap(true, Ordering::SeqCst) {
                log::warn!("Sync requested while another sync is in flight");
                return Err(SyncError::SyncInProgress);
            }
            let token = CancellationToken::new();
            *current = Some(token.clone());
            token
        };

        let sync_id = format!("sync-{}", uuid::Uuid::new_v4());
        let _guard = AttemptGuard {
            orchestrator: self,
            sync_id: sync_id.clone(),
        };

        log::info!("[{}] Starting sync", sync_id);
        self.emit(SyncEvent::Started {
            sync_id: sync_id.clone(),
        });

        let mut attempt = Attempt {
            sync_id,
            state: SyncState::Idle,
            cancel,
        };
        let result = self.drive(&mut attempt).await;

        match &result {
            Ok(report) => {
                log::info!(
                    "[{}] Run queued for workflow '{}' v{} ({} changed nodes)",
                    attempt.sync_id,
                    report.workflow_id,
                    report.version,
                    report.changed_nodes
                );
                self.emit(SyncEvent::Completed {
                    sync_id: attempt.sync_id.clone(),
                    workflow_id: report.workflow_id.clone(),
                    version: report.version,
                    link: report.link.clone(),
                });
            }
            Err(e) => {
                match e {
                    SyncError::Cancelled => {
                        log::info!("[{}] Sync cancelled in {}", attempt.sync_id, attempt.state)
                    }
                    _ => log::error!("[{}] Sync failed in {}: {}", attempt.sync_id, attempt.state, e),
                }
                if !attempt.state.is_terminal() {
                    self.enter(&mut attempt, SyncState::Failed);
                }
                self.emit(SyncEvent::Failed {
                    sync_id: attempt.sync_id.clone(),
                    kind: e.kind(),
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn drive(&self, attempt: &mut Attempt) -> Result<SyncReport> {
        self.check_auth(attempt)?;
        let snapshot = self.validate_prompt(attempt).await?;
        let (metadata_node, mut metadata, created_workflow) = self.ensure_workflow(attempt).await?;

        self.enter(attempt, SyncState::Diffing);
        let remote = attempt
            .call(
                self.services
                    .workflows
                    .fetch_workflow(&metadata.workflow_id, metadata.version),
                SyncError::FetchRemoteFailed,
            )
            .await?;
        let changes = diff(&snapshot, &remote)?;

        let mut bundle = DependencyBundle::default();
        let mut unresolved_nodes = BTreeSet::new();
        let mut task_id = None;

        if changes.is_empty() {
            log::info!(
                "[{}] Workflow '{}' is up to date",
                attempt.sync_id,
                metadata.workflow_id
            );
        } else {
            self.enter(attempt, SyncState::UploadingDependencies);
            let classifier = DependencyClassifier::new(self.services.registry.as_ref());
            let (resolved, report) = attempt
                .until_cancelled(classifier.classify_with_report(&changes))
                .await?;
            if report.is_partial() {
                let classes = report
                    .unresolved
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                // never queue a run whose only dependencies went unresolved
                if resolved.is_empty() {
                    return Err(SyncError::DependencySyncFailed(format!(
                        "custom node registry unavailable for {}",
                        classes
                    )));
                }
                log::warn!(
                    "[{}] Could not resolve packages for {}; uploading without them",
                    attempt.sync_id,
                    classes
                );
            }
            bundle = resolved;
            unresolved_nodes = report.unresolved;
            self.emit(SyncEvent::DependenciesResolved {
                sync_id: attempt.sync_id.clone(),
                bundle: bundle.clone(),
            });

            if bundle.is_empty() {
                log::debug!("[{}] No dependencies to upload", attempt.sync_id);
            } else {
                let ack = attempt
                    .call(
                        self.services.uploader.upload(&metadata.workflow_id, &bundle),
                        SyncError::DependencySyncFailed,
                    )
                    .await?;

                if let Some(id) = ack.task_id.filter(|id| !id.is_empty()) {
                    self.enter(attempt, SyncState::PollingTask);
                    self.wait_for_task(attempt, &id).await?;
                    task_id = Some(id);
                }
            }

            self.enter(attempt, SyncState::UpdatingWorkflow);
            let ack = attempt
                .call(
                    self.services
                        .workflows
                        .update_workflow(&metadata.workflow_id, &snapshot, &metadata, &bundle),
                    SyncError::UploadFailed,
                )
                .await?;
            metadata.version = ack.version;
            self.services
                .graph
                .write_metadata(&metadata_node, &metadata)
                .map_err(|e| SyncError::UploadFailed(e.to_string()))?;
        }

        self.enter(attempt, SyncState::CreatingRun);
        attempt
            .call(
                self.services
                    .runs
                    .create_run(&metadata.workflow_id, metadata.version),
                SyncError::RunCreationFailed,
            )
            .await?;

        self.enter(attempt, SyncState::Done);

        Ok(SyncReport {
            sync_id: attempt.sync_id.clone(),
            link: self.config.workflow_link(&metadata.workflow_id),
            workflow_id: metadata.workflow_id,
            version: metadata.version,
            created_workflow,
            changed_nodes: changes.len(),
            bundle,
            unresolved_nodes,
            task_id,
        })
    }

    fn check_auth(&self, attempt: &mut Attempt) -> Result<()> {
        self.enter(attempt, SyncState::CheckingAuth);

        match self.services.auth.token() {
            Some(token) if !token.trim().is_empty() => Ok(()),
            _ => {
                log::info!("[{}] No API token, requesting login", attempt.sync_id);
                self.emit(SyncEvent::AuthRequired {
                    sync_id: attempt.sync_id.clone(),
                });
                self.services.auth.request_login();
                Err(SyncError::Unauthenticated)
            }
        }
    }

    async fn validate_prompt(&self, attempt: &mut Attempt) -> Result<GraphSnapshot> {
        self.enter(attempt, SyncState::ValidatingPrompt);

        let snapshot = attempt
            .call(
                self.services.graph.capture_snapshot(),
                SyncError::InvalidPrompt,
            )
            .await?;
        if snapshot.is_empty() {
            return Err(SyncError::InvalidPrompt("workflow has no nodes".to_string()));
        }

        let report = attempt
            .call(
                self.services.validation.validate(&snapshot),
                SyncError::InvalidPrompt,
            )
            .await?;
        if !report.is_valid {
            let detail = if report.errors.is_empty() {
                "rejected without details".to_string()
            } else {
                report
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            return Err(SyncError::InvalidPrompt(detail));
        }

        log::debug!(
            "[{}] Captured and validated {} nodes",
            attempt.sync_id,
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Make sure the graph is bound to a remote workflow record
    ///
    /// Returns the metadata handle, the current metadata, and whether a
    /// workflow was created. A metadata node whose ID is still empty (an
    /// earlier attempt failed before create) is completed in place.
    async fn ensure_workflow(
        &self,
        attempt: &mut Attempt,
    ) -> Result<(MetadataNodeId, WorkflowMetadata, bool)> {
        self.enter(attempt, SyncState::EnsuringWorkflow);
        let graph = &self.services.graph;

        let node = match graph.find_metadata_node() {
            Some(node) => node,
            None => {
                let name = self.ask_workflow_name(attempt).await?;
                graph
                    .create_metadata_node(&name)
                    .map_err(|e| SyncError::WorkflowCreateFailed(e.to_string()))?
            }
        };

        let mut metadata = graph
            .read_metadata(&node)
            .map_err(|e| SyncError::WorkflowCreateFailed(e.to_string()))?;

        if metadata.is_synced() {
            log::debug!(
                "[{}] Graph is bound to workflow '{}' v{}",
                attempt.sync_id,
                metadata.workflow_id,
                metadata.version
            );
            return Ok((node, metadata, false));
        }

        if metadata.workflow_name.trim().is_empty() {
            metadata.workflow_name = self.ask_workflow_name(attempt).await?;
        }

        let workflow_id = attempt
            .call(
                self.services.workflows.create_workflow(&metadata.workflow_name),
                SyncError::WorkflowCreateFailed,
            )
            .await?;
        metadata.workflow_id = workflow_id;
        graph
            .write_metadata(&node, &metadata)
            .map_err(|e| SyncError::WorkflowCreateFailed(e.to_string()))?;

        log::info!(
            "[{}] Created workflow '{}' ({})",
            attempt.sync_id,
            metadata.workflow_name,
            metadata.workflow_id
        );
        Ok((node, metadata, true))
    }

    async fn ask_workflow_name(&self, attempt: &Attempt) -> Result<String> {
        let answer = attempt
            .until_cancelled(self.services.name_prompt.request_workflow_name())
            .await?;

        match answer.map(|name| name.trim().to_string()) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(SyncError::WorkflowCreateFailed(
                "no workflow name given".to_string(),
            )),
        }
    }

    async fn wait_for_task(&self, attempt: &Attempt, task_id: &str) -> Result<()> {
        let poller = TaskPoller::from_config(&self.config);
        let sync_id = attempt.sync_id.as_str();

        let outcome = poller
            .poll(
                self.services.tasks.as_ref(),
                task_id,
                &attempt.cancel,
                |report| {
                    self.emit(SyncEvent::TaskProgress {
                        sync_id: sync_id.to_string(),
                        task_id: task_id.to_string(),
                        status: report.status,
                        progress: report.progress,
                        message: report.message.clone(),
                    })
                },
            )
            .await
            .map_err(|e| {
                SyncError::DependencySyncFailed(format!(
                    "status of task '{}' unavailable: {}",
                    task_id, e
                ))
            })?;

        match outcome {
            PollOutcome::Succeeded => Ok(()),
            PollOutcome::Failed { message } => Err(SyncError::DependencySyncFailed(
                message.unwrap_or_else(|| format!("task '{}' failed", task_id)),
            )),
            PollOutcome::TimedOut => Err(SyncError::PollTimeout {
                task_id: task_id.to_string(),
                waited_ms: self.config.poll_timeout_ms,
            }),
            PollOutcome::Cancelled => Err(SyncError::Cancelled),
        }
    }

    fn enter(&self, attempt: &mut Attempt, next: SyncState) {
        debug_assert!(
            attempt.state.can_transition_to(next),
            "illegal transition {} -> {}",
            attempt.state,
            next
        );
        log::debug!("[{}] {} -> {}", attempt.sync_id, attempt.state, next);
        attempt.state = next;
        self.emit(SyncEvent::state_changed(&attempt.sync_id, next));
    }

    fn emit(&self, event: SyncEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver sync event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{
        AuthStore, CustomNodeMap, CustomNodeRegistry, DependencyUploader, GraphHost, RunApi,
        TaskStatusApi, ValidationService, WorkflowNamePrompt, WorkflowRemote,
    };
    use crate::error::SyncErrorKind;
    use crate::events::VecEventSink;
    use crate::types::{
        NodeDescriptor, TaskReport, TaskStatus, UpdateAck, UploadAck, ValidationReport,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// One object standing in for every collaborator
    struct FakeHost {
        token: Option<String>,
        login_requests: AtomicUsize,
        snapshot: GraphSnapshot,
        metadata: std::sync::Mutex<Option<WorkflowMetadata>>,
        workflow_name: Option<String>,
        name_gate: Option<Arc<Notify>>,
        task_status: TaskStatus,
        calls: std::sync::Mutex<Vec<String>>,
    }

    impl FakeHost {
        fn new() -> Self {
            Self {
                token: Some("token-123".to_string()),
                login_requests: AtomicUsize::new(0),
                snapshot: GraphSnapshot::new().with_node(
                    "10",
                    NodeDescriptor::new("LoadImage").with_input("image", json!("cat.png")),
                ),
                metadata: std::sync::Mutex::new(None),
                workflow_name: Some("cats".to_string()),
                name_gate: None,
                task_status: TaskStatus::Succeeded,
                calls: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn metadata(&self) -> Option<WorkflowMetadata> {
            self.metadata.lock().unwrap().clone()
        }
    }

    impl AuthStore for FakeHost {
        fn token(&self) -> Option<String> {
            self.token.clone()
        }

        fn request_login(&self) {
            self.login_requests.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl GraphHost for FakeHost {
        async fn capture_snapshot(&self) -> RemoteResult<GraphSnapshot> {
            self.record("capture_snapshot");
            Ok(self.snapshot.clone())
        }

        fn find_metadata_node(&self) -> Option<MetadataNodeId> {
            self.metadata
                .lock()
                .unwrap()
                .as_ref()
                .map(|_| MetadataNodeId::new("meta"))
        }

        fn create_metadata_node(&self, name: &str) -> RemoteResult<MetadataNodeId> {
            self.record("create_metadata_node");
            *self.metadata.lock().unwrap() = Some(WorkflowMetadata::new(name));
            Ok(MetadataNodeId::new("meta"))
        }

        fn read_metadata(&self, _node: &MetadataNodeId) -> RemoteResult<WorkflowMetadata> {
            Ok(self.metadata().unwrap_or_default())
        }

        fn write_metadata(&self, _node: &MetadataNodeId, metadata: &WorkflowMetadata) -> RemoteResult<()> {
            *self.metadata.lock().unwrap() = Some(metadata.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl WorkflowNamePrompt for FakeHost {
        async fn request_workflow_name(&self) -> Option<String> {
            self.record("request_workflow_name");
            if let Some(gate) = &self.name_gate {
                gate.notified().await;
            }
            self.workflow_name.clone()
        }
    }

    #[async_trait]
    impl ValidationService for FakeHost {
        async fn validate(&self, _snapshot: &GraphSnapshot) -> RemoteResult<ValidationReport> {
            self.record("validate");
            Ok(ValidationReport::valid())
        }
    }

    #[async_trait]
    impl WorkflowRemote for FakeHost {
        async fn create_workflow(&self, _name: &str) -> RemoteResult<String> {
            self.record("create_workflow");
            Ok("wf_1".to_string())
        }

        async fn fetch_workflow(&self, _workflow_id: &str, _version: i64) -> RemoteResult<GraphSnapshot> {
            self.record("fetch_workflow");
            Ok(GraphSnapshot::new())
        }

        async fn update_workflow(
            &self,
            _workflow_id: &str,
            _snapshot: &GraphSnapshot,
            metadata: &WorkflowMetadata,
            _dependencies: &DependencyBundle,
        ) -> RemoteResult<UpdateAck> {
            self.record("update_workflow");
            Ok(UpdateAck {
                version: metadata.version + 1,
            })
        }
    }

    #[async_trait]
    impl DependencyUploader for FakeHost {
        async fn upload(&self, _workflow_id: &str, _bundle: &DependencyBundle) -> RemoteResult<UploadAck> {
            self.record("upload");
            Ok(UploadAck {
                task_id: Some("task-1".to_string()),
            })
        }
    }

    #[async_trait]
    impl TaskStatusApi for FakeHost {
        async fn status(&self, _task_id: &str) -> RemoteResult<TaskReport> {
            self.record("status");
            Ok(TaskReport::new(self.task_status))
        }
    }

    #[async_trait]
    impl RunApi for FakeHost {
        async fn create_run(&self, _workflow_id: &str, _version: i64) -> RemoteResult<()> {
            self.record("create_run");
            Ok(())
        }
    }

    #[async_trait]
    impl CustomNodeRegistry for FakeHost {
        async fn custom_nodes(&self) -> RemoteResult<CustomNodeMap> {
            self.record("custom_nodes");
            Ok(CustomNodeMap::new())
        }
    }

    fn services(host: Arc<FakeHost>) -> SyncServices {
        SyncServices {
            auth: host.clone(),
            graph: host.clone(),
            name_prompt: host.clone(),
            validation: host.clone(),
            workflows: host.clone(),
            uploader: host.clone(),
            tasks: host.clone(),
            runs: host.clone(),
            registry: host,
        }
    }

    fn orchestrator(host: Arc<FakeHost>, sink: Arc<VecEventSink>) -> SyncOrchestrator {
        let config = SyncConfig {
            poll_interval_ms: 1_000,
            poll_timeout_ms: 60_000,
            ..SyncConfig::default()
        };
        SyncOrchestrator::new(services(host), config, sink)
    }

    #[tokio::test]
    async fn test_missing_token_requests_login() {
        let host = Arc::new(FakeHost {
            token: None,
            ..FakeHost::new()
        });
        let sink = Arc::new(VecEventSink::new());
        let orch = orchestrator(host.clone(), sink.clone());

        let err = orch.run_sync().await.unwrap_err();

        assert_eq!(err.kind(), SyncErrorKind::Unauthenticated);
        assert_eq!(host.login_requests.load(Ordering::SeqCst), 1);
        assert!(host.calls().is_empty());
        assert_eq!(
            sink.states(),
            vec![SyncState::CheckingAuth, SyncState::Failed]
        );

        let events = sink.events();
        assert!(matches!(events[0], SyncEvent::Started { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, SyncEvent::AuthRequired { .. })));
        assert!(matches!(events.last(), Some(SyncEvent::Finished { .. })));
        assert!(!orch.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_share_one_sync_id() {
        let host = Arc::new(FakeHost::new());
        let sink = Arc::new(VecEventSink::new());
        let orch = orchestrator(host, sink.clone());

        let report = orch.run_sync().await.unwrap();

        assert!(report.sync_id.starts_with("sync-"));
        assert!(sink
            .events()
            .iter()
            .all(|e| e.sync_id() == report.sync_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_sync_is_rejected_while_running() {
        let gate = Arc::new(Notify::new());
        let host = Arc::new(FakeHost {
            name_gate: Some(gate.clone()),
            ..FakeHost::new()
        });
        let sink = Arc::new(VecEventSink::new());
        let orch = Arc::new(orchestrator(host.clone(), sink.clone()));

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run_sync().await })
        };

        while !host.calls().contains(&"request_workflow_name".to_string()) {
            tokio::task::yield_now().await;
        }
        assert!(orch.is_running());

        let events_before = sink.events().len();
        let err = orch.run_sync().await.unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::SyncInProgress);
        assert_eq!(sink.events().len(), events_before);

        gate.notify_one();
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.workflow_id, "wf_1");
        assert!(!orch.is_running());

        // the orchestrator is reusable once the first attempt is over
        assert!(orch.run_sync().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_poll_keeps_created_workflow() {
        let host = Arc::new(FakeHost {
            task_status: TaskStatus::Running,
            ..FakeHost::new()
        });
        let sink = Arc::new(VecEventSink::new());
        let orch = Arc::new(orchestrator(host.clone(), sink.clone()));

        let attempt = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run_sync().await })
        };

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert!(orch.cancel());

        let err = attempt.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::Cancelled);

        let calls = host.calls();
        assert_eq!(calls.iter().filter(|c| *c == "status").count(), 3);
        assert!(!calls.contains(&"update_workflow".to_string()));

        let metadata = host.metadata().unwrap();
        assert_eq!(metadata.workflow_id, "wf_1");
        assert_eq!(metadata.version, 0);

        assert!(matches!(sink.events().last(), Some(SyncEvent::Finished { .. })));
        assert!(!orch.is_running());
        assert!(!orch.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_maps_to_poll_timeout() {
        let host = Arc::new(FakeHost {
            task_status: TaskStatus::Pending,
            ..FakeHost::new()
        });
        let sink = Arc::new(VecEventSink::new());
        let orch = orchestrator(host.clone(), sink.clone());

        let err = orch.run_sync().await.unwrap_err();

        match err {
            SyncError::PollTimeout { task_id, waited_ms } => {
                assert_eq!(task_id, "task-1");
                assert_eq!(waited_ms, 60_000);
            }
            other => panic!("Expected PollTimeout, got {:?}", other),
        }
        assert!(!host.calls().contains(&"update_workflow".to_string()));
        assert_eq!(sink.states().last(), Some(&SyncState::Failed));
    }

    #[tokio::test]
    async fn test_dismissed_name_prompt_fails_before_create() {
        let host = Arc::new(FakeHost {
            workflow_name: Some("   ".to_string()),
            ..FakeHost::new()
        });
        let sink = Arc::new(VecEventSink::new());
        let orch = orchestrator(host.clone(), sink);

        let err = orch.run_sync().await.unwrap_err();

        assert_eq!(err.kind(), SyncErrorKind::WorkflowCreateFailed);
        assert!(!host.calls().contains(&"create_workflow".to_string()));
        assert!(host.metadata().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_named_metadata_without_id_resumes_create() {
        let host = Arc::new(FakeHost::new());
        *host.metadata.lock().unwrap() = Some(WorkflowMetadata::new("portraits"));
        let sink = Arc::new(VecEventSink::new());
        let orch = orchestrator(host.clone(), sink);

        let report = orch.run_sync().await.unwrap();

        assert!(report.created_workflow);
        let calls = host.calls();
        assert!(!calls.contains(&"request_workflow_name".to_string()));
        assert!(!calls.contains(&"create_metadata_node".to_string()));
        assert_eq!(calls.iter().filter(|c| *c == "create_workflow").count(), 1);

        let metadata = host.metadata().unwrap();
        assert_eq!(metadata.workflow_name, "portraits");
        assert_eq!(metadata.workflow_id, "wf_1");
        assert_eq!(metadata.version, 1);
    }

    #[tokio::test]
    async fn test_dropped_attempt_still_releases_orchestrator() {
        let gate = Arc::new(Notify::new());
        let host = Arc::new(FakeHost {
            name_gate: Some(gate),
            ..FakeHost::new()
        });
        let sink = Arc::new(VecEventSink::new());
        let orch = orchestrator(host, sink.clone());

        let timed_out = tokio::time::timeout(Duration::from_millis(20), orch.run_sync()).await;

        assert!(timed_out.is_err());
        assert!(!orch.is_running());
        assert!(matches!(sink.events().last(), Some(SyncEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_name() {
        let gate = Arc::new(Notify::new());
        let host = Arc::new(FakeHost {
            name_gate: Some(gate),
            ..FakeHost::new()
        });
        let sink = Arc::new(VecEventSink::new());
        let orch = Arc::new(orchestrator(host.clone(), sink.clone()));
        assert!(!orch.cancel());

        let attempt = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run_sync().await })
        };

        while !orch.is_running() {
            tokio::task::yield_now().await;
        }
        // running implies a token is published
        assert!(orch.cancel());

        let err = attempt.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::Cancelled);
        assert!(!host.calls().contains(&"create_workflow".to_string()));
        assert!(!orch.is_running());
        assert!(matches!(sink.events().last(), Some(SyncEvent::Finished { .. })));
    }
}
