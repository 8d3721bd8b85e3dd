//! HTTP collaborators for the sync engine
//!
//! - [`CloudClient`]: workflow records and run creation on the cloud API
//! - [`LocalHostClient`]: prompt validation, custom node registry and
//!   dependency upload on the local editor host
//!
//! Both convert their failures into [`sync_engine::RemoteError`] so the
//! orchestrator can map them onto sync errors.

pub mod cloud;
pub mod config;
pub mod constants;
pub mod error;
pub mod local;
mod wire;

use std::sync::Arc;

use sync_engine::{AuthStore, GraphHost, SyncServices, WorkflowNamePrompt};

pub use cloud::CloudClient;
pub use config::HttpAdapterConfig;
pub use error::HttpAdapterError;
pub use local::LocalHostClient;

/// Wire the HTTP collaborators together with the host-provided ones
///
/// Both clients share one connection pool.
pub fn http_services(
    config: &HttpAdapterConfig,
    auth: Arc<dyn AuthStore>,
    graph: Arc<dyn GraphHost>,
    name_prompt: Arc<dyn WorkflowNamePrompt>,
) -> Result<SyncServices, HttpAdapterError> {
    let http_client = config.build_client()?;
    let cloud = Arc::new(CloudClient::with_client(
        http_client.clone(),
        &config.endpoint,
        auth.clone(),
    ));
    let local = Arc::new(LocalHostClient::with_client(
        http_client,
        &config.local_url,
        &config.endpoint,
    ));

    Ok(SyncServices {
        auth,
        graph,
        name_prompt,
        validation: local.clone(),
        workflows: cloud.clone(),
        uploader: local.clone(),
        tasks: local.clone(),
        runs: cloud,
        registry: local,
    })
}
