//! Routes and defaults of the HTTP adapter

pub mod defaults {
    /// Cloud API used when none is configured
    pub const CLOUD_ENDPOINT: &str = "https://comfycloud.vercel.app";
    /// Editor host on its default port
    pub const LOCAL_URL: &str = "http://127.0.0.1:8188";
    pub const REQUEST_TIMEOUT_MS: u64 = 30_000;
    pub const CONFIG_FILE: &str = "http.json";
}

/// Cloud API routes, relative to the endpoint
pub mod cloud {
    /// Create or update a workflow record
    pub const WORKFLOW: &str = "/api/workflow";
    pub const RUN: &str = "/api/run";
}

/// Editor host routes, relative to the local URL
pub mod local {
    pub const VALIDATE_PROMPT: &str = "/comfy-cloud/validate-prompt";
    pub const CUSTOM_NODES: &str = "/comfy-cloud/custom-nodes-list";
    pub const UPLOAD: &str = "/comfy-cloud/upload";
    pub const UPLOAD_STATUS: &str = "/comfy-cloud/upload-status";
}

/// Join a base URL and an absolute route
pub fn join(base: &str, route: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), route)
}
