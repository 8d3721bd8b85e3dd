//! Engine-wide constants
//!
//! Single source of truth for node allowlists, file heuristics and
//! configuration defaults.

/// Node types understood by the classifier
pub mod nodes {
    /// Node types whose `image` input references a file in the input directory
    pub const IMAGE_LOADERS: &[&str] = &["LoadImage", "LoadImageMask"];

    /// Input that holds the image path on image loaders
    pub const IMAGE_INPUT: &str = "image";

    /// Native node types of the execution engine (never need a package upload)
    pub const BUILTIN: &[&str] = &[
        "KSampler",
        "KSamplerAdvanced",
        "CheckpointLoader",
        "CheckpointLoaderSimple",
        "VAELoader",
        "LoraLoader",
        "CLIPLoader",
        "ControlNetLoader",
        "DiffControlNetLoader",
        "StyleModelLoader",
        "CLIPVisionLoader",
        "UpscaleModelLoader",
        "CLIPVisionEncode",
        "StyleModelApply",
        "CLIPTextEncode",
        "CLIPSetLastLayer",
        "ConditioningCombine",
        "ConditioningAverage",
        "ConditioningConcat",
        "ConditioningSetArea",
        "ConditioningSetAreaPercentage",
        "ConditioningSetMask",
        "ControlNetApply",
        "ControlNetApplyAdvanced",
        "VAEEncodeForInpaint",
        "SetLatentNoiseMask",
        "VAEDecode",
        "VAEEncode",
        "LatentRotate",
        "LatentFlip",
        "LatentCrop",
        "EmptyLatentImage",
        "LatentUpscale",
        "LatentUpscaleBy",
        "LatentComposite",
        "LatentBlend",
        "LatentFromBatch",
        "RepeatLatentBatch",
        "SaveImage",
        "PreviewImage",
        "LoadImage",
        "LoadImageMask",
        "ImageScale",
        "ImageScaleBy",
        "ImageUpscaleWithModel",
        "ImageInvert",
        "ImagePadForOutpaint",
        "ImageBatch",
        "VAEDecodeTiled",
        "VAEEncodeTiled",
    ];
}

/// File heuristics
pub mod files {
    /// Extensions the execution engine loads as model weights
    pub const MODEL_EXTENSIONS: &[&str] = &[".safetensors", ".pth", ".pt", ".bin", ".ckpt"];
}

/// Default values for sync configuration
pub mod defaults {
    /// Delay between two task status queries
    pub const POLL_INTERVAL_MS: u64 = 2_000;
    /// Give up on a sync task after this long (30 minutes)
    pub const POLL_TIMEOUT_MS: u64 = 30 * 60 * 1_000;
    /// Web dashboard that hosts run results
    pub const DASHBOARD_URL: &str = "https://comfycloud.vercel.app";
    /// File name of the persisted sync configuration
    pub const CONFIG_FILE: &str = "sync.json";
}

/// Status messages shown while a sync runs
pub mod messages {
    pub const CHECKING_AUTH: &str = "Checking credentials...";
    pub const VALIDATING_PROMPT: &str = "Validating workflow...";
    pub const ENSURING_WORKFLOW: &str = "Creating new workflow. This may take awhile";
    pub const DIFFING: &str = "Comparing with cloud workflow...";
    pub const UPLOADING_DEPENDENCIES: &str = "Syncing dependencies...";
    pub const POLLING_TASK: &str = "Uploading dependencies...";
    pub const UPDATING_WORKFLOW: &str = "Updating workflow...";
    pub const CREATING_RUN: &str = "Queueing run...";
    pub const RESULT_TITLE: &str = "Item queued!";
    pub const ERROR_TITLE: &str = "Error";
}
