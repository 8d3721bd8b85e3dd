//! Dependency classification
//!
//! Turns a [`DiffSet`] into the assets that must be uploaded before the
//! remote side can run the graph. Rules, applied to each changed node:
//!
//! 1. Image loaders contribute their `image` input to `filesToUpload`.
//! 2. Any string input with a model-weight extension goes to `modelsToUpload`.
//! 3. Non-builtin node types are resolved against the custom node registry;
//!    every package that provides the type goes to `nodesToUpload`.
//!
//! A registry failure only skips rule 3 for the node being classified.

use std::collections::BTreeSet;

use crate::collaborators::{CustomNodeMap, CustomNodeRegistry};
use crate::constants::{files, nodes};
use crate::types::{DependencyBundle, DiffSet, NodeDescriptor};

/// Whether `class_type` is a native node of the execution engine
pub fn is_builtin(class_type: &str) -> bool {
    nodes::BUILTIN.contains(&class_type)
}

/// Whether `class_type` loads an image from the input directory
pub fn is_image_loader(class_type: &str) -> bool {
    nodes::IMAGE_LOADERS.contains(&class_type)
}

/// Whether a string input references a model weight file
pub fn is_model_file(value: &str) -> bool {
    files::MODEL_EXTENSIONS
        .iter()
        .any(|ext| value.ends_with(ext))
}

/// Side information gathered while classifying
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    /// Custom class types that could not be resolved because the registry was unreachable
    pub unresolved: BTreeSet<String>,
    /// Number of registry fetches issued
    pub registry_fetches: usize,
}

impl ClassifyReport {
    /// True if at least one node skipped rule 3
    pub fn is_partial(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

/// Classifier bound to a custom node registry
pub struct DependencyClassifier<'a> {
    registry: &'a dyn CustomNodeRegistry,
}

impl<'a> DependencyClassifier<'a> {
    pub fn new(registry: &'a dyn CustomNodeRegistry) -> Self {
        Self { registry }
    }

    /// Classify a diff into a dependency bundle
    pub async fn classify(&self, diff: &DiffSet) -> DependencyBundle {
        self.classify_with_report(diff).await.0
    }

    /// Classify a diff, also reporting which custom nodes could not be resolved
    ///
    /// The registry is fetched lazily, at most once per successful pass. A
    /// failed fetch is retried for the next custom node that needs it.
    pub async fn classify_with_report(&self, diff: &DiffSet) -> (DependencyBundle, ClassifyReport) {
        let mut bundle = DependencyBundle::default();
        let mut report = ClassifyReport::default();
        let mut registry: Option<CustomNodeMap> = None;

        for (node_id, node) in diff.iter() {
            collect_input_files(node, &mut bundle);
            collect_model_files(node, &mut bundle);

            if is_builtin(&node.class_type) {
                continue;
            }

            if registry.is_none() {
                report.registry_fetches += 1;
                match self.registry.custom_nodes().await {
                    Ok(map) => registry = Some(map),
                    Err(e) => {
                        log::warn!(
                            "Custom node lookup failed for node '{}' ({}): {}",
                            node_id,
                            node.class_type,
                            e
                        );
                        report.unresolved.insert(node.class_type.clone());
                        continue;
                    }
                }
            }

            if let Some(map) = &registry {
                let before = bundle.nodes_to_upload.len();
                for (package, class_types) in map {
                    if class_types.iter().any(|c| c == &node.class_type) {
                        bundle.nodes_to_upload.insert(package.clone());
                    }
                }
                if bundle.nodes_to_upload.len() == before {
                    log::debug!(
                        "No installed package provides '{}' (node '{}')",
                        node.class_type,
                        node_id
                    );
                }
            }
        }

        log::debug!(
            "Classified {} changed nodes: {} models, {} files, {} packages",
            diff.len(),
            bundle.models_to_upload.len(),
            bundle.files_to_upload.len(),
            bundle.nodes_to_upload.len()
        );

        (bundle, report)
    }
}

fn collect_input_files(node: &NodeDescriptor, bundle: &mut DependencyBundle) {
    if !is_image_loader(&node.class_type) {
        return;
    }
    if let Some(image) = node.input_str(nodes::IMAGE_INPUT) {
        bundle.files_to_upload.insert(image.to_string());
    }
}

fn collect_model_files(node: &NodeDescriptor, bundle: &mut DependencyBundle) {
    for value in node.inputs.values() {
        if let Some(s) = value.as_str() {
            if is_model_file(s) {
                bundle.models_to_upload.insert(s.to_string());
            }
        }
    }
}
