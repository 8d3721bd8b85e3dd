//! Structural diff between a local snapshot and its last-synced remote copy
//!
//! Both snapshots are viewed as sets of `(node_id, key) -> value` pairs,
//! where `key` is `class_type` or an input name. The diff keeps every local
//! pair whose value is not present at the same position remotely.
//!
//! The diff is directional: anything removed locally but still present
//! remotely is never reported, so a partially loaded local graph can not
//! cause remote deletions.

use std::collections::BTreeMap;

use crate::error::{Result, SyncError};
use crate::types::{DiffSet, GraphSnapshot, NodeDescriptor};

/// Compute the local-minus-remote diff
///
/// Returns `InvalidArgument` if `local` is empty. An empty `remote` yields
/// the whole local snapshot (first sync).
pub fn diff(local: &GraphSnapshot, remote: &GraphSnapshot) -> Result<DiffSet> {
    if local.is_empty() {
        return Err(SyncError::invalid_argument(
            "cannot diff an empty local snapshot",
        ));
    }

    let mut result = DiffSet::default();

    for (node_id, node) in local.iter() {
        let remote_node = remote.get(node_id);

        let class_changed = remote_node.map_or(true, |r| r.class_type != node.class_type);

        let changed_inputs: BTreeMap<_, _> = node
            .inputs
            .iter()
            .filter(|(name, value)| {
                remote_node.and_then(|r| r.inputs.get(name.as_str())) != Some(*value)
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if class_changed || !changed_inputs.is_empty() {
            result.insert(
                node_id.clone(),
                NodeDescriptor {
                    class_type: node.class_type.clone(),
                    inputs: changed_inputs,
                },
            );
        }
    }

    log::debug!(
        "Diffed {} local nodes against {} remote nodes: {} changed",
        local.len(),
        remote.len(),
        result.len()
    );

    Ok(result)
}
