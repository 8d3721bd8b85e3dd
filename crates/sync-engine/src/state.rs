//! States of the sync state machine

use serde::{Deserialize, Serialize};

use crate::constants::messages;

/// Position of a sync attempt in the protocol
///
/// `Done` and `Failed` are terminal. `Failed` is reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    CheckingAuth,
    ValidatingPrompt,
    EnsuringWorkflow,
    Diffing,
    UploadingDependencies,
    PollingTask,
    UpdatingWorkflow,
    CreatingRun,
    Done,
    Failed,
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Status line shown while in this state
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::CheckingAuth => messages::CHECKING_AUTH,
            Self::ValidatingPrompt => messages::VALIDATING_PROMPT,
            Self::EnsuringWorkflow => messages::ENSURING_WORKFLOW,
            Self::Diffing => messages::DIFFING,
            Self::UploadingDependencies => messages::UPLOADING_DEPENDENCIES,
            Self::PollingTask => messages::POLLING_TASK,
            Self::UpdatingWorkflow => messages::UPDATING_WORKFLOW,
            Self::CreatingRun => messages::CREATING_RUN,
            Self::Idle | Self::Done | Self::Failed => "",
        }
    }

    /// Whether the protocol allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: SyncState) -> bool {
        use SyncState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, CheckingAuth)
                | (CheckingAuth, ValidatingPrompt)
                | (ValidatingPrompt, EnsuringWorkflow)
                | (EnsuringWorkflow, Diffing)
                | (Diffing, UploadingDependencies)
                | (Diffing, CreatingRun)
                | (UploadingDependencies, PollingTask)
                | (UploadingDependencies, UpdatingWorkflow)
                | (PollingTask, UpdatingWorkflow)
                | (UpdatingWorkflow, CreatingRun)
                | (CreatingRun, Done)
        )
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CheckingAuth => "checking_auth",
            Self::ValidatingPrompt => "validating_prompt",
            Self::EnsuringWorkflow => "ensuring_workflow",
            Self::Diffing => "diffing",
            Self::UploadingDependencies => "uploading_dependencies",
            Self::PollingTask => "polling_task",
            Self::UpdatingWorkflow => "updating_workflow",
            Self::CreatingRun => "creating_run",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
