//! Event adapter for presenting sync events on a [`UiSink`]
//!
//! Bridges the orchestrator's [`EventSink`] stream and the host's button,
//! status line and dialogs.

use std::sync::Arc;

use crate::collaborators::UiSink;
use crate::constants::messages;
use crate::error::SyncErrorKind;
use crate::events::{EventError, EventSink, SyncEvent};

/// Adapter that turns [`SyncEvent`]s into [`UiSink`] calls
pub struct UiEventAdapter<S: UiSink + ?Sized> {
    ui: Arc<S>,
}

impl<S: UiSink + ?Sized> UiEventAdapter<S> {
    pub fn new(ui: Arc<S>) -> Self {
        Self { ui }
    }
}

impl<S: UiSink + ?Sized> EventSink for UiEventAdapter<S> {
    fn send(&self, event: SyncEvent) -> Result<(), EventError> {
        match event {
            SyncEvent::Started { .. } => self.ui.set_busy(true),

            SyncEvent::StateChanged { message, .. } => self.ui.set_status_message(&message),

            SyncEvent::TaskProgress {
                progress, message, ..
            } => {
                let text = progress_text(progress, message.as_deref());
                self.ui.set_status_message(&text);
            }

            SyncEvent::Completed { link, .. } => {
                let body = format!("You can view your generation results at {}", link);
                self.ui.show_result(messages::RESULT_TITLE, &body);
            }

            SyncEvent::Failed { kind, error, .. } => {
                // the login flow and a user abort are their own feedback
                if !matches!(kind, SyncErrorKind::Unauthenticated | SyncErrorKind::Cancelled) {
                    self.ui.show_error(messages::ERROR_TITLE, &error);
                }
            }

            SyncEvent::Finished { .. } => {
                self.ui.set_status_message("");
                self.ui.set_busy(false);
            }

            SyncEvent::AuthRequired { .. } | SyncEvent::DependenciesResolved { .. } => {}
        }

        Ok(())
    }
}

fn progress_text(progress: Option<f32>, stage: Option<&str>) -> String {
    let stage = stage.unwrap_or(messages::POLLING_TASK);
    match progress {
        Some(p) => format!("{} {:.0}%", stage, (p.clamp(0.0, 1.0) * 100.0)),
        None => stage.to_string(),
    }
}
