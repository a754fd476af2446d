use crate::record::{ObjectId, RecordUpdate};
use std::fmt;

/// Engine-to-host notifications, drained once per frame by the embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SelectionChanged { id: Option<ObjectId> },
    /// Write-back request; the host applies the patch to its record list.
    RecordUpdated(RecordUpdate),
    ObjectLoadFailed { id: ObjectId, reason: String },
    /// The active camera record vanished or was hidden.
    ActiveCameraReverted { id: ObjectId },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::SelectionChanged { id: Some(id) } => write!(f, "selected {id}"),
            EngineEvent::SelectionChanged { id: None } => write!(f, "selection cleared"),
            EngineEvent::RecordUpdated(update) => {
                let kind = if update.committed { "committed" } else { "live" };
                write!(f, "{kind} update for {}", update.id)
            }
            EngineEvent::ObjectLoadFailed { id, reason } => {
                write!(f, "load failed for {id}: {reason}")
            }
            EngineEvent::ActiveCameraReverted { id } => {
                write!(f, "active camera {id} unavailable, reverted to editor")
            }
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    events: Vec<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
