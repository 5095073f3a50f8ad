use serde::{Deserialize, Serialize};

use crate::dom::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    Blur,
    Input,
    Change,
    Click,
    PointerDown,
    PointerUp,
    MouseDown,
    MouseUp,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Click => "click",
            EventKind::PointerDown => "pointerdown",
            EventKind::PointerUp => "pointerup",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
        }
    }
}

/// A dispatched event as seen by listeners and the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
    /// Virtual clock reading at dispatch time.
    pub at_ms: u64,
}
