pub mod document;
pub mod events;
pub mod snapshot;
pub mod tree;

pub use document::Document;
pub use events::{DomEvent, EventKind};
pub use snapshot::{ElementSnapshot, NodeSnapshot, PageSnapshot};
pub use tree::{AttachedFile, ElementTree, NodeId, collapse_whitespace};
