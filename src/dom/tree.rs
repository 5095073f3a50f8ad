use std::time::Duration;

use crate::dom::events::EventKind;

/// Handle to a node inside an [`ElementTree`]. Only meaningful for the tree
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A file object attached to an `<input type="file">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

const FORM_CONTROL_TAGS: &[&str] = &["input", "select", "textarea", "button"];

/// A queryable, mutable element tree.
///
/// The scanner and filler only ever talk to the page through this trait, so
/// they run the same way against a live browser bridge or a synthetic
/// [`Document`](crate::dom::Document) fixture.
pub trait ElementTree {
    fn url(&self) -> &str;
    fn title(&self) -> &str;
    fn root(&self) -> NodeId;

    /// Lowercase tag name, `None` for text and document nodes.
    fn tag(&self, node: NodeId) -> Option<&str>;
    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);

    fn parent(&self, node: NodeId) -> Option<NodeId>;
    /// Element children in document order (text nodes excluded).
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Raw concatenated text of the subtree, skipping subtrees rooted at any
    /// of `skip_tags`.
    fn collect_text(&self, node: NodeId, skip_tags: &[&str]) -> String;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;
    /// Computed visibility: no `display: none` on the node or an ancestor and
    /// no effective `visibility: hidden`.
    fn is_visible(&self, node: NodeId) -> bool;

    /// Current control value. For `<select>` this is the selected option's
    /// value.
    fn value(&self, node: NodeId) -> String;
    /// Framework-safe value assignment: writes the underlying value without
    /// going through any page-intercepted setter and without firing events.
    fn set_value(&mut self, node: NodeId, value: &str);
    fn is_checked(&self, node: NodeId) -> bool;
    fn set_checked(&mut self, node: NodeId, checked: bool);

    fn dispatch(&mut self, node: NodeId, kind: EventKind);
    /// Yield to the host page for `wait`. The only suspension point the
    /// filler uses.
    fn settle(&mut self, wait: Duration);

    fn watch_navigation(&mut self, enabled: bool);
    fn navigation_detected(&self) -> bool;

    fn attach_file(&mut self, node: NodeId, file: AttachedFile);

    // ------------------------------------------------------------------
    // Provided helpers
    // ------------------------------------------------------------------

    /// Element descendants of `node` in document order, excluding `node`.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }

    fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|n| self.tag(*n).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    /// Element ancestors from the parent upwards.
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if self.tag(current).is_some() {
                out.push(current);
            }
            cursor = self.parent(current);
        }
        out
    }

    /// Element siblings that follow `node` under the same parent.
    fn next_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(node) else {
            return Vec::new();
        };
        self.children(parent)
            .into_iter()
            .skip_while(|n| *n != node)
            .skip(1)
            .collect()
    }

    /// Element siblings that precede `node`, nearest first.
    fn previous_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(node) else {
            return Vec::new();
        };
        let mut before: Vec<NodeId> = self
            .children(parent)
            .into_iter()
            .take_while(|n| *n != node)
            .collect();
        before.reverse();
        before
    }

    /// Whitespace-collapsed text of the whole subtree.
    fn text_content(&self, node: NodeId) -> String {
        collapse_whitespace(&self.collect_text(node, &["script", "style"]))
    }

    /// Visible label text: subtree text without nested controls and options.
    fn label_text(&self, node: NodeId) -> String {
        collapse_whitespace(&self.collect_text(
            node,
            &["select", "option", "textarea", "script", "style"],
        ))
    }

    /// Whether the lowercase `class` attribute contains any fragment.
    fn has_class_fragment(&self, node: NodeId, fragments: &[&str]) -> bool {
        self.attr(node, "class").is_some_and(|class| {
            let class = class.to_lowercase();
            fragments.iter().any(|f| class.contains(f))
        })
    }

    fn contains_form_control(&self, node: NodeId) -> bool {
        self.descendants(node)
            .into_iter()
            .any(|n| self.tag(n).is_some_and(|t| FORM_CONTROL_TAGS.contains(&t)))
    }

    fn is_form_control(&self, node: NodeId) -> bool {
        self.tag(node).is_some_and(|t| FORM_CONTROL_TAGS.contains(&t))
    }
}

/// Trim and collapse every run of whitespace to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
