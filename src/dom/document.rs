use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use crate::dom::events::{DomEvent, EventKind};
use crate::dom::tree::{AttachedFile, ElementTree, NodeId};

// ============================================================================
// Arena nodes
// ============================================================================

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    value: String,
    checked: bool,
    selected: bool,
    files: Vec<AttachedFile>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

type ListenerFn = Box<dyn FnMut(&mut Document, &DomEvent)>;

struct Listener {
    target: Option<NodeId>,
    kind: Option<EventKind>,
    callback: ListenerFn,
}

// ============================================================================
// Document
// ============================================================================

/// In-memory element tree used for fixtures, snapshots, and the CLI.
///
/// Listeners registered with [`Document::add_listener`] receive a mutable
/// document, so they can play the host page's part: revealing conditional
/// fields, opening listboxes, or navigating away. Listeners fire for events
/// on their target or any descendant of it. A dispatch issued from inside a
/// listener is logged but does not re-enter listeners.
pub struct Document {
    url: String,
    title: String,
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, Vec<NodeId>>,
    events: Vec<DomEvent>,
    listeners: Vec<Listener>,
    clock_ms: u64,
    watching_navigation: bool,
    navigation_seen: bool,
    navigations: Vec<String>,
    focused: Option<NodeId>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("title", &self.title)
            .field("nodes", &self.nodes.len())
            .field("events", &self.events.len())
            .field("listeners", &self.listeners.len())
            .field("clock_ms", &self.clock_ms)
            .finish()
    }
}

impl Document {
    pub fn new(url: &str, title: &str) -> Self {
        Document {
            url: url.to_string(),
            title: title.to_string(),
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
            events: Vec::new(),
            listeners: Vec::new(),
            clock_ms: 0,
            watching_navigation: false,
            navigation_seen: false,
            navigations: Vec::new(),
            focused: None,
        }
    }

    /// Append a new element under `parent`.
    ///
    /// `value`, `checked`, and `selected` attributes seed the live control
    /// state the same way a parser would.
    pub fn create_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs: BTreeMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect();
        self.insert_element(parent, tag, attrs)
    }

    pub(crate) fn insert_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: BTreeMap<String, String>,
    ) -> NodeId {
        let element = Element {
            tag: tag.to_lowercase(),
            value: attrs.get("value").cloned().unwrap_or_default(),
            checked: attrs.contains_key("checked"),
            selected: attrs.contains_key("selected"),
            attrs,
            files: Vec::new(),
        };
        let id_attr = element.attrs.get("id").cloned();
        let node = self.push_node(Some(parent), NodeData::Element(element));
        if let Some(id) = id_attr {
            self.index_id(&id, node);
        }
        node
    }

    /// Append a text node under `parent`. Text inside a `<textarea>` also
    /// becomes its value.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        if let Some(el) = self.element_mut(parent)
            && el.tag == "textarea"
        {
            el.value.push_str(text);
        }
        self.push_node(Some(parent), NodeData::Text(text.to_string()))
    }

    /// Detach `node` (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        let name = name.to_lowercase();
        let old = self
            .element_mut(node)
            .and_then(|el| el.attrs.remove(&name));
        if name == "id"
            && let Some(old) = old
        {
            self.unindex_id(&old, node);
        }
    }

    /// Simulate the page navigating away. Flags the active navigation watch.
    pub fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_string());
        self.url = url.to_string();
        if self.watching_navigation {
            self.navigation_seen = true;
        }
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Register a listener. `target: None` listens document-wide and
    /// `kind: None` listens to every event kind.
    pub fn add_listener<F>(&mut self, target: Option<NodeId>, kind: Option<EventKind>, callback: F)
    where
        F: FnMut(&mut Document, &DomEvent) + 'static,
    {
        self.listeners.push(Listener {
            target,
            kind,
            callback: Box::new(callback),
        });
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Event kinds dispatched at `node`, in order.
    pub fn events_for(&self, node: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == node)
            .map(|e| e.kind)
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn files(&self, node: NodeId) -> &[AttachedFile] {
        self.element(node).map(|el| el.files.as_slice()).unwrap_or(&[])
    }

    /// Attributes of an element in name order.
    pub fn attrs(&self, node: NodeId) -> Vec<(String, String)> {
        self.element(node)
            .map(|el| el.attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    pub(crate) fn is_selected(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.selected)
    }

    pub(crate) fn set_selected(&mut self, node: NodeId, selected: bool) {
        if let Some(el) = self.element_mut(node) {
            el.selected = selected;
        }
    }

    pub(crate) fn set_checked_raw(&mut self, node: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(node) {
            el.checked = checked;
        }
    }

    pub(crate) fn raw_value(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.value.as_str())
    }

    pub(crate) fn set_raw_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.value = value.to_string();
        }
    }

    /// All child nodes including text, for snapshot export.
    pub(crate) fn child_nodes(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub(crate) fn text_of(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    fn push_node(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn index_id(&mut self, id: &str, node: NodeId) {
        if id.is_empty() {
            return;
        }
        let entry = self.id_index.entry(id.to_string()).or_default();
        if !entry.contains(&node) {
            entry.push(node);
        }
    }

    fn unindex_id(&mut self, id: &str, node: NodeId) {
        let Some(nodes) = self.id_index.get_mut(id) else {
            return;
        };
        nodes.retain(|n| *n != node);
        if nodes.is_empty() {
            self.id_index.remove(id);
        }
    }

    /// Whether `node` is still reachable from the document root.
    fn is_connected(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.nodes[current.0].parent;
        }
        false
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes[current.0].parent;
        }
        false
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self.text_content(option),
        }
    }

    fn select_options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|n| self.tag(*n) == Some("option"))
            .collect()
    }

    fn collect_text_into(&self, node: NodeId, skip_tags: &[&str], out: &mut String) {
        for child in &self.nodes[node.0].children {
            match &self.nodes[child.0].data {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element(el) => {
                    if skip_tags.contains(&el.tag.as_str()) {
                        continue;
                    }
                    out.push(' ');
                    self.collect_text_into(*child, skip_tags, out);
                    out.push(' ');
                }
                NodeData::Document => {}
            }
        }
    }
}

/// Lowercased `display` / `visibility` declarations from an inline style.
fn style_property(style: &str, property: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        (name.trim().eq_ignore_ascii_case(property)).then(|| value.trim().to_lowercase())
    })
}

impl ElementTree for Document {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let name = name.to_lowercase();
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let old = el.attrs.insert(name.clone(), value.to_string());
        if name == "id" {
            if let Some(old) = old {
                self.unindex_id(&old, node);
            }
            self.index_id(value, node);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|c| matches!(self.nodes[c.0].data, NodeData::Element(_)))
            .collect()
    }

    fn collect_text(&self, node: NodeId, skip_tags: &[&str]) -> String {
        let mut out = String::new();
        self.collect_text_into(node, skip_tags, &mut out);
        out
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index
            .get(id)?
            .iter()
            .copied()
            .find(|n| self.is_connected(*n))
    }

    fn is_visible(&self, node: NodeId) -> bool {
        let mut visibility: Option<bool> = None;
        let mut cursor = Some(node);
        let mut reached_root = false;

        while let Some(current) = cursor {
            if current == self.root {
                reached_root = true;
                break;
            }
            if let Some(el) = self.element(current) {
                if el.attrs.contains_key("hidden") {
                    return false;
                }
                if let Some(style) = el.attrs.get("style") {
                    if style_property(style, "display").as_deref() == Some("none") {
                        return false;
                    }
                    if visibility.is_none()
                        && let Some(v) = style_property(style, "visibility")
                    {
                        visibility = Some(v != "hidden" && v != "collapse");
                    }
                }
            }
            cursor = self.nodes[current.0].parent;
        }

        reached_root && visibility.unwrap_or(true)
    }

    fn value(&self, node: NodeId) -> String {
        match self.tag(node) {
            Some("select") => {
                let options = self.select_options(node);
                options
                    .iter()
                    .find(|o| self.is_selected(**o))
                    .or_else(|| options.first())
                    .map(|o| self.option_value(*o))
                    .unwrap_or_default()
            }
            Some("option") => self.option_value(node),
            _ => self.raw_value(node).unwrap_or_default().to_string(),
        }
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        if self.tag(node) == Some("select") {
            let options = self.select_options(node);
            if !options.iter().any(|o| self.option_value(*o) == value) {
                return;
            }
            for option in options {
                let selected = self.option_value(option) == value;
                self.set_selected(option, selected);
            }
            return;
        }
        self.set_raw_value(node, value);
    }

    fn is_checked(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.checked)
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) {
        let is_radio = self
            .attr(node, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("radio"));
        if checked
            && is_radio
            && let Some(name) = self.attr(node, "name").map(str::to_string)
        {
            for other in self.elements_by_tag(&["input"]) {
                if other != node
                    && self.attr(other, "name") == Some(name.as_str())
                    && self
                        .attr(other, "type")
                        .is_some_and(|t| t.eq_ignore_ascii_case("radio"))
                {
                    self.set_checked_raw(other, false);
                }
            }
        }
        self.set_checked_raw(node, checked);
    }

    fn dispatch(&mut self, node: NodeId, kind: EventKind) {
        let event = DomEvent {
            target: node,
            kind,
            at_ms: self.clock_ms,
        };
        match kind {
            EventKind::Focus => self.focused = Some(node),
            EventKind::Blur if self.focused == Some(node) => self.focused = None,
            _ => {}
        }
        self.events.push(event.clone());

        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            let kind_matches = listener.kind.is_none_or(|k| k == kind);
            let target_matches = listener
                .target
                .is_none_or(|t| self.is_inclusive_ancestor(t, node));
            if kind_matches && target_matches {
                (listener.callback)(self, &event);
            }
        }
        // Listeners registered during callbacks landed in `self.listeners`.
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    fn settle(&mut self, wait: Duration) {
        self.clock_ms += wait.as_millis() as u64;
    }

    fn watch_navigation(&mut self, enabled: bool) {
        self.watching_navigation = enabled;
        if enabled {
            self.navigation_seen = false;
        }
    }

    fn navigation_detected(&self) -> bool {
        self.navigation_seen
    }

    fn attach_file(&mut self, node: NodeId, file: AttachedFile) {
        if let Some(el) = self.element_mut(node) {
            el.value = format!("C:\\fakepath\\{}", file.name);
            el.files = vec![file];
        }
    }
}
