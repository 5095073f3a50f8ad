use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dom::document::Document;
use crate::dom::tree::{ElementTree, NodeId};
use crate::error::{AutofillError, Result};

/// Serializable description of a page: the input format of the CLI and the
/// shape fixtures are written in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSnapshot {
    Text(String),
    Element(ElementSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Shorthand for a single leading text child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
    /// Live value, exported after filling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Live checked state (selectedness for `<option>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Names of attached files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

impl PageSnapshot {
    /// Load a snapshot from `.json`, `.yaml` or `.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AutofillError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self> {
        let context = format!("page snapshot {}", path.display());
        if is_yaml(path) {
            serde_yaml::from_str(raw).map_err(|e| AutofillError::Parse {
                context,
                message: e.to_string(),
            })
        } else {
            serde_json::from_str(raw).map_err(|e| AutofillError::Parse {
                context,
                message: e.to_string(),
            })
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| AutofillError::Parse {
                context: "serialize snapshot".into(),
                message: e.to_string(),
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| AutofillError::Parse {
                context: "serialize snapshot".into(),
                message: e.to_string(),
            })?
        };
        fs::write(path, serialized).map_err(|source| AutofillError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn element_count(&self) -> usize {
        fn count(nodes: &[NodeSnapshot]) -> usize {
            nodes
                .iter()
                .map(|n| match n {
                    NodeSnapshot::Text(_) => 0,
                    NodeSnapshot::Element(el) => 1 + count(&el.children),
                })
                .sum()
        }
        count(&self.body)
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

// ============================================================================
// Document <-> snapshot
// ============================================================================

impl Document {
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        let mut doc = Document::new(&snapshot.url, &snapshot.title);
        let root = doc.root();
        for node in &snapshot.body {
            doc.load_node(root, node);
        }
        doc
    }

    fn load_node(&mut self, parent: NodeId, node: &NodeSnapshot) {
        match node {
            NodeSnapshot::Text(text) => {
                self.append_text(parent, text);
            }
            NodeSnapshot::Element(el) => {
                let attrs = el
                    .attrs
                    .iter()
                    .map(|(k, v)| (k.to_lowercase(), v.clone()))
                    .collect();
                let id = self.insert_element(parent, &el.tag, attrs);
                if let Some(text) = &el.text {
                    self.append_text(id, text);
                }
                for child in &el.children {
                    self.load_node(id, child);
                }
                if let Some(value) = &el.value {
                    self.set_raw_value(id, value);
                }
                if let Some(checked) = el.checked {
                    if el.tag.eq_ignore_ascii_case("option") {
                        self.set_selected(id, checked);
                    } else {
                        self.set_checked_raw(id, checked);
                    }
                }
            }
        }
    }

    /// Export the current state, including live values, checked flags and
    /// attached file names.
    pub fn to_snapshot(&self) -> PageSnapshot {
        let body = self
            .child_nodes(self.root())
            .iter()
            .filter_map(|n| self.export_node(*n))
            .collect();
        PageSnapshot {
            url: self.url().to_string(),
            title: self.title().to_string(),
            body,
        }
    }

    fn export_node(&self, node: NodeId) -> Option<NodeSnapshot> {
        if let Some(text) = self.text_of(node) {
            return Some(NodeSnapshot::Text(text.to_string()));
        }
        let tag = self.tag(node)?.to_string();
        let children = self
            .child_nodes(node)
            .iter()
            .filter_map(|n| self.export_node(*n))
            .collect();

        let (value, checked) = match tag.as_str() {
            "input" => {
                let kind = self.attr(node, "type").unwrap_or("text").to_lowercase();
                if kind == "checkbox" || kind == "radio" {
                    (None, Some(self.is_checked(node)))
                } else {
                    let v = self.value(node);
                    ((!v.is_empty()).then_some(v), None)
                }
            }
            "textarea" => {
                let v = self.value(node);
                ((!v.is_empty()).then_some(v), None)
            }
            "option" => (None, self.is_selected(node).then_some(true)),
            _ => (None, None),
        };

        Some(NodeSnapshot::Element(ElementSnapshot {
            tag,
            attrs: self.attrs(node).into_iter().collect(),
            text: None,
            children,
            value,
            checked,
            files: self.files(node).iter().map(|f| f.name.clone()).collect(),
        }))
    }
}
