use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dom::{ElementTree, NodeId};
use crate::error::{AutofillError, Result};
use crate::scan::actions::scan_actions;
use crate::scan::field_model::{
    ActionDescriptor, FieldDescriptor, FieldKind, FieldOption, NO_LABEL, OptionSource, ScanResult,
};
use crate::scan::heuristics::{BooleanQuestionClassifier, YesNoHeuristic};
use crate::scan::identity::assign_field_id;
use crate::scan::label::{
    clean_label, group_label, is_required, labelledby_text, option_label, raw_label, resolve_hint,
    resolve_label,
};
use crate::scan::options::{MAX_OPTIONS, infer_options, is_combobox, select_options};

/// Input types that carry no user data.
const SKIPPED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "image", "reset"];

/// Input types reported as plain text.
const TEXT_LIKE_TYPES: &[&str] = &[
    "text",
    "email",
    "tel",
    "url",
    "number",
    "search",
    "password",
    "date",
    "datetime-local",
    "month",
    "week",
    "time",
];

const BUTTON_GROUP_CLASSES: &[&str] = &[
    "button-group",
    "btn-group",
    "toggle-group",
    "segmented",
    "choice-group",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub max_options: usize,
    pub boolean_keywords: Vec<String>,
    pub acknowledgment_terms: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_options: MAX_OPTIONS,
            boolean_keywords: Vec::new(),
            acknowledgment_terms: Vec::new(),
        }
    }
}

/// A unit of work discovered while walking controls in document order.
enum Pending {
    Single(NodeId),
    Group {
        kind: FieldKind,
        name: String,
        members: Vec<NodeId>,
    },
    ButtonGroup {
        container: NodeId,
        buttons: Vec<NodeId>,
    },
}

pub struct Scanner {
    max_options: usize,
    classifier: Box<dyn BooleanQuestionClassifier>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            max_options: MAX_OPTIONS,
            classifier: Box::new(YesNoHeuristic::new()),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            max_options: config.max_options.max(1),
            classifier: Box::new(YesNoHeuristic::with_extra_terms(
                &config.boolean_keywords,
                &config.acknowledgment_terms,
            )),
        }
    }

    /// Swap the yes/no question classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn BooleanQuestionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn scan(&self, tree: &mut dyn ElementTree) -> ScanResult {
        let fields = self.scan_fields(tree);
        let actions = self.scan_actions(&*tree);
        ScanResult { fields, actions }
    }

    /// Clickable actions outside button groups.
    pub fn scan_actions(&self, tree: &dyn ElementTree) -> Vec<ActionDescriptor> {
        let groups: Vec<NodeId> = detect_button_groups(tree)
            .into_iter()
            .map(|(container, _)| container)
            .collect();
        scan_actions(tree, &groups)
    }

    pub fn scan_fields(&self, tree: &mut dyn ElementTree) -> Vec<FieldDescriptor> {
        self.scan_excluding(tree, &HashSet::new())
    }

    /// Scan, returning only descriptors whose id is not in `known`.
    ///
    /// Ids are still assigned and written back for every field so that the
    /// excluded ones stay stable.
    pub fn scan_excluding(
        &self,
        tree: &mut dyn ElementTree,
        known: &HashSet<String>,
    ) -> Vec<FieldDescriptor> {
        let mut taken: HashSet<String> = HashSet::new();
        let mut fields = Vec::new();

        for pending in collect_pending(&*tree) {
            let result = match &pending {
                Pending::Single(node) => self.describe_single(tree, *node, &mut taken),
                Pending::Group {
                    kind,
                    name,
                    members,
                } => self.describe_group(&*tree, *kind, name, members, &mut taken),
                Pending::ButtonGroup { container, buttons } => {
                    self.describe_button_group(tree, *container, buttons, &mut taken)
                }
            };

            match result {
                Ok(field) if known.contains(&field.id) => {}
                Ok(field) => {
                    debug!(id = %field.id, kind = field.kind.as_str(), label = %field.label, "scanned field");
                    fields.push(field);
                }
                Err(e) => warn!("skipping field: {}", e),
            }
        }

        fields
    }

    /// Option recovery for a text-like control (see [`infer_options`]).
    pub fn infer_options(
        &self,
        tree: &dyn ElementTree,
        node: NodeId,
        field_id: &str,
        question: &str,
    ) -> Option<(Vec<FieldOption>, OptionSource)> {
        infer_options(
            tree,
            node,
            field_id,
            question,
            self.classifier.as_ref(),
            self.max_options,
        )
    }

    // ------------------------------------------------------------------
    // per-unit extraction
    // ------------------------------------------------------------------

    fn describe_single(
        &self,
        tree: &mut dyn ElementTree,
        node: NodeId,
        taken: &mut HashSet<String>,
    ) -> Result<FieldDescriptor> {
        let tag = tree
            .tag(node)
            .ok_or_else(|| AutofillError::DomStructure(format!("node {} is not an element", node.0)))?
            .to_string();

        let raw = raw_label(&*tree, node);
        let label = resolve_label(&*tree, node);
        let hint = resolve_hint(&*tree, node, &label);
        let required = is_required(&*tree, node, raw.as_deref());
        let name = tree.attr(node, "name").map(str::to_string);
        let input_type = input_type(&*tree, node);

        let id = assign_field_id(tree, node, &label, taken);
        let tree: &dyn ElementTree = &*tree;

        let mut field = FieldDescriptor::new(id, label, FieldKind::Unknown);
        field.hint = hint;
        field.required = required;
        field.name = name;

        match tag.as_str() {
            "select" => {
                field.kind = FieldKind::Select;
                let options = select_options(tree, node, self.max_options);
                let current = tree.value(node);
                field.current_value = options
                    .iter()
                    .find(|o| o.value == current)
                    .map(|o| o.text.clone())
                    .filter(|t| !t.is_empty());
                field.options = Some(options);
            }
            "textarea" => {
                field.kind = FieldKind::Textarea;
                field.current_value = non_empty(tree.value(node));
            }
            "input" => match input_type.as_str() {
                "checkbox" => {
                    field.kind = FieldKind::Checkbox;
                    field.current_value = Some(toggle_state(tree, node));
                }
                "radio" => {
                    field.kind = FieldKind::Radio;
                    field.current_value = Some(toggle_state(tree, node));
                }
                "file" => field.kind = FieldKind::File,
                t if TEXT_LIKE_TYPES.contains(&t) => {
                    field.kind = if is_combobox(tree, node) {
                        FieldKind::Combobox
                    } else {
                        FieldKind::Text
                    };
                    field.current_value = non_empty(tree.value(node));
                    if t == "text" || t == "search" || field.kind == FieldKind::Combobox {
                        self.attach_recovered_options(tree, node, &mut field);
                    }
                }
                _ => field.kind = FieldKind::Unknown,
            },
            other => {
                return Err(AutofillError::DomStructure(format!(
                    "unexpected control <{other}>"
                )));
            }
        }

        Ok(field)
    }

    fn attach_recovered_options(
        &self,
        tree: &dyn ElementTree,
        node: NodeId,
        field: &mut FieldDescriptor,
    ) {
        let question = field.question_text();
        let Some((options, source)) = self.infer_options(tree, node, &field.id, &question) else {
            return;
        };
        debug!(id = %field.id, ?source, count = options.len(), "recovered options");
        if field.kind != FieldKind::Combobox {
            field.kind = FieldKind::CustomSelect;
        }
        field.options = Some(options);
        field.option_source = Some(source);
    }

    fn describe_group(
        &self,
        tree: &dyn ElementTree,
        kind: FieldKind,
        name: &str,
        members: &[NodeId],
        taken: &mut HashSet<String>,
    ) -> Result<FieldDescriptor> {
        let first = *members
            .first()
            .ok_or_else(|| AutofillError::DomStructure(format!("empty group '{name}'")))?;

        let label = group_label(tree, members);
        let hint = resolve_hint(tree, first, &label);
        let raw = raw_label(tree, first);
        let required = members.iter().any(|m| is_required(tree, *m, None))
            || is_required(tree, first, raw.as_deref())
            || label_marks_required(tree, first);

        let options: Vec<FieldOption> = members
            .iter()
            .take(self.max_options)
            .map(|m| {
                let text = option_label(tree, *m);
                let value = tree
                    .attr(*m, "value")
                    .map(str::to_string)
                    .unwrap_or_else(|| text.clone());
                FieldOption::new(value, text).with_checked(tree.is_checked(*m))
            })
            .collect();

        let checked: Vec<&str> = options
            .iter()
            .filter(|o| o.checked == Some(true))
            .map(|o| o.text.as_str())
            .collect();

        let id = group_id(tree, name, members, taken);
        let mut field = FieldDescriptor::new(id, label, kind);
        field.hint = hint;
        field.required = required;
        field.name = Some(name.to_string());
        field.current_value = (!checked.is_empty()).then(|| checked.join(", "));
        field.options = Some(options);
        Ok(field)
    }

    fn describe_button_group(
        &self,
        tree: &mut dyn ElementTree,
        container: NodeId,
        buttons: &[NodeId],
        taken: &mut HashSet<String>,
    ) -> Result<FieldDescriptor> {
        if buttons.len() < 2 {
            return Err(AutofillError::DomStructure(
                "button group with fewer than two choices".into(),
            ));
        }
        let label = button_group_label(&*tree, container);
        let hint = resolve_hint(&*tree, container, &label);
        let required = is_required(&*tree, container, None);
        let id = assign_field_id(tree, container, &label, taken);
        let tree: &dyn ElementTree = &*tree;

        let options: Vec<FieldOption> = buttons
            .iter()
            .take(self.max_options)
            .map(|b| {
                let text = tree.text_content(*b);
                let value = tree
                    .attr(*b, "data-value")
                    .or_else(|| tree.attr(*b, "value"))
                    .map(str::to_string)
                    .unwrap_or_else(|| text.clone());
                FieldOption::new(value, text).with_checked(is_pressed(tree, *b))
            })
            .collect();

        let mut field = FieldDescriptor::new(id, label, FieldKind::ButtonGroup);
        field.hint = hint;
        field.required = required;
        field.current_value = options
            .iter()
            .find(|o| o.checked == Some(true))
            .map(|o| o.text.clone());
        field.options = Some(options);
        Ok(field)
    }
}

// ============================================================================
// Discovery
// ============================================================================

fn collect_pending(tree: &dyn ElementTree) -> Vec<Pending> {
    let mut pending: Vec<Pending> = Vec::new();
    let mut radio_groups: HashMap<String, usize> = HashMap::new();
    let mut checkbox_groups: HashMap<String, usize> = HashMap::new();

    for node in tree.elements_by_tag(&["input", "select", "textarea"]) {
        if !tree.is_visible(node) {
            continue;
        }
        let ty = input_type(tree, node);
        if tree.tag(node) == Some("input") && SKIPPED_INPUT_TYPES.contains(&ty.as_str()) {
            continue;
        }

        let name = tree
            .attr(node, "name")
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let (groups, kind) = match (ty.as_str(), &name) {
            ("radio", Some(_)) => (&mut radio_groups, FieldKind::RadioGroup),
            ("checkbox", Some(_)) => (&mut checkbox_groups, FieldKind::CheckboxGroup),
            _ => {
                pending.push(Pending::Single(node));
                continue;
            }
        };
        let Some(name) = name else {
            continue;
        };

        match groups.get(&name) {
            Some(idx) => {
                if let Pending::Group { members, .. } = &mut pending[*idx] {
                    members.push(node);
                }
            }
            None => {
                groups.insert(name.clone(), pending.len());
                pending.push(Pending::Group {
                    kind,
                    name,
                    members: vec![node],
                });
            }
        }
    }

    // A lone checkbox is an independent boolean, not a group.
    for unit in pending.iter_mut() {
        if let Pending::Group {
            kind: FieldKind::CheckboxGroup,
            members,
            ..
        } = unit
            && members.len() == 1
        {
            *unit = Pending::Single(members[0]);
        }
    }

    for (container, buttons) in detect_button_groups(tree) {
        pending.push(Pending::ButtonGroup { container, buttons });
    }

    pending
}

/// Containers of mutually exclusive clickable choices with no native inputs.
pub fn detect_button_groups(tree: &dyn ElementTree) -> Vec<(NodeId, Vec<NodeId>)> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|n| {
            matches!(tree.attr(*n, "role"), Some("radiogroup") | Some("group"))
                || tree.has_class_fragment(*n, BUTTON_GROUP_CLASSES)
        })
        .filter(|n| tree.is_visible(*n))
        .filter(|n| {
            !tree
                .descendants(*n)
                .into_iter()
                .any(|d| matches!(tree.tag(d), Some("input") | Some("select") | Some("textarea")))
        })
        .filter_map(|container| {
            let buttons: Vec<NodeId> = tree
                .children(container)
                .into_iter()
                .filter(|c| is_clickable_choice(tree, *c) && tree.is_visible(*c))
                .collect();
            (buttons.len() >= 2).then_some((container, buttons))
        })
        .collect()
}

pub(crate) fn is_clickable_choice(tree: &dyn ElementTree, node: NodeId) -> bool {
    tree.tag(node) == Some("button")
        || matches!(
            tree.attr(node, "role"),
            Some("button") | Some("radio") | Some("option")
        )
}

pub(crate) fn is_pressed(tree: &dyn ElementTree, node: NodeId) -> bool {
    tree.attr(node, "aria-pressed") == Some("true")
        || tree.attr(node, "aria-checked") == Some("true")
        || tree.attr(node, "aria-selected") == Some("true")
        || tree.attr(node, "selected").is_some()
        || tree
            .attr(node, "class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == "active" || t == "selected"))
}

fn button_group_label(tree: &dyn ElementTree, container: NodeId) -> String {
    if let Some(aria) = tree.attr(container, "aria-label").filter(|a| !a.trim().is_empty()) {
        return clean_label(aria);
    }
    if let Some(text) = labelledby_text(tree, container) {
        return clean_label(&text);
    }
    tree.previous_siblings(container)
        .into_iter()
        .find(|s| {
            matches!(
                tree.tag(*s),
                Some("label") | Some("legend") | Some("h2") | Some("h3") | Some("h4") | Some("p") | Some("span") | Some("div")
            ) && !tree.contains_form_control(*s)
        })
        .map(|s| clean_label(&tree.label_text(s)))
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| NO_LABEL.to_string())
}

fn label_marks_required(tree: &dyn ElementTree, first: NodeId) -> bool {
    tree.ancestors(first)
        .into_iter()
        .find(|a| tree.tag(*a) == Some("fieldset"))
        .and_then(|fs| {
            tree.children(fs)
                .into_iter()
                .find(|c| tree.tag(*c) == Some("legend"))
        })
        .is_some_and(|legend| {
            let raw = tree.label_text(legend);
            raw.contains('*') || raw.to_lowercase().contains("required")
        })
}

/// Id for a radio/checkbox group: its shared `name`, suffixed `_2`, `_3`, ...
/// while another field or a non-member element already holds it.
fn group_id(
    tree: &dyn ElementTree,
    name: &str,
    members: &[NodeId],
    taken: &mut HashSet<String>,
) -> String {
    let mut id = name.to_string();
    let mut suffix = 2;
    while taken.contains(&id)
        || tree
            .element_by_id(&id)
            .is_some_and(|other| !members.contains(&other))
    {
        id = format!("{name}_{suffix}");
        suffix += 1;
    }
    taken.insert(id.clone());
    id
}

/// Lowercased input type; `text` when absent. Non-inputs report their tag.
pub(crate) fn input_type(tree: &dyn ElementTree, node: NodeId) -> String {
    match tree.tag(node) {
        Some("input") => tree
            .attr(node, "type")
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string()),
        Some(tag) => tag.to_string(),
        None => String::new(),
    }
}

fn toggle_state(tree: &dyn ElementTree, node: NodeId) -> String {
    let state = if tree.is_checked(node) { "checked" } else { "unchecked" };
    state.to_string()
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
