use std::time::Duration;

use tracing::debug;

use crate::dom::{ElementTree, EventKind, NodeId};
use crate::fill::fill_model::{
    FieldError, FieldIssue, FillConfig, FillMethod, FillValue, FilledField, ResolverTag,
    SkipReason, SkippedField,
};
use crate::matching::{MatchRung, boolean_class, find_option, match_option, normalize};
use crate::scan::label::option_label;
use crate::scan::options::{harvest_options, is_combobox, select_options};
use crate::scan::scanner::{input_type, is_clickable_choice, is_pressed};
use crate::scan::{FieldDescriptor, FieldKind, FieldOption, OptionSource};

/// The live control(s) behind a field, with whatever each kind needs to be
/// driven.
#[derive(Debug, Clone, PartialEq)]
pub enum FillTarget {
    Toggle(NodeId),
    RadioGroup(Vec<NodeId>),
    CheckboxGroup(Vec<NodeId>),
    Select(NodeId),
    CustomSelect {
        input: NodeId,
        options: Vec<FieldOption>,
        backing: Option<NodeId>,
    },
    Combobox {
        input: NodeId,
        options: Vec<FieldOption>,
        listbox: Option<NodeId>,
    },
    ButtonGroup {
        container: NodeId,
        buttons: Vec<NodeId>,
    },
    Text(NodeId),
    File(NodeId),
    Unknown(NodeId),
}

impl FillTarget {
    pub fn kind(&self, tree: &dyn ElementTree) -> FieldKind {
        match self {
            FillTarget::Toggle(node) => {
                if input_type(tree, *node) == "radio" {
                    FieldKind::Radio
                } else {
                    FieldKind::Checkbox
                }
            }
            FillTarget::RadioGroup(_) => FieldKind::RadioGroup,
            FillTarget::CheckboxGroup(_) => FieldKind::CheckboxGroup,
            FillTarget::Select(_) => FieldKind::Select,
            FillTarget::CustomSelect { .. } => FieldKind::CustomSelect,
            FillTarget::Combobox { .. } => FieldKind::Combobox,
            FillTarget::ButtonGroup { .. } => FieldKind::ButtonGroup,
            FillTarget::Text(node) => {
                if tree.tag(*node) == Some("textarea") {
                    FieldKind::Textarea
                } else {
                    FieldKind::Text
                }
            }
            FillTarget::File(_) => FieldKind::File,
            FillTarget::Unknown(_) => FieldKind::Unknown,
        }
    }
}

/// A file input waiting for the upload step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub field_id: String,
    pub file_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Filled(FilledField),
    Skipped(SkippedField),
    Failed(FieldError),
    Upload(PendingUpload),
    NotFound,
}

// ============================================================================
// Locating
// ============================================================================

/// Resolve a mapping id to its live control(s): by scanned descriptor, then
/// element id, then `name`, then position (`field_<n>` or `<n>`).
pub fn locate(
    tree: &dyn ElementTree,
    id: &str,
    descriptor: Option<&FieldDescriptor>,
) -> Option<FillTarget> {
    if let Some(descriptor) = descriptor
        && let Some(target) = locate_described(tree, descriptor)
    {
        return Some(target);
    }
    if let Some(node) = tree.element_by_id(id) {
        return Some(classify_node(tree, node));
    }
    if let Some(target) = locate_by_name(tree, id) {
        return Some(target);
    }
    locate_by_position(tree, id).map(|node| classify_node(tree, node))
}

fn locate_described(tree: &dyn ElementTree, field: &FieldDescriptor) -> Option<FillTarget> {
    match field.kind {
        FieldKind::RadioGroup | FieldKind::CheckboxGroup => {
            let name = field.name.as_deref().unwrap_or(&field.id);
            let ty = if field.kind == FieldKind::RadioGroup {
                "radio"
            } else {
                "checkbox"
            };
            let members = named_inputs(tree, name, ty);
            if members.is_empty() {
                return None;
            }
            Some(if field.kind == FieldKind::RadioGroup {
                FillTarget::RadioGroup(members)
            } else {
                FillTarget::CheckboxGroup(members)
            })
        }
        FieldKind::CustomSelect => {
            let input = tree.element_by_id(&field.id)?;
            let backing = match field.option_source {
                Some(OptionSource::NativeSelect(select)) => Some(select),
                _ => None,
            };
            Some(FillTarget::CustomSelect {
                input,
                options: field.options().to_vec(),
                backing,
            })
        }
        FieldKind::Combobox => {
            let input = tree.element_by_id(&field.id)?;
            let listbox = match field.option_source {
                Some(OptionSource::Listbox(listbox)) => Some(listbox),
                _ => None,
            };
            Some(FillTarget::Combobox {
                input,
                options: field.options().to_vec(),
                listbox,
            })
        }
        _ => tree
            .element_by_id(&field.id)
            .map(|node| classify_node(tree, node)),
    }
}

fn named_inputs(tree: &dyn ElementTree, name: &str, ty: &str) -> Vec<NodeId> {
    tree.elements_by_tag(&["input"])
        .into_iter()
        .filter(|n| tree.attr(*n, "name") == Some(name) && input_type(tree, *n) == ty)
        .collect()
}

fn locate_by_name(tree: &dyn ElementTree, name: &str) -> Option<FillTarget> {
    let named: Vec<NodeId> = tree
        .elements_by_tag(&["input", "select", "textarea"])
        .into_iter()
        .filter(|n| tree.attr(*n, "name") == Some(name))
        .collect();
    let first = *named.first()?;
    match input_type(tree, first).as_str() {
        "radio" => Some(FillTarget::RadioGroup(named_inputs(tree, name, "radio"))),
        "checkbox" if named.len() > 1 => {
            Some(FillTarget::CheckboxGroup(named_inputs(tree, name, "checkbox")))
        }
        _ => Some(classify_node(tree, first)),
    }
}

fn locate_by_position(tree: &dyn ElementTree, id: &str) -> Option<NodeId> {
    let index: usize = id.strip_prefix("field_").unwrap_or(id).parse().ok()?;
    tree.elements_by_tag(&["input", "select", "textarea"])
        .into_iter()
        .filter(|n| {
            tree.is_visible(*n)
                && !matches!(
                    input_type(tree, *n).as_str(),
                    "hidden" | "submit" | "button" | "image" | "reset"
                )
        })
        .nth(index)
}

/// Target for a bare element with no scanned descriptor.
fn classify_node(tree: &dyn ElementTree, node: NodeId) -> FillTarget {
    match tree.tag(node) {
        Some("select") => FillTarget::Select(node),
        Some("textarea") => FillTarget::Text(node),
        Some("input") => match input_type(tree, node).as_str() {
            "checkbox" | "radio" => FillTarget::Toggle(node),
            "file" => FillTarget::File(node),
            "range" | "color" => FillTarget::Unknown(node),
            _ if is_combobox(tree, node) => FillTarget::Combobox {
                input: node,
                options: Vec::new(),
                listbox: None,
            },
            _ => FillTarget::Text(node),
        },
        _ => {
            let buttons: Vec<NodeId> = tree
                .children(node)
                .into_iter()
                .filter(|c| is_clickable_choice(tree, *c))
                .collect();
            if buttons.len() >= 2 {
                FillTarget::ButtonGroup {
                    container: node,
                    buttons,
                }
            } else {
                FillTarget::Unknown(node)
            }
        }
    }
}

// ============================================================================
// Filling
// ============================================================================

/// Applies one value to one field, dispatching the events a page needs to
/// notice the change.
#[derive(Debug, Clone)]
pub struct Filler {
    combobox_wait: Duration,
    cover_letter: Option<String>,
}

impl Default for Filler {
    fn default() -> Self {
        Self::new(&FillConfig::default())
    }
}

impl Filler {
    pub fn new(config: &FillConfig) -> Self {
        Self {
            combobox_wait: Duration::from_millis(config.combobox_wait_ms),
            cover_letter: None,
        }
    }

    pub fn with_cover_letter(mut self, text: Option<String>) -> Self {
        self.cover_letter = text.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn fill_field(
        &self,
        tree: &mut dyn ElementTree,
        id: &str,
        descriptor: Option<&FieldDescriptor>,
        value: &FillValue,
    ) -> FieldOutcome {
        let Some(target) = locate(&*tree, id, descriptor) else {
            return FieldOutcome::NotFound;
        };
        let kind = descriptor
            .map(|d| d.kind)
            .unwrap_or_else(|| target.kind(&*tree));

        let value = match value {
            FillValue::Tag(tag) => match self.resolve_tag(*tag, id, &target) {
                Ok(text) => FillValue::Text(text),
                Err(outcome) => return outcome,
            },
            other => other.clone(),
        };

        debug!(id, kind = kind.as_str(), value = %value, "filling field");
        let result = match &target {
            FillTarget::Toggle(node) => fill_toggle(tree, *node, &value),
            FillTarget::RadioGroup(members) => fill_radio_group(tree, members, &value),
            FillTarget::CheckboxGroup(members) => fill_checkbox_group(tree, members, &value),
            FillTarget::Select(node) => fill_select(tree, *node, &value),
            FillTarget::CustomSelect {
                input,
                options,
                backing,
            } => fill_custom_select(tree, *input, options, *backing, &value),
            FillTarget::Combobox {
                input,
                options,
                listbox,
            } => self.fill_combobox(tree, *input, options, *listbox, &value),
            FillTarget::ButtonGroup { buttons, .. } => fill_button_group(tree, buttons, &value),
            FillTarget::Text(node) => Ok(fill_text(tree, *node, &value.as_text())),
            FillTarget::File(_) => return skipped(id, SkipReason::FileInput),
            FillTarget::Unknown(_) => Err(FieldIssue::Unsupported { kind }),
        };

        match result {
            Ok(applied) => FieldOutcome::Filled(FilledField {
                id: id.to_string(),
                kind,
                value: applied.value,
                method: applied.method,
                matched_option: applied.matched_option,
                rung: applied.rung,
            }),
            Err(issue) => FieldOutcome::Failed(FieldError {
                id: id.to_string(),
                issue,
            }),
        }
    }

    /// Text to type for a tag, or the terminal outcome when the tag is not
    /// typed at all.
    fn resolve_tag(
        &self,
        tag: ResolverTag,
        id: &str,
        target: &FillTarget,
    ) -> Result<String, FieldOutcome> {
        match tag {
            ResolverTag::ResumeFile | ResolverTag::CoverLetterFile => {
                let file_type = tag.file_type().unwrap_or("resume");
                if matches!(target, FillTarget::File(_)) {
                    Err(FieldOutcome::Upload(PendingUpload {
                        field_id: id.to_string(),
                        file_type: file_type.to_string(),
                    }))
                } else {
                    Err(skipped(id, SkipReason::NotAFileInput))
                }
            }
            ResolverTag::CoverLetterText => match &self.cover_letter {
                Some(text) => Ok(text.clone()),
                None => Err(skipped(id, SkipReason::NoCoverLetter)),
            },
            ResolverTag::NeedsHuman => Err(skipped(id, SkipReason::NeedsHuman)),
            ResolverTag::Skip => Err(skipped(id, SkipReason::ResolverSkip)),
        }
    }

    fn fill_combobox(
        &self,
        tree: &mut dyn ElementTree,
        input: NodeId,
        known: &[FieldOption],
        listbox: Option<NodeId>,
        value: &FillValue,
    ) -> Result<Applied, FieldIssue> {
        let candidate = value.as_text();
        let pre_match = find_option(&candidate, known);
        let typed = match pre_match {
            Some((idx, _)) => known[idx].text.clone(),
            None => candidate.clone(),
        };

        tree.dispatch(input, EventKind::Focus);
        tree.set_value(input, &typed);
        tree.dispatch(input, EventKind::Input);
        tree.settle(self.combobox_wait);

        let opened = open_options(&*tree, input, listbox);
        if !opened.is_empty() {
            let choices: Vec<FieldOption> = opened.iter().map(|(_, o)| o.clone()).collect();
            let (idx, rung) = find_option(&candidate, &choices)
                .or_else(|| find_option(&typed, &choices))
                .ok_or_else(|| not_found(&candidate, &choices))?;
            let (node, option) = &opened[idx];
            click_option(tree, *node);
            return Ok(Applied {
                value: option.text.clone(),
                method: FillMethod::TypeAndSelect,
                matched_option: Some(option.text.clone()),
                rung: Some(rung),
            });
        }

        // No list opened: the typed text stands, as long as it was a known
        // option or there were none to check against.
        if !known.is_empty() && pre_match.is_none() {
            return Err(not_found(&candidate, known));
        }
        tree.dispatch(input, EventKind::Change);
        tree.dispatch(input, EventKind::Blur);
        Ok(Applied {
            value: typed.clone(),
            method: FillMethod::TypeAndSelect,
            matched_option: pre_match.map(|_| typed),
            rung: pre_match.map(|(_, rung)| rung),
        })
    }
}

/// What a fill actually did.
struct Applied {
    value: String,
    method: FillMethod,
    matched_option: Option<String>,
    rung: Option<MatchRung>,
}

fn skipped(id: &str, reason: SkipReason) -> FieldOutcome {
    FieldOutcome::Skipped(SkippedField {
        id: id.to_string(),
        reason,
    })
}

fn not_found(candidate: &str, options: &[FieldOption]) -> FieldIssue {
    FieldIssue::OptionNotFound {
        candidate: candidate.to_string(),
        options: options.iter().map(|o| o.text.clone()).collect(),
    }
}

fn fill_toggle(tree: &mut dyn ElementTree, node: NodeId, value: &FillValue) -> Result<Applied, FieldIssue> {
    let desired = match value {
        FillValue::Bool(b) => *b,
        other => {
            let text = other.as_text();
            match boolean_class(&normalize(&text)) {
                Some(b) => b,
                None => {
                    // "I agree" against a checkbox labelled "I agree to the terms"
                    let label = option_label(&*tree, node);
                    let own_value = tree.attr(node, "value").unwrap_or_default().to_string();
                    if match_option(&text, &own_value, &label).is_match() {
                        true
                    } else {
                        return Err(FieldIssue::NotBoolean { candidate: text });
                    }
                }
            }
        }
    };

    let shown = if desired { "Yes" } else { "No" }.to_string();
    if tree.is_checked(node) == desired {
        return Ok(Applied {
            value: shown,
            method: FillMethod::AlreadySet,
            matched_option: None,
            rung: None,
        });
    }

    tree.set_checked(node, desired);
    tree.dispatch(node, EventKind::Click);
    tree.dispatch(node, EventKind::Change);
    Ok(Applied {
        value: shown,
        method: FillMethod::Toggle,
        matched_option: None,
        rung: None,
    })
}

fn member_options(tree: &dyn ElementTree, members: &[NodeId]) -> Vec<FieldOption> {
    members
        .iter()
        .map(|m| {
            let text = option_label(tree, *m);
            let value = tree
                .attr(*m, "value")
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            FieldOption::new(value, text)
        })
        .collect()
}

fn fill_radio_group(
    tree: &mut dyn ElementTree,
    members: &[NodeId],
    value: &FillValue,
) -> Result<Applied, FieldIssue> {
    let options = member_options(&*tree, members);
    let candidate = value.as_text();
    let (idx, rung) = find_option(&candidate, &options).ok_or_else(|| not_found(&candidate, &options))?;
    let node = members[idx];

    let method = if tree.is_checked(node) {
        FillMethod::AlreadySet
    } else {
        tree.set_checked(node, true);
        tree.dispatch(node, EventKind::Click);
        tree.dispatch(node, EventKind::Change);
        FillMethod::Toggle
    };
    Ok(Applied {
        value: options[idx].text.clone(),
        method,
        matched_option: Some(options[idx].text.clone()),
        rung: Some(rung),
    })
}

fn fill_checkbox_group(
    tree: &mut dyn ElementTree,
    members: &[NodeId],
    value: &FillValue,
) -> Result<Applied, FieldIssue> {
    let options = member_options(&*tree, members);
    let mut chosen: Vec<String> = Vec::new();
    let mut best_rung: Option<MatchRung> = None;
    let mut missing: Option<String> = None;

    for candidate in value.candidates() {
        let Some((idx, rung)) = find_option(&candidate, &options) else {
            missing.get_or_insert(candidate);
            continue;
        };
        let node = members[idx];
        if !tree.is_checked(node) {
            tree.set_checked(node, true);
            tree.dispatch(node, EventKind::Click);
            tree.dispatch(node, EventKind::Change);
        }
        chosen.push(options[idx].text.clone());
        best_rung = Some(best_rung.map_or(rung, |r| r.max(rung)));
    }

    if chosen.is_empty() {
        let candidate = missing.unwrap_or_else(|| value.as_text());
        return Err(not_found(&candidate, &options));
    }
    Ok(Applied {
        value: chosen.join(", "),
        method: FillMethod::Toggle,
        matched_option: Some(chosen.join(", ")),
        rung: best_rung,
    })
}

fn fill_select(tree: &mut dyn ElementTree, node: NodeId, value: &FillValue) -> Result<Applied, FieldIssue> {
    let options = select_options(&*tree, node, usize::MAX);
    let candidate = value.as_text();
    let (idx, rung) = find_option(&candidate, &options).ok_or_else(|| not_found(&candidate, &options))?;
    let option = &options[idx];

    tree.set_value(node, &option.value);
    tree.dispatch(node, EventKind::Change);
    Ok(Applied {
        value: option.value.clone(),
        method: FillMethod::SelectValue,
        matched_option: Some(option.text.clone()),
        rung: Some(rung),
    })
}

fn fill_custom_select(
    tree: &mut dyn ElementTree,
    input: NodeId,
    options: &[FieldOption],
    backing: Option<NodeId>,
    value: &FillValue,
) -> Result<Applied, FieldIssue> {
    let candidate = value.as_text();
    if options.is_empty() {
        return Ok(fill_text(tree, input, &candidate));
    }
    let (idx, rung) = find_option(&candidate, options).ok_or_else(|| not_found(&candidate, options))?;
    let option = &options[idx];

    if let Some(select) = backing {
        tree.set_value(select, &option.value);
        tree.dispatch(select, EventKind::Change);
    }
    tree.set_value(input, &option.text);
    tree.dispatch(input, EventKind::Input);
    tree.dispatch(input, EventKind::Change);
    Ok(Applied {
        value: option.text.clone(),
        method: FillMethod::SelectValue,
        matched_option: Some(option.text.clone()),
        rung: Some(rung),
    })
}

fn fill_button_group(
    tree: &mut dyn ElementTree,
    buttons: &[NodeId],
    value: &FillValue,
) -> Result<Applied, FieldIssue> {
    let options: Vec<FieldOption> = buttons
        .iter()
        .map(|b| {
            let text = tree.text_content(*b);
            let value = tree
                .attr(*b, "data-value")
                .or_else(|| tree.attr(*b, "value"))
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            FieldOption::new(value, text)
        })
        .collect();
    let candidate = value.as_text();
    let (idx, rung) = find_option(&candidate, &options).ok_or_else(|| not_found(&candidate, &options))?;
    let button = buttons[idx];

    let method = if is_pressed(&*tree, button) {
        FillMethod::AlreadySet
    } else {
        tree.dispatch(button, EventKind::Focus);
        tree.dispatch(button, EventKind::PointerDown);
        tree.dispatch(button, EventKind::PointerUp);
        tree.dispatch(button, EventKind::Click);
        FillMethod::ButtonClick
    };
    Ok(Applied {
        value: options[idx].text.clone(),
        method,
        matched_option: Some(options[idx].text.clone()),
        rung: Some(rung),
    })
}

fn fill_text(tree: &mut dyn ElementTree, node: NodeId, text: &str) -> Applied {
    tree.set_value(node, text);
    tree.dispatch(node, EventKind::Input);
    tree.dispatch(node, EventKind::Change);
    Applied {
        value: text.to_string(),
        method: FillMethod::TextInput,
        matched_option: None,
        rung: None,
    }
}

/// Visible `role=option` entries currently shown for a combobox.
fn open_options(
    tree: &dyn ElementTree,
    input: NodeId,
    listbox: Option<NodeId>,
) -> Vec<(NodeId, FieldOption)> {
    let scope = tree
        .attr(input, "aria-controls")
        .or_else(|| tree.attr(input, "aria-owns"))
        .and_then(|ids| ids.split_whitespace().find_map(|id| tree.element_by_id(id)))
        .or(listbox);

    let candidates = match scope {
        Some(scope) => tree.descendants(scope),
        None => tree.descendants(tree.root()),
    };
    let nodes: Vec<NodeId> = candidates
        .into_iter()
        .filter(|n| tree.attr(*n, "role") == Some("option") && tree.is_visible(*n))
        .collect();

    if nodes.is_empty() {
        // Listboxes that render plain list items.
        if let Some(scope) = scope.filter(|s| tree.is_visible(*s)) {
            let items: Vec<NodeId> = tree
                .descendants(scope)
                .into_iter()
                .filter(|n| tree.tag(*n) == Some("li") && tree.is_visible(*n))
                .collect();
            let harvested = harvest_options(tree, scope, usize::MAX);
            if items.len() == harvested.len() {
                return items.into_iter().zip(harvested).collect();
            }
        }
        return Vec::new();
    }

    nodes
        .into_iter()
        .map(|n| {
            let text = tree.text_content(n);
            let value = tree
                .attr(n, "data-value")
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            (n, FieldOption::new(value, text))
        })
        .collect()
}

fn click_option(tree: &mut dyn ElementTree, node: NodeId) {
    tree.dispatch(node, EventKind::PointerDown);
    tree.dispatch(node, EventKind::MouseDown);
    tree.dispatch(node, EventKind::PointerUp);
    tree.dispatch(node, EventKind::MouseUp);
    tree.dispatch(node, EventKind::Click);
}
