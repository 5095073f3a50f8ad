use crate::dom::{ElementTree, NodeId};
use crate::scan::field_model::{FieldOption, OptionSource};
use crate::scan::heuristics::{BooleanQuestionClassifier, yes_no_options};

pub const MAX_OPTIONS: usize = 20;

const ANCESTOR_SELECT_DEPTH: usize = 3;
const WRAPPER_DEPTH: usize = 5;
const WRAPPER_CLASSES: &[&str] = &["field", "form-field", "select-wrapper", "custom-select", "dropdown"];

/// Options of a native `<select>`, verbatim, capped at `max`.
pub fn select_options(tree: &dyn ElementTree, select: NodeId, max: usize) -> Vec<FieldOption> {
    tree.descendants(select)
        .into_iter()
        .filter(|n| tree.tag(*n) == Some("option"))
        .take(max)
        .map(|o| FieldOption::new(tree.value(o), tree.text_content(o)))
        .collect()
}

/// Whether a text input behaves like an ARIA combobox.
pub fn is_combobox(tree: &dyn ElementTree, node: NodeId) -> bool {
    tree.attr(node, "role") == Some("combobox")
        || tree
            .attr(node, "aria-autocomplete")
            .is_some_and(|v| !v.eq_ignore_ascii_case("none"))
        || tree.attr(node, "aria-haspopup") == Some("listbox")
}

/// Recover a bounded option set for a text-like control.
///
/// Structural sources are tried first and the yes/no heuristic only runs
/// when none of them produce options.
pub fn infer_options(
    tree: &dyn ElementTree,
    node: NodeId,
    field_id: &str,
    question: &str,
    classifier: &dyn BooleanQuestionClassifier,
    max: usize,
) -> Option<(Vec<FieldOption>, OptionSource)> {
    if let Some(select) = associated_select(tree, node, field_id) {
        let options = select_options(tree, select, max);
        if !options.is_empty() {
            return Some((options, OptionSource::NativeSelect(select)));
        }
    }

    if let Some(select) = ancestor_hidden_select(tree, node) {
        let options = select_options(tree, select, max);
        if !options.is_empty() {
            return Some((options, OptionSource::NativeSelect(select)));
        }
    }

    if let Some(listbox) = controlled_listbox(tree, node) {
        let options = harvest_options(tree, listbox, max);
        if !options.is_empty() {
            return Some((options, OptionSource::Listbox(listbox)));
        }
    }

    if let Some(wrapper) = widget_wrapper(tree, node) {
        let options = wrapper_options(tree, wrapper, node, max);
        if !options.is_empty() {
            return Some((options, OptionSource::Wrapper(wrapper)));
        }
    }

    classifier
        .classify(question)
        .map(|_| (yes_no_options(), OptionSource::YesNoHeuristic))
}

/// A `<select>` tied to the input by name, id convention, or `data-for`.
fn associated_select(tree: &dyn ElementTree, node: NodeId, field_id: &str) -> Option<NodeId> {
    let name = tree.attr(node, "name").filter(|n| !n.is_empty());
    let select_id = format!("{field_id}_select");

    tree.elements_by_tag(&["select"]).into_iter().find(|s| {
        if *s == node {
            return false;
        }
        let s_name = tree.attr(*s, "name");
        let s_id = tree.attr(*s, "id");
        let data_for = tree.attr(*s, "data-for");

        (name.is_some() && s_name == name)
            || (!field_id.is_empty() && s_id == Some(select_id.as_str()))
            || (!field_id.is_empty() && data_for == Some(field_id))
            || (name.is_some() && data_for == name)
            || (name.is_some() && s_id == name)
    })
}

/// A hidden `<select>` within the nearest few ancestors. A visible one is a
/// field of its own and does not stop the search.
fn ancestor_hidden_select(tree: &dyn ElementTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .into_iter()
        .take(ANCESTOR_SELECT_DEPTH)
        .find_map(|scope| {
            tree.descendants(scope)
                .into_iter()
                .find(|n| tree.tag(*n) == Some("select") && !tree.is_visible(*n))
        })
}

fn controlled_listbox(tree: &dyn ElementTree, node: NodeId) -> Option<NodeId> {
    ["aria-controls", "aria-owns"]
        .iter()
        .filter_map(|attr| tree.attr(node, attr))
        .flat_map(|ids| ids.split_whitespace())
        .find_map(|id| tree.element_by_id(id))
}

/// Nearest widget-like ancestor that wraps this control alone. The walk stops
/// at the first ancestor holding another data-entry control.
fn widget_wrapper(tree: &dyn ElementTree, node: NodeId) -> Option<NodeId> {
    for ancestor in tree.ancestors(node).into_iter().take(WRAPPER_DEPTH) {
        if holds_other_control(tree, ancestor, node) {
            return None;
        }
        if is_wrapper(tree, ancestor) {
            return Some(ancestor);
        }
    }
    None
}

fn is_wrapper(tree: &dyn ElementTree, node: NodeId) -> bool {
    tree.attr(node, "data-field-type").is_some()
        || tree.attr(node, "class").is_some_and(|class| {
            class
                .split_whitespace()
                .any(|token| WRAPPER_CLASSES.iter().any(|w| token.eq_ignore_ascii_case(w)))
        })
}

/// Toggle buttons and hidden inputs belong to the widget itself.
fn holds_other_control(tree: &dyn ElementTree, scope: NodeId, node: NodeId) -> bool {
    tree.descendants(scope).into_iter().any(|n| {
        n != node
            && match tree.tag(n) {
                Some("select") | Some("textarea") => true,
                Some("input") => !tree
                    .attr(n, "type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
                _ => false,
            }
    })
}

/// Nodes listed in some other control's `aria-controls` / `aria-owns`.
fn claimed_popups(tree: &dyn ElementTree, node: NodeId) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|n| *n != node)
        .flat_map(|n| {
            ["aria-controls", "aria-owns"]
                .iter()
                .filter_map(|attr| tree.attr(n, attr))
                .flat_map(|ids| ids.split_whitespace())
                .filter_map(|id| tree.element_by_id(id))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn wrapper_options(
    tree: &dyn ElementTree,
    wrapper: NodeId,
    node: NodeId,
    max: usize,
) -> Vec<FieldOption> {
    let claimed = claimed_popups(tree, node);
    let items = option_items(tree, wrapper)
        .into_iter()
        .filter(|item| {
            !claimed.contains(item)
                && !tree.ancestors(*item).iter().any(|a| claimed.contains(a))
        })
        .collect();
    to_options(tree, items, max)
}

/// Option-like descendants of a container: `role=option`, then `<li>`, then
/// anything with an option class.
pub fn harvest_options(tree: &dyn ElementTree, container: NodeId, max: usize) -> Vec<FieldOption> {
    to_options(tree, option_items(tree, container), max)
}

fn option_items(tree: &dyn ElementTree, container: NodeId) -> Vec<NodeId> {
    let descendants = tree.descendants(container);
    let by_role: Vec<NodeId> = descendants
        .iter()
        .copied()
        .filter(|n| tree.attr(*n, "role") == Some("option"))
        .collect();
    if !by_role.is_empty() {
        return by_role;
    }
    let lis: Vec<NodeId> = descendants
        .iter()
        .copied()
        .filter(|n| tree.tag(*n) == Some("li"))
        .collect();
    if !lis.is_empty() {
        return lis;
    }
    descendants
        .iter()
        .copied()
        .filter(|n| tree.has_class_fragment(*n, &["option"]))
        .collect()
}

fn to_options(tree: &dyn ElementTree, items: Vec<NodeId>, max: usize) -> Vec<FieldOption> {
    items
        .into_iter()
        .filter_map(|item| {
            let text = tree.text_content(item);
            let value = tree
                .attr(item, "data-value")
                .or_else(|| tree.attr(item, "value"))
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            (!value.is_empty() || !text.is_empty()).then(|| FieldOption::new(value, text))
        })
        .take(max)
        .collect()
}
