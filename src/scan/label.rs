use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{ElementTree, NodeId, collapse_whitespace};
use crate::scan::field_model::NO_LABEL;

const HINT_CLASSES: &[&str] = &[
    "hint",
    "help",
    "description",
    "instruction",
    "subtitle",
    "sub-label",
    "note",
];

const HINT_ID_SUFFIXES: &[&str] = &[
    "-hint",
    "-help",
    "_hint",
    "_help",
    "-description",
    "-instructions",
];

static REQUIRED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*required\s*\)").expect("valid regex"));

const MAX_HINT_FRAGMENT: usize = 300;
const HINT_SEPARATOR: &str = " | ";

// ============================================================================
// Labels
// ============================================================================

/// Label text exactly as found, before markers are stripped.
///
/// Priority: `label[for]`, enclosing `<label>`, `aria-label`,
/// `aria-labelledby`, `placeholder`, `name`.
pub fn raw_label(tree: &dyn ElementTree, node: NodeId) -> Option<String> {
    if let Some(id) = tree.attr(node, "id").filter(|id| !id.is_empty()) {
        let explicit = tree
            .elements_by_tag(&["label"])
            .into_iter()
            .filter(|l| tree.attr(*l, "for") == Some(id))
            .map(|l| tree.label_text(l))
            .find(|t| !t.is_empty());
        if explicit.is_some() {
            return explicit;
        }
    }

    if let Some(label) = tree
        .ancestors(node)
        .into_iter()
        .find(|a| tree.tag(*a) == Some("label"))
    {
        let text = tree.label_text(label);
        if !text.is_empty() {
            return Some(text);
        }
    }

    if let Some(aria) = non_empty_attr(tree, node, "aria-label") {
        return Some(aria);
    }

    if let Some(text) = labelledby_text(tree, node) {
        return Some(text);
    }

    non_empty_attr(tree, node, "placeholder").or_else(|| non_empty_attr(tree, node, "name"))
}

/// Resolved label with required markers removed, or the no-label sentinel.
pub fn resolve_label(tree: &dyn ElementTree, node: NodeId) -> String {
    raw_label(tree, node)
        .map(|raw| clean_label(&raw))
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| NO_LABEL.to_string())
}

pub fn clean_label(raw: &str) -> String {
    let text = raw.replace('*', " ");
    collapse_whitespace(&REQUIRED_MARKER.replace_all(&text, " "))
}

/// Text of the elements named by `aria-labelledby`, joined with spaces.
pub fn labelledby_text(tree: &dyn ElementTree, node: NodeId) -> Option<String> {
    let ids = tree.attr(node, "aria-labelledby")?;
    let text = ids
        .split_whitespace()
        .filter_map(|id| tree.element_by_id(id))
        .map(|n| tree.label_text(n))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Label for a single radio or checkbox inside a group.
pub fn option_label(tree: &dyn ElementTree, node: NodeId) -> String {
    if let Some(raw) = raw_label_without_fallbacks(tree, node) {
        let cleaned = clean_label(&raw);
        if !cleaned.is_empty() {
            return cleaned;
        }
    }
    if let Some(next) = tree.next_siblings(node).first()
        && matches!(tree.tag(*next), Some("span") | Some("label"))
    {
        let text = tree.label_text(*next);
        if !text.is_empty() {
            return text;
        }
    }
    tree.attr(node, "value").unwrap_or("on").to_string()
}

/// Like [`raw_label`] but without the placeholder/name fallbacks, which are
/// meaningless for individual options.
fn raw_label_without_fallbacks(tree: &dyn ElementTree, node: NodeId) -> Option<String> {
    if let Some(id) = tree.attr(node, "id").filter(|id| !id.is_empty()) {
        let explicit = tree
            .elements_by_tag(&["label"])
            .into_iter()
            .filter(|l| tree.attr(*l, "for") == Some(id))
            .map(|l| tree.label_text(l))
            .find(|t| !t.is_empty());
        if explicit.is_some() {
            return explicit;
        }
    }
    tree.ancestors(node)
        .into_iter()
        .find(|a| tree.tag(*a) == Some("label"))
        .map(|l| tree.label_text(l))
        .filter(|t| !t.is_empty())
        .or_else(|| non_empty_attr(tree, node, "aria-label"))
}

/// Group question text for a set of radios or checkboxes.
pub fn group_label(tree: &dyn ElementTree, members: &[NodeId]) -> String {
    let Some(first) = members.first().copied() else {
        return NO_LABEL.to_string();
    };

    if let Some(fieldset) = tree
        .ancestors(first)
        .into_iter()
        .find(|a| tree.tag(*a) == Some("fieldset"))
        && let Some(legend) = tree
            .children(fieldset)
            .into_iter()
            .find(|c| tree.tag(*c) == Some("legend"))
    {
        let text = clean_label(&tree.label_text(legend));
        if !text.is_empty() {
            return text;
        }
    }

    let group = tree.ancestors(first).into_iter().find(|a| {
        matches!(tree.attr(*a, "role"), Some("radiogroup") | Some("group"))
    });
    if let Some(group) = group {
        let text = non_empty_attr(tree, group, "aria-label").or_else(|| labelledby_text(tree, group));
        if let Some(text) = text {
            let text = clean_label(&text);
            if !text.is_empty() {
                return text;
            }
        }
    }

    resolve_label(tree, first)
}

/// Whether the control is required by attribute or by label marker.
pub fn is_required(tree: &dyn ElementTree, node: NodeId, raw_label: Option<&str>) -> bool {
    if tree.attr(node, "required").is_some() {
        return true;
    }
    if tree
        .attr(node, "aria-required")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return true;
    }
    raw_label.is_some_and(|l| l.contains('*') || l.to_lowercase().contains("required"))
}

// ============================================================================
// Hints
// ============================================================================

/// Supplementary help text around a control, deduplicated and joined.
pub fn resolve_hint(tree: &dyn ElementTree, node: NodeId, label: &str) -> String {
    let mut fragments: Vec<String> = Vec::new();
    let label_norm = label.to_lowercase();
    let mut push = |text: String| {
        let text = collapse_whitespace(&text);
        if text.is_empty() || text.chars().count() > MAX_HINT_FRAGMENT {
            return;
        }
        let lower = text.to_lowercase();
        if lower == label_norm || fragments.iter().any(|f| f.to_lowercase() == lower) {
            return;
        }
        fragments.push(text);
    };

    if let Some(ids) = tree.attr(node, "aria-describedby") {
        for id in ids.split_whitespace() {
            if let Some(target) = tree.element_by_id(id) {
                push(tree.text_content(target));
            }
        }
    }

    if let Some(id) = tree.attr(node, "id").filter(|id| !id.is_empty()) {
        for suffix in HINT_ID_SUFFIXES {
            if let Some(target) = tree.element_by_id(&format!("{id}{suffix}")) {
                push(tree.text_content(target));
            }
        }
    }

    // Siblings up to the next control belong to this one.
    for sibling in tree
        .next_siblings(node)
        .into_iter()
        .take_while(|s| !tree.is_form_control(*s) && !tree.contains_form_control(*s))
    {
        if is_hint_like(tree, sibling) {
            push(tree.text_content(sibling));
        }
    }

    let parent = tree.parent(node).filter(|p| tree.tag(*p).is_some());
    if let Some(parent) = parent {
        for sibling in tree
            .next_siblings(parent)
            .into_iter()
            .take_while(|s| !tree.is_form_control(*s) && !tree.contains_form_control(*s))
        {
            if is_hint_like(tree, sibling) {
                push(tree.text_content(sibling));
            }
        }

        let grandparent = tree.parent(parent).filter(|g| tree.tag(*g).is_some());
        for scope in [Some(parent), grandparent]
            .into_iter()
            .flatten()
            .filter(|s| owns_only(tree, *s, node))
        {
            for candidate in tree.descendants(scope) {
                if tree.has_class_fragment(candidate, HINT_CLASSES)
                    && !tree.contains_form_control(candidate)
                    && !tree.is_form_control(candidate)
                {
                    push(tree.text_content(candidate));
                }
            }
        }
    }

    fragments.join(HINT_SEPARATOR)
}

/// Whether `node` is the only form control inside `scope`.
fn owns_only(tree: &dyn ElementTree, scope: NodeId, node: NodeId) -> bool {
    tree.descendants(scope)
        .into_iter()
        .filter(|n| tree.is_form_control(*n))
        .all(|n| n == node)
}

fn is_hint_like(tree: &dyn ElementTree, node: NodeId) -> bool {
    if tree.is_form_control(node) || tree.contains_form_control(node) {
        return false;
    }
    tree.tag(node) == Some("small") || tree.has_class_fragment(node, HINT_CLASSES)
}

fn non_empty_attr(tree: &dyn ElementTree, node: NodeId, name: &str) -> Option<String> {
    tree.attr(node, name)
        .map(collapse_whitespace)
        .filter(|v| !v.is_empty())
}
