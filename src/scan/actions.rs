use crate::dom::{ElementTree, NodeId};
use crate::scan::field_model::{ActionDescriptor, ActionKind};

/// Link text or href fragments that mark a link as part of the application flow.
const LINK_KEYWORDS: &[&str] = &[
    "apply",
    "submit",
    "next",
    "continue",
    "review",
    "save",
    "upload",
    "attach",
    "resume",
    "cover letter",
];

/// Visible clickable controls, skipping anything inside a detected button
/// group (those are reported as fields).
pub fn scan_actions(tree: &dyn ElementTree, button_groups: &[NodeId]) -> Vec<ActionDescriptor> {
    let inside_group = |node: NodeId| {
        tree.ancestors(node)
            .iter()
            .any(|a| button_groups.contains(a))
    };

    let mut actions = Vec::new();
    for node in tree.descendants(tree.root()) {
        if !tree.is_visible(node) || inside_group(node) {
            continue;
        }
        let Some(action) = describe_action(tree, node) else {
            continue;
        };
        actions.push(action);
    }
    actions
}

fn describe_action(tree: &dyn ElementTree, node: NodeId) -> Option<ActionDescriptor> {
    let tag = tree.tag(node)?;
    let (kind, text, href) = match tag {
        "button" => {
            let kind = if tree.attr(node, "type") == Some("submit") {
                ActionKind::Submit
            } else {
                ActionKind::Button
            };
            (kind, visible_text(tree, node), None)
        }
        "input" => {
            let kind = match tree.attr(node, "type").map(str::to_lowercase).as_deref() {
                Some("submit") => ActionKind::Submit,
                Some("button") => ActionKind::Button,
                _ => return None,
            };
            let text = tree
                .attr(node, "value")
                .or_else(|| tree.attr(node, "aria-label"))
                .unwrap_or_default()
                .trim()
                .to_string();
            (kind, text, None)
        }
        "a" => {
            let href = tree.attr(node, "href")?.to_string();
            let text = visible_text(tree, node);
            let haystack = format!("{} {}", text.to_lowercase(), href.to_lowercase());
            if !LINK_KEYWORDS.iter().any(|k| haystack.contains(k)) {
                return None;
            }
            (ActionKind::Link, text, Some(href))
        }
        _ if tree.attr(node, "role") == Some("button") => {
            (ActionKind::RoleButton, visible_text(tree, node), None)
        }
        _ => return None,
    };

    if text.is_empty() {
        return None;
    }
    Some(ActionDescriptor {
        kind,
        text,
        href,
        id: tree.attr(node, "id").map(str::to_string),
    })
}

fn visible_text(tree: &dyn ElementTree, node: NodeId) -> String {
    let text = tree.text_content(node);
    if text.is_empty() {
        tree.attr(node, "aria-label").unwrap_or_default().trim().to_string()
    } else {
        text
    }
}
