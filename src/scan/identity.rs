use std::collections::HashSet;

use crate::dom::{ElementTree, NodeId};
use crate::scan::field_model::NO_LABEL;

const MAX_SLUG_LEN: usize = 50;

/// Lowercase, non-alphanumerics collapsed to single underscores.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch);
        } else {
            pending_sep = true;
        }
    }
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('_') {
            slug.pop();
        }
    }
    slug
}

pub fn text_fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stable id for a control.
///
/// An existing `id` attribute is kept. Otherwise a slug is derived from the
/// label, then `name`, then `placeholder`, made unique against `taken`, and
/// written back onto the element so later scans and fills see the same id.
pub fn assign_field_id(
    tree: &mut dyn ElementTree,
    node: NodeId,
    label: &str,
    taken: &mut HashSet<String>,
) -> String {
    if let Some(existing) = tree.attr(node, "id").filter(|id| !id.is_empty()) {
        let existing = existing.to_string();
        taken.insert(existing.clone());
        return existing;
    }

    let base = derive_base(&*tree, node, label);
    let mut id = base.clone();
    let mut suffix = 2;
    while taken.contains(&id) || tree.element_by_id(&id).is_some_and(|other| other != node) {
        id = format!("{base}_{suffix}");
        suffix += 1;
    }

    tree.set_attr(node, "id", &id);
    taken.insert(id.clone());
    id
}

fn derive_base(tree: &dyn ElementTree, node: NodeId, label: &str) -> String {
    let candidates = [
        (label != NO_LABEL).then(|| label.to_string()),
        tree.attr(node, "name").map(str::to_string),
        tree.attr(node, "placeholder").map(str::to_string),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|c| slugify(&c))
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| {
            let tag = tree.tag(node).unwrap_or("node");
            let print = text_fingerprint(&format!("{tag}:{label}:{}", node.0));
            format!("field_{}", &print[..10])
        })
}
