use std::time::Duration;

use form_autofill::dom::{AttachedFile, Document, ElementTree, EventKind, NodeId};
use form_autofill::fill::{FieldOutcome, FillValue, Filler};
use form_autofill::scan::{ActionKind, FieldKind, NO_LABEL, Scanner};
use serde_json::json;

mod common;
use common::{checkbox, checkbox_group, doc, field, ids, node, option_texts, radio_group, select, text_input};

// ============================================================================
// Discovery and grouping
// ============================================================================

#[test]
fn standalone_fields_plus_groups_count_n_plus_two() {
    let mut d = doc(json!([
        text_input("first_name", "First name"),
        text_input("last_name", "Last name"),
        select("country", "Country", &[("us", "United States"), ("ca", "Canada")]),
        { "tag": "textarea", "attrs": { "id": "why", "aria-label": "Why us?" } },
        radio_group("work_mode", "Preferred work mode", &["Remote", "Hybrid", "Onsite"]),
        checkbox_group("langs", "Languages", &["Rust", "Go"]),
        { "tag": "input", "attrs": { "type": "hidden", "name": "token", "value": "abc" } },
        { "tag": "input", "attrs": { "type": "submit", "value": "Apply" } },
        { "tag": "input", "attrs": { "id": "secret", "style": "display:none" } }
    ]));

    let scan = Scanner::new().scan(&mut d);
    assert_eq!(scan.fields.len(), 4 + 2);

    let mode = field(&scan, "work_mode");
    assert_eq!(mode.kind, FieldKind::RadioGroup);
    assert_eq!(mode.label, "Preferred work mode");
    assert_eq!(option_texts(mode), vec!["Remote", "Hybrid", "Onsite"]);

    let langs = field(&scan, "langs");
    assert_eq!(langs.kind, FieldKind::CheckboxGroup);
    assert_eq!(langs.options().len(), 2);
}

#[test]
fn lone_checkbox_is_a_boolean_field() {
    let mut d = doc(json!([checkbox("agree_terms", "I agree to the terms *")]));
    let scan = Scanner::new().scan(&mut d);

    assert_eq!(scan.fields.len(), 1);
    let agree = field(&scan, "agree_terms");
    assert_eq!(agree.kind, FieldKind::Checkbox);
    assert_eq!(agree.label, "I agree to the terms");
    assert!(agree.required, "Asterisk marks the field required");
    assert_eq!(agree.current_value.as_deref(), Some("unchecked"));
}

#[test]
fn select_reports_options_and_selected_text() {
    let mut d = doc(json!([
        { "tag": "label", "attrs": { "for": "state" }, "text": "State" },
        { "tag": "select", "attrs": { "id": "state", "required": "" }, "children": [
            { "tag": "option", "attrs": { "value": "ca" }, "text": "California" },
            { "tag": "option", "attrs": { "value": "ny", "selected": "" }, "text": "New York" }
        ]}
    ]));
    let scan = Scanner::new().scan(&mut d);
    let state = field(&scan, "state");
    assert_eq!(state.kind, FieldKind::Select);
    assert!(state.required);
    assert_eq!(state.current_value.as_deref(), Some("New York"));
}

#[test]
fn select_options_are_capped_at_twenty() {
    let options: Vec<_> = (0..30)
        .map(|i| json!({ "tag": "option", "attrs": { "value": format!("v{i}") }, "text": format!("Option {i}") }))
        .collect();
    let mut d = doc(json!([
        { "tag": "select", "attrs": { "id": "many", "aria-label": "Many" }, "children": options }
    ]));
    let scan = Scanner::new().scan(&mut d);
    assert_eq!(field(&scan, "many").options().len(), 20);
}

// ============================================================================
// Labels and ids
// ============================================================================

#[test]
fn label_priority_chain() {
    let mut d = doc(json!([
        { "tag": "label", "children": [ "Enclosing label", { "tag": "input", "attrs": { "id": "a" } } ] },
        { "tag": "input", "attrs": { "id": "b", "aria-label": "Aria label", "placeholder": "Placeholder" } },
        { "tag": "span", "attrs": { "id": "lb" }, "text": "Labelled by" },
        { "tag": "input", "attrs": { "id": "c", "aria-labelledby": "lb" } },
        { "tag": "input", "attrs": { "id": "d", "placeholder": "Placeholder only" } },
        { "tag": "input", "attrs": { "id": "e", "name": "just_a_name" } },
        { "tag": "input", "attrs": { "id": "f" } }
    ]));
    let scan = Scanner::new().scan(&mut d);
    assert_eq!(field(&scan, "a").label, "Enclosing label");
    assert_eq!(field(&scan, "b").label, "Aria label");
    assert_eq!(field(&scan, "c").label, "Labelled by");
    assert_eq!(field(&scan, "d").label, "Placeholder only");
    assert_eq!(field(&scan, "e").label, "just_a_name");
    assert_eq!(field(&scan, "f").label, NO_LABEL);
}

#[test]
fn generated_ids_are_written_back_and_stable() {
    let mut d = doc(json!([
        { "tag": "label", "children": [ "Email address", { "tag": "input", "attrs": { "type": "email" } } ] },
        { "tag": "label", "children": [ "Email address", { "tag": "input", "attrs": { "type": "email" } } ] },
        { "tag": "input", "attrs": { "name": "phone" } },
        { "tag": "input", "attrs": { "type": "text" } }
    ]));
    let scanner = Scanner::new();
    let first = scanner.scan(&mut d);
    let second = scanner.scan(&mut d);

    assert_eq!(ids(&first.fields), ids(&second.fields));
    assert_eq!(ids(&first.fields)[..3], ["email_address", "email_address_2", "phone"]);
    assert!(first.fields[3].id.starts_with("field_"));
    assert!(first.fields.iter().all(|f| !f.id.is_empty()));
    assert!(d.element_by_id("email_address_2").is_some());
}

#[test]
fn group_id_does_not_collide_with_a_generated_slug() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "type": "text", "aria-label": "Gender" } },
        radio_group("gender", "Gender identity", &["Female", "Male"])
    ]));
    let scanner = Scanner::new();
    let scan = scanner.scan(&mut d);
    assert_eq!(ids(&scan.fields), vec!["gender", "gender_2"]);
    assert_eq!(field(&scan, "gender").kind, FieldKind::Text);
    let group = field(&scan, "gender_2");
    assert_eq!(group.kind, FieldKind::RadioGroup);
    assert_eq!(group.name.as_deref(), Some("gender"));

    let rescan = scanner.scan(&mut d);
    assert_eq!(ids(&rescan.fields), ids(&scan.fields));

    let filler = Filler::default();
    let text = filler.fill_field(&mut d, "gender", scan.field("gender"), &FillValue::Text("Prefer to self-describe".into()));
    assert!(matches!(text, FieldOutcome::Filled(_)), "got {text:?}");
    let radio = filler.fill_field(&mut d, "gender_2", scan.field("gender_2"), &FillValue::Text("Female".into()));
    assert!(matches!(radio, FieldOutcome::Filled(_)), "got {radio:?}");

    assert_eq!(d.value(node(&d, "gender")), "Prefer to self-describe");
    let female = d
        .elements_by_tag(&["input"])
        .into_iter()
        .find(|n| d.attr(*n, "value") == Some("Female"))
        .unwrap();
    assert!(d.is_checked(female));
}

#[test]
fn email_and_number_inputs_flatten_to_text() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "id": "mail", "type": "email", "aria-label": "Email" } },
        { "tag": "input", "attrs": { "id": "years", "type": "number", "aria-label": "Years of experience" } }
    ]));
    let scan = Scanner::new().scan(&mut d);
    assert_eq!(field(&scan, "mail").kind, FieldKind::Text);
    assert_eq!(field(&scan, "years").kind, FieldKind::Text);
}

// ============================================================================
// Hints
// ============================================================================

#[test]
fn hints_collect_from_describedby_suffix_and_siblings() {
    let mut d = doc(json!([
        { "tag": "div", "children": [
            { "tag": "label", "attrs": { "for": "salary" }, "text": "Salary expectation" },
            { "tag": "input", "attrs": { "id": "salary", "aria-describedby": "salary-note" } },
            { "tag": "small", "text": "Annual, in USD" }
        ]},
        { "tag": "p", "attrs": { "id": "salary-note" }, "text": "Optional" },
        { "tag": "p", "attrs": { "id": "salary-help" }, "text": "Optional" }
    ]));
    let scan = Scanner::new().scan(&mut d);
    assert_eq!(field(&scan, "salary").hint, "Optional | Annual, in USD");
}

#[test]
fn hint_of_one_field_does_not_leak_into_the_previous_one() {
    let mut d = doc(json!([
        { "tag": "div", "children": [
            { "tag": "input", "attrs": { "id": "a", "aria-label": "A" } },
            { "tag": "input", "attrs": { "id": "b", "aria-label": "B" } },
            { "tag": "span", "attrs": { "class": "help-text" }, "text": "About B" }
        ]}
    ]));
    let scan = Scanner::new().scan(&mut d);
    assert_eq!(field(&scan, "a").hint, "");
    assert_eq!(field(&scan, "b").hint, "About B");
}

// ============================================================================
// Button groups and actions
// ============================================================================

#[test]
fn button_group_becomes_a_field_and_not_an_action() {
    let mut d = doc(json!([
        { "tag": "p", "text": "Are you authorized to work in the US?" },
        { "tag": "div", "attrs": { "class": "btn-group", "id": "authorized" }, "children": [
            { "tag": "button", "attrs": { "data-value": "yes" }, "text": "Yes" },
            { "tag": "button", "attrs": { "data-value": "no", "aria-pressed": "true" }, "text": "No" }
        ]},
        { "tag": "button", "attrs": { "type": "submit" }, "text": "Submit application" },
        { "tag": "a", "attrs": { "href": "/jobs/1/apply" }, "text": "Apply now" },
        { "tag": "a", "attrs": { "href": "/about" }, "text": "About us" }
    ]));
    let scan = Scanner::new().scan(&mut d);

    let group = field(&scan, "authorized");
    assert_eq!(group.kind, FieldKind::ButtonGroup);
    assert_eq!(group.label, "Are you authorized to work in the US?");
    assert_eq!(group.current_value.as_deref(), Some("No"));
    assert_eq!(group.options()[0].value, "yes");

    let kinds: Vec<ActionKind> = scan.actions.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ActionKind::Submit, ActionKind::Link]);
    assert_eq!(scan.actions[1].href.as_deref(), Some("/jobs/1/apply"));
}

// ============================================================================
// Exclusion
// ============================================================================

#[test]
fn scan_excluding_returns_only_new_fields() {
    let mut d = doc(json!([
        text_input("first_name", "First name"),
        text_input("last_name", "Last name")
    ]));
    let scanner = Scanner::new();
    let known = ids(&scanner.scan_fields(&mut d)).into_iter().collect();

    let root = d.root();
    let extra = d.create_element(root, "input", &[("aria-label", "Middle name")]);
    let fresh = scanner.scan_excluding(&mut d, &known);

    assert_eq!(ids(&fresh), vec!["middle_name"]);
    assert_eq!(d.attr(extra, "id"), Some("middle_name"));
    assert_eq!(node(&d, "middle_name"), extra);
}

// ============================================================================
// Per-field failures
// ============================================================================

/// Delegates to a [`Document`] but reports no tag for one control, the way a
/// detached node looks to a live bridge.
struct DetachedControl<'a> {
    inner: &'a mut Document,
    detached: NodeId,
}

impl ElementTree for DetachedControl<'_> {
    fn url(&self) -> &str {
        self.inner.url()
    }
    fn title(&self) -> &str {
        self.inner.title()
    }
    fn root(&self) -> NodeId {
        self.inner.root()
    }
    fn tag(&self, node: NodeId) -> Option<&str> {
        if node == self.detached {
            None
        } else {
            self.inner.tag(node)
        }
    }
    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.inner.attr(node, name)
    }
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.inner.set_attr(node, name, value)
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.children(node)
    }
    fn collect_text(&self, node: NodeId, skip_tags: &[&str]) -> String {
        self.inner.collect_text(node, skip_tags)
    }
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.inner.element_by_id(id)
    }
    fn is_visible(&self, node: NodeId) -> bool {
        self.inner.is_visible(node)
    }
    fn value(&self, node: NodeId) -> String {
        self.inner.value(node)
    }
    fn set_value(&mut self, node: NodeId, value: &str) {
        self.inner.set_value(node, value)
    }
    fn is_checked(&self, node: NodeId) -> bool {
        self.inner.is_checked(node)
    }
    fn set_checked(&mut self, node: NodeId, checked: bool) {
        self.inner.set_checked(node, checked)
    }
    fn dispatch(&mut self, node: NodeId, kind: EventKind) {
        self.inner.dispatch(node, kind)
    }
    fn settle(&mut self, wait: Duration) {
        self.inner.settle(wait)
    }
    fn watch_navigation(&mut self, enabled: bool) {
        self.inner.watch_navigation(enabled)
    }
    fn navigation_detected(&self) -> bool {
        self.inner.navigation_detected()
    }
    fn attach_file(&mut self, node: NodeId, file: AttachedFile) {
        self.inner.attach_file(node, file)
    }

    // Candidate discovery still sees the control; only its description fails.
    fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeId> {
        self.inner.elements_by_tag(tags)
    }
}

#[test]
fn a_control_that_fails_to_describe_is_skipped_and_the_scan_continues() {
    let mut d = doc(json!([
        text_input("first_name", "First name"),
        text_input("broken", "Broken"),
        text_input("last_name", "Last name"),
        radio_group("remote", "Remote?", &["Yes", "No"])
    ]));
    let detached = node(&d, "broken");
    let mut tree = DetachedControl {
        inner: &mut d,
        detached,
    };

    let fields = Scanner::new().scan_fields(&mut tree);
    assert_eq!(ids(&fields), vec!["first_name", "last_name", "remote"]);
}
