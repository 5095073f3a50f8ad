#![allow(dead_code)]

use form_autofill::dom::{Document, ElementTree, NodeId, PageSnapshot};
use form_autofill::scan::{FieldDescriptor, ScanResult};
use serde_json::{Value, json};

/// Build a document from a `json!` body, with a neutral URL and title.
pub fn doc(body: Value) -> Document {
    page("https://example.com/apply", "Apply", body)
}

pub fn page(url: &str, title: &str, body: Value) -> Document {
    let snapshot: PageSnapshot = serde_json::from_value(json!({
        "url": url,
        "title": title,
        "body": body,
    }))
    .expect("fixture snapshot");
    Document::from_snapshot(&snapshot)
}

/// Element by id, panicking with the id when absent.
pub fn node(doc: &Document, id: &str) -> NodeId {
    doc.element_by_id(id)
        .unwrap_or_else(|| panic!("no element with id '{id}'"))
}

pub fn field<'a>(scan: &'a ScanResult, id: &str) -> &'a FieldDescriptor {
    scan.field(id)
        .unwrap_or_else(|| panic!("no field '{id}' in {:?}", ids(&scan.fields)))
}

pub fn ids(fields: &[FieldDescriptor]) -> Vec<String> {
    fields.iter().map(|f| f.id.clone()).collect()
}

pub fn option_texts(field: &FieldDescriptor) -> Vec<String> {
    field.options().iter().map(|o| o.text.clone()).collect()
}

// ============================================================================
// Fixture builders
// ============================================================================

pub fn text_input(id: &str, label: &str) -> Value {
    json!({
        "tag": "div",
        "children": [
            { "tag": "label", "attrs": { "for": id }, "text": label },
            { "tag": "input", "attrs": { "id": id, "type": "text" } }
        ]
    })
}

pub fn checkbox(id: &str, label: &str) -> Value {
    json!({
        "tag": "label",
        "children": [
            { "tag": "input", "attrs": { "id": id, "type": "checkbox", "name": id } },
            label
        ]
    })
}

pub fn radio_group(name: &str, legend: &str, choices: &[&str]) -> Value {
    let options: Vec<Value> = choices
        .iter()
        .map(|c| {
            json!({
                "tag": "label",
                "children": [
                    { "tag": "input", "attrs": { "type": "radio", "name": name, "value": c } },
                    c
                ]
            })
        })
        .collect();
    let mut children = vec![json!({ "tag": "legend", "text": legend })];
    children.extend(options);
    json!({ "tag": "fieldset", "children": children })
}

pub fn checkbox_group(name: &str, legend: &str, choices: &[&str]) -> Value {
    let options: Vec<Value> = choices
        .iter()
        .map(|c| {
            json!({
                "tag": "label",
                "children": [
                    { "tag": "input", "attrs": { "type": "checkbox", "name": name, "value": c } },
                    c
                ]
            })
        })
        .collect();
    let mut children = vec![json!({ "tag": "legend", "text": legend })];
    children.extend(options);
    json!({ "tag": "fieldset", "children": children })
}

pub fn select(id: &str, label: &str, choices: &[(&str, &str)]) -> Value {
    let options: Vec<Value> = choices
        .iter()
        .map(|(value, text)| json!({ "tag": "option", "attrs": { "value": value }, "text": text }))
        .collect();
    json!({
        "tag": "div",
        "children": [
            { "tag": "label", "attrs": { "for": id }, "text": label },
            { "tag": "select", "attrs": { "id": id, "name": id }, "children": options }
        ]
    })
}
