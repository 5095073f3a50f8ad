use std::cell::RefCell;
use std::rc::Rc;

use form_autofill::dom::{ElementTree, EventKind};
use form_autofill::fill::{
    FieldIssue, FieldOutcome, FillConfig, FillMethod, FillValue, Filler, ResolverTag, SkipReason,
};
use form_autofill::matching::MatchRung;
use form_autofill::scan::{FieldKind, Scanner};
use serde_json::json;

mod common;
use common::{checkbox, checkbox_group, doc, field, node, radio_group, select};

fn filled(outcome: FieldOutcome) -> form_autofill::fill::FilledField {
    match outcome {
        FieldOutcome::Filled(f) => f,
        other => panic!("expected Filled, got {other:?}"),
    }
}

// ============================================================================
// Toggles
// ============================================================================

#[test]
fn checkbox_true_fires_click_and_change_for_listener() {
    let mut d = doc(json!([checkbox("agree_terms", "I agree to the terms")]));
    let agree = node(&d, "agree_terms");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    d.add_listener(Some(agree), None, move |_, e| sink.borrow_mut().push(e.kind));

    let result = filled(Filler::default().fill_field(&mut d, "agree_terms", None, &FillValue::Bool(true)));

    assert!(d.is_checked(agree));
    assert_eq!(result.method, FillMethod::Toggle);
    assert_eq!(result.kind, FieldKind::Checkbox);
    assert_eq!(*seen.borrow(), vec![EventKind::Click, EventKind::Change]);
}

#[test]
fn checkbox_already_in_desired_state_emits_nothing() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "id": "opt_in", "type": "checkbox", "checked": "" } }
    ]));
    let result = filled(Filler::default().fill_field(&mut d, "opt_in", None, &"yes".into()));
    assert_eq!(result.method, FillMethod::AlreadySet);
    assert!(d.events().is_empty());
}

#[test]
fn checkbox_accepts_its_own_label_as_true() {
    let mut d = doc(json!([checkbox("consent", "I consent to data processing")]));
    let result = filled(Filler::default().fill_field(&mut d, "consent", None, &"I consent".into()));
    assert!(d.is_checked(node(&d, "consent")));
    assert_eq!(result.value, "Yes");
}

#[test]
fn checkbox_rejects_non_boolean_text() {
    let mut d = doc(json!([checkbox("newsletter", "Subscribe")]));
    let outcome = Filler::default().fill_field(&mut d, "newsletter", None, &"maybe later".into());
    match outcome {
        FieldOutcome::Failed(err) => {
            assert_eq!(err.issue, FieldIssue::NotBoolean { candidate: "maybe later".into() })
        }
        other => panic!("expected NotBoolean, got {other:?}"),
    }
    assert!(!d.is_checked(node(&d, "newsletter")));
}

// ============================================================================
// Selects and groups
// ============================================================================

#[test]
fn select_uses_fuzzy_ladder_and_fires_change() {
    let mut d = doc(json!([select(
        "country",
        "Country",
        &[("", "Select..."), ("us", "United States"), ("ca", "Canada")]
    )]));
    let result = filled(Filler::default().fill_field(&mut d, "country", None, &"USA".into()));

    let country = node(&d, "country");
    assert_eq!(d.value(country), "us");
    assert_eq!(d.events_for(country), vec![EventKind::Change]);
    assert_eq!(result.matched_option.as_deref(), Some("United States"));
    assert_eq!(result.rung, Some(MatchRung::Canonical));
}

#[test]
fn select_without_match_is_a_field_error() {
    let mut d = doc(json!([select("country", "Country", &[("us", "United States")])]));
    let outcome = Filler::default().fill_field(&mut d, "country", None, &"Narnia".into());
    match outcome {
        FieldOutcome::Failed(err) => assert!(matches!(err.issue, FieldIssue::OptionNotFound { .. })),
        other => panic!("expected OptionNotFound, got {other:?}"),
    }
    assert!(d.events().is_empty());
}

#[test]
fn radio_group_found_by_name() {
    let mut d = doc(json!([radio_group("mode", "Work mode", &["Remote", "Hybrid", "Onsite"])]));
    let result = filled(Filler::default().fill_field(&mut d, "mode", None, &"hybrid".into()));
    assert_eq!(result.value, "Hybrid");

    let checked: Vec<String> = d
        .elements_by_tag(&["input"])
        .into_iter()
        .filter(|n| d.is_checked(*n))
        .map(|n| d.value(n))
        .collect();
    assert_eq!(checked, vec!["Hybrid"]);
}

#[test]
fn checkbox_group_checks_every_listed_option() {
    let mut d = doc(json!([checkbox_group("langs", "Languages", &["Rust", "Go", "Python"])]));
    let value = FillValue::List(vec!["rust".into(), "python".into()]);
    let result = filled(Filler::default().fill_field(&mut d, "langs", None, &value));
    assert_eq!(result.value, "Rust, Python");

    let checked: Vec<String> = d
        .elements_by_tag(&["input"])
        .into_iter()
        .filter(|n| d.is_checked(*n))
        .map(|n| d.value(n))
        .collect();
    assert_eq!(checked, vec!["Rust", "Python"]);
}

#[test]
fn custom_select_sets_backing_select_and_visible_text() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "id": "gender", "name": "gender", "aria-label": "Gender" } },
        { "tag": "select", "attrs": { "name": "gender", "hidden": "" }, "children": [
            { "tag": "option", "attrs": { "value": "m" }, "text": "Male" },
            { "tag": "option", "attrs": { "value": "f" }, "text": "Female" }
        ]}
    ]));
    let scan = Scanner::new().scan(&mut d);
    let descriptor = field(&scan, "gender").clone();

    let result = filled(Filler::default().fill_field(&mut d, "gender", Some(&descriptor), &"woman".into()));
    assert_eq!(result.kind, FieldKind::CustomSelect);
    assert_eq!(d.value(node(&d, "gender")), "Female");
    let backing = d.elements_by_tag(&["select"])[0];
    assert_eq!(d.value(backing), "f");
}

// ============================================================================
// Combobox and button groups
// ============================================================================

#[test]
fn combobox_types_then_clicks_opened_option() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "id": "city", "role": "combobox", "aria-controls": "city-list" } },
        { "tag": "ul", "attrs": { "id": "city-list", "style": "display:none" }, "children": [
            { "tag": "li", "attrs": { "role": "option", "id": "nyc" }, "text": "New York" },
            { "tag": "li", "attrs": { "role": "option", "id": "sf" }, "text": "San Francisco" }
        ]}
    ]));
    let (city, list) = (node(&d, "city"), node(&d, "city-list"));
    d.add_listener(Some(city), Some(EventKind::Input), move |doc, _| {
        doc.remove_attr(list, "style");
    });

    let result = filled(Filler::default().fill_field(&mut d, "city", None, &"San Francisco".into()));
    assert_eq!(result.method, FillMethod::TypeAndSelect);
    assert_eq!(result.matched_option.as_deref(), Some("San Francisco"));
    assert_eq!(
        d.events_for(node(&d, "sf")),
        vec![
            EventKind::PointerDown,
            EventKind::MouseDown,
            EventKind::PointerUp,
            EventKind::MouseUp,
            EventKind::Click
        ]
    );
    assert_eq!(&d.events_for(city)[..2], &[EventKind::Focus, EventKind::Input]);
    assert_eq!(d.clock_ms(), FillConfig::default().combobox_wait_ms);
}

#[test]
fn combobox_without_list_keeps_typed_text() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "id": "school", "aria-autocomplete": "list" } }
    ]));
    let school = node(&d, "school");
    let result = filled(Filler::default().fill_field(&mut d, "school", None, &"MIT".into()));
    assert_eq!(result.value, "MIT");
    assert_eq!(d.value(school), "MIT");
    assert_eq!(
        d.events_for(school),
        vec![EventKind::Focus, EventKind::Input, EventKind::Change, EventKind::Blur]
    );
}

#[test]
fn button_group_dispatches_pointer_sequence() {
    let mut d = doc(json!([
        { "tag": "div", "attrs": { "id": "sponsor", "role": "group" }, "children": [
            { "tag": "button", "attrs": { "id": "sponsor_yes" }, "text": "Yes" },
            { "tag": "button", "attrs": { "id": "sponsor_no" }, "text": "No" }
        ]}
    ]));
    let result = filled(Filler::default().fill_field(&mut d, "sponsor", None, &FillValue::Bool(false)));
    assert_eq!(result.method, FillMethod::ButtonClick);
    assert_eq!(result.kind, FieldKind::ButtonGroup);
    assert_eq!(
        d.events_for(node(&d, "sponsor_no")),
        vec![EventKind::Focus, EventKind::PointerDown, EventKind::PointerUp, EventKind::Click]
    );
    assert!(d.events_for(node(&d, "sponsor_yes")).is_empty());
}

// ============================================================================
// Text, lookup fallbacks and tags
// ============================================================================

#[test]
fn text_fill_emits_input_then_change() {
    let mut d = doc(json!([{ "tag": "textarea", "attrs": { "id": "bio" } }]));
    let bio = node(&d, "bio");
    let result = filled(Filler::default().fill_field(&mut d, "bio", None, &"Hello".into()));
    assert_eq!(result.kind, FieldKind::Textarea);
    assert_eq!(d.value(bio), "Hello");
    assert_eq!(d.events_for(bio), vec![EventKind::Input, EventKind::Change]);
}

#[test]
fn lookup_falls_back_to_name_then_position() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "type": "hidden", "name": "csrf" } },
        { "tag": "input", "attrs": { "name": "email" } },
        { "tag": "input", "attrs": { "name": "phone" } }
    ]));
    let filler = Filler::default();
    filled(filler.fill_field(&mut d, "email", None, &"ada@example.com".into()));
    filled(filler.fill_field(&mut d, "field_1", None, &"555-0100".into()));

    let inputs = d.elements_by_tag(&["input"]);
    assert_eq!(d.value(inputs[1]), "ada@example.com");
    assert_eq!(d.value(inputs[2]), "555-0100");
    assert_eq!(filler.fill_field(&mut d, "missing", None, &"x".into()), FieldOutcome::NotFound);
}

#[test]
fn resolver_tags_route_to_skip_upload_or_text() {
    let mut d = doc(json!([
        { "tag": "input", "attrs": { "id": "resume", "type": "file" } },
        { "tag": "input", "attrs": { "id": "portfolio" } },
        { "tag": "textarea", "attrs": { "id": "cover" } },
        { "tag": "textarea", "attrs": { "id": "essay" } },
        { "tag": "input", "attrs": { "id": "ref" } }
    ]));
    let plain = Filler::default();
    let with_letter = Filler::default().with_cover_letter(Some("Dear team".into()));

    match plain.fill_field(&mut d, "resume", None, &FillValue::Tag(ResolverTag::ResumeFile)) {
        FieldOutcome::Upload(upload) => assert_eq!(upload.file_type, "resume"),
        other => panic!("expected upload, got {other:?}"),
    }
    let skip = |outcome: FieldOutcome| match outcome {
        FieldOutcome::Skipped(s) => s.reason,
        other => panic!("expected skip, got {other:?}"),
    };
    assert_eq!(
        skip(plain.fill_field(&mut d, "portfolio", None, &FillValue::Tag(ResolverTag::ResumeFile))),
        SkipReason::NotAFileInput
    );
    assert_eq!(
        skip(plain.fill_field(&mut d, "cover", None, &FillValue::Tag(ResolverTag::CoverLetterText))),
        SkipReason::NoCoverLetter
    );
    assert_eq!(
        skip(plain.fill_field(&mut d, "essay", None, &FillValue::Tag(ResolverTag::NeedsHuman))),
        SkipReason::NeedsHuman
    );
    assert_eq!(
        skip(plain.fill_field(&mut d, "resume", None, &"a value".into())),
        SkipReason::FileInput
    );

    filled(with_letter.fill_field(&mut d, "cover", None, &FillValue::Tag(ResolverTag::CoverLetterText)));
    assert_eq!(d.value(node(&d, "cover")), "Dear team");

    let unknown = FillValue::from("__REFERRAL_CODE__");
    assert_eq!(unknown, FillValue::Text("__REFERRAL_CODE__".into()));
    filled(plain.fill_field(&mut d, "ref", None, &unknown));
    assert_eq!(d.value(node(&d, "ref")), "__REFERRAL_CODE__");
}
