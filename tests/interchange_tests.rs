use job_autofill::form::field_model::{
    ControlKind, FieldDescriptor, SelectOption, fields_from_json, fields_to_json, fingerprint,
    load_fields, save_fields,
};
use pretty_assertions::assert_eq;

use crate::common::{APPLICATION_FORM, POSTING_URL, scan_static};

mod common;

// ============================================================================
// Saved scrapes
// ============================================================================

#[test]
fn scrape_survives_save_and_load() {
    let scan = scan_static(POSTING_URL, APPLICATION_FORM);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fields.json");

    save_fields(&path, &scan.collection.fields).unwrap();
    let loaded = load_fields(&path).unwrap();

    assert_eq!(loaded, scan.collection.fields);
    assert_eq!(fingerprint(&loaded), scan.fingerprint);
}

#[test]
fn interchange_uses_flat_field_names() {
    let field = FieldDescriptor::new("email", ControlKind::Email)
        .with_label("Email")
        .required();
    let json = fields_to_json(&[field]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let object = &value[0];

    assert_eq!(object["name"], "email");
    assert_eq!(object["type"], "email");
    assert_eq!(object["label"], "Email");
    assert_eq!(object["placeholder"], "");
    assert_eq!(object["required"], true);
    assert_eq!(object["tag"], "input");
    assert_eq!(object["value"], serde_json::Value::Null);
    assert_eq!(object["checked"], false);
    assert_eq!(object["options"], serde_json::json!([]));
}

#[test]
fn nulls_and_missing_keys_load_as_defaults() {
    let json = r#"[
        {"name": "resume", "type": "file", "label": null, "placeholder": null,
         "required": null, "tag": "input", "value": null, "checked": null, "options": null},
        {"name": "level", "type": "select",
         "options": [{"value": "sr", "label": "Senior", "selected": true}, {"value": null}]}
    ]"#;
    let fields = fields_from_json(json).unwrap();

    assert_eq!(fields[0].control_kind, ControlKind::File);
    assert_eq!(fields[0].label_text, "");
    assert!(!fields[0].is_required);
    assert_eq!(fields[0].current_value, None);
    assert!(fields[0].options.is_empty());

    assert_eq!(fields[1].tag, "");
    assert_eq!(
        fields[1].options,
        vec![
            SelectOption {
                value: "sr".into(),
                label: "Senior".into(),
                selected: true,
            },
            SelectOption {
                value: "".into(),
                label: "".into(),
                selected: false,
            },
        ]
    );
}

#[test]
fn unknown_control_types_load_as_other() {
    let json = r#"[{"name": "when", "type": "datetime-local"}]"#;
    let fields = fields_from_json(json).unwrap();
    assert_eq!(fields[0].control_kind, ControlKind::Other);
}

#[test]
fn saved_types_load_like_live_collection() {
    let json = r#"[
        {"name": "q", "type": "search"},
        {"name": "contact", "type": "EMAIL"},
        {"name": "level", "type": "select-one"},
        {"name": "blank", "type": null}
    ]"#;
    let kinds: Vec<ControlKind> = fields_from_json(json)
        .unwrap()
        .iter()
        .map(|f| f.control_kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ControlKind::Text,
            ControlKind::Email,
            ControlKind::Select,
            ControlKind::Other
        ]
    );
}

#[test]
fn malformed_scrape_is_a_parse_error() {
    let err = fields_from_json("{not json").unwrap_err();
    assert!(err.to_string().contains("field descriptors"));

    let missing = load_fields("/nonexistent/dir/fields.json").unwrap_err();
    assert!(missing.to_string().contains("/nonexistent/dir/fields.json"));
}

// ============================================================================
// Fingerprints
// ============================================================================

#[test]
fn fingerprint_depends_on_identifier_kind_and_order() {
    let a = FieldDescriptor::new("email", ControlKind::Email);
    let b = FieldDescriptor::new("phone", ControlKind::Tel);

    let base = fingerprint(&[a.clone(), b.clone()]);
    assert_eq!(base.len(), 40);
    assert_eq!(base, fingerprint(&[a.clone(), b.clone()]));

    // Labels and values do not matter.
    let relabelled = a.clone().with_label("Work email").with_value("x@y.z");
    assert_eq!(base, fingerprint(&[relabelled, b.clone()]));

    assert_ne!(base, fingerprint(&[b.clone(), a.clone()]));
    assert_ne!(
        base,
        fingerprint(&[FieldDescriptor::new("email", ControlKind::Text), b])
    );
}
