//! Unit tests for the draft, error map and step definition building blocks.
mod common;
use common::*;
use serde_json::json;
use stepform::prelude::*;

#[test]
fn test_draft_paths_and_merge() {
    let mut draft = Draft::from_value(json!({ "contact": { "name": "Camille" }, "title": "" }));
    assert_eq!(draft.get_path("contact.name"), Some(&json!("Camille")));
    assert!(draft.get_path("contact.phone").is_none());
    assert!(draft.get_path("title.length").is_none());

    draft.set_nested("contact", "phone", "0612345678");
    draft.set_nested("title", "oops", 1);
    assert_eq!(draft.get_path("contact.phone"), Some(&json!("0612345678")));
    assert_eq!(draft.get("title"), Some(&json!({ "oops": 1 })));

    draft.merge(Draft::from_value(json!({
        "contact": { "name": "Camille Martin", "email": "camille@example.org" },
        "group": "g-42",
    })));
    assert_eq!(
        draft.get("contact"),
        Some(&json!({ "name": "Camille Martin", "phone": "0612345678", "email": "camille@example.org" }))
    );
    assert_eq!(draft.get("group"), Some(&json!("g-42")));
    assert!(Draft::from_value(json!([1, 2])).is_empty());
}

#[test]
fn test_draft_identifier_ignores_null() {
    let draft = Draft::new().with("id", json!(null));
    assert!(draft.identifier("id").is_none());
    let draft = draft.with("id", "abc");
    assert_eq!(draft.identifier("id"), Some(&json!("abc")));
}

#[test]
fn test_error_map_prunes_empty_entries() {
    let mut errors = ErrorMap::new();
    errors.insert("title", FieldError::message(""));
    errors.insert("contact", FieldError::Nested(ErrorMap::new()));
    errors.insert(
        "attachments",
        FieldError::Items {
            message: None,
            items: vec![None, Some(ErrorMap::new())],
        },
    );
    assert!(errors.is_empty());
    assert_eq!(errors.len(), 0);
}

#[test]
fn test_error_map_nested_clearing() {
    let mut errors = ErrorMap::new();
    errors.set_message("contact.name", "Nom requis");
    errors.set_message("contact.phone", "Téléphone requis");

    errors.clear_nested("contact", "phone");
    assert!(errors.has_error("contact"));
    assert!(errors.get_path("contact.phone").is_none());

    errors.clear_nested("contact", "name");
    assert!(!errors.has_error("contact"));
    assert!(errors.get("contact").is_none());

    // A plain message on the parent goes away when a child is edited.
    errors.set_message("bankAccount", "Coordonnées invalides");
    errors.clear_nested("bankAccount", "iban");
    assert!(!errors.has_error("bankAccount"));
}

#[test]
fn test_error_map_parent_message_wins() {
    let mut errors = ErrorMap::new();
    errors.set_message("contact", "Contact requis");
    errors.set_message("contact.phone", "Téléphone requis");
    assert_eq!(errors.get("contact"), Some(&FieldError::message("Contact requis")));
    assert!(errors.covers("contact.phone"));
}

#[test]
fn test_error_map_items_keep_field_message() {
    let mut errors = ErrorMap::new().with("attachments", "Ce champ est obligatoire");
    errors.set_items(
        "attachments",
        vec![Some(ErrorMap::new().with("file", "Fichier requis")), None],
    );
    match errors.get("attachments") {
        Some(FieldError::Items { message, items }) => {
            assert_eq!(message.as_deref(), Some("Ce champ est obligatoire"));
            assert_eq!(items.len(), 2);
        }
        other => panic!("unexpected entry: {:?}", other),
    }

    errors.dismiss_item("attachments", 0);
    // The field-level message survives dismissal of its items.
    assert!(errors.has_error("attachments"));
    assert_eq!(
        errors.get("attachments").and_then(FieldError::first_message),
        Some("Ce champ est obligatoire")
    );
}

#[test]
fn test_push_global_joins_messages() {
    let mut errors = ErrorMap::global("Premier");
    errors.push_global("Second");
    errors.push_global("Second");
    errors.push_global("");
    assert_eq!(errors.global_message(), Some("Premier\nSecond"));
}

#[test]
fn test_error_map_serializes_like_the_front_end() {
    let mut errors = ErrorMap::new().with("title", "Ce champ est obligatoire");
    errors.set_message("contact.phone", "Saisissez un numéro de téléphone valide.");
    let value = serde_json::to_value(&errors).unwrap();
    assert_eq!(
        value,
        json!({
            "title": "Ce champ est obligatoire",
            "contact": { "phone": "Saisissez un numéro de téléphone valide." },
        })
    );
}

#[test]
fn test_steps_ownership_and_first_invalid_step() {
    let steps = Steps::new(spending_request_steps()).unwrap();
    assert_eq!(steps.len(), 5);
    assert_eq!(steps.step_of("contact.phone"), Some(0));
    assert_eq!(steps.step_of("bankAccount"), Some(3));
    assert!(!steps.owns(GLOBAL_FIELD));

    let errors = ErrorMap::new()
        .with("bankAccount", "IBAN invalide")
        .with("amount", "Montant requis");
    assert_eq!(steps.first_invalid_step(&errors), Some(2));

    let errors = errors.with("agreement", "Requis").with("title", "Requis");
    assert_eq!(steps.first_invalid_step(&errors), Some(0));

    assert_eq!(steps.first_invalid_step(&ErrorMap::global("Erreur")), Some(4));
    assert_eq!(steps.first_invalid_step(&ErrorMap::new()), None);
}

#[test]
fn test_steps_reject_invalid_definitions() {
    assert!(matches!(Steps::new(vec![]), Err(DefinitionError::NoSteps)));

    let duplicate = Steps::new(vec![
        StepDefinition::new("Un", ["title"]),
        StepDefinition::new("Deux", ["amount", "title"]),
    ]);
    match duplicate {
        Err(DefinitionError::DuplicateField {
            field,
            first_step,
            second_step,
        }) => {
            assert_eq!(field, "title");
            assert_eq!(first_step, "Un");
            assert_eq!(second_step, "Deux");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let reserved = Steps::new(vec![StepDefinition::new("Fin", ["agreement", "global"])]);
    assert!(matches!(reserved, Err(DefinitionError::ReservedField { .. })));
}

#[test]
fn test_error_display() {
    let err = DefinitionError::DuplicateField {
        field: "title".to_string(),
        first_step: "Un".to_string(),
        second_step: "Deux".to_string(),
    };
    assert!(err.to_string().contains("title"));
    assert!(err.to_string().contains("Deux"));

    let err = FormError::StepOutOfRange { index: 7, count: 5 };
    assert!(err.to_string().contains('7'));
    assert!(err.to_string().contains('5'));

    let err: FormError = DefinitionError::NoSteps.into();
    assert_eq!(err.to_string(), "A form needs at least one step");

    let err = SubmitError::Transport("timeout".to_string());
    assert!(err.to_string().contains("timeout"));
}
