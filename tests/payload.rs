//! Tests for server error normalization and response envelopes.
mod common;
use common::*;
use serde_json::json;
use stepform::prelude::*;

fn steps() -> Steps {
    Steps::new(spending_request_steps()).unwrap()
}

#[test]
fn test_payload_variants() {
    assert_eq!(
        ServerErrorPayload::from_json(json!("Une erreur est survenue")),
        ServerErrorPayload::GlobalMessage("Une erreur est survenue".to_string())
    );
    assert!(matches!(
        ServerErrorPayload::from_json(json!({ "title": "x" })),
        ServerErrorPayload::FieldErrors(_)
    ));
    assert_eq!(
        ServerErrorPayload::from_json(json!(["Premier", "Second"])),
        ServerErrorPayload::GlobalMessage("Premier".to_string())
    );
    assert!(ServerErrorPayload::from_json(json!(null)).is_none());
    assert!(ServerErrorPayload::from_json(json!({})).is_none());
    assert!(ServerErrorPayload::from_json(json!("")).is_none());
}

#[test]
fn test_field_errors_keep_known_fields() {
    let payload = ServerErrorPayload::from_json(json!({
        "title": ["Ce champ est obligatoire.", "Trop court."],
        "amount": "Montant invalide",
    }));
    let errors = payload.into_error_map(&steps(), &complete_draft());

    assert_eq!(
        errors,
        ErrorMap::new()
            .with("title", "Ce champ est obligatoire.")
            .with("amount", "Montant invalide")
    );
}

#[test]
fn test_unknown_keys_are_relabeled_global() {
    let payload = ServerErrorPayload::from_json(json!({
        "detail": "Vous n'avez pas la permission",
        "non_field_errors": ["Demande déjà envoyée"],
        "title": "Titre invalide",
    }));
    let errors = payload.into_error_map(&steps(), &complete_draft());

    assert!(errors.has_error("title"));
    assert!(!errors.has_error("detail"));
    assert!(!errors.has_error("non_field_errors"));
    let global = errors.global_message().unwrap();
    assert!(global.contains("Vous n'avez pas la permission"));
    assert!(global.contains("Demande déjà envoyée"));
    assert_eq!(global.lines().count(), 2);
}

#[test]
fn test_nested_errors_and_unknown_nested_keys() {
    let payload = ServerErrorPayload::from_json(json!({
        "contact": { "phone": ["Numéro invalide"], "fax": "Inconnu" },
        "bankAccount": { "iban": "IBAN invalide" },
    }));
    let errors = payload.into_error_map(&steps(), &complete_draft());

    assert_eq!(
        errors.get_path("contact.phone"),
        Some(&FieldError::message("Numéro invalide"))
    );
    assert!(errors.get_path("contact.fax").is_none());
    assert_eq!(
        errors.get_path("contact.global"),
        Some(&FieldError::message("Inconnu"))
    );
    assert_eq!(
        errors.get_path("bankAccount.iban"),
        Some(&FieldError::message("IBAN invalide"))
    );
    assert!(errors.global_message().is_none());
}

#[test]
fn test_dotted_keys_merge_into_nested_entries() {
    let payload = ServerErrorPayload::from_json(json!({
        "contact": { "name": "Nom requis" },
        "contact.phone": "Numéro invalide",
        "contact.fax": "Inconnu",
        "bankAccount.iban": ["IBAN invalide"],
    }));
    let errors = payload.into_error_map(&steps(), &complete_draft());

    assert_eq!(
        errors.get_path("contact.name"),
        Some(&FieldError::message("Nom requis"))
    );
    assert_eq!(
        errors.get_path("contact.phone"),
        Some(&FieldError::message("Numéro invalide"))
    );
    assert!(errors.get_path("contact.fax").is_none());
    assert_eq!(
        errors.get_path("contact.global"),
        Some(&FieldError::message("Inconnu"))
    );
    assert_eq!(
        errors.get_path("bankAccount.iban"),
        Some(&FieldError::message("IBAN invalide"))
    );
    assert_eq!(errors.fields(), vec!["bankAccount", "contact"]);
    assert!(errors.global_message().is_none());
}

#[test]
fn test_nested_keys_kept_when_draft_has_no_shape() {
    let payload = ServerErrorPayload::from_json(json!({ "bankAccount": { "rib": "RIB manquant" } }));
    let errors = payload.into_error_map(&steps(), &Draft::new());
    assert_eq!(
        errors.get_path("bankAccount.rib"),
        Some(&FieldError::message("RIB manquant"))
    );
}

#[test]
fn test_list_of_objects_becomes_item_errors() {
    let payload = ServerErrorPayload::from_json(json!({
        "attachments": [{}, { "file": ["Fichier trop volumineux"] }],
    }));
    let errors = payload.into_error_map(&steps(), &complete_draft());

    match errors.get("attachments") {
        Some(FieldError::Items { message, items }) => {
            assert!(message.is_none());
            assert_eq!(items.len(), 2);
            assert!(items[0].is_none());
            assert_eq!(
                items[1].as_ref().and_then(|item| item.get("file")),
                Some(&FieldError::message("Fichier trop volumineux"))
            );
        }
        other => panic!("unexpected attachments error: {:?}", other),
    }
    assert_eq!(steps().first_invalid_step(&errors), Some(1));
}

#[test]
fn test_empty_field_errors_produce_empty_map() {
    let payload = ServerErrorPayload::from_json(json!({ "title": null, "amount": [] }));
    let errors = payload.into_error_map(&steps(), &complete_draft());
    assert!(errors.is_empty());
}

#[test]
fn test_parse_response_envelopes() {
    assert_eq!(
        parse_response(json!({ "data": { "id": "1" } })).unwrap(),
        json!({ "id": "1" })
    );
    assert_eq!(
        parse_response(json!({ "data": { "id": "1" }, "error": null })).unwrap(),
        json!({ "id": "1" })
    );
    assert_eq!(parse_response(json!({ "id": "2" })).unwrap(), json!({ "id": "2" }));

    match parse_response(json!({ "error": "Une erreur est survenue" })) {
        Err(SubmitError::Rejected(payload)) => assert_eq!(
            payload,
            ServerErrorPayload::GlobalMessage("Une erreur est survenue".to_string())
        ),
        other => panic!("unexpected response: {:?}", other),
    }
    assert!(matches!(
        parse_response(json!({ "errors": { "title": "x" } })),
        Err(SubmitError::Rejected(ServerErrorPayload::FieldErrors(_)))
    ));
}

#[test]
fn test_payload_display() {
    let payload = ServerErrorPayload::from_json(json!({ "amount": "x", "title": "y" }));
    assert_eq!(payload.to_string(), "errors on amount, title");
    let err = SubmitError::Rejected(ServerErrorPayload::GlobalMessage("Refusé".to_string()));
    assert!(err.to_string().contains("Refusé"));
}
