//! Common test utilities: a spending-request style form and a recording submitter.
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::future::{self, Future};
use stepform::prelude::*;

/// Five steps, mirroring the spending request flow.
#[allow(dead_code)]
pub fn spending_request_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(
            "Détails",
            [
                "timing",
                "title",
                "campaign",
                "category",
                "explanation",
                "event",
                "spendingDate",
                "contact",
            ],
        ),
        StepDefinition::new("Pièces justificatives", ["attachments"]),
        StepDefinition::new("Montant et financement", ["amount"]),
        StepDefinition::new("Coordonnées bancaires", ["bankAccount"]),
        StepDefinition::new("Finalisation", ["agreement"]),
    ]
}

/// Draft rules: title and category. Strict rules add everything needed for a final submission.
#[allow(dead_code)]
pub fn spending_request_validator() -> FormValidator {
    let draft = ConstraintSet::new()
        .rule("title", Rule::presence())
        .rule("title", Rule::max_length(200))
        .rule(
            "category",
            Rule::presence().with_message("Ce champ ne peut pas être vide."),
        )
        .rule(
            "category",
            Rule::inclusion(["IM", "CO", "AC", "DE", "HE", "SA", "MA", "TE", "VE"]),
        );

    let strict = ConstraintSet::new()
        .rule("explanation", Rule::presence())
        .rule("explanation", Rule::max_length(1500))
        .rule("spendingDate", Rule::presence())
        .rule("spendingDate", Rule::date())
        .rule("contact.name", Rule::presence())
        .rule("contact.name", Rule::max_length(255))
        .rule("contact.phone", Rule::presence())
        .rule("contact.phone", Rule::phone())
        .rule("attachments", Rule::presence())
        .rule("amount", Rule::presence())
        .rule("bankAccount.name", Rule::presence())
        .rule("bankAccount.iban", Rule::presence())
        .rule("bankAccount.bic", Rule::presence());

    let document = ConstraintSet::new()
        .rule("type", Rule::inclusion(["E", "I", "B", "P", "O"]))
        .rule("type", Rule::presence())
        .rule("title", Rule::presence())
        .rule("file", Rule::presence());

    FormValidator::new(draft, strict).with_items("attachments", document)
}

#[allow(dead_code)]
pub fn valid_attachment() -> Value {
    json!({ "type": "I", "title": "Facture imprimeur", "file": "facture.pdf" })
}

/// A draft that passes the strict constraint set.
#[allow(dead_code)]
pub fn complete_draft() -> Draft {
    Draft::from_value(json!({
        "title": "Impression de tracts",
        "campaign": false,
        "category": "IM",
        "explanation": "Tracts pour la réunion publique",
        "spendingDate": "2024-03-12",
        "contact": { "name": "Camille Martin", "phone": "06 12 34 56 78" },
        "attachments": [valid_attachment()],
        "amount": 12000,
        "bankAccount": { "name": "Groupe d'action", "iban": "FR7630006000011234567890189", "bic": "AGRIFRPP" },
        "agreement": true,
    }))
}

/// A draft as seeded for a new request: blank title, profile contact.
#[allow(dead_code)]
pub fn initial_draft() -> Draft {
    Draft::from_value(json!({
        "title": "",
        "campaign": false,
        "spendingDate": null,
        "attachments": [],
        "contact": { "name": "Camille Martin", "phone": "" },
    }))
}

#[allow(dead_code)]
pub fn spending_request_form(draft: Draft) -> FormController {
    FormController::builder(spending_request_steps(), spending_request_validator())
        .with_draft(draft)
        .build()
        .expect("spending request form should build")
}

/// A submitter that replays a fixed answer and records what it was sent.
#[allow(dead_code)]
pub struct RecordingSubmitter {
    response: std::result::Result<Value, SubmitError>,
    calls: Cell<usize>,
    last_draft: RefCell<Option<Draft>>,
}

#[allow(dead_code)]
impl RecordingSubmitter {
    pub fn accepting(data: Value) -> Self {
        Self::answering(Ok(data))
    }

    pub fn rejecting(error: Value) -> Self {
        Self::answering(Err(SubmitError::Rejected(ServerErrorPayload::from_json(
            error,
        ))))
    }

    pub fn failing(message: &str) -> Self {
        Self::answering(Err(SubmitError::Transport(message.to_string())))
    }

    fn answering(response: std::result::Result<Value, SubmitError>) -> Self {
        Self {
            response,
            calls: Cell::new(0),
            last_draft: RefCell::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_draft(&self) -> Option<Draft> {
        self.last_draft.borrow().clone()
    }
}

impl Submitter for RecordingSubmitter {
    fn submit(
        &self,
        draft: &Draft,
        _strict: bool,
    ) -> impl Future<Output = std::result::Result<Value, SubmitError>> + Send {
        self.calls.set(self.calls.get() + 1);
        *self.last_draft.borrow_mut() = Some(draft.clone());
        future::ready(self.response.clone())
    }
}
