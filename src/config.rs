use crate::constraints::{ConstraintSet, FormValidator, Rule};
use crate::controller::FormController;
use crate::draft::Draft;
use crate::error::{DefinitionError, FormError};
use crate::steps::StepDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

pub const DEFAULT_IDENTIFIER_FIELD: &str = "id";
pub const DEFAULT_ERROR_MESSAGE: &str = "Une erreur est survenue";

/// Per-form behaviour switches.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FormOptions {
    /// Response field holding the identifier of the saved record.
    #[serde(alias = "identifierField")]
    pub identifier_field: String,
    /// Treat an accepted response without identifier as a failure.
    #[serde(alias = "requireIdentifier")]
    pub require_identifier: bool,
    /// Global message used when a failure carries no usable text.
    #[serde(alias = "defaultErrorMessage")]
    pub default_error_message: String,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
            require_identifier: false,
            default_error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Declarative constraints of a form definition file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConstraintsDefinition {
    /// Rules checked in both modes.
    pub draft: BTreeMap<String, Vec<Rule>>,
    /// Rules added in strict mode.
    pub strict: BTreeMap<String, Vec<Rule>>,
    /// Per-item rules for list fields, keyed by list field then item path.
    pub items: BTreeMap<String, BTreeMap<String, Vec<Rule>>>,
}

/// A complete form description, loadable from JSON.
///
/// ```json
/// {
///   "steps": [{ "name": "Détails", "fields": ["title", "category"] }],
///   "constraints": { "draft": { "title": [{ "kind": "presence" }] } },
///   "options": { "requireIdentifier": true },
///   "initial": { "title": "" }
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormDefinition {
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub constraints: ConstraintsDefinition,
    #[serde(default)]
    pub options: FormOptions,
    #[serde(default)]
    pub initial: Draft,
}

impl FormDefinition {
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    pub fn from_file(path: &str) -> Result<Self, DefinitionError> {
        let content = fs::read_to_string(path).map_err(|e| DefinitionError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Builds the validator described by the `constraints` section.
    pub fn validator(&self) -> FormValidator {
        let constraints = self.constraints.clone();
        constraints.items.into_iter().fold(
            FormValidator::new(
                ConstraintSet::from_rules(constraints.draft),
                ConstraintSet::from_rules(constraints.strict),
            ),
            |validator, (field, rules)| validator.with_items(&field, ConstraintSet::from_rules(rules)),
        )
    }

    /// Creates a controller for a new editing session.
    ///
    /// `seed` (a user's profile, a previously saved record) is deep-merged over
    /// the definition's initial values.
    pub fn into_controller(self, seed: Option<Draft>) -> Result<FormController, FormError> {
        let validator = self.validator();
        let mut draft = self.initial;
        if let Some(seed) = seed {
            draft.merge(seed);
        }
        FormController::builder(self.steps, validator)
            .with_draft(draft)
            .with_options(self.options)
            .build()
    }
}
