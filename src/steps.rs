use crate::error::DefinitionError;
use crate::feedback::{ErrorMap, GLOBAL_FIELD};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One page of a multi-step form and the fields it shows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepDefinition {
    pub name: String,
    pub fields: Vec<String>,
}

impl StepDefinition {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// The validated, ordered step list of a form.
///
/// Every field is owned by exactly one step. The reserved `global` field is
/// owned by none.
#[derive(Debug, Clone)]
pub struct Steps {
    steps: Vec<StepDefinition>,
    owners: AHashMap<String, usize>,
}

impl Steps {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, DefinitionError> {
        if steps.is_empty() {
            return Err(DefinitionError::NoSteps);
        }

        let mut owners: AHashMap<String, usize> = AHashMap::new();
        for (index, step) in steps.iter().enumerate() {
            for field in &step.fields {
                if field == GLOBAL_FIELD {
                    return Err(DefinitionError::ReservedField {
                        step: step.name.clone(),
                        field: field.clone(),
                    });
                }
                if let Some(&first) = owners.get(field) {
                    return Err(DefinitionError::DuplicateField {
                        field: field.clone(),
                        first_step: steps[first].name.clone(),
                        second_step: step.name.clone(),
                    });
                }
                owners.insert(field.clone(), index);
            }
        }

        Ok(Self { steps, owners })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }

    /// The index of the step owning `field`. Dotted paths resolve through their first segment.
    pub fn step_of(&self, field: &str) -> Option<usize> {
        let top = field.split('.').next().unwrap_or(field);
        self.owners.get(top).copied()
    }

    pub fn owns(&self, field: &str) -> bool {
        self.step_of(field).is_some()
    }

    /// Whether step `index` owns a field with an error.
    pub fn step_has_errors(&self, index: usize, errors: &ErrorMap) -> bool {
        self.steps
            .get(index)
            .is_some_and(|step| step.fields.iter().any(|field| errors.has_error(field)))
    }

    /// Finds the step a user should be sent to after a failed validation or submission.
    ///
    /// The first step in declared order owning an erroring field wins. If only
    /// fields bound to no step carry errors (`global`, or anything unrecognized),
    /// the last step is selected. `None` means there is nothing to show.
    pub fn first_invalid_step(&self, errors: &ErrorMap) -> Option<usize> {
        (0..self.steps.len())
            .find(|&index| self.step_has_errors(index, errors))
            .or_else(|| {
                errors
                    .fields()
                    .iter()
                    .any(|field| !self.owns(field))
                    .then(|| self.last_index())
            })
    }
}
