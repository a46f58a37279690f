use crate::payload::ServerErrorPayload;
use thiserror::Error;

/// Errors raised when a form definition (steps, constraints, options) is invalid.
#[derive(Error, Debug, Clone)]
pub enum DefinitionError {
    #[error("Failed to parse form definition JSON: {0}")]
    JsonParseError(String),

    #[error("Could not read form definition file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("A form needs at least one step")]
    NoSteps,

    #[error("Field '{field}' is owned by both step '{first_step}' and step '{second_step}'")]
    DuplicateField {
        field: String,
        first_step: String,
        second_step: String,
    },

    #[error("Step '{step}' claims the reserved field '{field}', which is not bound to any step")]
    ReservedField { step: String, field: String },
}

/// Errors raised by misuse of a `FormController`.
#[derive(Error, Debug, Clone)]
pub enum FormError {
    #[error("Field '{0}' is not owned by any step of this form")]
    UnknownField(String),

    #[error("Step {index} does not exist, the form has {count} steps")]
    StepOutOfRange { index: usize, count: usize },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("No submission is in flight")]
    NotSubmitting,

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Errors returned by a `Submitter` when the server does not accept a draft.
#[derive(Error, Debug, Clone)]
pub enum SubmitError {
    #[error("The server rejected the submission: {0}")]
    Rejected(ServerErrorPayload),

    #[error("Transport failure: {0}")]
    Transport(String),
}
