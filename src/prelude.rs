//! Prelude module for convenient imports
//!
//! Re-exports the types needed to define a form, drive a controller and plug
//! in the validation and submission collaborators.
//!
//! # Example
//!
//! ```rust,no_run
//! use stepform::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let definition = FormDefinition::from_file("path/to/form.json")?;
//! let mut form = definition.into_controller(None)?;
//!
//! form.set_field("title", "Impression de tracts")?;
//! if let Some(errors) = form.validate(true) {
//!     println!("Still invalid: {:?}", errors.fields());
//! }
//! # Ok(())
//! # }
//! ```

// Controller and its lifecycle types
pub use crate::controller::{
    FormController, FormControllerBuilder, SubmissionOutcome, SubmissionState, SubmitAttempt,
};

// Form description
pub use crate::config::{ConstraintsDefinition, FormDefinition, FormOptions};
pub use crate::draft::Draft;
pub use crate::steps::{StepDefinition, Steps};

// Validation
pub use crate::constraints::{Constraint, ConstraintSet, FormValidator, Rule, Validator};
pub use crate::feedback::{ErrorMap, FieldError, GLOBAL_FIELD};

// Submission
pub use crate::payload::ServerErrorPayload;
pub use crate::submit::{FnSubmitter, Submitter, parse_response};

// Error types
pub use crate::error::{DefinitionError, FormError, SubmitError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
