//! # stepform - Multi-Step Form Controller
//!
//! **stepform** drives multi-page forms (donations, spending requests, event
//! creation) as a plain in-memory state machine. A [`FormController`] owns the
//! draft being edited, the per-field error map, the current step and the
//! submission lifecycle; rendering code reads that state and calls back into
//! it on user input.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the form**: an ordered list of steps, each owning some fields,
//!     plus a validator. Use [`FormDefinition`] to load both from JSON, or build
//!     them in code with [`StepDefinition`] and [`FormValidator`].
//! 2.  **Edit**: `set_field`, `set_nested_field` and `set_array_field` update
//!     the draft and clear the edited field's error straight away.
//! 3.  **Submit**: `submit` validates locally (lenient draft rules or strict
//!     final rules), hands the draft to your [`Submitter`], and maps any server
//!     errors back onto the steps. After a failure, the cursor sits on the first
//!     step holding an error, or on the last step for form-wide errors.
//! 4.  **React**: once the server assigns an identifier it is stored in the
//!     draft; `outcome().has_server_id` tells the page the record exists.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stepform::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let steps = vec![
//!         StepDefinition::new("Détails", ["title", "category"]),
//!         StepDefinition::new("Montant", ["amount"]),
//!     ];
//!     let validator = FormValidator::new(
//!         ConstraintSet::new()
//!             .rule("title", Rule::presence())
//!             .rule("title", Rule::max_length(200)),
//!         ConstraintSet::new().rule("amount", Rule::greater_than(0.0)),
//!     );
//!
//!     let mut form = FormController::builder(steps, validator)
//!         .with_draft(Draft::new().with("title", "").with("category", "IM"))
//!         .build()?;
//!
//!     form.set_field("title", "Impression de tracts")?;
//!     form.set_field("amount", 120)?;
//!
//!     let submitter = FnSubmitter::new(|_draft, _strict| Ok(json!({ "id": "42" })));
//!     let attempt = tokio_test::block_on(form.submit(true, &submitter))?;
//!
//!     println!("{:?} -> {:?}", attempt, form.outcome());
//!     Ok(())
//! }
//! ```
//!
//! [`FormController`]: controller::FormController
//! [`FormDefinition`]: config::FormDefinition
//! [`StepDefinition`]: steps::StepDefinition
//! [`FormValidator`]: constraints::FormValidator
//! [`Submitter`]: submit::Submitter

pub mod config;
pub mod constraints;
pub mod controller;
pub mod draft;
pub mod error;
pub mod feedback;
pub mod payload;
pub mod prelude;
pub mod steps;
pub mod submit;
