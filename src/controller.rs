use crate::config::FormOptions;
use crate::constraints::Validator;
use crate::draft::Draft;
use crate::error::{FormError, SubmitError};
use crate::feedback::{ErrorMap, FieldError};
use crate::steps::{StepDefinition, Steps};
use crate::submit::Submitter;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Lifecycle of the current submission attempt.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// What a single call to `submit` or `complete_submission` ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Local validation failed; the submitter was not called.
    NotSent,
    Succeeded,
    Failed,
}

/// Independent flags describing what the server knows about the record.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmissionOutcome {
    /// The draft carries a server-issued identifier: the record exists server-side.
    pub has_server_id: bool,
    /// The last accepted submission was checked against the strict constraint set.
    pub is_fully_validated: bool,
}

/// Owns the draft, error map, step cursor and submission state of one editing session.
///
/// All mutation goes through the methods below. Field edits clear the edited
/// field's error immediately; failed validations and submissions move the
/// cursor to the first step holding an error.
pub struct FormController {
    steps: Steps,
    validator: Box<dyn Validator>,
    options: FormOptions,
    draft: Draft,
    errors: ErrorMap,
    current_step: usize,
    state: SubmissionState,
    pending_strict: bool,
    fully_validated: bool,
}

pub struct FormControllerBuilder {
    steps: Vec<StepDefinition>,
    validator: Box<dyn Validator>,
    options: FormOptions,
    draft: Draft,
    start_step: usize,
}

impl FormControllerBuilder {
    pub fn new(steps: Vec<StepDefinition>, validator: impl Validator + 'static) -> Self {
        Self {
            steps,
            validator: Box::new(validator),
            options: FormOptions::default(),
            draft: Draft::new(),
            start_step: 0,
        }
    }

    /// Initial values: defaults, a user's profile, or a partially saved record.
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn starting_at(mut self, step: usize) -> Self {
        self.start_step = step;
        self
    }

    pub fn build(self) -> Result<FormController, FormError> {
        let steps = Steps::new(self.steps)?;
        if self.start_step >= steps.len() {
            return Err(FormError::StepOutOfRange {
                index: self.start_step,
                count: steps.len(),
            });
        }
        Ok(FormController {
            steps,
            validator: self.validator,
            options: self.options,
            draft: self.draft,
            errors: ErrorMap::new(),
            current_step: self.start_step,
            state: SubmissionState::Idle,
            pending_strict: false,
            fully_validated: false,
        })
    }
}

impl FormController {
    pub fn builder(
        steps: Vec<StepDefinition>,
        validator: impl Validator + 'static,
    ) -> FormControllerBuilder {
        FormControllerBuilder::new(steps, validator)
    }

    fn ensure_known(&self, name: &str) -> Result<(), FormError> {
        if self.steps.owns(name) {
            Ok(())
        } else {
            Err(FormError::UnknownField(name.to_string()))
        }
    }

    // --- Field mutation ---

    /// Sets a top-level field and clears its error.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FormError> {
        self.ensure_known(name)?;
        self.errors.clear(name);
        self.draft.set(name, value);
        debug!(field = name, "field updated");
        Ok(())
    }

    /// Sets several fields at once, clearing each one's error.
    /// Nothing is applied if any name is unknown.
    pub fn set_fields<'a, I>(&mut self, values: I) -> Result<(), FormError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let values: Vec<_> = values.into_iter().collect();
        for (name, _) in &values {
            self.ensure_known(name)?;
        }
        for (name, value) in values {
            self.errors.clear(name);
            self.draft.set(name, value);
        }
        Ok(())
    }

    /// Sets `parent.child`, clearing only that nested error.
    pub fn set_nested_field(
        &mut self,
        parent: &str,
        child: &str,
        value: impl Into<Value>,
    ) -> Result<(), FormError> {
        self.ensure_known(parent)?;
        self.errors.clear_nested(parent, child);
        self.draft.set_nested(parent, child, value);
        debug!(field = parent, child, "nested field updated");
        Ok(())
    }

    /// Replaces a list field. `dismissed_index` drops that item's error and
    /// shifts later item errors down; the rest are not revalidated.
    pub fn set_array_field(
        &mut self,
        name: &str,
        value: Vec<Value>,
        dismissed_index: Option<usize>,
    ) -> Result<(), FormError> {
        self.ensure_known(name)?;
        if let Some(index) = dismissed_index {
            self.errors.dismiss_item(name, index);
        }
        self.draft.set(name, Value::Array(value));
        Ok(())
    }

    // --- Step navigation ---

    /// Moves to `index`. Ignored while a submission is in flight (returns `Ok(false)`).
    pub fn go_to_step(&mut self, index: usize) -> Result<bool, FormError> {
        if self.is_submitting() {
            debug!(step = index, "navigation ignored during submission");
            return Ok(false);
        }
        if index >= self.steps.len() {
            return Err(FormError::StepOutOfRange {
                index,
                count: self.steps.len(),
            });
        }
        self.current_step = index;
        Ok(true)
    }

    pub fn go_to_next_step(&mut self) -> bool {
        if self.is_submitting() || self.current_step >= self.steps.last_index() {
            return false;
        }
        self.current_step += 1;
        true
    }

    pub fn go_to_previous_step(&mut self) -> bool {
        if self.is_submitting() || self.current_step == 0 {
            return false;
        }
        self.current_step -= 1;
        true
    }

    fn go_to_first_invalid_step(&mut self) {
        if let Some(step) = self.steps.first_invalid_step(&self.errors) {
            if step != self.current_step {
                debug!(from = self.current_step, to = step, "jumping to first invalid step");
                self.current_step = step;
            }
        }
    }

    // --- Validation and submission ---

    /// Runs local validation. `strict` selects the final constraint set.
    pub fn validate(&self, strict: bool) -> Option<ErrorMap> {
        let mut errors = self.validator.validate(&self.draft, strict)?;
        errors.prune();
        (!errors.is_empty()).then_some(errors)
    }

    /// Validates and stores the result without sending anything. On failure the
    /// cursor moves to the first invalid step. Returns whether the draft is valid.
    pub fn apply_validation(&mut self, strict: bool) -> Result<bool, FormError> {
        if self.is_submitting() {
            return Err(FormError::SubmissionInFlight);
        }
        let Some(errors) = self.validate(strict) else {
            self.errors.clear_all();
            return Ok(true);
        };
        debug!(fields = ?errors.fields(), "local validation failed");
        self.errors = errors;
        self.go_to_first_invalid_step();
        Ok(false)
    }

    /// Validates and, when valid, enters `Submitting` and returns the draft to send.
    ///
    /// Returns `Ok(None)` when local validation failed: the errors are stored
    /// and the cursor moved to the first invalid step.
    pub fn begin_submission(&mut self, strict: bool) -> Result<Option<Draft>, FormError> {
        if !self.apply_validation(strict)? {
            return Ok(None);
        }
        self.state = SubmissionState::Submitting;
        self.pending_strict = strict;
        Ok(Some(self.draft.clone()))
    }

    /// Applies the submitter's answer to the in-flight submission.
    pub fn complete_submission(
        &mut self,
        result: Result<Value, SubmitError>,
    ) -> Result<SubmitAttempt, FormError> {
        if !self.is_submitting() {
            return Err(FormError::NotSubmitting);
        }

        let errors = match result {
            Ok(data) => {
                let identifier = data
                    .get(&self.options.identifier_field)
                    .filter(|id| !id.is_null())
                    .cloned();
                match identifier {
                    Some(id) => {
                        info!(id = %id, "submission accepted");
                        self.draft.set(&self.options.identifier_field, id);
                        return Ok(self.succeed());
                    }
                    None if !self.options.require_identifier => {
                        info!("submission accepted");
                        return Ok(self.succeed());
                    }
                    None => {
                        warn!("submission accepted without an identifier");
                        ErrorMap::global(self.options.default_error_message.clone())
                    }
                }
            }
            Err(SubmitError::Rejected(payload)) => {
                warn!(%payload, "submission rejected");
                let errors = payload.into_error_map(&self.steps, &self.draft);
                if errors.is_empty() {
                    ErrorMap::global(self.options.default_error_message.clone())
                } else {
                    errors
                }
            }
            Err(SubmitError::Transport(message)) => {
                warn!(%message, "submission transport failure");
                if message.is_empty() {
                    ErrorMap::global(self.options.default_error_message.clone())
                } else {
                    ErrorMap::global(message)
                }
            }
        };

        self.state = SubmissionState::Failed;
        self.errors = errors;
        self.go_to_first_invalid_step();
        Ok(SubmitAttempt::Failed)
    }

    fn succeed(&mut self) -> SubmitAttempt {
        self.state = SubmissionState::Succeeded;
        self.fully_validated = self.pending_strict;
        SubmitAttempt::Succeeded
    }

    /// Runs one full submission attempt against `submitter`.
    ///
    /// Local validation failures never reach the submitter. Nothing is retried.
    pub async fn submit<S: Submitter>(
        &mut self,
        strict: bool,
        submitter: &S,
    ) -> Result<SubmitAttempt, FormError> {
        let Some(snapshot) = self.begin_submission(strict)? else {
            return Ok(SubmitAttempt::NotSent);
        };
        let result = submitter.submit(&snapshot, strict).await;
        self.complete_submission(result)
    }

    // --- Accessors ---

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&FieldError> {
        self.errors.get_path(name)
    }

    pub fn global_error(&self) -> Option<&str> {
        self.errors.global_message()
    }

    pub fn steps(&self) -> &Steps {
        &self.steps
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current_step_name(&self) -> &str {
        self.steps
            .get(self.current_step)
            .map(|step| step.name.as_str())
            .unwrap_or_default()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.steps.last_index()
    }

    pub fn step_has_errors(&self, index: usize) -> bool {
        self.steps.step_has_errors(index, &self.errors)
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    pub fn outcome(&self) -> SubmissionOutcome {
        SubmissionOutcome {
            has_server_id: self
                .draft
                .identifier(&self.options.identifier_field)
                .is_some(),
            is_fully_validated: self.fully_validated,
        }
    }
}
