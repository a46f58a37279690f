use crate::draft::Draft;
use crate::feedback::{ErrorMap, FieldError, GLOBAL_FIELD};
use crate::steps::Steps;
use itertools::Itertools;
use serde_json::{Map, Value};
use std::fmt;

/// The error body returned by a server, normalized to three cases.
///
/// Servers answer with a bare string, a field-keyed object, a list of messages,
/// or nothing usable. `from_json` folds all of these into one of the variants
/// below before anything is merged into an [`ErrorMap`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ServerErrorPayload {
    GlobalMessage(String),
    FieldErrors(Map<String, Value>),
    #[default]
    None,
}

impl ServerErrorPayload {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(message) if !message.is_empty() => {
                ServerErrorPayload::GlobalMessage(message)
            }
            Value::Object(fields) if !fields.is_empty() => ServerErrorPayload::FieldErrors(fields),
            Value::Array(items) => items
                .into_iter()
                .find_map(|item| match item {
                    Value::String(message) if !message.is_empty() => Some(message),
                    _ => None,
                })
                .map_or(ServerErrorPayload::None, ServerErrorPayload::GlobalMessage),
            _ => ServerErrorPayload::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ServerErrorPayload::None)
    }

    /// Converts the payload into an Error Map for the given form.
    ///
    /// Top-level keys not owned by any step are relabeled to `global`. Inside a
    /// nested object, keys the draft does not know about are relabeled to that
    /// object's own `global` entry. When the draft holds no object for the
    /// parent there is nothing to compare against and nested keys are kept.
    pub fn into_error_map(self, steps: &Steps, draft: &Draft) -> ErrorMap {
        match self {
            ServerErrorPayload::GlobalMessage(message) => ErrorMap::global(message),
            ServerErrorPayload::FieldErrors(fields) => {
                let mut errors = ErrorMap::new();
                for (key, value) in fields {
                    let Some(error) = convert(&value, draft.get_path(&key)) else {
                        continue;
                    };
                    if !steps.owns(&key) {
                        if let Some(message) = error.first_message() {
                            errors.push_global(message);
                        }
                    } else if let Some((parent, path)) = key.split_once('.') {
                        insert_dotted(&mut errors, parent, path, error, draft);
                    } else {
                        errors.insert(&key, error);
                    }
                }
                errors
            }
            ServerErrorPayload::None => ErrorMap::new(),
        }
    }
}

impl fmt::Display for ServerErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerErrorPayload::GlobalMessage(message) => write!(f, "{}", message),
            ServerErrorPayload::FieldErrors(fields) => {
                write!(f, "errors on {}", fields.keys().join(", "))
            }
            ServerErrorPayload::None => write!(f, "no details"),
        }
    }
}

/// Converts one server value into a field error. `shape` is the matching draft
/// value, used to recognize nested keys.
fn convert(value: &Value, shape: Option<&Value>) -> Option<FieldError> {
    match value {
        Value::String(message) => Some(FieldError::Message(message.clone())),
        Value::Number(_) | Value::Bool(_) => Some(FieldError::Message(value.to_string())),
        Value::Null => None,
        Value::Array(elements) if elements.iter().any(Value::is_object) => {
            let shapes = shape.and_then(Value::as_array);
            let items = elements
                .iter()
                .enumerate()
                .map(|(index, element)| match element {
                    Value::Object(fields) => {
                        let item_shape = shapes.and_then(|s| s.get(index)).and_then(Value::as_object);
                        Some(convert_object(fields, item_shape))
                    }
                    _ => None,
                })
                .collect();
            Some(FieldError::Items {
                message: None,
                items,
            })
        }
        // A list of messages is reported by its first one.
        Value::Array(elements) => elements
            .iter()
            .find_map(|element| convert(element, None))
            .and_then(|error| error.first_message().map(FieldError::message)),
        Value::Object(fields) => Some(FieldError::Nested(convert_object(
            fields,
            shape.and_then(Value::as_object),
        ))),
    }
}

/// Records an error sent under a dotted key (`contact.phone`) as a nested entry
/// of its parent, so it is found and cleared like any other nested error.
fn insert_dotted(
    errors: &mut ErrorMap,
    parent: &str,
    path: &str,
    error: FieldError,
    draft: &Draft,
) {
    let child = path.split_once('.').map_or(path, |(head, _)| head);
    let known = child != GLOBAL_FIELD
        && draft
            .get(parent)
            .and_then(Value::as_object)
            .is_none_or(|shape| shape.contains_key(child));
    if known {
        errors.insert_path(&format!("{}.{}", parent, path), error);
    } else if let Some(message) = error.first_message() {
        errors.set_message(&format!("{}.{}", parent, GLOBAL_FIELD), message);
    }
}

fn convert_object(fields: &Map<String, Value>, shape: Option<&Map<String, Value>>) -> ErrorMap {
    let mut errors = ErrorMap::new();
    for (key, value) in fields {
        let Some(error) = convert(value, shape.and_then(|s| s.get(key))) else {
            continue;
        };
        let known = key != GLOBAL_FIELD && shape.is_none_or(|s| s.contains_key(key));
        if known {
            errors.insert(key, error);
        } else if let Some(message) = error.first_message() {
            errors.push_global(message);
        }
    }
    errors
}
