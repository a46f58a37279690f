use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;

/// The in-progress record being edited, keyed by field name.
///
/// Values are plain JSON so a draft can hold strings, numbers, booleans,
/// nested objects (`contact`, `bankAccount`) and lists (`attachments`) without
/// the form having to know their shape up front.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Draft {
    fields: Map<String, Value>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a draft from a JSON value. Anything other than an object yields an empty draft.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Parses a draft from a JSON object string.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    /// Loads a draft from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, DefinitionError> {
        let content = fs::read_to_string(path).map_err(|e| DefinitionError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Chainable insert, handy when seeding initial values.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Looks up a dotted path such as `contact.phone`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.fields.get(first)?, |value, segment| {
            value.as_object()?.get(segment)
        })
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Sets `parent.child`, replacing `parent` with an object if it held anything else.
    pub fn set_nested(&mut self, parent: &str, child: &str, value: impl Into<Value>) {
        let entry = self
            .fields
            .entry(parent.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(children) = entry {
            children.insert(child.to_string(), value.into());
        }
    }

    /// Deep-merges `overlay` into this draft: nested objects are merged key by key,
    /// every other value is replaced.
    ///
    /// Used to seed a blank form with a user's profile or a partially saved record.
    pub fn merge(&mut self, overlay: Draft) {
        merge_objects(&mut self.fields, overlay.fields);
    }

    /// The server-issued identifier stored under `field`, if any.
    pub fn identifier(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn merge_objects(current: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match value {
            Value::Object(incoming_inner) if current.get(&key).is_some_and(Value::is_object) => {
                if let Some(Value::Object(inner)) = current.get_mut(&key) {
                    merge_objects(inner, incoming_inner);
                }
            }
            value => {
                current.insert(key, value);
            }
        }
    }
}
