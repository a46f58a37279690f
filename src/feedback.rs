use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;

/// Reserved pseudo-field for form-wide errors. It belongs to no step.
pub const GLOBAL_FIELD: &str = "global";

/// The error state recorded for a single field.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldError {
    /// A single human-readable message.
    Message(String),
    /// A list-valued field. The field itself may carry a message, and each
    /// item has its own error state aligned by index with the draft array.
    Items {
        message: Option<String>,
        items: Vec<Option<ErrorMap>>,
    },
    /// Errors keyed by the sub-fields of an object-valued field (`contact.phone`).
    Nested(ErrorMap),
}

impl FieldError {
    pub fn message(message: impl Into<String>) -> Self {
        FieldError::Message(message.into())
    }

    /// Whether this entry marks its field as invalid.
    pub fn is_set(&self) -> bool {
        match self {
            FieldError::Message(message) => !message.is_empty(),
            FieldError::Items { message, items } => {
                message.as_ref().is_some_and(|m| !m.is_empty())
                    || items.iter().flatten().any(|item| !item.is_empty())
            }
            FieldError::Nested(map) => !map.is_empty(),
        }
    }

    /// The first message found in this entry, searching depth-first.
    pub fn first_message(&self) -> Option<&str> {
        match self {
            FieldError::Message(message) if !message.is_empty() => Some(message.as_str()),
            FieldError::Message(_) => None,
            FieldError::Items { message, items } => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .or_else(|| items.iter().flatten().find_map(ErrorMap::first_message)),
            FieldError::Nested(map) => map.first_message(),
        }
    }

    /// Drops empty nested entries. Per-item slots are kept so indices stay aligned.
    fn prune(&mut self) {
        match self {
            FieldError::Message(_) => {}
            FieldError::Items { items, .. } => {
                for slot in items.iter_mut() {
                    if let Some(map) = slot.as_mut() {
                        map.prune();
                    }
                    if slot.as_ref().is_some_and(ErrorMap::is_empty) {
                        *slot = None;
                    }
                }
            }
            FieldError::Nested(map) => map.prune(),
        }
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        FieldError::Message(message.to_string())
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        FieldError::Message(message)
    }
}

/// Field-name-keyed record of validation and server error state.
///
/// An absent key means the field is valid. Entries that carry nothing (an empty
/// message, an empty nested map, a list whose items all passed) are pruned on
/// insertion so that `has_error` is a reliable check.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ErrorMap {
    entries: AHashMap<String, FieldError>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding only a form-wide message.
    pub fn global(message: impl Into<String>) -> Self {
        let mut map = Self::new();
        map.insert(GLOBAL_FIELD, FieldError::Message(message.into()));
        map
    }

    /// Chainable insert.
    pub fn with(mut self, name: &str, error: impl Into<FieldError>) -> Self {
        self.insert(name, error.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.entries.values().any(FieldError::is_set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&FieldError> {
        self.entries.get(name).filter(|error| error.is_set())
    }

    /// Looks up a dotted path such as `contact.phone`.
    pub fn get_path(&self, path: &str) -> Option<&FieldError> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let entry = self.get(head)?;
        match (entry, rest) {
            (_, None) => Some(entry),
            (FieldError::Nested(map), Some(rest)) => map.get_path(rest),
            _ => None,
        }
    }

    pub fn has_error(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `path` or any of its ancestors already records an error.
    pub fn covers(&self, path: &str) -> bool {
        let mut prefix = String::new();
        for segment in path.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            match self.get_path(&prefix) {
                Some(FieldError::Nested(_)) => continue,
                Some(_) => return true,
                None => return false,
            }
        }
        self.get_path(path).is_some()
    }

    /// The message of the `global` pseudo-field.
    pub fn global_message(&self) -> Option<&str> {
        self.get(GLOBAL_FIELD).and_then(FieldError::first_message)
    }

    pub fn first_message(&self) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(_, error)| error.is_set())
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .find_map(|(_, error)| error.first_message())
    }

    /// Inserts an entry, or removes the key when `error` carries nothing.
    pub fn insert(&mut self, name: &str, mut error: FieldError) {
        error.prune();
        if error.is_set() {
            self.entries.insert(name.to_string(), error);
        } else {
            self.entries.remove(name);
        }
    }

    /// Records `message` under a dotted path, creating nested maps as needed.
    ///
    /// If an ancestor already holds a plain message, that message wins and the
    /// nested one is dropped.
    pub fn set_message(&mut self, path: &str, message: impl Into<String>) {
        self.insert_path(path, FieldError::Message(message.into()));
    }

    /// Inserts `error` under a dotted path, merging into existing nested maps.
    /// An ancestor holding a plain message or a list error is left untouched.
    pub fn insert_path(&mut self, path: &str, error: FieldError) {
        match path.split_once('.') {
            None => self.insert(path, error),
            Some((head, rest)) => match self.entries.get_mut(head) {
                Some(FieldError::Nested(map)) => map.insert_path(rest, error),
                Some(existing) if existing.is_set() => {}
                _ => {
                    let mut nested = ErrorMap::new();
                    nested.insert_path(rest, error);
                    self.insert(head, FieldError::Nested(nested));
                }
            },
        }
    }

    /// Attaches per-item errors to a list field, keeping any message the field
    /// itself already carries (the two-tier shape).
    pub fn set_items(&mut self, name: &str, items: Vec<Option<ErrorMap>>) {
        let message = match self.entries.remove(name) {
            Some(FieldError::Message(message)) => Some(message),
            Some(FieldError::Items { message, .. }) => message,
            _ => None,
        };
        self.insert(name, FieldError::Items { message, items });
    }

    /// Appends a form-wide message, joining it to any existing one with a newline.
    pub fn push_global(&mut self, message: &str) {
        if message.is_empty() {
            return;
        }
        let combined = match self.global_message() {
            Some(existing) if existing.lines().any(|line| line == message) => return,
            Some(existing) => [existing, message].iter().join("\n"),
            None => message.to_string(),
        };
        self.insert(GLOBAL_FIELD, FieldError::Message(combined));
    }

    /// Removes the error recorded for `name`.
    pub fn clear(&mut self, name: &str) -> Option<FieldError> {
        self.entries.remove(name)
    }

    /// Removes `parent.child`, preserving sibling errors. When no sibling error
    /// remains the parent entry is removed instead of being left empty. A plain
    /// message on the parent is cleared too, since the parent is being edited.
    pub fn clear_nested(&mut self, parent: &str, child: &str) {
        let remove_parent = match self.entries.get_mut(parent) {
            Some(FieldError::Nested(map)) => {
                map.clear(child);
                map.prune();
                map.is_empty()
            }
            Some(FieldError::Message(_)) => true,
            Some(FieldError::Items { .. }) | None => false,
        };
        if remove_parent {
            self.entries.remove(parent);
        }
    }

    /// Removes the per-item error at `index` of a list field, shifting later
    /// entries down by one. Other items are not revalidated.
    pub fn dismiss_item(&mut self, name: &str, index: usize) {
        if !matches!(self.entries.get(name), Some(FieldError::Items { .. })) {
            return;
        }
        let Some(FieldError::Items { message, items }) = self.entries.remove(name) else {
            return;
        };
        let items = items
            .into_iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, item)| item)
            .collect();
        self.insert(name, FieldError::Items { message, items });
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Recursively removes entries that carry nothing.
    pub fn prune(&mut self) {
        for error in self.entries.values_mut() {
            error.prune();
        }
        self.entries.retain(|_, error| error.is_set());
    }

    /// Names of the fields holding an error, sorted for stable output.
    pub fn fields(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, error)| error.is_set())
            .map(|(name, _)| name.as_str())
            .sorted()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.entries
            .iter()
            .filter(|(_, error)| error.is_set())
            .map(|(name, error)| (name.as_str(), error))
    }
}
