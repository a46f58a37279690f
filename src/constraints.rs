//! Local, synchronous validation of a draft.
//!
//! The controller only needs something implementing [`Validator`]. Pages with
//! ad-hoc logic can pass a closure; everything else can describe its rules
//! declaratively with [`Rule`]s collected into a [`ConstraintSet`], and combine
//! a lenient draft tier with a strict final tier in a [`FormValidator`].

use crate::draft::Draft;
use crate::feedback::ErrorMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::Date;
use time::macros::format_description;

pub const REQUIRED_MESSAGE: &str = "Ce champ est obligatoire";
pub const TOO_LONG_MESSAGE: &str =
    "La valeur de ce champ ne peut pas dépasser les %{count} caractères";
pub const TOO_SHORT_MESSAGE: &str = "La valeur de ce champ doit contenir au moins %{count} caractères";
pub const INCLUSION_MESSAGE: &str = "Veuillez choisir une des options.";
pub const DATE_MESSAGE: &str = "Saisissez une date valide";
pub const PHONE_MESSAGE: &str = "Saisissez un numéro de téléphone valide.";
pub const NUMBER_MESSAGE: &str = "Ce champ doit être un nombre";
pub const GREATER_THAN_MESSAGE: &str = "La valeur de ce champ doit être supérieure à %{count}";

/// The page-supplied validation collaborator.
///
/// `strict` selects the final constraint set instead of the lenient draft one.
/// Returns `None` when the draft is valid.
pub trait Validator {
    fn validate(&self, draft: &Draft, strict: bool) -> Option<ErrorMap>;
}

impl<F> Validator for F
where
    F: Fn(&Draft, bool) -> Option<ErrorMap>,
{
    fn validate(&self, draft: &Draft, strict: bool) -> Option<ErrorMap> {
        self(draft, strict)
    }
}

/// A single check on the value found at a field path.
///
/// Implement this for cross-field rules: the whole draft is available.
pub trait Constraint: Send + Sync {
    /// Returns the message to report, or `None` if `value` is acceptable.
    fn check(&self, value: Option<&Value>, draft: &Draft) -> Option<String>;
}

/// Built-in declarative rules. Deserializes from `{ "kind": "presence", ... }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Rule {
    Presence {
        #[serde(default, alias = "allowEmpty")]
        allow_empty: bool,
        message: Option<String>,
    },
    Length {
        minimum: Option<usize>,
        maximum: Option<usize>,
        #[serde(alias = "tooShort")]
        too_short: Option<String>,
        #[serde(alias = "tooLong")]
        too_long: Option<String>,
    },
    Inclusion {
        within: Vec<String>,
        message: Option<String>,
    },
    Date {
        message: Option<String>,
    },
    Phone {
        message: Option<String>,
    },
    Numericality {
        #[serde(alias = "greaterThan")]
        greater_than: Option<f64>,
        message: Option<String>,
    },
}

impl Rule {
    /// Required, and empty strings, lists and objects do not count as present.
    pub fn presence() -> Self {
        Rule::Presence {
            allow_empty: false,
            message: None,
        }
    }

    pub fn max_length(maximum: usize) -> Self {
        Rule::Length {
            minimum: None,
            maximum: Some(maximum),
            too_short: None,
            too_long: None,
        }
    }

    pub fn min_length(minimum: usize) -> Self {
        Rule::Length {
            minimum: Some(minimum),
            maximum: None,
            too_short: None,
            too_long: None,
        }
    }

    pub fn inclusion<I, S>(within: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::Inclusion {
            within: within.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    pub fn date() -> Self {
        Rule::Date { message: None }
    }

    pub fn phone() -> Self {
        Rule::Phone { message: None }
    }

    pub fn number() -> Self {
        Rule::Numericality {
            greater_than: None,
            message: None,
        }
    }

    pub fn greater_than(bound: f64) -> Self {
        Rule::Numericality {
            greater_than: Some(bound),
            message: None,
        }
    }

    /// Overrides the rule's message. For `length`, this replaces both bounds' messages.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        match &mut self {
            Rule::Presence { message, .. }
            | Rule::Inclusion { message, .. }
            | Rule::Date { message }
            | Rule::Phone { message }
            | Rule::Numericality { message, .. } => *message = Some(text),
            Rule::Length {
                too_short,
                too_long,
                ..
            } => {
                *too_short = Some(text.clone());
                *too_long = Some(text);
            }
        }
        self
    }
}

impl Constraint for Rule {
    fn check(&self, value: Option<&Value>, _draft: &Draft) -> Option<String> {
        if let Rule::Presence {
            allow_empty,
            message,
        } = self
        {
            let missing = match value {
                None | Some(Value::Null) => true,
                Some(value) => !allow_empty && is_empty(value),
            };
            return missing.then(|| message_or(message, REQUIRED_MESSAGE));
        }

        // Absent values are the presence rule's business.
        let value = value.filter(|value| !value.is_null() && !is_empty(value))?;

        match self {
            Rule::Presence { .. } => None,
            Rule::Length {
                minimum,
                maximum,
                too_short,
                too_long,
            } => {
                let count = value.as_str()?.chars().count();
                if let Some(max) = maximum.filter(|max| count > *max) {
                    return Some(with_count(&message_or(too_long, TOO_LONG_MESSAGE), max));
                }
                if let Some(min) = minimum.filter(|min| count < *min) {
                    return Some(with_count(&message_or(too_short, TOO_SHORT_MESSAGE), min));
                }
                None
            }
            Rule::Inclusion { within, message } => {
                let candidate = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (!within.contains(&candidate)).then(|| message_or(message, INCLUSION_MESSAGE))
            }
            Rule::Date { message } => {
                let valid = value.as_str().is_some_and(is_valid_date);
                (!valid).then(|| message_or(message, DATE_MESSAGE))
            }
            Rule::Phone { message } => {
                let valid = value.as_str().is_some_and(is_valid_phone);
                (!valid).then(|| message_or(message, PHONE_MESSAGE))
            }
            Rule::Numericality {
                greater_than,
                message,
            } => match as_number(value) {
                None => Some(message_or(message, NUMBER_MESSAGE)),
                Some(number) => match greater_than {
                    Some(bound) if number <= *bound => Some(match message {
                        Some(message) => message.clone(),
                        None => GREATER_THAN_MESSAGE.replace("%{count}", &bound.to_string()),
                    }),
                    _ => None,
                },
            },
        }
    }
}

fn message_or(message: &Option<String>, default: &str) -> String {
    message.clone().unwrap_or_else(|| default.to_string())
}

fn with_count(message: &str, count: usize) -> String {
    message.replace("%{count}", &count.to_string())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a `T` time part.
fn is_valid_date(text: &str) -> bool {
    let day = text.split('T').next().unwrap_or(text);
    Date::parse(day, format_description!("[year]-[month]-[day]")).is_ok()
}

/// An optional leading `+` then 9 to 15 digits, ignoring spaces, dots and dashes.
fn is_valid_phone(text: &str) -> bool {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    (9..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// An ordered list of constraints attached to field paths.
///
/// Only the first failing constraint of a path is reported, and a path is
/// skipped once one of its ancestors already failed.
#[derive(Default)]
pub struct ConstraintSet {
    entries: Vec<(String, Box<dyn Constraint>)>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from path-keyed rule lists, as found in a form definition file.
    pub fn from_rules(rules: BTreeMap<String, Vec<Rule>>) -> Self {
        rules
            .into_iter()
            .flat_map(|(path, rules)| rules.into_iter().map(move |rule| (path.clone(), rule)))
            .fold(Self::new(), |set, (path, rule)| set.rule(&path, rule))
    }

    pub fn rule(self, path: &str, rule: Rule) -> Self {
        self.with_custom(path, Box::new(rule))
    }

    /// Attaches an arbitrary constraint to `path`.
    pub fn with_custom(mut self, path: &str, constraint: Box<dyn Constraint>) -> Self {
        self.entries.push((path.to_string(), constraint));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether some constraint targets `path`.
    pub fn constrains(&self, path: &str) -> bool {
        self.entries.iter().any(|(target, _)| target == path)
    }

    /// Runs every constraint against `draft`, adding failures to `errors`.
    pub fn check_into(&self, draft: &Draft, errors: &mut ErrorMap) {
        for (path, constraint) in &self.entries {
            if errors.covers(path) {
                continue;
            }
            if let Some(message) = constraint.check(draft.get_path(path), draft) {
                errors.set_message(path, message);
            }
        }
    }

    pub fn check(&self, draft: &Draft) -> ErrorMap {
        let mut errors = ErrorMap::new();
        self.check_into(draft, &mut errors);
        errors
    }
}

/// A two-tier validator: the draft tier always runs, the strict tier is added
/// on top of it in strict mode. Per-item sets validate each element of a list
/// field in both modes.
///
/// Because the strict tier only ever adds constraints, a draft accepted by the
/// strict validator is always accepted by the lenient one.
#[derive(Default)]
pub struct FormValidator {
    draft: ConstraintSet,
    strict: ConstraintSet,
    items: Vec<(String, ConstraintSet)>,
}

impl FormValidator {
    pub fn new(draft: ConstraintSet, strict: ConstraintSet) -> Self {
        Self {
            draft,
            strict,
            items: Vec::new(),
        }
    }

    /// Validates every element of the list field `field` with `constraints`.
    pub fn with_items(mut self, field: &str, constraints: ConstraintSet) -> Self {
        self.items.push((field.to_string(), constraints));
        self
    }

    fn check_items(&self, draft: &Draft, errors: &mut ErrorMap) {
        for (field, constraints) in &self.items {
            let Some(Value::Array(elements)) = draft.get(field) else {
                continue;
            };
            let items: Vec<Option<ErrorMap>> = elements
                .iter()
                .map(|element| {
                    let item = Draft::from_value(element.clone());
                    let item_errors = constraints.check(&item);
                    (!item_errors.is_empty()).then_some(item_errors)
                })
                .collect();
            if items.iter().any(Option::is_some) {
                errors.set_items(field, items);
            }
        }
    }
}

impl Validator for FormValidator {
    fn validate(&self, draft: &Draft, strict: bool) -> Option<ErrorMap> {
        let mut errors = ErrorMap::new();
        self.draft.check_into(draft, &mut errors);
        if strict {
            self.strict.check_into(draft, &mut errors);
        }
        self.check_items(draft, &mut errors);
        (!errors.is_empty()).then_some(errors)
    }
}
