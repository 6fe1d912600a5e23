// Field-level validation errors shared by all request payloads

use std::collections::BTreeMap;

use serde::Serialize;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const MAX_TEXT_LENGTH: usize = 255;

/// Maps a field name to the list of problems found with it.
/// Serializes as `{ "field": ["message", ...] }`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field failure
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors: ValidationErrors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns `value` when no error has been recorded
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Checks a text field against the blank and length rules.
/// `required` decides whether an absent value is itself an error.
pub fn check_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    required: bool,
    allow_blank: bool,
) -> Option<String> {
    let Some(value) = value else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };

    let trimmed: &str = value.trim();
    if trimmed.is_empty() && !allow_blank {
        errors.add(field, BLANK);
        return None;
    }

    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_TEXT_LENGTH} characters."),
        );
        return None;
    }

    Some(trimmed.to_owned())
}
