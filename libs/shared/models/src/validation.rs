use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const REQUIRED: &str = "This field is required.";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// Field-level validation messages, keyed by input field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Like `merge`, but skips fields that already carry a message.
    pub fn merge_unreported(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_insert(messages);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Trims `value` and records a message when it is blank or longer than `max_len`.
    pub fn required(&mut self, field: &str, value: &str, max_len: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, REQUIRED);
        } else {
            self.max_length(field, trimmed, max_len);
        }
        trimmed.to_string()
    }

    /// Like `required` but blank values are accepted.
    pub fn optional(&mut self, field: &str, value: &str, max_len: usize) -> String {
        let trimmed = value.trim();
        self.max_length(field, trimmed, max_len);
        trimmed.to_string()
    }

    pub fn max_length(&mut self, field: &str, value: &str, max_len: usize) {
        let len = value.chars().count();
        if len > max_len {
            self.add(
                field,
                format!("Ensure this value has at most {} characters (it has {}).", max_len, len),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str, required: bool) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            if required {
                self.add(field, REQUIRED);
            }
        } else if !is_valid_email(trimmed) {
            self.add(field, "Enter a valid email address.");
        }
        trimmed.to_string()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
