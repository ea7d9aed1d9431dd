use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use shared_models::validation::REQUIRED;
use shared_models::FieldErrors;

use crate::params::{parse_date, parse_datetime};

/// Submitted HTML form values plus the parse errors collected while reading them.
#[derive(Debug, Clone, Default)]
pub struct FormInput {
    values: HashMap<String, String>,
    errors: FieldErrors,
}

impl FormInput {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values, errors: FieldErrors::new() }
    }

    pub fn raw(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn text(&self, name: &str) -> String {
        self.raw(name).to_string()
    }

    /// Unchecked boxes are simply absent from the submission.
    pub fn checkbox(&self, name: &str) -> bool {
        matches!(self.raw(name), "true" | "on" | "1")
    }

    pub fn parse<T: FromStr>(&mut self, name: &str, invalid: &str) -> Option<T> {
        let raw = self.raw(name).trim().to_string();
        if raw.is_empty() {
            self.errors.add(name, REQUIRED);
            return None;
        }
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.add(name, invalid);
                None
            }
        }
    }

    /// Blank values give `Ok(None)`; unparsable ones record `invalid`.
    pub fn parse_optional<T: FromStr>(&mut self, name: &str, invalid: &str) -> Option<Option<T>> {
        let raw = self.raw(name).trim().to_string();
        if raw.is_empty() {
            return Some(None);
        }
        match raw.parse() {
            Ok(value) => Some(Some(value)),
            Err(_) => {
                self.errors.add(name, invalid);
                None
            }
        }
    }

    pub fn date(&mut self, name: &str) -> Option<NaiveDate> {
        let raw = self.raw(name).trim().to_string();
        if raw.is_empty() {
            self.errors.add(name, REQUIRED);
            return None;
        }
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            self.errors.add(name, "Enter a valid date.");
        }
        parsed
    }

    pub fn optional_date(&mut self, name: &str) -> Option<Option<NaiveDate>> {
        if self.raw(name).trim().is_empty() {
            return Some(None);
        }
        self.date(name).map(Some)
    }

    pub fn datetime(&mut self, name: &str) -> Option<DateTime<Utc>> {
        let raw = self.raw(name).trim().to_string();
        if raw.is_empty() {
            self.errors.add(name, REQUIRED);
            return None;
        }
        let parsed = parse_datetime(&raw);
        if parsed.is_none() {
            self.errors.add(name, "Enter a valid date/time.");
        }
        parsed
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormInput {
        FormInput::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn missing_and_invalid_values_are_recorded() {
        let mut input = form(&[("stock", "lots"), ("laboratory_id", "")]);
        assert_eq!(input.parse::<i32>("stock", "Enter a whole number."), None);
        assert_eq!(input.parse::<i64>("laboratory_id", "Select a valid laboratory."), None);

        let errors = input.into_errors();
        assert_eq!(errors.get("stock"), ["Enter a whole number.".to_string()]);
        assert_eq!(errors.get("laboratory_id"), [REQUIRED.to_string()]);
    }

    #[test]
    fn optional_values_may_be_blank() {
        let mut input = form(&[("end_date", ""), ("stock", "12")]);
        assert_eq!(input.optional_date("end_date"), Some(None));
        assert_eq!(input.parse_optional::<i32>("stock", "bad"), Some(Some(12)));
        assert!(input.is_valid());
    }

    #[test]
    fn checkbox_reads_presence() {
        let input = form(&[("active", "true")]);
        assert!(input.checkbox("active"));
        assert!(!input.checkbox("requires_prescription"));
    }

    #[test]
    fn datetime_local_values_parse() {
        let mut input = form(&[("scheduled_at", "2025-06-01T09:15")]);
        let at = input.datetime("scheduled_at").unwrap();
        assert_eq!(at.to_rfc3339(), "2025-06-01T09:15:00+00:00");
    }
}
