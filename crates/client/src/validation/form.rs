//! Error map and caller-side form state.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{Record, ValidationRule, validate};

/// Field name → human-readable error message.
///
/// A field without an entry is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

/// One entry of a 400 response body's `error` array.
#[derive(Debug, Deserialize)]
struct ServerFieldError {
    field: String,
    msg: String,
}

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Record a failure, replacing any earlier message for the field.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Iterate `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build an error map from a server response.
    ///
    /// Only a `400` whose body carries `error: [{ field, msg, .. }, ..]` is
    /// understood; any other status or shape yields an empty map.
    #[must_use]
    pub fn from_server_response(status: u16, body: &Value) -> Self {
        if status != 400 {
            return Self::default();
        }

        let Some(entries) = body.get("error").and_then(Value::as_array) else {
            return Self::default();
        };

        // The body is trusted only if its first entry has the expected shape
        let well_formed = entries
            .first()
            .is_some_and(|e| e.get("field").is_some() && e.get("msg").is_some());
        if !well_formed {
            return Self::default();
        }

        let mut errors = Self::default();
        for entry in entries {
            match ServerFieldError::deserialize(entry) {
                Ok(e) => errors.insert(e.field, e.msg),
                Err(e) => tracing::debug!(error = %e, "Skipping malformed server field error"),
            }
        }
        errors
    }
}

impl FromIterator<(String, String)> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Form state the UI keeps around a set of rules.
///
/// Nothing is validated while the user types until the first submit; from
/// then on every edit re-runs the rules so errors clear as they are fixed.
#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    rules: Vec<ValidationRule>,
    errors: ValidationErrors,
    validated: bool,
}

impl FormValidator {
    #[must_use]
    pub const fn new(rules: Vec<ValidationRule>) -> Self {
        Self {
            rules,
            errors: ValidationErrors(BTreeMap::new()),
            validated: false,
        }
    }

    /// Validate on submit. Returns true if the record is valid.
    pub fn submit(&mut self, record: &Record) -> bool {
        self.validated = true;
        self.run(record)
    }

    /// Re-validate after an edit, once the form has been submitted.
    ///
    /// Returns the current validity; before the first submit this is
    /// whatever the (empty) error map says.
    pub fn on_edit(&mut self, record: &Record) -> bool {
        if self.validated {
            self.run(record)
        } else {
            self.errors.is_empty()
        }
    }

    /// Replace the errors, e.g. with ones reported by the server.
    pub fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    #[must_use]
    pub const fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    #[must_use]
    pub const fn is_validated(&self) -> bool {
        self.validated
    }

    fn run(&mut self, record: &Record) -> bool {
        let report = validate(record, &self.rules);
        self.errors = report.errors;
        report.is_valid
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_edit_before_submit_does_not_validate() {
        let mut form = FormValidator::new(vec![ValidationRule::new("name", "Tên").required()]);
        assert!(form.on_edit(&record(json!({ "name": "" }))));
        assert!(form.errors().is_empty());
        assert!(!form.is_validated());
    }

    #[test]
    fn test_edit_after_submit_revalidates() {
        let mut form = FormValidator::new(vec![ValidationRule::new("name", "Tên").required()]);
        assert!(!form.submit(&record(json!({ "name": "" }))));
        assert_eq!(form.errors().get("name"), Some("Tên không được để trống"));

        assert!(form.on_edit(&record(json!({ "name": "Lan" }))));
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_server_errors_parsed_from_400() {
        let body = json!({
            "msg": "Bad request",
            "error": [
                { "field": "email", "value": "a@b.vn", "msg": "Email đã tồn tại" },
                { "field": "code", "value": "x", "msg": "Mã đã tồn tại" }
            ]
        });
        let errors = ValidationErrors::from_server_response(400, &body);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email"), Some("Email đã tồn tại"));
    }

    #[test]
    fn test_server_errors_other_shapes_are_empty() {
        let body = json!({ "msg": "Bad request", "error": "boom" });
        assert!(ValidationErrors::from_server_response(400, &body).is_empty());

        let body = json!({ "error": [{ "field": "email", "msg": "x" }] });
        assert!(ValidationErrors::from_server_response(500, &body).is_empty());

        let body = json!({ "error": [{ "message": "x" }] });
        assert!(ValidationErrors::from_server_response(400, &body).is_empty());
    }

    #[test]
    fn test_set_errors_replaces() {
        let mut form = FormValidator::new(Vec::new());
        form.set_errors([("email".to_string(), "taken".to_string())].into_iter().collect());
        assert_eq!(form.errors().get("email"), Some("taken"));
    }
}
