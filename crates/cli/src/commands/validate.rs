//! Offline validation command.
//!
//! # Usage
//!
//! ```bash
//! mart validate --rules rules.json --data form.json
//! ```
//!
//! The rules file is a JSON array of field declarations:
//!
//! ```json
//! [
//!   { "field": "email", "name": "Email", "rules": ["Required", "Email"] },
//!   { "field": "password", "name": "Mật khẩu", "rules": ["Password"] },
//!   { "field": "confirm", "name": "Xác nhận mật khẩu", "matches": "password" }
//! ]
//! ```
//!
//! `matches` adds a check that the field equals another field of the record.
//! The data file must be a JSON object.

use std::path::Path;

use mart_client::validation::{Record, ValidationReport, ValidationRule, validate};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while running the validator.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid JSON of the expected shape.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Some fields failed validation.
    #[error("{0} field(s) failed validation")]
    Invalid(usize),
}

/// A built-in rule kind, as named in the rules file.
#[derive(Debug, Clone, Copy, Deserialize)]
enum KindName {
    Required,
    Email,
    Password,
    PhoneNumber,
}

/// One field declaration from the rules file.
#[derive(Debug, Deserialize)]
struct FieldSpec {
    field: String,
    name: String,
    #[serde(default)]
    rules: Vec<KindName>,
    #[serde(default)]
    matches: Option<String>,
}

impl FieldSpec {
    fn into_rule(self) -> ValidationRule {
        let mut rule = ValidationRule::new(self.field, self.name);
        for kind in self.rules {
            rule = match kind {
                KindName::Required => rule.required(),
                KindName::Email => rule.email(),
                KindName::Password => rule.password(),
                KindName::PhoneNumber => rule.phone_number(),
            };
        }
        if let Some(other) = self.matches {
            rule = rule.custom(move |value, ctx| {
                (ctx.record.get(&other) != Some(value))
                    .then(|| format!("{} không khớp", ctx.display_name))
            });
        }
        rule
    }
}

/// Validate the record in `data` against the rules in `rules`.
///
/// # Errors
///
/// Returns an error if either file cannot be read or parsed, or if the
/// record fails validation.
pub fn run(rules: &Path, data: &Path) -> Result<(), ValidateError> {
    let specs: Vec<FieldSpec> = read_json(rules)?;
    let record: Record = read_json(data)?;

    let rules: Vec<ValidationRule> = specs.into_iter().map(FieldSpec::into_rule).collect();
    let report = validate(&record, &rules);
    print_report(&report);

    if report.is_valid {
        Ok(())
    } else {
        Err(ValidateError::Invalid(report.errors.len()))
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ValidateError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ValidateError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ValidateError::Json {
        path: display,
        source,
    })
}

#[allow(clippy::print_stdout)]
fn print_report(report: &ValidationReport) {
    if report.is_valid {
        println!("Valid");
        return;
    }
    for (field, message) in report.errors.iter() {
        println!("{field}: {message}");
    }
}
