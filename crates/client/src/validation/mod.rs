//! Rule-based form validation.
//!
//! A form declares one [`ValidationRule`] per field. [`validate`] evaluates
//! them against a JSON record and produces a field → message map; a missing
//! key means the field is valid.
//!
//! # Evaluation order
//!
//! For each rule:
//! 1. An empty (falsy) value fails immediately with the "must not be empty"
//!    message, whatever kinds the rule lists.
//! 2. Otherwise the kinds run in declaration order and the first failing kind
//!    wins; later kinds for that field are not evaluated.
//!
//! Re-validating on every edit after the first submit is the caller's job;
//! see [`FormValidator`].
//!
//! # Example
//!
//! ```
//! use mart_client::validation::{ValidationRule, validate};
//! use serde_json::json;
//!
//! let rules = vec![
//!     ValidationRule::new("email", "Email").required().email(),
//!     ValidationRule::new("password", "Mật khẩu").password(),
//! ];
//! let data = json!({ "email": "khach@shop.vn", "password": "abc" });
//!
//! let report = validate(data.as_object().unwrap(), &rules);
//! assert!(!report.is_valid);
//! assert!(report.errors.get("email").is_none());
//! assert!(report.errors.get("password").is_some());
//! ```

mod form;
mod messages;
mod predicates;

pub use form::{FormValidator, ValidationErrors};
pub use predicates::{is_email, is_phone_number, is_present, is_strong_password, is_truthy};

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// The input record a form submits: field name → raw value.
pub type Record = serde_json::Map<String, Value>;

/// What a custom checker sees besides the value itself.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Name of the field being validated.
    pub field: &'a str,
    /// Human-readable field name used in messages.
    pub display_name: &'a str,
    /// The whole record, for cross-field checks.
    pub record: &'a Record,
}

type CheckFn = dyn Fn(&Value, &RuleContext<'_>) -> Option<String> + Send + Sync;

/// A caller-supplied check.
///
/// Returns `Some(message)` to fail the field. `None` or an empty message
/// means the value passes.
#[derive(Clone)]
pub struct CustomRule(Arc<CheckFn>);

impl CustomRule {
    /// Wrap a checker closure.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value, &RuleContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    fn check(&self, value: &Value, ctx: &RuleContext<'_>) -> Option<String> {
        (self.0)(value, ctx).filter(|msg| !msg.is_empty())
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(..)")
    }
}

/// A category of field check.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Non-empty, non-whitespace, non-empty-array.
    Required,
    /// Standard `local@domain.tld` grammar.
    Email,
    /// 8–32 characters with a lowercase letter, an uppercase letter and a digit.
    Password,
    /// Ten consecutive digits.
    PhoneNumber,
    /// Caller-supplied check.
    Custom(CustomRule),
}

impl RuleKind {
    /// Evaluate this kind against a non-empty value.
    fn check(&self, value: &Value, ctx: &RuleContext<'_>) -> Option<String> {
        let name = ctx.display_name;
        match self {
            Self::Required => (!is_present(value)).then(|| messages::empty(name)),
            Self::Email => (!is_email(&predicates::as_text(value))).then(|| messages::email(name)),
            Self::PhoneNumber => (!is_phone_number(&predicates::as_text(value)))
                .then(|| messages::phone_number(name)),
            Self::Password => (!is_strong_password(&predicates::as_text(value)))
                .then(|| messages::password(name)),
            Self::Custom(rule) => rule.check(value, ctx),
        }
    }
}

/// The checks declared for one field.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub field: String,
    pub display_name: String,
    pub kinds: Vec<RuleKind>,
}

impl ValidationRule {
    /// Start a rule for `field`, labelled `display_name` in messages.
    #[must_use]
    pub fn new(field: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            display_name: display_name.into(),
            kinds: Vec::new(),
        }
    }

    /// Append a rule kind.
    #[must_use]
    pub fn with(mut self, kind: RuleKind) -> Self {
        self.kinds.push(kind);
        self
    }

    #[must_use]
    pub fn required(self) -> Self {
        self.with(RuleKind::Required)
    }

    #[must_use]
    pub fn email(self) -> Self {
        self.with(RuleKind::Email)
    }

    #[must_use]
    pub fn password(self) -> Self {
        self.with(RuleKind::Password)
    }

    #[must_use]
    pub fn phone_number(self) -> Self {
        self.with(RuleKind::PhoneNumber)
    }

    /// Append a custom check.
    #[must_use]
    pub fn custom<F>(self, check: F) -> Self
    where
        F: Fn(&Value, &RuleContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.with(RuleKind::Custom(CustomRule::new(check)))
    }

    /// Evaluate this rule against `record`, returning the first error.
    #[must_use]
    pub fn evaluate(&self, record: &Record) -> Option<String> {
        let value = record.get(&self.field).unwrap_or(&Value::Null);
        if !is_truthy(value) {
            return Some(messages::empty(&self.display_name));
        }

        let ctx = RuleContext {
            field: &self.field,
            display_name: &self.display_name,
            record,
        };
        self.kinds.iter().find_map(|kind| kind.check(value, &ctx))
    }
}

/// Result of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: ValidationErrors,
}

/// Validate `record` against `rules`.
///
/// The result is recomputed from scratch; nothing is carried over between
/// calls. When two rules target the same field, the later failure wins.
#[must_use]
pub fn validate(record: &Record, rules: &[ValidationRule]) -> ValidationReport {
    let mut errors = ValidationErrors::default();
    for rule in rules {
        if let Some(message) = rule.evaluate(record) {
            errors.insert(rule.field.clone(), message);
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_empty_value_reports_empty_message_first() {
        let rules = vec![ValidationRule::new("email", "Email").required().email()];
        let report = validate(&record(json!({ "email": "" })), &rules);
        assert!(!report.is_valid);
        assert_eq!(
            report.errors.get("email"),
            Some("Email không được để trống")
        );
    }

    #[test]
    fn test_missing_field_is_empty_even_without_required() {
        let rules = vec![ValidationRule::new("phone", "Số điện thoại").phone_number()];
        let report = validate(&record(json!({})), &rules);
        assert_eq!(
            report.errors.get("phone"),
            Some("Số điện thoại không được để trống")
        );
    }

    #[test]
    fn test_whitespace_fails_required() {
        let rules = vec![ValidationRule::new("name", "Tên").required()];
        let report = validate(&record(json!({ "name": "   " })), &rules);
        assert_eq!(report.errors.get("name"), Some("Tên không được để trống"));
    }

    #[test]
    fn test_email_format() {
        let rules = vec![ValidationRule::new("email", "Email").required().email()];
        let bad = validate(&record(json!({ "email": "khach@shop" })), &rules);
        assert_eq!(bad.errors.get("email"), Some("Email sai định dạng email"));

        let good = validate(&record(json!({ "email": "khach@shop.vn" })), &rules);
        assert!(good.is_valid);
    }

    #[test]
    fn test_password_rule() {
        let rules = vec![ValidationRule::new("password", "Mật khẩu").password()];
        let weak = validate(&record(json!({ "password": "abc" })), &rules);
        assert_eq!(
            weak.errors.get("password"),
            Some("Mật khẩu cần từ 8 đến 32 ký tự bao gồm chữ, số, chữ in hoa")
        );

        let strong = validate(&record(json!({ "password": "Abcdefg1" })), &rules);
        assert!(strong.is_valid);
    }

    #[test]
    fn test_phone_number_rule() {
        let rules = vec![ValidationRule::new("phone", "SĐT").phone_number()];
        assert!(validate(&record(json!({ "phone": "0912345678" })), &rules).is_valid);
        assert_eq!(
            validate(&record(json!({ "phone": "09123" })), &rules)
                .errors
                .get("phone"),
            Some("SĐT sai định dạng số điện thoại")
        );
    }

    #[test]
    fn test_first_failure_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let rules = vec![
            ValidationRule::new("email", "Email")
                .email()
                .custom(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Some("unreachable".to_string())
                }),
        ];

        let report = validate(&record(json!({ "email": "not-an-email" })), &rules);
        assert_eq!(report.errors.get("email"), Some("Email sai định dạng email"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Once the earlier kind passes, the custom check does run
        let report = validate(&record(json!({ "email": "a@b.vn" })), &rules);
        assert_eq!(report.errors.get("email"), Some("unreachable"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_confirm_password_custom_rule() {
        let rules = vec![
            ValidationRule::new("password", "Mật khẩu").required().password(),
            ValidationRule::new("confirmPassword", "Xác nhận mật khẩu")
                .required()
                .custom(|value, ctx| {
                    (ctx.record.get("password") != Some(value))
                        .then(|| format!("{} không khớp", ctx.display_name))
                }),
        ];

        let mismatch = validate(
            &record(json!({ "password": "Abcdefg1", "confirmPassword": "Abcdefg2" })),
            &rules,
        );
        assert_eq!(
            mismatch.errors.get("confirmPassword"),
            Some("Xác nhận mật khẩu không khớp")
        );

        let matching = validate(
            &record(json!({ "password": "Abcdefg1", "confirmPassword": "Abcdefg1" })),
            &rules,
        );
        assert!(matching.is_valid);
    }

    #[test]
    fn test_custom_empty_message_passes() {
        let rules = vec![ValidationRule::new("code", "Mã").custom(|_, _| Some(String::new()))];
        assert!(validate(&record(json!({ "code": "SP01" })), &rules).is_valid);
    }

    #[test]
    fn test_custom_receives_field_and_name() {
        let rules = vec![ValidationRule::new("code", "Mã").custom(|value, ctx| {
            Some(format!("{}|{}|{}", ctx.field, ctx.display_name, value))
        })];
        let report = validate(&record(json!({ "code": "SP01" })), &rules);
        assert_eq!(report.errors.get("code"), Some("code|Mã|\"SP01\""));
    }

    #[test]
    fn test_no_rules_is_valid() {
        let report = validate(&record(json!({ "anything": 1 })), &[]);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_zero_number_is_empty() {
        let rules = vec![ValidationRule::new("price", "Giá")];
        let report = validate(&record(json!({ "price": 0 })), &rules);
        assert_eq!(report.errors.get("price"), Some("Giá không được để trống"));
        assert!(validate(&record(json!({ "price": 1000 })), &rules).is_valid);
    }
}
