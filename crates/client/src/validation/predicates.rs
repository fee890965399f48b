//! Value predicates behind each rule kind.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// `local@label.label.tld` with a 2-4 character top-level label.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@([A-Za-z0-9_-]+\.)+[A-Za-z0-9_-]{2,4}$").expect("Invalid regex")
});

/// Ten consecutive digits anywhere in the input.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{10}").expect("Invalid regex"));

const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 32;

/// Returns false for null, `false`, `0` and `""`.
///
/// Arrays and objects are truthy even when empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Truthy, not whitespace-only, and not an empty array.
#[must_use]
pub fn is_present(value: &Value) -> bool {
    if !is_truthy(value) {
        return false;
    }
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

#[must_use]
pub fn is_email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}

#[must_use]
pub fn is_phone_number(input: &str) -> bool {
    PHONE_RE.is_match(input)
}

/// 8–32 characters on a single line, containing an ASCII digit, a lowercase
/// and an uppercase letter.
#[must_use]
pub fn is_strong_password(input: &str) -> bool {
    let len = input.chars().count();
    (PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len)
        && !input.contains(['\n', '\r', '\u{2028}', '\u{2029}'])
        && input.chars().any(|c| c.is_ascii_digit())
        && input.chars().any(|c| c.is_ascii_lowercase())
        && input.chars().any(|c| c.is_ascii_uppercase())
}

/// Text form of a value for the format checks. Non-strings use their JSON text.
pub(super) fn as_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(" ")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-1.5)));
    }

    #[test]
    fn test_present() {
        assert!(!is_present(&json!("  \t")));
        assert!(!is_present(&json!([])));
        assert!(is_present(&json!(["a"])));
        assert!(is_present(&json!(true)));
    }

    #[test]
    fn test_email() {
        assert!(is_email("user@example.com"));
        assert!(is_email("user.name-x@mail.example.vn"));
        assert!(!is_email("user@example"));
        assert!(!is_email("user@example.museum"));
        assert!(!is_email("us er@example.com"));
        assert!(!is_email("@example.com"));
    }

    #[test]
    fn test_phone_number() {
        assert!(is_phone_number("0987654321"));
        assert!(is_phone_number("+84 0987654321"));
        assert!(!is_phone_number("098765432"));
        assert!(!is_phone_number("0987 654 321"));
    }

    #[test]
    fn test_strong_password() {
        assert!(is_strong_password("Abcdefg1"));
        assert!(!is_strong_password("abc"));
        assert!(!is_strong_password("abcdefg1"));
        assert!(!is_strong_password("ABCDEFG1"));
        assert!(!is_strong_password("Abcdefgh"));
        assert!(!is_strong_password(&format!("Ab1{}", "x".repeat(30))));
        assert!(is_strong_password(&format!("Ab1{}", "x".repeat(29))));
        assert!(!is_strong_password("Abcd\nefg1"));
    }
}
