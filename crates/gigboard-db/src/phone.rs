//! Canonical phone number grammar.
//!
//! The relaxed international form: an optional leading `+`, then digits
//! optionally broken up by spaces, dots, dashes or parentheses, with 7 to
//! 15 digits in total. `4155551234` and `+1 (415) 555-1234` are both
//! accepted; an empty string never is.

use once_cell::sync::Lazy;
use regex::Regex;

/// Shape check: optional `+`, leading digit, then digits and separators.
pub const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 ().-]*$";

const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(PHONE_PATTERN).expect("phone regex"));

/// Validate a phone number, returning the user-facing message on failure.
///
/// Applied on every write to a phone column (see the entity
/// `before_save` hooks) and again up front by the booking operations.
pub fn validate(value: &str) -> Result<(), String> {
    if value.is_empty() || !PHONE_RE.is_match(value) {
        return Err(format!("Invalid phone number format: {value}"));
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(format!("Invalid phone number format: {value}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ten_digit_number() {
        assert!(validate("4155551234").is_ok());
    }

    #[test]
    fn test_international_with_separators() {
        assert!(validate("+1 (415) 555-1234").is_ok());
        assert!(validate("415.555.1234").is_ok());
        assert!(validate("+44 20 7946 0958").is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate("").is_err());
    }

    #[test]
    fn test_letters_rejected() {
        assert!(validate("555-CALL-NOW").is_err());
    }

    #[test]
    fn test_digit_count_bounds() {
        // too few
        assert!(validate("123456").is_err());
        // lower bound
        assert!(validate("1234567").is_ok());
        // upper bound
        assert!(validate("123456789012345").is_ok());
        // too many
        assert!(validate("1234567890123456").is_err());
    }

    #[test]
    fn test_plus_must_lead_a_digit() {
        assert!(validate("+").is_err());
        assert!(validate("+-415").is_err());
    }

    #[test]
    fn test_failure_message_names_the_value() {
        let err = validate("bogus").unwrap_err();
        assert_eq!(err, "Invalid phone number format: bogus");
    }
}
