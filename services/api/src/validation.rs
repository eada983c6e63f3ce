//! Input validation utilities

use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Longest value accepted by the `VARCHAR(255)` columns
pub const MAX_FIELD_LENGTH: usize = 255;

const MIN_PASSWORD_LENGTH: usize = 5;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Prices are stored as NUMERIC(5, 2)
const PRICE_DECIMAL_PLACES: u32 = 2;
const PRICE_MAX_WHOLE_DIGITS: u32 = 3;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("email: This field is required.".to_string());
    }

    if email.len() > MAX_FIELD_LENGTH {
        return Err(format!(
            "email: Ensure this field has no more than {} characters.",
            MAX_FIELD_LENGTH
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("email: Enter a valid email address.".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("password: This field is required.".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "password: Ensure this field has at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "password: Ensure this field has no more than {} characters.",
            MAX_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

/// Validate a required, non-blank text field of bounded length
pub fn validate_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{}: This field may not be blank.", field));
    }

    validate_optional_text(field, value)
}

/// Validate a text field that may be blank but is still bounded
pub fn validate_optional_text(field: &str, value: &str) -> Result<(), String> {
    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(format!(
            "{}: Ensure this field has no more than {} characters.",
            field, MAX_FIELD_LENGTH
        ));
    }

    Ok(())
}

/// Validate a price and return it at the stored scale.
///
/// Accepts at most 2 decimal places and 5 digits in total.
pub fn validate_price(price: Decimal) -> Result<Decimal, String> {
    let normalized = price.normalize();

    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "price: Ensure that there are no more than {} decimal places.",
            PRICE_DECIMAL_PLACES
        ));
    }

    let limit = Decimal::from(10_i64.pow(PRICE_MAX_WHOLE_DIGITS));
    if normalized.abs() >= limit {
        return Err(format!(
            "price: Ensure that there are no more than {} digits before the decimal point.",
            PRICE_MAX_WHOLE_DIGITS
        ));
    }

    let mut stored = normalized;
    stored.rescale(PRICE_DECIMAL_PLACES);
    Ok(stored)
}

/// Parse a comma separated list of ids such as `"1,2,3"`.
///
/// Returns `None` for an empty parameter, which means "no filter".
pub fn parse_id_list(field: &str, raw: &str) -> Result<Option<Vec<i64>>, String> {
    if raw.is_empty() {
        return Ok(None);
    }

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| format!("{}: '{}' is not a valid id.", field, part))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse an integer flag such as `assigned_only=1`; any non-zero value is true
pub fn parse_flag(field: &str, raw: Option<&str>) -> Result<bool, String> {
    match raw {
        None | Some("") => Ok(false),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| format!("{}: A valid integer is required.", field)),
    }
}

/// Drop repeated names, keeping the first occurrence of each
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("Test2@EXAMPLE.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("pass1").is_ok());
        assert!(validate_password("pw").is_err());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_text() {
        assert!(validate_text("title", "Soup").is_ok());
        assert!(validate_text("title", "   ").is_err());
        assert!(validate_text("title", &"a".repeat(256)).is_err());
        assert!(validate_optional_text("link", "").is_ok());
    }

    #[test]
    fn test_validate_price_rescales() {
        let price = validate_price(Decimal::from_str("5.5").unwrap()).unwrap();
        assert_eq!(price.to_string(), "5.50");

        let price = validate_price(Decimal::from_str("999.99").unwrap()).unwrap();
        assert_eq!(price.to_string(), "999.99");

        let price = validate_price(Decimal::from_str("2.500").unwrap()).unwrap();
        assert_eq!(price.to_string(), "2.50");
    }

    #[test]
    fn test_validate_price_rejects_out_of_range() {
        assert!(validate_price(Decimal::from_str("1.234").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("1000").unwrap()).is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("tags", "").unwrap(), None);
        assert_eq!(parse_id_list("tags", "1,2").unwrap(), Some(vec![1, 2]));
        assert_eq!(parse_id_list("tags", "3").unwrap(), Some(vec![3]));
        assert!(parse_id_list("tags", "1,abc").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("assigned_only", None).unwrap());
        assert!(!parse_flag("assigned_only", Some("0")).unwrap());
        assert!(parse_flag("assigned_only", Some("1")).unwrap());
        assert!(parse_flag("assigned_only", Some("yes")).is_err());
    }

    #[test]
    fn test_dedupe_names_keeps_first_occurrence() {
        let names = vec![
            "Indian".to_string(),
            "Breakfast".to_string(),
            "Indian".to_string(),
        ];
        assert_eq!(dedupe_names(names), vec!["Indian", "Breakfast"]);
    }
}
