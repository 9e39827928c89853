use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use shared_models::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn require_email(email: &str) -> Result<(), AppError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::ValidationError("Invalid email address".to_string()))
    }
}

/// Minimum length in characters, after trimming.
pub fn require_min_len(field: &str, value: &str, min: usize) -> Result<(), AppError> {
    if value.trim().chars().count() < min {
        let unit = if min == 1 { "character" } else { "characters" };
        return Err(AppError::ValidationError(format!(
            "{} must be at least {} {}",
            field, min, unit
        )));
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

/// Empty strings become `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("patient@clinic.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn min_len_counts_trimmed_chars() {
        assert!(require_min_len("Name", "Al", 2).is_ok());
        assert_matches!(require_min_len("Name", " A ", 2), Err(AppError::ValidationError(msg)) if msg == "Name must be at least 2 characters");
    }

    #[test]
    fn dates_are_iso() {
        assert!(parse_date("2024-06-03").is_ok());
        assert!(parse_date("03/06/2024").is_err());
    }

    #[test]
    fn blank_optionals_collapse() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" x ".to_string())), Some("x".to_string()));
    }
}
