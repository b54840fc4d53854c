//! Field validation shared by the services
//!
//! Every check returns `RegistryError::InvalidInput` naming the field, so the
//! client can point at the offending input.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::RegistryError;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
    })
}

/// Philippine mobile (09XXXXXXXXX / +639XXXXXXXXX) or landline with area code
fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?:\+63|0)9\d{9}|\(?0\d{1,2}\)?\d{7,8})$").expect("phone pattern is valid")
    })
}

fn invalid(field: &str, reason: impl std::fmt::Display) -> RegistryError {
    RegistryError::InvalidInput(format!("{} {}", field, reason))
}

/// Non-blank after trimming
pub fn required(field: &str, value: &str) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "is required"));
    }
    Ok(())
}

/// Bounded length, counted in characters
pub fn max_len(field: &str, value: &str, max: usize) -> Result<(), RegistryError> {
    if value.chars().count() > max {
        return Err(invalid(field, format!("must be at most {} characters", max)));
    }
    Ok(())
}

/// Membership in a status or category vocabulary
pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), RegistryError> {
    if !allowed.contains(&value) {
        return Err(invalid(
            field,
            format!("must be one of {} (got {})", allowed.join(", "), value),
        ));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> Result<(), RegistryError> {
    if !email_regex().is_match(value.trim()) {
        return Err(invalid(field, "is not a valid email address"));
    }
    Ok(())
}

/// Spaces and dashes are ignored
pub fn phone(field: &str, value: &str) -> Result<(), RegistryError> {
    let compact: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !phone_regex().is_match(&compact) {
        return Err(invalid(field, "is not a valid phone number"));
    }
    Ok(())
}

/// Calendar date, YYYY-MM-DD
pub fn date(field: &str, value: &str) -> Result<NaiveDate, RegistryError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(field, "must be a date in YYYY-MM-DD format"))
}

/// Date or date-time (YYYY-MM-DD, YYYY-MM-DDTHH:MM[:SS][Z])
pub fn date_or_datetime(field: &str, value: &str) -> Result<(), RegistryError> {
    let value = value.trim();
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Ok(());
    }
    let bare = value.trim_end_matches('Z');
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if NaiveDateTime::parse_from_str(bare, format).is_ok() {
            return Ok(());
        }
    }
    if chrono::DateTime::parse_from_rfc3339(value).is_ok() {
        return Ok(());
    }
    Err(invalid(field, "must be a date or date-time"))
}

pub fn non_negative(field: &str, value: f64) -> Result<(), RegistryError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, "must be zero or more"));
    }
    Ok(())
}

pub fn positive(field: &str, value: f64) -> Result<(), RegistryError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(())
}

pub fn in_range(field: &str, value: i32, min: i32, max: i32) -> Result<(), RegistryError> {
    if value < min || value > max {
        return Err(invalid(field, format!("must be between {} and {}", min, max)));
    }
    Ok(())
}

/// Apply `check` to an optional value
pub fn optional<T: ?Sized>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> Result<(), RegistryError>,
) -> Result<(), RegistryError> {
    match value {
        Some(v) => check(v),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_vocab() {
        assert!(required("street", "  ").is_err());
        assert!(required("street", "Rizal St.").is_ok());
        assert!(one_of("gender", "MALE", &["MALE", "FEMALE"]).is_ok());
        let err = one_of("gender", "X", &["MALE", "FEMALE"]).unwrap_err();
        assert!(err.to_string().contains("gender"));
    }

    #[test]
    fn test_email() {
        assert!(email("email", "kap@barangay.gov.ph").is_ok());
        assert!(email("email", "not-an-email").is_err());
        assert!(email("email", "a@b").is_err());
    }

    #[test]
    fn test_phone() {
        assert!(phone("contactNumber", "09171234567").is_ok());
        assert!(phone("contactNumber", "+63 917-123-4567").is_ok());
        assert!(phone("contactNumber", "(02)87654321").is_ok());
        assert!(phone("contactNumber", "12345").is_err());
    }

    #[test]
    fn test_dates_and_ranges() {
        assert!(date("birthDate", "1990-02-28").is_ok());
        assert!(date("birthDate", "1990-02-30").is_err());
        assert!(date_or_datetime("scheduledAt", "2024-06-01T09:30").is_ok());
        assert!(date_or_datetime("scheduledAt", "2024-06-01T09:30:00Z").is_ok());
        assert!(date_or_datetime("scheduledAt", "next week").is_err());
        assert!(in_range("progress", 101, 0, 100).is_err());
        assert!(non_negative("amount", -1.0).is_err());
        assert!(positive("amount", 0.0).is_err());
    }
}
