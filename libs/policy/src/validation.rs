//! Input validation utilities
//!
//! Validators return a human readable message that the services surface as a
//! `Validation` error.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// Validate an employee nickname (login handle)
pub fn validate_nickname(nickname: &str) -> Result<(), String> {
    if nickname.is_empty() {
        return Err("Nickname is required".to_string());
    }

    if nickname.len() < 3 {
        return Err("Nickname must be at least 3 characters long".to_string());
    }

    if nickname.len() > 32 {
        return Err("Nickname must be at most 32 characters long".to_string());
    }

    static NICKNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NICKNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.]+$").expect("Failed to compile nickname regex"));

    if !regex.is_match(nickname) {
        return Err(
            "Nickname can only contain letters, numbers, dots and underscores".to_string(),
        );
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a phone number: optional leading `+`, then 7 to 15 digits
pub fn validate_phone_number(phone: &str) -> Result<(), String> {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("Failed to compile phone regex"));

    if !regex.is_match(phone) {
        return Err("Invalid phone number format".to_string());
    }

    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_upper && has_lower && has_digit) {
        return Err(
            "Password must mix uppercase letters, lowercase letters and digits".to_string(),
        );
    }

    Ok(())
}

/// Parse a `HH:MM` company rule value
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("'{}' is not a HH:MM time", value))
}

/// Parse a `YYYY-MM-DD` query value
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a YYYY-MM-DD date", value))
}
