//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

pub const MAX_CODE_LENGTH: usize = 64;
pub const MAX_NAME_LENGTH: usize = 128;

/// Validate a scanned or typed external code.
///
/// Codes are compared after trimming, so surrounding whitespace from a
/// scanner is not an error here.
pub fn validate_external_code(code: &str) -> Result<(), String> {
    let code = code.trim();

    if code.is_empty() {
        return Err("Code is required".to_string());
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(format!(
            "Code must be at most {} characters long",
            MAX_CODE_LENGTH
        ));
    }

    static CODE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = CODE_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Failed to compile code regex"));

    if !regex.is_match(code) {
        return Err("Code can only contain letters, numbers, dashes and underscores".to_string());
    }

    Ok(())
}

/// Validate a person, group or organization name
pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(format!("{} is required", field));
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "{} must be at most {} characters long",
            field, MAX_NAME_LENGTH
        ));
    }

    Ok(())
}
