use lazy_static::lazy_static;
use regex::Regex;
use crate::{Error, Result};

pub const SLUG_MAX_LENGTH: usize = 100;

lazy_static! {
    static ref SLUG_PATTERN: Regex = Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap();
}

/// Validate a slug and return its lowercase form.
pub fn validate_slug(value: &str, field: &str) -> Result<String> {
    if value.is_empty() {
        return Err(Error::validation(field, "cannot be empty"));
    }

    let normalized = value.to_lowercase();

    if normalized.chars().count() > SLUG_MAX_LENGTH {
        return Err(Error::validation(
            field,
            format!("cannot exceed {} characters", SLUG_MAX_LENGTH),
        ));
    }

    if !SLUG_PATTERN.is_match(&normalized) {
        return Err(Error::validation(
            field,
            "must contain only lowercase letters, numbers, hyphens, and underscores, \
             and must start with a letter or number",
        ));
    }

    Ok(normalized)
}

pub fn is_valid_slug(value: &str) -> bool {
    validate_slug(value, "value").is_ok()
}
