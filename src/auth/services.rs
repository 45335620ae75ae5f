use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^\S{1,100}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Normalize and check registration input. Returns the trimmed username.
pub(crate) fn validate_credentials(username: &str, password: &str) -> Result<String, AppError> {
    let username = username.trim();
    if !is_valid_username(username) {
        return Err(AppError::Validation(
            "Username must be 1 to 100 characters without spaces.".into(),
        ));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password is required.".into()));
    }
    Ok(username.to_string())
}
