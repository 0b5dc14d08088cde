//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Validates username format.
///
/// Requirements:
/// - Only alphanumeric characters, underscores and hyphens
/// - 3-30 characters in length
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if !(3..=30).contains(&length) {
        return Err(ValidationError::new("username_invalid_length"));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::new("username_invalid_characters"));
    }

    Ok(())
}
