//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted side-to-move token.
pub const MAX_TURN_LENGTH: usize = 32;
/// Longest accepted player name in end/quit paths.
pub const MAX_PLAYER_LENGTH: usize = 64;

/// Validates that a token is non-blank and free of control characters.
///
/// # Examples
///
/// ```ignore
/// validate_token("black") // Ok
/// validate_token("   ")   // Err - blank
/// validate_token("a\nb")  // Err - control character
/// ```
pub fn validate_token(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("token_blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }

    if value.chars().any(char::is_control) {
        let mut err = ValidationError::new("token_format");
        err.message = Some("value must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
