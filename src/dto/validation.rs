//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted display name, in characters.
pub const MAX_NAME_CHARS: usize = 64;

/// Keys of a history point that sit next to the flattened team columns.
pub const RESERVED_NAMES: [&str; 2] = ["time", "isRevealed"];

/// Validates a round or team display name: non-blank, bounded, no control characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Round 1")   // Ok
/// validate_display_name("   ")       // Err - blank
/// validate_display_name("a\tb")      // Err - control character
/// validate_display_name("time")      // Err - reserved history key
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("name_required");
        err.message = Some("name is required".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("name must be at most {MAX_NAME_CHARS} characters (got {chars})").into(),
        );
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("name_format");
        err.message = Some("name must not contain control characters".into());
        return Err(err);
    }

    if RESERVED_NAMES.contains(&trimmed) {
        let mut err = ValidationError::new("name_reserved");
        err.message = Some(format!("name `{trimmed}` is reserved").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("R1").is_ok());
        assert!(validate_display_name("Red Romans").is_ok());
        assert!(validate_display_name("  padded  ").is_ok());
        assert!(validate_display_name(&"x".repeat(MAX_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_display_name_blank() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn test_validate_display_name_invalid() {
        assert!(validate_display_name(&"x".repeat(MAX_NAME_CHARS + 1)).is_err());
        assert!(validate_display_name("a\tb").is_err());
        assert!(validate_display_name("line\nbreak").is_err());
    }

    #[test]
    fn test_validate_display_name_reserved() {
        assert!(validate_display_name("time").is_err());
        assert!(validate_display_name(" isRevealed ").is_err());
        assert!(validate_display_name("Time").is_ok());
    }
}
