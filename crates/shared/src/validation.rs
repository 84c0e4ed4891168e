//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a free-text checklist answer.
pub const MAX_ANSWER_LENGTH: usize = 2000;

lazy_static::lazy_static! {
    /// Club member slugs: letters, digits, underscore and dash.
    pub static ref USER_SLUG_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9_-]{1,32}$").unwrap();
}

/// Validates a club member slug.
pub fn validate_user_slug(slug: &str) -> Result<(), ValidationError> {
    if USER_SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug_format");
        err.message = Some("Slug must be 1-32 letters, digits, '_' or '-'".into());
        Err(err)
    }
}

/// Validates a checklist answer length. Empty answers are allowed and mean "clear".
pub fn validate_answer_value(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() <= MAX_ANSWER_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("answer_length");
        err.message = Some("Answer must be at most 2000 characters".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_slug() {
        assert!(validate_user_slug("vas3k").is_ok());
        assert!(validate_user_slug("Alice_B-2").is_ok());
        assert!(validate_user_slug("").is_err());
        assert!(validate_user_slug("has space").is_err());
        assert!(validate_user_slug("slash/slug").is_err());
        assert!(validate_user_slug(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_user_slug_error_message() {
        let err = validate_user_slug("nope!").unwrap_err();
        assert_eq!(err.code, "slug_format");
        assert!(err.message.unwrap().contains("Slug"));
    }

    #[test]
    fn test_validate_answer_value() {
        assert!(validate_answer_value("").is_ok());
        assert!(validate_answer_value("vegan").is_ok());
        assert!(validate_answer_value(&"я".repeat(MAX_ANSWER_LENGTH)).is_ok());
        assert!(validate_answer_value(&"x".repeat(MAX_ANSWER_LENGTH + 1)).is_err());
    }
}
