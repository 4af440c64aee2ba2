//! Input validation for author names.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Author name cannot be empty")]
    EmptyAuthor,

    #[error("Author name too short (minimum {min} characters)")]
    AuthorTooShort { min: usize },

    #[error("Author name too long (maximum {max} characters)")]
    AuthorTooLong { max: usize },

    #[error("Author name contains control characters")]
    ControlCharacters,
}

/// Length bounds applied to author names after trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorBounds {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for AuthorBounds {
    fn default() -> Self {
        Self {
            min_len: 2,
            max_len: 200,
        }
    }
}

/// Validate and normalize an author name.
///
/// Surrounding whitespace is trimmed and internal runs of whitespace are
/// collapsed to a single space. Length is measured in characters.
pub fn validate_author(name: &str, bounds: AuthorBounds) -> Result<String, ValidationError> {
    let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.is_empty() {
        return Err(ValidationError::EmptyAuthor);
    }

    if normalized.chars().any(|c| c.is_control()) {
        return Err(ValidationError::ControlCharacters);
    }

    let len = normalized.chars().count();
    if len < bounds.min_len {
        return Err(ValidationError::AuthorTooShort {
            min: bounds.min_len,
        });
    }
    if len > bounds.max_len {
        return Err(ValidationError::AuthorTooLong {
            max: bounds.max_len,
        });
    }

    Ok(normalized)
}
