use thiserror::Error;

/// A required parameter was missing or blank.
///
/// Raised before any network or disk activity so callers can tell a bad
/// invocation apart from a remote failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// The named parameter was empty or contained only whitespace.
    #[error("Argument '{name}' must not be empty or whitespace")]
    Blank { name: &'static str },
}

/// Returns `value` unchanged when it contains at least one non-whitespace
/// character, otherwise [`ArgumentError::Blank`] naming `name`.
pub fn require_non_blank<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ArgumentError> {
    if value.trim().is_empty() {
        return Err(ArgumentError::Blank { name });
    }
    Ok(value)
}
