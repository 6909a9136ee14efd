use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::util::{require_non_blank, ArgumentError};

/// Errors produced while decoding a Graph API response body.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body was empty or whitespace; nothing was decoded.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The body was not valid JSON for the requested record.
    #[error("Invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes a raw response body into a typed record.
///
/// Unknown fields are ignored and missing or `null` ones take their defaults,
/// so only structurally invalid text is an error. Decode into `Option<T>` to accept a
/// literal `null` body.
pub fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let raw = require_non_blank("jsonContent", raw)?;
    Ok(serde_json::from_str(raw)?)
}
