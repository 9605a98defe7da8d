//! Structural checks run once per message before any per-key work.

use crate::core::{AlertType, Message};
use crate::errors::ValidationError;

/// Validates the required fields of a message.
///
/// Checks, in order: at least one key, a non-empty source, contents present
/// (an empty map is accepted, an absent one is not) and a recognised type.
///
/// # Returns
/// * `Ok(AlertType)` with the parsed classification
/// * `Err(ValidationError)` for the first failed check
pub fn validate_message(message: &Message) -> Result<AlertType, ValidationError> {
    if message.keys.is_empty() {
        return Err(ValidationError::NoKeys);
    }

    if message.source.is_empty() {
        return Err(ValidationError::EmptySource);
    }

    if message.contents.is_none() {
        return Err(ValidationError::MissingContents);
    }

    message
        .alert_type()
        .ok_or_else(|| ValidationError::InvalidType(message.kind.clone()))
}
