//! One-shot flash messages carried through the session.
//!
//! A handler pushes a message, the next page render pops the whole queue.
//! Messages survive exactly one redirect, which is how the cart and payment
//! flows report outcomes ("This item was added to your cart.", card decline
//! details, and so on).

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    #[must_use]
    pub fn new(level: FlashLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Append a flash message to the session queue.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push(
    session: &Session,
    level: FlashLevel,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut queue: Vec<FlashMessage> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    queue.push(FlashMessage::new(level, text));
    session.insert(session_keys::FLASH, &queue).await
}

/// Take all pending flash messages, clearing the queue.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take(session: &Session) -> Result<Vec<FlashMessage>, tower_sessions::session::Error> {
    let queue: Option<Vec<FlashMessage>> = session.remove(session_keys::FLASH).await?;
    Ok(queue.unwrap_or_default())
}

/// Shorthand for an info-level message.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn info(
    session: &Session,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashLevel::Info, text).await
}

/// Shorthand for a success-level message.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn success(
    session: &Session,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashLevel::Success, text).await
}

/// Shorthand for a warning-level message.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn warning(
    session: &Session,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashLevel::Warning, text).await
}

/// Shorthand for an error-level message.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn error(
    session: &Session,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashLevel::Error, text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_message_serde_roundtrip() {
        let message = FlashMessage::new(FlashLevel::Warning, "You do not have an active order");
        let json = serde_json::to_string(&message).expect("serialize");
        assert!(json.contains("\"warning\""));

        let back: FlashMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, message);
    }
}
