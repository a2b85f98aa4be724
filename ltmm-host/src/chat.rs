//! Chat log lookup.

use serde::{Deserialize, Serialize};

/// One message in the host's chat log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker name.
    #[serde(default)]
    pub name: String,
    /// Whether the user (rather than a character) sent it.
    #[serde(default)]
    pub is_user: bool,
    /// Message text.
    #[serde(default)]
    pub mes: String,
}

impl ChatMessage {
    /// A message sent by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            name: "User".to_string(),
            is_user: true,
            mes: text.into(),
        }
    }

    /// A message sent by a character.
    #[must_use]
    pub fn character(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_user: false,
            mes: text.into(),
        }
    }
}

/// Text of the most recent user-authored message, if any.
#[must_use]
pub fn last_user_message(chat: &[ChatMessage]) -> Option<&str> {
    chat.iter().rev().find(|m| m.is_user).map(|m| m.mes.as_str())
}
