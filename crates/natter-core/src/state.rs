//! UI-agnostic conversation types
//!
//! These are the values a rendering layer reads out of a
//! [`Conversation`](crate::Conversation). They don't depend on any UI framework.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation key for a single turn, unique within a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The role of a chat turn's author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Delivery status of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Pending,
    Sent,
    Failed,
}

impl TurnStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnStatus::Pending)
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: TurnId,
    pub role: ChatRole,
    pub content: String,
    pub status: TurnStatus,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role: ChatRole::User,
            content: content.into(),
            status: TurnStatus::Pending,
        }
    }

    /// An empty assistant turn standing in for a reply that hasn't arrived yet
    pub fn placeholder() -> Self {
        Self {
            id: TurnId::new(),
            role: ChatRole::Assistant,
            content: String::new(),
            status: TurnStatus::Pending,
        }
    }

    /// True for an assistant turn still waiting on its content.
    /// Renderers draw these as a typing indicator.
    pub fn is_placeholder(&self) -> bool {
        self.role == ChatRole::Assistant
            && self.content.is_empty()
            && self.status == TurnStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        assert!(ChatTurn::placeholder().is_placeholder());
        assert!(!ChatTurn::user("").is_placeholder());

        let mut reply = ChatTurn::placeholder();
        reply.content = "Hi!".to_string();
        assert!(!reply.is_placeholder());

        // An empty reply that arrived is not still typing
        let mut empty_reply = ChatTurn::placeholder();
        empty_reply.status = TurnStatus::Sent;
        assert!(!empty_reply.is_placeholder());
    }

    #[test]
    fn test_turn_serializes_lowercase() {
        let turn = ChatTurn::user("Hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["id"], turn.id.to_string());
    }

    #[test]
    fn test_only_pending_is_open() {
        assert!(!TurnStatus::Pending.is_terminal());
        assert!(TurnStatus::Sent.is_terminal());
        assert!(TurnStatus::Failed.is_terminal());
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(TurnId::new(), TurnId::new());
    }
}
