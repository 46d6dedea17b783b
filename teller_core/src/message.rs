//! Timeline entries and the identifiers attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentTag;

/// Locally unique message identifier.
///
/// Ids are handed out from a per-controller sequence, so creation order is
/// recoverable even when two messages share a wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Server-assigned conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Agent,
    /// Client-synthesized content, never received from the server.
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Sending,
    Delivered,
    Failed,
}

/// One entry in the conversation timeline.
///
/// Fields are private so the origin/agent/delivery combinations stay
/// consistent: only user messages carry a non-final delivery state, and
/// agent or system messages always carry an agent tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: MessageId,
    text: String,
    origin: Origin,
    agent: Option<AgentTag>,
    created_at: DateTime<Utc>,
    delivery: DeliveryState,
}

impl Message {
    /// A freshly typed user message, not yet acknowledged by the server.
    #[must_use]
    pub fn outgoing(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            origin: Origin::User,
            agent: None,
            created_at: Utc::now(),
            delivery: DeliveryState::Sending,
        }
    }

    #[must_use]
    pub fn reply(id: MessageId, text: impl Into<String>, agent: AgentTag) -> Self {
        Self {
            id,
            text: text.into(),
            origin: Origin::Agent,
            agent: Some(agent),
            created_at: Utc::now(),
            delivery: DeliveryState::Delivered,
        }
    }

    #[must_use]
    pub fn notice(id: MessageId, text: impl Into<String>, styled_as: AgentTag) -> Self {
        Self {
            id,
            text: text.into(),
            origin: Origin::System,
            agent: Some(styled_as),
            created_at: Utc::now(),
            delivery: DeliveryState::Delivered,
        }
    }

    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    #[must_use]
    pub const fn agent(&self) -> Option<&AgentTag> {
        self.agent.as_ref()
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn delivery(&self) -> DeliveryState {
        self.delivery
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self.origin, Origin::User)
    }

    /// Move a sending user message to `Delivered` or `Failed`.
    ///
    /// Returns `false` and leaves the message untouched for any other
    /// transition.
    pub fn settle(&mut self, outcome: DeliveryState) -> bool {
        let legal = self.is_user()
            && self.delivery == DeliveryState::Sending
            && outcome != DeliveryState::Sending;
        if legal {
            self.delivery = outcome;
        }
        legal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_starts_sending_without_agent() {
        let msg = Message::outgoing(MessageId::new(1), "Block my card");
        assert_eq!(msg.origin(), Origin::User);
        assert_eq!(msg.delivery(), DeliveryState::Sending);
        assert!(msg.agent().is_none());
    }

    #[test]
    fn test_agent_and_system_messages_are_delivered_and_tagged() {
        let reply = Message::reply(MessageId::new(2), "Done", AgentTag::CardOperations);
        let notice = Message::notice(MessageId::new(3), "Sorry", AgentTag::Support);

        assert_eq!(reply.delivery(), DeliveryState::Delivered);
        assert_eq!(reply.agent(), Some(&AgentTag::CardOperations));
        assert_eq!(notice.origin(), Origin::System);
        assert_eq!(notice.agent(), Some(&AgentTag::Support));
    }

    #[test]
    fn test_settle_only_moves_sending_user_messages_once() {
        let mut msg = Message::outgoing(MessageId::new(1), "hi");
        assert!(!msg.settle(DeliveryState::Sending));
        assert!(msg.settle(DeliveryState::Failed));
        assert!(!msg.settle(DeliveryState::Delivered));
        assert_eq!(msg.delivery(), DeliveryState::Failed);

        let mut reply = Message::reply(MessageId::new(2), "ok", AgentTag::Loan);
        assert!(!reply.settle(DeliveryState::Failed));
        assert_eq!(reply.delivery(), DeliveryState::Delivered);
    }

    #[test]
    fn test_message_ids_order_by_sequence() {
        assert!(MessageId::new(3) > MessageId::new(2));
        assert_eq!(MessageId::new(7).to_string(), "#7");
    }
}
