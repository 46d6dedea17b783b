//! The append-only message sequence behind a conversation.

use serde::Serialize;
use teller_core::{AgentTag, DeliveryState, Message, MessageId, Origin};

/// Insertion-ordered list of messages.
///
/// Messages can be appended and user messages can be settled, but nothing is
/// ever removed or reordered. Ids come from an internal counter, so they
/// increase strictly with insertion order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    messages: Vec<Message>,
    last_id: u64,
}

impl Timeline {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            last_id: 0,
        }
    }

    const fn next_id(&mut self) -> MessageId {
        self.last_id += 1;
        MessageId::new(self.last_id)
    }

    fn push(&mut self, message: Message) -> MessageId {
        let id = message.id();
        self.messages.push(message);
        id
    }

    /// Append a user message in the `Sending` state.
    pub fn push_outgoing(&mut self, text: impl Into<String>) -> MessageId {
        let id = self.next_id();
        self.push(Message::outgoing(id, text))
    }

    pub fn push_reply(&mut self, text: impl Into<String>, agent: AgentTag) -> MessageId {
        let id = self.next_id();
        self.push(Message::reply(id, text, agent))
    }

    /// Append client-synthesized content, styled as `agent`.
    pub fn push_notice(&mut self, text: impl Into<String>, agent: AgentTag) -> MessageId {
        let id = self.next_id();
        self.push(Message::notice(id, text, agent))
    }

    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages
            .binary_search_by_key(&id, Message::id)
            .ok()
            .map(|index| &self.messages[index])
    }

    /// Settle the delivery state of a sending user message.
    pub fn settle(&mut self, id: MessageId, outcome: DeliveryState) -> bool {
        self.messages
            .binary_search_by_key(&id, Message::id)
            .is_ok_and(|index| self.messages[index].settle(outcome))
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Message counts over a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimelineStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub agent_messages: usize,
    pub system_messages: usize,
    pub failed_messages: usize,
    pub total_characters: usize,
}

impl TimelineStats {
    #[must_use]
    pub fn of(messages: &[Message]) -> Self {
        messages.iter().fold(Self::default(), |mut stats, msg| {
            stats.total_messages += 1;
            stats.total_characters += msg.text().chars().count();
            match msg.origin() {
                Origin::User => stats.user_messages += 1,
                Origin::Agent => stats.agent_messages += 1,
                Origin::System => stats.system_messages += 1,
            }
            if msg.delivery() == DeliveryState::Failed {
                stats.failed_messages += 1;
            }
            stats
        })
    }
}
