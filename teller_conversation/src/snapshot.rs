use serde::Serialize;
use teller_core::{Message, MessageId, SessionId};

use crate::timeline::TimelineStats;

/// Banner text shown after a failed submission.
pub const SEND_FAILED_NOTICE: &str = "Failed to send message. Please try again.";

/// Dismissible error surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotice {
    pub message: String,
    pub retryable: bool,
    /// The user message whose submission failed.
    pub failed_message: MessageId,
}

impl ErrorNotice {
    #[must_use]
    pub fn send_failed(failed_message: MessageId) -> Self {
        Self {
            message: SEND_FAILED_NOTICE.to_string(),
            retryable: true,
            failed_message,
        }
    }
}

/// Read-only copy of everything a view needs to render a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub session_id: Option<SessionId>,
    pub loading: bool,
    pub last_error: Option<ErrorNotice>,
    pub input: String,
    pub suggestions: Vec<String>,
}

impl ConversationSnapshot {
    #[must_use]
    pub fn stats(&self) -> TimelineStats {
        TimelineStats::of(&self.messages)
    }

    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|msg| msg.id() == id)
    }
}
