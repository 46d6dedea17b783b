//! Session controller: owns the timeline and session identity, and drives
//! chat submissions through a [`Transport`].

use std::fmt;
use std::sync::Arc;
use teller_core::{
    AgentTag, ChatReply, ChatRequest, DeliveryState, Message, MessageId, SessionId, Transport,
    TransportError,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::snapshot::{ConversationSnapshot, ErrorNotice};
use crate::timeline::Timeline;

/// Reply shown in place of the agent's answer when a submission fails.
pub const APOLOGY_TEXT: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again in a moment.";

/// Settings fixed for the lifetime of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub customer_id: String,
    /// Seeded as the first coordinator message when present.
    pub greeting: Option<String>,
}

impl ControllerConfig {
    #[must_use]
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            greeting: None,
        }
    }

    #[must_use]
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting.filter(|g| !g.trim().is_empty());
        self
    }
}

/// The single in-flight submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub message_id: MessageId,
}

/// A request accepted by [`SessionController::begin_submit`] that still has
/// to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub id: u64,
    pub message_id: MessageId,
    pub request: ChatRequest,
}

impl OutboundRequest {
    const fn pending(&self) -> PendingRequest {
        PendingRequest {
            id: self.id,
            message_id: self.message_id,
        }
    }
}

/// Outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank text, or another request was still pending. Nothing changed.
    Rejected,
    Delivered { user: MessageId, reply: MessageId },
    Failed { user: MessageId, notice: MessageId },
}

impl Submission {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Positive,
    Negative,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        })
    }
}

/// Conversation state machine: `Idle -> Submitting -> Idle`.
///
/// All mutation goes through `&mut self`, and every mutation publishes a
/// fresh [`ConversationSnapshot`] to subscribers. Transport failures are
/// folded into the timeline and `last_error`; no operation returns an error.
pub struct SessionController<T = Arc<dyn Transport>>
where
    T: Transport,
{
    transport: T,
    config: ControllerConfig,
    timeline: Timeline,
    session_id: Option<SessionId>,
    pending: Option<PendingRequest>,
    last_error: Option<ErrorNotice>,
    input: String,
    suggestions: Vec<String>,
    last_request: u64,
    publisher: watch::Sender<ConversationSnapshot>,
}

impl<T> SessionController<T>
where
    T: Transport,
{
    #[must_use]
    pub fn new(transport: T, config: ControllerConfig) -> Self {
        info!(
            "Creating session controller for customer: {}",
            config.customer_id
        );

        let mut timeline = Timeline::new();
        if let Some(greeting) = &config.greeting {
            timeline.push_reply(greeting.clone(), AgentTag::Coordinator);
        }

        let (publisher, _) = watch::channel(ConversationSnapshot::default());
        let controller = Self {
            transport,
            config,
            timeline,
            session_id: None,
            pending: None,
            last_error: None,
            input: String::new(),
            suggestions: Vec::new(),
            last_request: 0,
            publisher,
        };
        controller.publish();
        controller
    }

    /// Submit `text` and wait for the transport to answer.
    pub async fn submit_message(&mut self, text: &str) -> Submission {
        let outbound = self.begin_submit(text);
        self.drive(outbound).await
    }

    /// Submit the input buffer. The buffer is cleared only if the submission
    /// is accepted.
    pub async fn submit_input(&mut self) -> Submission {
        let outbound = self.begin_submit_input();
        self.drive(outbound).await
    }

    /// Resubmit the text of a failed user message as a new message.
    pub async fn retry(&mut self, message_id: MessageId) -> Submission {
        let outbound = self.begin_retry(message_id);
        self.drive(outbound).await
    }

    async fn drive(&mut self, outbound: Option<OutboundRequest>) -> Submission {
        let Some(outbound) = outbound else {
            return Submission::Rejected;
        };
        let outcome = self.transport.send_message(&outbound.request).await;
        self.finish(outbound.pending(), outcome)
    }

    /// First half of a submission: append the user message optimistically
    /// and hand back the request to send.
    ///
    /// Returns `None` without touching any state when `text` is blank or a
    /// request is already pending.
    pub fn begin_submit(&mut self, text: &str) -> Option<OutboundRequest> {
        let outbound = self.open_request(text)?;
        self.publish();
        Some(outbound)
    }

    pub fn begin_submit_input(&mut self) -> Option<OutboundRequest> {
        let text = std::mem::take(&mut self.input);
        let Some(outbound) = self.open_request(&text) else {
            self.input = text;
            return None;
        };
        self.publish();
        Some(outbound)
    }

    pub fn begin_retry(&mut self, message_id: MessageId) -> Option<OutboundRequest> {
        let text = self
            .timeline
            .get(message_id)
            .filter(|msg| msg.is_user() && msg.delivery() == DeliveryState::Failed)
            .map(|msg| msg.text().to_string());
        let Some(text) = text else {
            debug!("Ignoring retry of {message_id}: not a failed user message");
            return None;
        };
        info!("Retrying failed message {message_id}");
        self.begin_submit(&text)
    }

    /// Second half of a submission. An `id` that does not match the pending
    /// request is ignored and yields `None`.
    pub fn complete(
        &mut self,
        id: u64,
        outcome: Result<ChatReply, TransportError>,
    ) -> Option<Submission> {
        match self.pending {
            Some(pending) if pending.id == id => Some(self.finish(pending, outcome)),
            _ => {
                warn!("Ignoring completion for request {id}: not the pending request");
                None
            }
        }
    }

    fn open_request(&mut self, text: &str) -> Option<OutboundRequest> {
        if text.trim().is_empty() {
            return None;
        }
        if let Some(pending) = self.pending {
            debug!(
                "Dropping submission while request {} is pending",
                pending.id
            );
            return None;
        }

        self.last_request += 1;
        let message_id = self.timeline.push_outgoing(text);
        let outbound = OutboundRequest {
            id: self.last_request,
            message_id,
            request: ChatRequest {
                message: text.to_string(),
                customer_id: self.config.customer_id.clone(),
                session_id: self.session_id.clone(),
            },
        };
        self.last_error = None;
        self.pending = Some(outbound.pending());
        debug!("Opened request {} for message {message_id}", outbound.id);
        Some(outbound)
    }

    fn finish(
        &mut self,
        pending: PendingRequest,
        outcome: Result<ChatReply, TransportError>,
    ) -> Submission {
        self.pending = None;
        let submission = match outcome {
            Ok(reply) => {
                self.timeline
                    .settle(pending.message_id, DeliveryState::Delivered);
                self.adopt_session(reply.session_id);
                self.suggestions = reply.suggestions;
                let reply_id = self.timeline.push_reply(reply.response, reply.agent_name);
                Submission::Delivered {
                    user: pending.message_id,
                    reply: reply_id,
                }
            }
            Err(e) => {
                error!("Failed to send message {}: {e}", pending.message_id);
                self.timeline
                    .settle(pending.message_id, DeliveryState::Failed);
                let notice = self.timeline.push_notice(APOLOGY_TEXT, AgentTag::Support);
                self.last_error = Some(ErrorNotice::send_failed(pending.message_id));
                Submission::Failed {
                    user: pending.message_id,
                    notice,
                }
            }
        };
        self.publish();
        submission
    }

    fn adopt_session(&mut self, returned: SessionId) {
        match &self.session_id {
            None => {
                info!("Session established: {returned}");
                self.session_id = Some(returned);
            }
            Some(current) if *current != returned => {
                warn!("Server returned session {returned}, keeping {current}");
            }
            Some(_) => {}
        }
    }

    pub fn clear_error(&mut self) {
        if self.last_error.take().is_some() {
            self.publish();
        }
    }

    /// Place a quick-action prompt into the input buffer without sending it.
    pub fn accept_quick_action(&mut self, text: &str) {
        self.set_input(text);
    }

    pub fn set_input(&mut self, text: &str) {
        text.clone_into(&mut self.input);
        self.publish();
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Text of a message for the clipboard.
    #[must_use]
    pub fn copy_text(&self, message_id: MessageId) -> Option<&str> {
        let text = self.timeline.get(message_id).map(Message::text);
        if text.is_some() {
            debug!(target: "teller::telemetry", message_id = %message_id, "message copied");
        }
        text
    }

    /// Record a rating of a non-user message. Returns `false` for unknown ids
    /// and user messages.
    pub fn feedback(&self, message_id: MessageId, feedback: Feedback) -> bool {
        let Some(msg) = self.timeline.get(message_id).filter(|msg| !msg.is_user()) else {
            return false;
        };
        info!(
            target: "teller::telemetry",
            message_id = %message_id,
            agent = msg.agent().map_or("unknown", |tag| tag.as_str()),
            feedback = %feedback,
            "message feedback"
        );
        true
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.timeline.messages()
    }

    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<&ErrorNotice> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    #[must_use]
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.timeline.messages().to_vec(),
            session_id: self.session_id.clone(),
            loading: self.is_loading(),
            last_error: self.last_error.clone(),
            input: self.input.clone(),
            suggestions: self.suggestions.clone(),
        }
    }

    /// Receiver that always holds the latest snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.publisher.subscribe()
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}
