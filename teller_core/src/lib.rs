#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Shared building blocks for the teller client: the message model, the
//! agent directory, the message formatter and the transport contract.

use async_trait::async_trait;

pub mod agent;
pub mod error;
pub mod format;
pub mod message;
pub mod wire;

pub use agent::{AgentColor, AgentDescriptor, AgentIcon, AgentTag, describe};
pub use error::TransportError;
pub use format::{
    LONG_MESSAGE_CHARS, Marks, Span, SpanKind, StructuredText, format, is_long, preview,
};
pub use message::{DeliveryState, Message, MessageId, Origin, SessionId};
pub use wire::{ChatReply, ChatRequest, HealthReport, SessionInfo, SessionMessage};

/// Request/reply contract with the remote messaging endpoint.
///
/// Implementations collapse every failure mode (connect, timeout, status,
/// decode) into a single [`TransportError`]; callers treat it as opaque.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

#[async_trait]
impl<T> Transport for std::sync::Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        (**self).send_message(request).await
    }
}
