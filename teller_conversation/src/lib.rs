#![warn(
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

//! Client-side conversation state for the banking assistant.
//!
//! [`SessionController`] owns the message timeline and the server session
//! id, sends one chat request at a time and publishes a
//! [`ConversationSnapshot`] after every change.
//!
//! # Key Features
//! - Optimistic user messages, settled as delivered or failed
//! - A synthesized apology reply and retryable error notice on failure
//! - Quick-action prompts that fill the input without sending
//! - Manual retry of failed messages

pub mod controller;
pub mod quick_action;
pub mod snapshot;
pub mod timeline;

pub use controller::{
    APOLOGY_TEXT, ControllerConfig, Feedback, OutboundRequest, PendingRequest, SessionController,
    Submission,
};
pub use quick_action::{QUICK_ACTIONS, QuickAction, quick_action};
pub use snapshot::{ConversationSnapshot, ErrorNotice, SEND_FAILED_NOTICE};
pub use timeline::{Timeline, TimelineStats};
