//! JSON bodies exchanged with the chat endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::agent::AgentTag;
use crate::message::SessionId;

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub customer_id: String,
    /// `null` on the first turn; the server then opens a session.
    pub session_id: Option<SessionId>,
}

/// Successful reply to a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default = "unknown_agent", deserialize_with = "lenient_agent")]
    pub agent_name: AgentTag,
    pub session_id: SessionId,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub session_state: Option<serde_json::Value>,
}

const fn unknown_agent() -> AgentTag {
    AgentTag::Unknown
}

fn lenient_agent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AgentTag, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map_or(AgentTag::Unknown, |name| AgentTag::parse(&name)))
}

/// One stored exchange as returned by `GET /sessions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    pub timestamp: String,
}

/// Session metadata from `GET /sessions/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub customer_id: String,
    pub created_at: String,
    pub last_updated: String,
    #[serde(default)]
    pub state: serde_json::Value,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    #[serde(default)]
    pub operations_count: u32,
}

/// Liveness report from `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub database: serde_json::Value,
    #[serde(default)]
    pub services: HashMap<String, String>,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
