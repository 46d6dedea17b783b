use colored::Colorize;
use teller_core::{AgentTag, SessionId, describe, preview};
use tracing::info;

use super::init_common_components;
use crate::render::terminal_safe;

/// Input parameters for the Session command strategy.
#[derive(Debug, Clone)]
pub struct SessionInput {
    pub session_id: String,
    /// Backend base URL override
    pub api_url: Option<String>,
}

/// Strategy for printing a stored session and its messages.
#[derive(Debug, Clone, Copy)]
pub struct SessionStrategy;

impl super::CommandStrategy for SessionStrategy {
    type Input = SessionInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components(input.api_url)?;
        let session_id = SessionId::new(input.session_id);

        info!("Fetching session {session_id}");
        let session = common.transport.get_session(&session_id).await?;

        println!("=== Session {} ===\n", session.session_id);
        println!("Customer: {}", session.customer_id);
        println!("Created: {}", session.created_at);
        println!("Last Updated: {}", session.last_updated);
        println!("Operations: {}", session.operations_count);
        println!("Messages: {}", session.messages.len());
        println!();

        for msg in &session.messages {
            let speaker = match msg.agent_name.as_deref() {
                Some(agent) if msg.role != "user" => {
                    let descriptor = describe(AgentTag::parse(agent));
                    format!("{} {}", descriptor.icon.glyph(), descriptor.display_name)
                }
                _ => terminal_safe(&msg.role).into_owned(),
            };
            println!(
                "{} {}  {}",
                terminal_safe(&msg.timestamp).dimmed(),
                speaker.bold(),
                terminal_safe(&preview(&msg.content, 80))
            );
        }

        Ok(())
    }
}
