//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use std::sync::Arc;
use teller_config::Config;
use teller_transport::{Backoff, HttpTransport};
use tracing::info;

mod chat;
mod health;
mod info;
mod init;
mod session;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use health::{HealthInput, HealthStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use session::{SessionInput, SessionStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```rust,ignore
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Config and transport shared by commands that talk to the backend.
pub struct CommonComponents {
    pub config: Config,
    pub transport: Arc<HttpTransport>,
}

/// Load config (defaults when no file exists) and build the HTTP transport.
///
/// `api_url` overrides the configured base URL.
fn init_common_components(api_url: Option<String>) -> anyhow::Result<CommonComponents> {
    let mut config = Config::load_or_default()?;
    if let Some(url) = api_url {
        config.api.base_url = url;
    }

    let transport = HttpTransport::new(&config.api.base_url, config.api.timeout())?
        .with_auth_token(config.api.auth_token.clone())
        .with_read_backoff(Backoff::standard(config.api.read_attempts));
    info!(
        "Using backend {} as customer {}",
        transport.base_url(),
        config.customer.id
    );

    Ok(CommonComponents {
        config,
        transport: Arc::new(transport),
    })
}
