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

mod command;
mod render;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, HealthInput, HealthStrategy, InfoStrategy,
    InitStrategy, SessionInput, SessionStrategy, VersionStrategy,
};
use teller_config::Config;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser)]
#[command(name = "teller")]
#[command(about = "TBC Bank assistant chat client", long_about = None)]
struct Cli {
    /// Backend base URL, overriding the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// Customer id to chat as
        #[arg(short = 'c', long)]
        customer: Option<String>,

        /// Start without the greeting message
        #[arg(long)]
        no_greeting: bool,
    },
    /// Show a stored session and its messages
    Session {
        /// Session id returned by the backend
        session_id: String,
    },
    /// Check backend health
    Health {
        /// Poll with backoff until the backend answers
        #[arg(long)]
        wait: bool,
    },
    /// Initialize configuration
    Init,
    /// Show the effective configuration
    Info,
    /// Show version
    Version,
}

/// `RUST_LOG` when set, else the configured `log_level`, else `info`.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = Config::config_path()
            .ok()
            .filter(|path| path.exists())
            .and_then(|path| Config::from_path(&path).ok())
            .and_then(|config| config.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let api_url = cli.api_url;

    match cli.command {
        Commands::Chat {
            message,
            customer,
            no_greeting,
        } => {
            ChatStrategy
                .execute(ChatInput {
                    message,
                    customer,
                    no_greeting,
                    api_url,
                })
                .await?;
        }
        Commands::Session { session_id } => {
            SessionStrategy
                .execute(SessionInput {
                    session_id,
                    api_url,
                })
                .await?;
        }
        Commands::Health { wait } => {
            HealthStrategy
                .execute(HealthInput { wait, api_url })
                .await?;
        }
        Commands::Init => InitStrategy.execute(()).await?,
        Commands::Info => InfoStrategy.execute(()).await?,
        Commands::Version => VersionStrategy.execute(()).await?,
    }

    Ok(())
}
