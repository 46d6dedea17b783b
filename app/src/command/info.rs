use teller_config::Config;
use teller_core::preview;

/// Strategy for displaying the effective configuration.
///
/// Reads the config file (or defaults) with environment overrides applied
/// and prints it with the bearer token masked.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load_or_default()?;

        println!("=== teller Configuration ===\n");

        println!("Config File:");
        let path = Config::config_path()?;
        let state = if path.exists() { "" } else { " (not found, using defaults)" };
        println!("  Path: {}{state}", path.display());
        println!();

        println!("API:");
        println!("  Base URL: {}", config.api.base_url);
        println!("  Token: {}", mask_token(config.api.auth_token.as_deref()));
        println!("  Timeout: {}s", config.api.timeout_secs);
        println!("  Read Attempts: {}", config.api.read_attempts);
        println!();

        println!("Customer:");
        println!("  ID: {}", config.customer.id);
        println!();

        println!("Chat:");
        match &config.chat.greeting {
            Some(greeting) => println!("  Greeting: {}", one_line(greeting, 60)),
            None => println!("  Greeting: (disabled)"),
        }
        println!("  Show Feedback: {}", config.chat.show_feedback);
        println!();

        println!(
            "Log Level: {}",
            config.log_level.as_deref().unwrap_or("info (default)")
        );

        Ok(())
    }
}

fn mask_token(token: Option<&str>) -> String {
    match token {
        None | Some("") => "(not set)".to_string(),
        Some(token) => {
            let count = token.chars().count();
            if count > 8 {
                let head: String = token.chars().take(4).collect();
                let tail: String = token.chars().skip(count - 4).collect();
                format!("{head}...{tail}")
            } else {
                "***".to_string()
            }
        }
    }
}

fn one_line(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    preview(&flat, max_chars).into_owned()
}
