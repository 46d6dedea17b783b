use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_GREETING: &str = "გამარჯობა! მე ვარ TBC ბანკის ვირტუალური ასისტენტი. როგორ შემიძლია დაგეხმაროთ?\n\nHello! I'm TBC Bank's virtual assistant. How can I help you today?";

const ENV_BASE_URL: &str = "TELLER_API_BASE_URL";
const ENV_TOKEN: &str = "TELLER_API_TOKEN";
const ENV_CUSTOMER: &str = "TELLER_CUSTOMER_ID";

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub customer: CustomerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default = "ApiConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts for read-only lookups (session, health).
    #[serde(default = "ApiConfig::default_read_attempts")]
    pub read_attempts: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            auth_token: None,
            timeout_secs: Self::default_timeout_secs(),
            read_attempts: Self::default_read_attempts(),
        }
    }
}

impl ApiConfig {
    fn default_base_url() -> String {
        "http://localhost:8000/api".to_string()
    }

    const fn default_timeout_secs() -> u64 {
        30
    }

    const fn default_read_attempts() -> usize {
        3
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CustomerConfig {
    #[serde(default = "CustomerConfig::default_id")]
    pub id: String,
}

impl Default for CustomerConfig {
    fn default() -> Self {
        Self {
            id: Self::default_id(),
        }
    }
}

impl CustomerConfig {
    fn default_id() -> String {
        "CUST001".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Opening message from the coordinator; `null` starts with an empty
    /// timeline.
    #[serde(default = "ChatConfig::default_greeting")]
    pub greeting: Option<String>,
    #[serde(default = "ChatConfig::default_show_feedback")]
    pub show_feedback: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: Self::default_greeting(),
            show_feedback: Self::default_show_feedback(),
        }
    }
}

impl ChatConfig {
    #[expect(
        clippy::unnecessary_wraps,
        reason = "serde default for an optional field"
    )]
    fn default_greeting() -> Option<String> {
        Some(DEFAULT_GREETING.to_string())
    }

    const fn default_show_feedback() -> bool {
        true
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("teller"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/teller/config.json` and apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'teller init' to create config.",
                config_path.display()
            );
        }

        let mut config = Self::from_path(&config_path)?;
        config.apply_env();
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            warn!(
                "No config at {}, using defaults (run 'teller init' to create one)",
                config_path.display()
            );
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config at {}: {e}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override file values with `TELLER_*` variables resolved by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_BASE_URL) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.api.auth_token = Some(token);
        }
        if let Some(id) = lookup(ENV_CUSTOMER) {
            self.customer.id = id;
        }
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let template = Self {
            api: ApiConfig {
                auth_token: Some("your-api-token-here".to_string()),
                ..ApiConfig::default()
            },
            log_level: Some("info".to_string()),
            ..Self::default()
        };
        std::fs::write(&config_path, serde_json::to_string_pretty(&template)?)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Set api.base_url to your chat backend");
        println!("   2. Put your bearer token in api.auth_token");
        println!("   3. Run 'teller chat' to start a conversation");
        println!();
        println!("🔧 Environment overrides:");
        println!("   - {ENV_BASE_URL}: backend base URL");
        println!("   - {ENV_TOKEN}: bearer token");
        println!("   - {ENV_CUSTOMER}: customer identifier");
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.customer.id, "CUST001");
        assert_eq!(config.chat.greeting.as_deref(), Some(DEFAULT_GREETING));
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_json(
            r#"{ "api": { "base_url": "https://bank.example/api" }, "chat": { "greeting": null } }"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://bank.example/api");
        assert_eq!(config.api.read_attempts, 3);
        assert!(config.chat.greeting.is_none());
        assert!(config.chat.show_feedback);
    }

    #[test]
    fn test_env_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = [
            ("TELLER_API_BASE_URL", "http://10.0.0.5:8000/api"),
            ("TELLER_API_TOKEN", "secret"),
            ("TELLER_CUSTOMER_ID", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.api.base_url, "http://10.0.0.5:8000/api");
        assert_eq!(config.api.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.customer.id, "CUST001");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Config::from_json("{ not json").is_err());
    }

    #[test]
    fn test_template_round_trips_through_serde() {
        let text = serde_json::to_string(&Config::default()).unwrap();
        assert_eq!(Config::from_json(&text).unwrap(), Config::default());
    }
}
