use anyhow::{Context, Result};
use command_center_core::storage::redb_store::DEFAULT_HEARTBEAT_WINDOW_SECS;
use command_center_core::{
    BackgroundTasks, NoopNotifier, Notifier, RedbStore, Store, WebhookNotifier,
};
use command_center_mcp::McpServer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

fn default_db_file() -> String {
    "command-center.redb".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: default_db_file(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret agents present as a bearer token or `?key=`
    #[serde(default)]
    pub mcp_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook receiving urgent-task and inbox notifications
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Link back to the dashboard included in every notification
    #[serde(default)]
    pub dashboard_url: String,

    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_notify_timeout_secs() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            dashboard_url: String::new(),
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_heartbeat_stale_secs")]
    pub heartbeat_stale_secs: i64,
}

fn default_heartbeat_stale_secs() -> i64 {
    DEFAULT_HEARTBEAT_WINDOW_SECS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            heartbeat_stale_secs: default_heartbeat_stale_secs(),
        }
    }
}

/// Values from the command line or environment, which win over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub mcp_secret: Option<String>,
    pub webhook_url: Option<String>,
    pub dashboard_url: Option<String>,
}

impl ServerConfig {
    pub fn load(config_path: &Path, data_dir: PathBuf) -> Result<Self> {
        // Create data directory if it doesn't exist
        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        // Load config file if it exists, otherwise use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            Self::parse(&content)?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        config.data_dir = data_dir;

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration file")
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(secret) = overrides.mcp_secret {
            self.auth.mcp_secret = Some(secret);
        }
        if let Some(url) = overrides.webhook_url {
            self.notify.webhook_url = Some(url);
        }
        if let Some(url) = overrides.dashboard_url {
            self.notify.dashboard_url = url;
        }
    }

    /// Get the database file path
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.db_file)
    }

    /// The configured secret, treating an empty string as unset
    pub fn mcp_secret(&self) -> Option<&str> {
        self.auth.mcp_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.notify.webhook_url.as_deref().filter(|s| !s.is_empty())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub background: BackgroundTasks,
    pub mcp: McpServer,
    mcp_secret: Option<String>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let store = RedbStore::new(config.db_path())
            .context("Failed to open dashboard database")?
            .with_heartbeat_window(chrono::Duration::seconds(config.agent.heartbeat_stale_secs));

        let notifier: Arc<dyn Notifier> = match config.webhook_url() {
            Some(url) => {
                tracing::info!("Webhook notifications enabled");
                Arc::new(
                    WebhookNotifier::new(
                        url,
                        config.notify.dashboard_url.clone(),
                        Duration::from_secs(config.notify.timeout_secs),
                    )
                    .context("Failed to create webhook client")?,
                )
            }
            None => {
                tracing::info!("No webhook configured, notifications disabled");
                Arc::new(NoopNotifier)
            }
        };

        if config.mcp_secret().is_none() {
            tracing::warn!("No MCP secret configured; every API request will be rejected");
        }

        Ok(Self::from_parts(
            Arc::new(store),
            notifier,
            BackgroundTasks::new(),
            config.mcp_secret().map(String::from),
        ))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        background: BackgroundTasks,
        mcp_secret: Option<String>,
    ) -> Self {
        let mcp = McpServer::new(store.clone(), notifier.clone(), background.clone());
        Self {
            store,
            notifier,
            background,
            mcp,
            mcp_secret,
        }
    }

    pub fn mcp_secret(&self) -> Option<&str> {
        self.mcp_secret.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = ServerConfig::parse(
            r#"
            [storage]
            db_file = "dash.redb"

            [auth]
            mcp_secret = "from-file"

            [notify]
            webhook_url = "https://hooks.example/cc"
            dashboard_url = "https://cc.example"

            [agent]
            heartbeat_stale_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.db_file, "dash.redb");
        assert_eq!(config.mcp_secret(), Some("from-file"));
        assert_eq!(config.webhook_url(), Some("https://hooks.example/cc"));
        assert_eq!(config.notify.timeout_secs, 10);
        assert_eq!(config.agent.heartbeat_stale_secs, 60);
    }

    #[test]
    fn test_defaults_and_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let mut config =
            ServerConfig::load(&temp_dir.path().join("missing.toml"), temp_dir.path().to_path_buf())
                .unwrap();

        assert_eq!(config.db_path(), temp_dir.path().join("command-center.redb"));
        assert_eq!(config.mcp_secret(), None);
        assert_eq!(config.agent.heartbeat_stale_secs, 30);

        config.auth.mcp_secret = Some(String::new());
        assert_eq!(config.mcp_secret(), None);

        config.apply_overrides(ConfigOverrides {
            mcp_secret: Some("from-env".to_string()),
            webhook_url: None,
            dashboard_url: Some("https://cc.example".to_string()),
        });
        assert_eq!(config.mcp_secret(), Some("from-env"));
        assert_eq!(config.webhook_url(), None);
        assert_eq!(config.notify.dashboard_url, "https://cc.example");
    }

    #[test]
    fn test_app_state_without_webhook() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ServerConfig::default();
        config.data_dir = temp_dir.path().to_path_buf();
        config.auth.mcp_secret = Some("s".to_string());

        let state = AppState::new(&config).unwrap();
        assert_eq!(state.mcp_secret(), Some("s"));
        assert!(config.db_path().exists());
    }
}
