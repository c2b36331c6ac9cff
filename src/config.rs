use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use url::Url;

/// Command line options for the client.
#[derive(Parser, Debug, Default)]
pub struct Cli {
    /// Websocket URL of the chat coordinator.
    #[arg(long)]
    pub server: Option<String>,
    /// Username to join with immediately.
    #[arg(long)]
    pub username: Option<String>,
    /// Enable or disable logging (true/false).
    #[arg(long)]
    pub logging: Option<bool>,
    /// Path to configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Runtime configuration resolved from file, env and CLI.
#[derive(Clone, Debug)]
pub struct Config {
    /// Coordinator websocket URL.
    pub server_url: String,
    /// Attachment ceiling in mebibytes.
    pub max_attachment_mb: u64,
    /// Quiet period after the last keystroke before `stop-typing`.
    pub typing_debounce_ms: u64,
    /// Lifetime of a remote typing indicator after its last refresh.
    pub typing_expiry_ms: u64,
    /// Whether verbose logging is enabled.
    pub logging_enabled: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: FileServer,
    #[serde(default)]
    attachment: FileAttachment,
    #[serde(default)]
    typing: FileTyping,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Deserialize)]
struct FileServer {
    #[serde(default = "default_server_url")]
    url: String,
}

#[derive(Deserialize)]
struct FileAttachment {
    #[serde(default = "default_max_mb")]
    max_mb: u64,
}

#[derive(Deserialize)]
struct FileTyping {
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,
    #[serde(default = "default_expiry_ms")]
    expiry_ms: u64,
}

#[derive(Deserialize)]
struct FileLogging {
    #[serde(default = "default_logging")]
    enabled: bool,
}

fn default_server_url() -> String {
    "ws://127.0.0.1:5000".into()
}

fn default_max_mb() -> u64 {
    5
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_expiry_ms() -> u64 {
    3000
}

fn default_logging() -> bool {
    true
}

impl Default for FileServer {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

impl Default for FileAttachment {
    fn default() -> Self {
        Self {
            max_mb: default_max_mb(),
        }
    }
}

impl Default for FileTyping {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            expiry_ms: default_expiry_ms(),
        }
    }
}

impl Default for FileLogging {
    fn default() -> Self {
        Self {
            enabled: default_logging(),
        }
    }
}

impl Config {
    /// Resolve configuration from CLI, environment variables, config file
    /// and built-in defaults, in that precedence order.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut server_url = default_server_url();
        let mut max_attachment_mb = default_max_mb();
        let mut typing_debounce_ms = default_debounce_ms();
        let mut typing_expiry_ms = default_expiry_ms();
        let mut logging = default_logging();

        // config file path precedence: CLI -> ENV -> default
        let config_path = cli
            .config
            .clone()
            .or_else(|| {
                std::env::var("COMMUNITY_CHAT_CONFIG")
                    .ok()
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from("config/community_chat.toml"));

        if let Ok(bytes) = fs::read(&config_path) {
            let contents = String::from_utf8_lossy(&bytes);
            let file_cfg: FileConfig = toml::from_str(&contents).context("invalid config file")?;
            server_url = file_cfg.server.url;
            max_attachment_mb = file_cfg.attachment.max_mb;
            typing_debounce_ms = file_cfg.typing.debounce_ms;
            typing_expiry_ms = file_cfg.typing.expiry_ms;
            logging = file_cfg.logging.enabled;
        }

        // environment overrides
        if let Ok(s) = std::env::var("COMMUNITY_CHAT_SERVER") {
            server_url = s;
        }
        if let Ok(l) = std::env::var("COMMUNITY_CHAT_LOGGING") {
            if let Ok(l) = l.parse::<bool>() {
                logging = l;
            }
        }
        if let Ok(m) = std::env::var("COMMUNITY_CHAT_MAX_ATTACHMENT_MB") {
            if let Ok(m) = m.parse::<u64>() {
                max_attachment_mb = m;
            }
        }

        // CLI overrides
        if let Some(s) = &cli.server {
            server_url = s.clone();
        }
        if let Some(l) = cli.logging {
            logging = l;
        }

        let url = Url::parse(&server_url).context("invalid_server_url")?;
        if !matches!(url.scheme(), "ws" | "wss") {
            anyhow::bail!("invalid_server_url");
        }
        if typing_debounce_ms == 0 || typing_expiry_ms == 0 {
            anyhow::bail!("invalid_typing_timers");
        }
        if max_attachment_mb == 0 {
            anyhow::bail!("invalid_attachment_limit");
        }

        Ok(Self {
            server_url,
            max_attachment_mb,
            typing_debounce_ms,
            typing_expiry_ms,
            logging_enabled: logging,
        })
    }

    pub fn max_attachment_bytes(&self) -> u64 {
        self.max_attachment_mb * 1024 * 1024
    }

    pub fn typing_debounce(&self) -> Duration {
        Duration::from_millis(self.typing_debounce_ms)
    }

    pub fn typing_expiry(&self) -> Duration {
        Duration::from_millis(self.typing_expiry_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            max_attachment_mb: default_max_mb(),
            typing_debounce_ms: default_debounce_ms(),
            typing_expiry_ms: default_expiry_ms(),
            logging_enabled: default_logging(),
        }
    }
}
