use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{BotboardError, Result};

pub const DEFAULT_WIDGET_BASE_URL: &str = "https://leadqualifier.koretex.ai";
pub const DEFAULT_COOKIE_NAME: &str = "sb-access-token";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WidgetConfig {
    #[serde(default = "default_widget_base_url")]
    pub base_url: String,
    /// Absolute URL of the bubble script. Derived from `base_url` when unset.
    pub bubble_script_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "ServerConfig::defaults")]
    pub server: ServerConfig,
    #[serde(default = "GatewayConfig::defaults")]
    pub gateway: GatewayConfig,
    #[serde(default = "WidgetConfig::defaults")]
    pub widget: WidgetConfig,
    #[serde(default = "AuthConfig::defaults")]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_widget_base_url() -> String {
    DEFAULT_WIDGET_BASE_URL.to_string()
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_sign_in_path() -> String {
    "/signin".to_string()
}

impl ServerConfig {
    fn defaults() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl GatewayConfig {
    fn defaults() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_seconds: Some(15),
        }
    }
}

impl WidgetConfig {
    fn defaults() -> Self {
        Self {
            base_url: default_widget_base_url(),
            bubble_script_url: None,
        }
    }

    pub fn bubble_script(&self) -> String {
        self.bubble_script_url
            .as_deref()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{}/chat-bot-bubble.js",
                    self.base_url.trim().trim_end_matches('/')
                )
            })
    }
}

impl AuthConfig {
    fn defaults() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            sign_in_path: default_sign_in_path(),
        }
    }
}

impl Config {
    pub fn convention_defaults() -> Self {
        Self {
            server: ServerConfig::defaults(),
            gateway: GatewayConfig::defaults(),
            widget: WidgetConfig::defaults(),
            auth: AuthConfig::defaults(),
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BotboardError::Config(format!("failed to read {path}: {e}")))?;
        serde_json::from_str(&content).map_err(|e| BotboardError::Config(e.to_string()))
    }

    /// Loads `path` when given, otherwise the convention defaults, then fills
    /// gateway settings from the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::convention_defaults(),
        };
        Ok(config.resolve_env())
    }

    pub fn resolve_env(mut self) -> Self {
        if self.gateway.url.is_none() {
            self.gateway.url = non_empty_env("BOTBOARD_GATEWAY_URL");
        }
        if self.gateway.anon_key.is_none() {
            self.gateway.anon_key = non_empty_env("BOTBOARD_GATEWAY_KEY");
        }
        self
    }

    pub fn gateway_url(&self) -> Result<String> {
        self.gateway
            .url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                BotboardError::Config(
                    "gateway.url is not set (config file or BOTBOARD_GATEWAY_URL)".to_string(),
                )
            })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_section_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"gateway": {"url": "https://db.example.co/", "anon_key": "anon"}}"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.cookie_name, DEFAULT_COOKIE_NAME);
        assert_eq!(config.auth.sign_in_path, "/signin");
        assert_eq!(config.widget.base_url, DEFAULT_WIDGET_BASE_URL);
        assert_eq!(config.gateway_url().unwrap(), "https://db.example.co");
    }

    #[test]
    fn bubble_script_is_derived_from_widget_base() {
        let mut widget = WidgetConfig::defaults();
        widget.base_url = "https://widget.example.com/".to_string();
        assert_eq!(
            widget.bubble_script(),
            "https://widget.example.com/chat-bot-bubble.js"
        );

        widget.bubble_script_url = Some("https://cdn.example.com/b.js".to_string());
        assert_eq!(widget.bubble_script(), "https://cdn.example.com/b.js");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("botboard.json");
        fs::write(
            &path,
            r#"{"server": {"port": 8088}, "gateway": {"url": "https://db.example.co", "anon_key": "anon"}, "auth": {"cookie_name": "session"}}"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.cookie_name, "session");
        assert_eq!(config.auth.sign_in_path, "/signin");
        assert_eq!(config.gateway.anon_key.as_deref(), Some("anon"));
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(
            Config::from_file(path.to_str().unwrap()),
            Err(BotboardError::Config(_))
        ));
    }

    #[test]
    fn missing_gateway_url_is_a_config_error() {
        let mut config = Config::convention_defaults();
        config.gateway.url = Some("   ".to_string());
        assert!(matches!(
            config.gateway_url(),
            Err(BotboardError::Config(_))
        ));
    }
}
