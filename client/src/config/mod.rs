pub mod manager;
pub mod secrets;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use manager::ConfigManager;
pub use secrets::SecretsLoader;

use crate::auth::AuthCredential;
use crate::constants::{defaults, endpoints, http};
use crate::errors::ConfigError;
use crate::session::ServerSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    pub user_id: String,
    pub device_id: String,
    pub client_version: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    // Absent or zero means blob transfers never time out
    pub blob_timeout_seconds: Option<u64>,
    pub upload_tmp_dir: Option<PathBuf>,
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default = "default_automation_path")]
    pub automation_path: String,
    #[serde(default)]
    pub proxy: ProxySettings,
}

fn default_timeout() -> u64 {
    http::REQUEST_TIMEOUT.as_secs()
}

fn default_repository() -> String {
    defaults::REPOSITORY.to_string()
}

fn default_automation_path() -> String {
    endpoints::AUTOMATION_PATH.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyMode {
    /// Never go through a proxy
    None,
    /// Use the proxy from the environment, if any
    #[default]
    System,
    Manual,
}

/// Proxy settings as chosen by the user, applied as-is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    #[serde(default)]
    pub config: ProxyMode,
    pub proxy_type: Option<String>,
    pub server: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub authenticated: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Comma-separated hosts that bypass the proxy
    pub exceptions: Option<String>,
}

impl ProxySettings {
    /// Proxy URL for manual settings
    pub fn proxy_url(&self) -> Result<Option<String>, ConfigError> {
        if self.config != ProxyMode::Manual {
            return Ok(None);
        }

        let server = self.server.as_deref().ok_or_else(|| ConfigError::MissingRequired {
            field: "proxy.server".to_string(),
        })?;
        let port = self.port.ok_or_else(|| ConfigError::MissingRequired {
            field: "proxy.port".to_string(),
        })?;
        let scheme = self.proxy_type.as_deref().unwrap_or("http");

        let url = if self.authenticated {
            let username = self.username.as_deref().ok_or_else(|| ConfigError::MissingRequired {
                field: "proxy.username".to_string(),
            })?;
            let password = self.password.as_deref().unwrap_or_default();
            format!("{}://{}:{}@{}:{}", scheme, username, password, server, port)
        } else {
            format!("{}://{}:{}", scheme, server, port)
        };
        Ok(Some(url))
    }

    pub fn exception_list(&self) -> Vec<String> {
        self.exceptions
            .as_deref()
            .map(|e| {
                e.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ClientConfig {
    /// Build a session, preferring a token over a password
    pub fn into_session(self, secrets: &SecretsLoader) -> Result<ServerSession, ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "user_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let credential = match (secrets.token(), secrets.password()) {
            (Some(token), _) => AuthCredential::token(token),
            (None, Some(password)) => AuthCredential::password(&self.user_id, password),
            (None, None) => {
                return Err(ConfigError::MissingRequired {
                    field: "credentials.password or credentials.token".to_string(),
                })
            }
        };

        // Surface bad manual proxy settings before the first request
        self.proxy.proxy_url()?;

        let mut session = ServerSession::new(
            self.server_url,
            self.user_id,
            self.device_id,
            self.client_version,
            credential,
        )
        .timeout(Duration::from_secs(self.timeout_seconds))
        .blob_timeout(
            self.blob_timeout_seconds
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
        )
        .repository(self.repository)
        .automation_path(self.automation_path)
        .proxy(self.proxy);
        if let Some(dir) = self.upload_tmp_dir {
            session = session.upload_tmp_dir(dir);
        }
        Ok(session)
    }
}
