use super::{ClientConfig, SecretsLoader};
use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::defaults;
use crate::errors::ConfigError;
use crate::session::ServerSession;

/// Loads `client.toml` and `secrets.toml` from a configuration directory
pub struct ConfigManager {
    config_dir: PathBuf,
    current_config: ClientConfig,
    secrets: SecretsLoader,
}

impl ConfigManager {
    pub fn new(config_dir: impl AsRef<Path>) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();
        let current_config = Self::load_configuration(&config_dir)?;
        let secrets = SecretsLoader::load(&config_dir.join(defaults::SECRETS_FILE))?;
        Ok(Self {
            config_dir,
            current_config,
            secrets,
        })
    }

    /// Session for the configured server, credentials resolved from secrets
    pub fn session(&self) -> Result<ServerSession> {
        self.current_config
            .clone()
            .into_session(&self.secrets)
            .map_err(|e| anyhow!("Invalid configuration in {}: {}", self.config_dir.display(), e))
    }

    fn load_configuration(config_dir: &Path) -> std::result::Result<ClientConfig, ConfigError> {
        let config_path = config_dir.join(defaults::CLIENT_CONFIG_FILE);
        debug!("Loading client config: {}", config_path.display());

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::LoadFailed {
            path: config_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: ClientConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                reason: e.to_string(),
            })?;

        info!(
            "Loaded configuration for server {} as user {} (device {})",
            config.server_url, config.user_id, config.device_id
        );

        Ok(config)
    }
}
