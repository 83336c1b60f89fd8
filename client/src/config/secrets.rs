//! Secrets loader for server credentials.
//!
//! Credentials live in a separate TOML file (config/secrets.toml) that should
//! be excluded from version control. A token takes precedence over a password
//! when both are present.
//!
//! Example secrets.toml:
//! ```toml
//! [credentials]
//! password = "secret"
//! # token = "0f4e..."
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Default)]
pub struct CredentialsSection {
    pub password: Option<String>,
    pub token: Option<String>,
}

/// Structure matching the secrets.toml file format
#[derive(Debug, Deserialize, Default)]
pub struct SecretsFile {
    #[serde(default)]
    pub credentials: CredentialsSection,
}

/// Loader for secrets from the secrets.toml file
#[derive(Default)]
pub struct SecretsLoader {
    secrets: SecretsFile,
}

impl SecretsLoader {
    /// Load secrets from the specified file path.
    /// Returns an empty loader if the file doesn't exist.
    pub fn load(secrets_path: &Path) -> Result<Self> {
        if !secrets_path.exists() {
            warn!(
                "Secrets file not found at {:?}, credentials will need to be configured",
                secrets_path
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(secrets_path)
            .with_context(|| format!("Failed to read secrets file: {:?}", secrets_path))?;

        let secrets: SecretsFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse secrets file: {:?}", secrets_path))?;

        info!(
            "Loaded credentials from {:?} (token: {}, password: {})",
            secrets_path,
            secrets.credentials.token.is_some(),
            secrets.credentials.password.is_some()
        );

        Ok(Self { secrets })
    }

    pub fn from_password(password: impl Into<String>) -> Self {
        Self {
            secrets: SecretsFile {
                credentials: CredentialsSection {
                    password: Some(password.into()),
                    token: None,
                },
            },
        }
    }

    pub fn password(&self) -> Option<&str> {
        self.secrets
            .credentials
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
    }

    pub fn token(&self) -> Option<&str> {
        self.secrets
            .credentials
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}
