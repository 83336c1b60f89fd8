//! Identity and transport settings for one logical connection to a server

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::AuthCredential;
use crate::config::ProxySettings;
use crate::constants::{defaults, endpoints, http};

#[derive(Debug, Clone)]
pub struct ServerSession {
    /// Always ends with a slash
    pub server_url: String,
    pub user_id: String,
    pub device_id: String,
    pub client_version: String,
    pub credential: AuthCredential,
    pub timeout: Duration,
    /// `None` lets blob transfers run as long as they need
    pub blob_timeout: Option<Duration>,
    pub proxy: ProxySettings,
    pub upload_tmp_dir: PathBuf,
    pub repository: String,
    pub automation_path: String,
}

impl ServerSession {
    pub fn new(
        server_url: impl Into<String>,
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        client_version: impl Into<String>,
        credential: AuthCredential,
    ) -> Self {
        let mut server_url = server_url.into();
        if !server_url.ends_with('/') {
            server_url.push('/');
        }

        Self {
            server_url,
            user_id: user_id.into(),
            device_id: device_id.into(),
            client_version: client_version.into(),
            credential,
            timeout: http::REQUEST_TIMEOUT,
            blob_timeout: None,
            proxy: ProxySettings::default(),
            upload_tmp_dir: std::env::temp_dir(),
            repository: defaults::REPOSITORY.to_string(),
            automation_path: endpoints::AUTOMATION_PATH.to_string(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn blob_timeout(mut self, blob_timeout: Option<Duration>) -> Self {
        self.blob_timeout = blob_timeout;
        self
    }

    pub fn proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn upload_tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_tmp_dir = dir.into();
        self
    }

    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn automation_path(mut self, path: impl Into<String>) -> Self {
        let mut path = path.into().trim_start_matches('/').to_string();
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        self.automation_path = path;
        self
    }

    pub fn automation_url(&self) -> String {
        format!("{}{}", self.server_url, self.automation_path)
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.server_url, endpoints::TOKEN_PATH)
    }
}
