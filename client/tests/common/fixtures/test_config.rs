//! Test configuration builder for writing config directories

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for client.toml / secrets.toml pairs
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    server_url: String,
    extra: Vec<String>,
    password: Option<String>,
    token: Option<String>,
    write_secrets: bool,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            server_url: "http://localhost:8080/nuxeo".to_string(),
            extra: Vec::new(),
            password: None,
            token: None,
            write_secrets: true,
        }
    }

    pub fn server_url(mut self, url: &str) -> Self {
        self.server_url = url.to_string();
        self
    }

    /// Append a raw TOML line to client.toml
    pub fn line(mut self, line: &str) -> Self {
        self.extra.push(line.to_string());
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn without_secrets(mut self) -> Self {
        self.write_secrets = false;
        self
    }

    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        let mut client_toml = format!(
            r#"server_url = "{}"
user_id = "Administrator"
device_id = "test-device-1"
client_version = "2.1.0"
"#,
            self.server_url
        );
        for line in &self.extra {
            client_toml.push_str(line);
            client_toml.push('\n');
        }
        fs::write(config_dir.join("client.toml"), client_toml).expect("Failed to write client.toml");

        if self.write_secrets {
            let mut secrets = String::from("[credentials]\n");
            if let Some(password) = &self.password {
                secrets.push_str(&format!("password = \"{}\"\n", password));
            }
            if let Some(token) = &self.token {
                secrets.push_str(&format!("token = \"{}\"\n", token));
            }
            fs::write(config_dir.join("secrets.toml"), secrets).expect("Failed to write secrets.toml");
        }

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
}
