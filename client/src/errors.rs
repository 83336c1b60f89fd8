//! Error types for the automation client
//!
//! Every failure a caller can observe maps to one `ClientError` variant so the
//! calling layer can decide on retries without inspecting message text.

use std::fmt;

/// Main error type for the automation client
#[derive(Debug)]
pub enum ClientError {
    /// Server rejected the credentials (HTTP 401/403)
    Unauthorized {
        server_url: String,
        user_id: String,
        status: u16,
    },

    /// Operation execution returned an HTTP error status
    Http { status: u16 },

    /// Transport-level failure, or an error status on registry/token fetch
    Connection { message: String },

    /// Local validation failed before any request was sent
    InvalidParameter { message: String },

    /// Batch upload response did not confirm the upload
    UploadFailed { batch_id: String, file_path: String },

    /// Upload was stopped by the suspend check
    UploadAborted { file_path: String, reason: String },

    /// Local file access failed
    Io { path: String, reason: String },

    /// Configuration errors
    Config(ConfigError),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

impl ClientError {
    /// Status code carried by the error, if it came from an HTTP response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { status, .. } | ClientError::Http { status } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Prefix the message of a connection error with some context
    pub(crate) fn with_context(self, context: &str) -> Self {
        match self {
            ClientError::Connection { message } => ClientError::Connection {
                message: format!("{}: {}", context, message),
            },
            other => other,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Unauthorized {
                server_url,
                user_id,
                status,
            } => {
                write!(
                    f,
                    "'{}' is not authorized to access '{}' with the provided credentials (HTTP {})",
                    user_id, server_url, status
                )
            }
            ClientError::Http { status } => write!(f, "HTTP error {}", status),
            ClientError::Connection { message } => write!(f, "{}", message),
            ClientError::InvalidParameter { message } => {
                write!(f, "Invalid parameter: {}", message)
            }
            ClientError::UploadFailed {
                batch_id,
                file_path,
            } => {
                write!(
                    f,
                    "Bad response from batch upload with id '{}' and file path '{}'",
                    batch_id, file_path
                )
            }
            ClientError::UploadAborted { file_path, reason } => {
                write!(f, "Upload of '{}' aborted: {}", file_path, reason)
            }
            ClientError::Io { path, reason } => {
                write!(f, "I/O error on '{}': {}", path, reason)
            }
            ClientError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl std::error::Error for ClientError {}
impl std::error::Error for ConfigError {}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Config(err)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out: {}", err)
        } else {
            err.to_string()
        };
        ClientError::Connection { message }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
