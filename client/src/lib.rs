pub mod auth;
pub mod config;
pub mod constants;
pub mod errors;
pub mod http;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use auth::AuthCredential;
pub use config::{ClientConfig, ConfigManager, ProxyMode, ProxySettings};
pub use errors::{ClientError, ConfigError};
pub use http::{
    AutomationClient, AutomationResponse, BatchUpload, OperationRequest, ParamValue, SuspendCheck,
};
pub use registry::{OperationRegistry, OperationSchema, ParamSpec};
pub use session::ServerSession;
