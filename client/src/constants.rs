//! Protocol constants, header names and default values
//!
//! Single source of truth for the automation endpoint layout, the headers the
//! server expects and the timeouts applied when the configuration is silent.

use std::time::Duration;

/// HTTP timeout constants
pub mod http {
    use super::Duration;

    /// Short timeout for JSON operations, avoids freezing callers on network issues
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

    /// Timeout for establishing connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Values sent when negotiating an authentication token
pub mod auth {
    pub const APPLICATION_NAME: &str = "Nuxeo Drive";

    pub const PERMISSION: &str = "ReadWrite";
}

/// Endpoint paths, relative to the server or automation URL
pub mod endpoints {
    /// Automation root, relative to the server URL
    pub const AUTOMATION_PATH: &str = "site/automation/";

    /// Token negotiation, relative to the server URL
    pub const TOKEN_PATH: &str = "authentication/token";

    pub const BATCH_UPLOAD: &str = "batch/upload";

    pub const BATCH_EXECUTE: &str = "batch/execute";
}

/// Header names used by the automation protocol
pub mod headers {
    pub const USER_ID: &str = "X-User-Id";
    pub const DEVICE_ID: &str = "X-Device-Id";
    pub const CLIENT_VERSION: &str = "X-Client-Version";
    pub const APPLICATION_NAME: &str = "X-Application-Name";
    pub const AUTH_TOKEN: &str = "X-Authentication-Token";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const USER_AGENT: &str = "User-Agent";
    pub const CACHE_CONTROL: &str = "Cache-Control";

    pub const DOCUMENT_PROPERTIES: &str = "X-NXDocumentProperties";
    pub const VOID_OPERATION: &str = "X-NXVoidOperation";

    pub const BATCH_ID: &str = "X-Batch-Id";
    pub const FILE_IDX: &str = "X-File-Idx";
    pub const FILE_NAME: &str = "X-File-Name";
    pub const FILE_SIZE: &str = "X-File-Size";
    pub const FILE_TYPE: &str = "X-File-Type";
}

/// Content types
pub mod content_types {
    pub const AUTOMATION_REQUEST: &str = "application/json+nxrequest";
    pub const AUTOMATION_ACCEPT: &str = "application/json+nxentity, */*";
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const JSON_PREFIX: &str = "application/json";
}

/// Well-known operations
pub mod operations {
    /// Presence of this operation means the server-side addon is installed
    pub const GET_ROOTS: &str = "NuxeoDrive.GetRoots";

    pub const WAIT_FOR_ASYNC_COMPLETION: &str = "NuxeoDrive.WaitForAsyncCompletion";
}

/// Upload streaming constants
pub mod upload {
    /// Chunk size used when the filesystem block size is unavailable
    pub const FILE_BUFFER_SIZE: usize = 1024 * 1024;

    /// Suffix of scratch files created for uploads
    pub const TMP_FILE_SUFFIX: &str = "-file-to-upload";
}

/// Default configuration values
pub mod defaults {
    pub const REPOSITORY: &str = "default";

    pub const CLIENT_CONFIG_FILE: &str = "client.toml";

    pub const SECRETS_FILE: &str = "secrets.toml";
}
