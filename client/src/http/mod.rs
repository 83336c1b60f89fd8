//! HTTP communication with the automation API
//!
//! # Architecture
//!
//! ```text
//! Caller → AutomationClient ──GET──→ <server>/site/automation/        (registry)
//!              │            ──POST─→ <automation>/<operation>         (execute)
//!              │            ──GET──→ <server>/authentication/token    (token)
//!              └─ upload ───POST─→ <automation>/batch/upload          (file body)
//!                           ──POST─→ <automation>/batch/execute       (blob input)
//! ```
//!
//! # Behaviour
//!
//! - One blocking round trip per call, no retries
//! - Parameters validated against the registry before any request
//! - Uploads stream the file with a cooperative suspend check per chunk

pub mod automation_client;
pub mod operations;
pub mod upload;

pub use automation_client::{AutomationClient, SuspendCheck};
pub use operations::{AutomationResponse, OperationRequest, ParamValue};
pub use upload::{BatchUpload, ChunkedFileReader};
