//! This module provides reusable test utilities:
//! - Mock automation server
//! - Slow raw TCP server for timeouts
//! - Tracing output capture
//! - Test configuration builders
//! - Common test data

// Allow unused code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod log_capture;
pub mod mock_server;
pub mod slow_server;
pub mod test_config;
pub mod test_data;

// Re-export commonly used items
pub use log_capture::LogCapture;
pub use mock_server::MockAutomationServer;
pub use slow_server::SlowServer;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
