//! Mock automation server for testing
//!
//! Wraps a mockito server and knows the endpoint layout, so tests only
//! describe the responses they care about.

use automation_client::{AuthCredential, AutomationClient, ServerSession};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::Value;

use super::test_data::*;

pub struct MockAutomationServer {
    pub server: ServerGuard,
}

impl MockAutomationServer {
    pub fn start() -> Self {
        Self {
            server: Server::new(),
        }
    }

    /// Server URL as stored in sessions, with its trailing slash
    pub fn server_url(&self) -> String {
        format!("{}/", self.server.url())
    }

    pub fn session(&self) -> ServerSession {
        ServerSession::new(
            self.server.url(),
            USER_ID,
            DEVICE_ID,
            CLIENT_VERSION,
            AuthCredential::password(USER_ID, PASSWORD),
        )
    }

    /// Mock the automation root with the given registry
    pub fn mock_registry(&mut self, registry: Value) -> Mock {
        self.server
            .mock("GET", "/site/automation/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(registry.to_string())
            .create()
    }

    pub fn mock_registry_status(&mut self, status: usize) -> Mock {
        self.server
            .mock("GET", "/site/automation/")
            .with_status(status)
            .create()
    }

    /// Registry mock plus a connected client
    pub fn connect(&mut self) -> AutomationClient {
        let _registry = self.mock_registry(registry_json());
        AutomationClient::connect(self.session()).expect("Failed to connect to mock server")
    }

    /// Mock an operation answering with a JSON body
    pub fn mock_operation(&mut self, operation: &str, status: usize, body: Value) -> Mock {
        self.server
            .mock("POST", format!("/site/automation/{}", operation).as_str())
            .with_status(status)
            .with_header("content-type", "application/json+nxentity")
            .with_body(body.to_string())
            .create()
    }

    /// Mock the token endpoint regardless of its query
    pub fn mock_token(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("GET", Matcher::Regex(r"^/authentication/token".to_string()))
            .with_status(status)
            .with_body(body)
            .create()
    }

    pub fn mock_upload(&mut self, body: Value) -> Mock {
        self.server
            .mock("POST", "/site/automation/batch/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create()
    }
}
