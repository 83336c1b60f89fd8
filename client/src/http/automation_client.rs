use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{NoProxy, Proxy, StatusCode};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, trace, warn};

use super::operations::{AutomationResponse, OperationRequest};
use crate::auth::AuthCredential;
use crate::config::{ProxyMode, ProxySettings};
use crate::constants::{auth, content_types, headers, http, operations, upload};
use crate::errors::{ClientError, Result};
use crate::registry::OperationRegistry;
use crate::session::ServerSession;

/// Called before each chunk of a streamed upload with a description of the
/// transfer. Blocking inside pauses the upload, returning an error aborts it.
pub type SuspendCheck = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// Client for the automation HTTP API of one server
///
/// Every call is a single blocking round trip on the caller's thread. Reads
/// take `&self`; swapping the credential takes `&mut self`, so a shared
/// client must be wrapped in a lock by whoever renews tokens.
pub struct AutomationClient {
    pub(crate) session: ServerSession,
    pub(crate) client: Client,
    pub(crate) registry: OperationRegistry,
    pub(crate) suspend_check: Option<SuspendCheck>,
}

impl AutomationClient {
    /// Build the HTTP client and fetch the operation registry
    pub fn connect(session: ServerSession) -> Result<Self> {
        let mut client = Self::with_registry(session, OperationRegistry::default())?;
        client.registry = client.fetch_registry()?;
        info!(
            "Connected to {} as {}: {} operations available",
            client.session.server_url,
            client.session.user_id,
            client.registry.len()
        );
        Ok(client)
    }

    /// Build a client around an already known registry, without any request
    pub fn with_registry(session: ServerSession, registry: OperationRegistry) -> Result<Self> {
        let client = build_http_client(&session.proxy)?;
        Ok(Self {
            session,
            client,
            registry,
            suspend_check: None,
        })
    }

    pub fn with_suspend_check(mut self, check: SuspendCheck) -> Self {
        self.suspend_check = Some(check);
        self
    }

    pub fn session(&self) -> &ServerSession {
        &self.session
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn credential(&self) -> &AuthCredential {
        &self.session.credential
    }

    /// Explicitly replace the active credential
    pub fn set_credential(&mut self, credential: AuthCredential) {
        self.session.credential = credential;
    }

    pub fn is_operation_supported(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn is_addon_installed(&self) -> bool {
        self.is_operation_supported(operations::GET_ROOTS)
    }

    /// Query the automation root for the operations the server exposes
    #[instrument(skip(self), fields(server = %self.session.server_url))]
    pub fn fetch_registry(&self) -> Result<OperationRegistry> {
        let base_error_message = format!(
            "Failed to connect to server {}",
            self.session.server_url
        );
        let url = self.session.automation_url();
        trace!("Calling {}", url);

        let response = self
            .apply_common_headers(self.client.get(&url))
            .timeout(self.session.timeout)
            .send()
            .map_err(|e| ClientError::from(e).with_context(&base_error_message))?;

        let status = response.status();
        if is_auth_failure(status) {
            return Err(self.unauthorized(status));
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::Connection {
                message: format!("{}: HTTP error {}", base_error_message, status.as_u16()),
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| ClientError::from(e).with_context(&base_error_message))?;
        OperationRegistry::from_json(&body).map_err(|e| e.with_context(&base_error_message))
    }

    /// Execute an automation operation
    ///
    /// Parameters are checked against the registry first unless the request
    /// opted out, so unknown operations never reach the network.
    #[instrument(skip(self, request), fields(operation = %request.operation))]
    pub fn execute(
        &self,
        request: &OperationRequest,
        timeout: Option<Duration>,
    ) -> Result<AutomationResponse> {
        if request.check_params {
            self.registry
                .validate(&request.operation, request.param_names())?;
        }

        let url = format!("{}{}", self.session.automation_url(), request.operation);
        let body = request.to_body();
        trace!("Calling {} with JSON payload {}", url, body);

        let mut builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, content_types::AUTOMATION_REQUEST)
            .header(ACCEPT, content_types::AUTOMATION_ACCEPT)
            .header(headers::DOCUMENT_PROPERTIES, "*");
        if request.void_op {
            builder = builder.header(headers::VOID_OPERATION, "true");
        }

        let response = self
            .apply_common_headers(builder)
            .timeout(timeout.unwrap_or(self.session.timeout))
            .body(body.to_string())
            .send()
            .map_err(|e| {
                debug!("Request to {} failed: {}", url, e);
                ClientError::from(e)
                    .with_context(&format!("Failed to execute operation {}", request.operation))
            })?;

        let response = self.check_status(response, &url)?;
        read_response(response, &url)
    }

    /// Request a new authentication token and use it from now on
    ///
    /// `Ok(None)` means the server does not support token authentication.
    #[instrument(skip(self), fields(user = %self.session.user_id))]
    pub fn request_token(&mut self) -> Result<Option<String>> {
        let token = self.fetch_token(false)?;
        if let Some(token) = &token {
            self.session.credential.switch_to_token(token.clone());
            debug!("Switched to token authentication");
        }
        Ok(token)
    }

    /// Ask the server to invalidate the token for this device
    ///
    /// The active credential is left untouched.
    #[instrument(skip(self), fields(user = %self.session.user_id))]
    pub fn revoke_token(&self) -> Result<()> {
        self.fetch_token(true).map(|_| ())
    }

    fn fetch_token(&self, revoke: bool) -> Result<Option<String>> {
        let base_error_message = format!(
            "Failed to connect to server {} with user {} to acquire a token",
            self.session.server_url, self.session.user_id
        );

        let mut query = vec![
            ("deviceId", self.session.device_id.clone()),
            ("applicationName", auth::APPLICATION_NAME.to_string()),
            ("permission", auth::PERMISSION.to_string()),
            ("revoke", revoke.to_string()),
        ];
        if let Some(description) = device_description(std::env::consts::OS) {
            query.push(("deviceDescription", description.to_string()));
        }

        let url = self.session.token_url();
        trace!("Calling {} with query {:?}", url, query);

        let response = self
            .apply_common_headers(self.client.get(&url))
            .query(&query)
            .timeout(self.session.timeout)
            .send()
            .map_err(|e| ClientError::from(e).with_context(&base_error_message))?;

        let status = response.status();
        if is_auth_failure(status) {
            return Err(self.unauthorized(status));
        }
        if status == StatusCode::NOT_FOUND {
            info!(
                "Server {} does not support token authentication",
                self.session.server_url
            );
            return Ok(None);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::Connection {
                message: format!("{}: HTTP error {}", base_error_message, status.as_u16()),
            });
        }

        let token = response
            .text()
            .map_err(|e| ClientError::from(e).with_context(&base_error_message))?
            .trim()
            .to_string();
        if token.is_empty() {
            if !revoke {
                warn!("Server {} returned an empty token", self.session.server_url);
            }
            return Ok(None);
        }

        trace!("Got token for device {}", self.session.device_id);
        Ok(Some(token))
    }

    /// Block until the server has finished its asynchronous work
    pub fn wait(&self) -> Result<()> {
        self.execute(
            &OperationRequest::new(operations::WAIT_FOR_ASYNC_COMPLETION),
            None,
        )?;
        Ok(())
    }

    /// Write `content` to a fresh file in the upload scratch directory
    pub fn make_tmp_file(&self, content: &[u8]) -> Result<PathBuf> {
        let dir = &self.session.upload_tmp_dir;
        let io_error = |e: std::io::Error| ClientError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut file = tempfile::Builder::new()
            .suffix(upload::TMP_FILE_SUFFIX)
            .tempfile_in(dir)
            .map_err(io_error)?;
        file.write_all(content).map_err(io_error)?;
        let (_, path) = file.keep().map_err(|e| io_error(e.error))?;
        Ok(path)
    }

    /// Identity headers plus the single auth header of the active credential
    pub fn common_headers(&self) -> Vec<(&'static str, String)> {
        let session = &self.session;
        let (auth_header, auth_value) = session.credential.header();
        vec![
            (headers::USER_ID, session.user_id.clone()),
            (headers::DEVICE_ID, session.device_id.clone()),
            (headers::CLIENT_VERSION, session.client_version.clone()),
            (
                headers::USER_AGENT,
                format!("{}/{}", auth::APPLICATION_NAME, session.client_version),
            ),
            (headers::APPLICATION_NAME, auth::APPLICATION_NAME.to_string()),
            (auth_header, auth_value),
            (headers::CACHE_CONTROL, "no-cache".to_string()),
        ]
    }

    pub(crate) fn apply_common_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        self.common_headers()
            .into_iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value))
    }

    pub(crate) fn unauthorized(&self, status: StatusCode) -> ClientError {
        ClientError::Unauthorized {
            server_url: self.session.server_url.clone(),
            user_id: self.session.user_id.clone(),
            status: status.as_u16(),
        }
    }

    /// Map error statuses, logging whatever detail the server sent back
    pub(crate) fn check_status(&self, response: Response, url: &str) -> Result<Response> {
        let status = response.status();
        if !(status.is_client_error() || status.is_server_error()) {
            return Ok(response);
        }

        log_error_details(response, url);
        if is_auth_failure(status) {
            Err(self.unauthorized(status))
        } else {
            Err(ClientError::Http {
                status: status.as_u16(),
            })
        }
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Server error bodies should be JSON with `message` and `stack`, but
/// sometimes are not
fn log_error_details(response: Response, url: &str) {
    let status = response.status();
    let detail = match response.text() {
        Ok(detail) => detail,
        Err(e) => {
            debug!("Could not read error body from {}: {}", url, e);
            return;
        }
    };

    match serde_json::from_str::<Value>(&detail) {
        Ok(error) => {
            if let Some(message) = error.get("message").and_then(Value::as_str) {
                debug!("Server error {} for {}: {}", status, url, message);
            }
            if let Some(stack) = error.get("stack").and_then(Value::as_str) {
                debug!("Server stack trace for {}: {}", url, stack);
            }
        }
        Err(_) => debug!("Server error {} for {}: {}", status, url, detail),
    }
}

/// JSON content types are decoded, anything else is returned as raw bytes
pub(crate) fn read_response(response: Response, url: &str) -> Result<AutomationResponse> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.bytes()?;

    if content_type.starts_with(content_types::JSON_PREFIX) {
        trace!("Response for {} with JSON payload of {} bytes", url, body.len());
        if body.is_empty() {
            return Ok(AutomationResponse::Json(Value::Null));
        }
        let value = serde_json::from_slice(&body).map_err(|e| ClientError::Connection {
            message: format!("Invalid JSON response from {}: {}", url, e),
        })?;
        Ok(AutomationResponse::Json(value))
    } else {
        trace!("Response for {} with content-type {:?}", url, content_type);
        Ok(AutomationResponse::Raw(body.to_vec()))
    }
}

/// Description sent along token requests, keyed by `std::env::consts::OS`
pub fn device_description(os: &str) -> Option<&'static str> {
    match os {
        "linux" => Some("Linux Desktop"),
        "macos" => Some("Mac OSX Desktop"),
        "windows" => Some("Windows Desktop"),
        _ => None,
    }
}

/// No client-wide timeout: each request sets its own
fn build_http_client(proxy: &ProxySettings) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(http::CONNECT_TIMEOUT)
        .timeout(None::<Duration>);

    match proxy.config {
        ProxyMode::None => builder = builder.no_proxy(),
        ProxyMode::System => {}
        ProxyMode::Manual => {
            if let Some(url) = proxy.proxy_url()? {
                let exceptions = proxy.exception_list();
                let mut manual = Proxy::all(&url)?;
                if !exceptions.is_empty() {
                    manual = manual.no_proxy(NoProxy::from_string(&exceptions.join(",")));
                }
                builder = builder.proxy(manual);
            }
        }
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn client(credential: AuthCredential) -> AutomationClient {
        let session = ServerSession::new(
            "http://localhost:8080/nuxeo",
            "Administrator",
            "device-1",
            "2.1.0",
            credential,
        );
        AutomationClient::with_registry(session, OperationRegistry::default()).unwrap()
    }

    #[test_case("linux", Some("Linux Desktop"))]
    #[test_case("macos", Some("Mac OSX Desktop"))]
    #[test_case("windows", Some("Windows Desktop"))]
    #[test_case("freebsd", None)]
    fn test_device_description(os: &str, expected: Option<&str>) {
        assert_eq!(device_description(os), expected);
    }

    #[test]
    fn test_common_headers_with_password() {
        let headers = client(AuthCredential::password("Administrator", "secret")).common_headers();
        let names: Vec<&str> = headers.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "X-User-Id",
                "X-Device-Id",
                "X-Client-Version",
                "User-Agent",
                "X-Application-Name",
                "Authorization",
                "Cache-Control",
            ]
        );
        assert!(headers.contains(&("User-Agent", "Nuxeo Drive/2.1.0".to_string())));
        assert!(headers.contains(&("Cache-Control", "no-cache".to_string())));
    }

    #[test]
    fn test_set_credential_changes_auth_header() {
        let mut client = client(AuthCredential::password("Administrator", "secret"));
        client.set_credential(AuthCredential::token("tok"));
        let headers = client.common_headers();
        assert!(headers.contains(&("X-Authentication-Token", "tok".to_string())));
        assert!(!headers.iter().any(|(n, _)| *n == "Authorization"));
    }

    #[test]
    fn test_make_tmp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let session = ServerSession::new("http://h/", "u", "d", "1", AuthCredential::token("t"))
            .upload_tmp_dir(dir.path());
        let client = AutomationClient::with_registry(session, OperationRegistry::default()).unwrap();

        let path = client.make_tmp_file(b"payload").unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.to_string_lossy().ends_with("-file-to-upload"));
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }

    #[test]
    fn test_manual_proxy_client_builds() {
        let proxy = ProxySettings {
            config: ProxyMode::Manual,
            server: Some("proxy.local".to_string()),
            port: Some(3128),
            exceptions: Some("localhost".to_string()),
            ..Default::default()
        };
        assert!(build_http_client(&proxy).is_ok());
    }
}
