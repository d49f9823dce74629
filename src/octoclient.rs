use reqwest::{Client, StatusCode, header, Error as ReqwestError};
use serde_json::{json, Value, Error as SerdeJsonError};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::config::OctoConfig;

/// Custom error type for OctoClient operations.
#[derive(Debug)]
pub enum OctoClientError {
    /// Error building the client or during the HTTP request (network, timeout, bad URL).
    HttpRequestError(ReqwestError),
    /// The server answered with something other than 200/204.
    Status(StatusCode),
    /// Error deserializing the response payload from JSON.
    DeserializationError(SerdeJsonError),
    /// The API key contains bytes that are not valid in a header.
    InvalidApiKey,
}

impl Display for OctoClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OctoClientError::HttpRequestError(e) => write!(f, "HTTP request error: {}", e),
            OctoClientError::Status(s) => write!(f, "OctoPrint answered {}", s),
            OctoClientError::DeserializationError(e) => write!(f, "JSON deserialization error: {}", e),
            OctoClientError::InvalidApiKey => write!(f, "API key is not a valid header value"),
        }
    }
}

impl std::error::Error for OctoClientError {}

impl From<ReqwestError> for OctoClientError {
    fn from(err: ReqwestError) -> Self {
        OctoClientError::HttpRequestError(err)
    }
}

impl From<SerdeJsonError> for OctoClientError {
    fn from(err: SerdeJsonError) -> Self {
        OctoClientError::DeserializationError(err)
    }
}

/// Job control commands accepted by `POST job`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCommand {
    Pause,
    Resume,
    Cancel,
}

impl JobCommand {
    pub fn payload(&self) -> Value {
        match self {
            JobCommand::Pause => json!({"command": "pause", "action": "pause"}),
            JobCommand::Resume => json!({"command": "pause", "action": "resume"}),
            JobCommand::Cancel => json!({"command": "cancel"}),
        }
    }
}

/// Connection commands accepted by `POST connection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionCommand {
    Connect,
    Disconnect,
}

impl ConnectionCommand {
    pub fn payload(&self) -> Value {
        match self {
            ConnectionCommand::Connect => json!({"command": "connect"}),
            ConnectionCommand::Disconnect => json!({"command": "disconnect"}),
        }
    }
}

/// A client for the OctoPrint REST API, API key carried on every request.
#[derive(Debug, Clone)]
pub struct OctoClient {
    base_url: String,
    client: Client,
}

impl OctoClient {
    /// Creates a client with default headers (API key included) and bounded timeouts.
    pub fn new(config: &OctoConfig) -> Result<Self, OctoClientError> {
        const VERSION: &'static str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Content-Type", header::HeaderValue::from_static("application/json"));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));
        let mut key = header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| OctoClientError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert("X-Api-Key", key);

        let client = Client::builder()
            .http1_only()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(OctoClient { base_url, client })
    }

    pub fn url_for(&self, api_path: &str) -> String {
        format!("{}{}", self.base_url, api_path.trim_start_matches('/'))
    }

    /// GET `api_path`, returning the decoded body on HTTP 200.
    pub async fn get_info(&self, api_path: &str) -> Result<Value, OctoClientError> {
        let response = self.client
            .get(self.url_for(api_path))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(OctoClientError::Status(response.status()));
        }

        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text)?;
        Ok(value)
    }

    /// GET that folds every failure into `None`, the way the dashboard consumes it.
    pub async fn get_info_opt(&self, api_path: &str) -> Option<Value> {
        match self.get_info(api_path).await {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("GET {} failed: {}", api_path, e);
                None
            }
        }
    }

    /// POST a JSON command. OctoPrint answers 204 for most commands.
    pub async fn post_info(&self, api_path: &str, command: &Value) -> Result<Option<Value>, OctoClientError> {
        let response = self.client
            .post(self.url_for(api_path))
            .body(command.to_string())
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::OK => {
                let text = response.text().await?;
                if text.trim().is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(serde_json::from_str(&text)?))
                }
            }
            other => Err(OctoClientError::Status(other)),
        }
    }

    pub async fn job_command(&self, command: JobCommand) -> Result<(), OctoClientError> {
        self.post_info("job", &command.payload()).await.map(|_| ())
    }

    pub async fn connection_command(&self, command: ConnectionCommand) -> Result<(), OctoClientError> {
        self.post_info("connection", &command.payload()).await.map(|_| ())
    }
}
