//! HTTP client acting as a single participant.

use floor_service::floor::{EventEnvelope, FineRecord, Snapshot};
use reqwest::Method;
use serde_json::Value;

/// Status and JSON body of one response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// The `error.code` field, if the response is an error.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }

    /// Committed events of a successful command.
    pub fn events(&self) -> Vec<EventEnvelope> {
        serde_json::from_value(self.body["events"].clone())
            .expect("response should carry an events array")
    }

    /// Wire names of the committed events, in order.
    pub fn event_types(&self) -> Vec<String> {
        self.body["events"]
            .as_array()
            .map(|events| {
                events
                    .iter()
                    .filter_map(|e| e["event"]["type"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Panic unless the status matches, printing the body on failure.
    #[track_caller]
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status, expected,
            "unexpected status, body: {}",
            self.body
        );
        self
    }

    /// Panic unless this is an error with the given code.
    #[track_caller]
    pub fn assert_error(&self, status: u16, code: &str) {
        self.assert_status(status);
        assert_eq!(self.error_code(), Some(code), "body: {}", self.body);
    }
}

/// Client sending every request with one participant's identity header.
#[derive(Debug, Clone)]
pub struct FloorClient {
    http: reqwest::Client,
    base_url: String,
    header: String,
    identity: Option<String>,
}

impl FloorClient {
    pub fn new(base_url: String, header: &str, identity: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            header: header.to_string(),
            identity: identity.map(str::to_string),
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Build a request with the identity header attached.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.identity {
            Some(identity) => builder.header(self.header.as_str(), identity.as_str()),
            None => builder,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, anyhow::Error> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Ok(ApiResponse { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, anyhow::Error> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<ApiResponse, anyhow::Error> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse, anyhow::Error> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse, anyhow::Error> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, anyhow::Error> {
        self.send(Method::DELETE, path, None).await
    }

    /// Typed resync snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot, anyhow::Error> {
        let response = self.get("/api/v1/snapshot").await?;
        response.assert_status(200);
        Ok(serde_json::from_value(response.body)?)
    }

    /// Typed fine book.
    pub async fn fines(&self) -> Result<Vec<FineRecord>, anyhow::Error> {
        let response = self.get("/api/v1/fines").await?;
        response.assert_status(200);
        Ok(serde_json::from_value(response.body["fines"].clone())?)
    }
}
