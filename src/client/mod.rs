use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::form::FormFields;
use crate::query::QueryParams;
use crate::record::InventoryRecord;

pub const COLLECTION: &str = "inventory";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("server responded with status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("failed to decode response (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } | ClientError::Decode { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Text for the flash slot: the server's `message` when it sent one,
    /// otherwise a fallback describing what went wrong.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Status {
                status,
                message: None,
            } => format!("Request failed with status {status}"),
            ClientError::Transport { source } => {
                format!("Unable to reach inventory service: {source}")
            }
            ClientError::Decode { .. } => "Unexpected response from server".to_string(),
            other => other.to_string(),
        }
    }
}

/// Pulls the `message` string out of a JSON error body.
pub fn error_message_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")?
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// What a successful response body is expected to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expect {
    Record,
    Records,
    Empty,
    Json,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
    Record(InventoryRecord),
    Records(Vec<InventoryRecord>),
    Empty,
    Json(Value),
}

/// A fully described call against the inventory API, built before anything
/// touches the network.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: QueryParams,
    pub body: Option<Value>,
    pub expect: Expect,
}

impl ApiRequest {
    fn new(method: Method, segments: &[&str], expect: Expect) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: QueryParams::new(),
            body: None,
            expect,
        }
    }

    pub fn create(fields: &FormFields) -> Self {
        let mut req = Self::new(Method::POST, &[COLLECTION], Expect::Record);
        req.body = Some(fields.payload());
        req
    }

    pub fn update(fields: &FormFields) -> Self {
        let mut req = Self::new(Method::PUT, &[COLLECTION, fields.id.trim()], Expect::Record);
        req.body = Some(fields.payload());
        req
    }

    pub fn restock(id: &str) -> Self {
        Self::new(Method::PUT, &[COLLECTION, id, "restock"], Expect::Record)
    }

    pub fn retrieve(id: &str) -> Self {
        Self::new(Method::GET, &[COLLECTION, id], Expect::Record)
    }

    pub fn delete(id: &str) -> Self {
        Self::new(Method::DELETE, &[COLLECTION, id], Expect::Empty)
    }

    pub fn search(query: QueryParams) -> Self {
        let mut req = Self::new(Method::GET, &[COLLECTION], Expect::Records);
        req.query = query;
        req
    }

    pub fn health() -> Self {
        Self::new(Method::GET, &["health"], Expect::Json)
    }

    /// Path plus query, for logs and progress lines.
    pub fn target(&self) -> String {
        let mut out = format!("/{}", self.segments.join("/"));
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query.encode());
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            proxy: None,
            header: None,
        }
    }
}

pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), ClientError> {
    let invalid = || ClientError::InvalidHeader {
        header: raw.to_string(),
    };
    let (key, value) = raw.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(key.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

#[derive(Clone, Debug)]
pub struct InventoryClient {
    http: reqwest::Client,
    base: Url,
}

impl InventoryClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let base = Url::parse(options.base_url.trim()).map_err(|e| ClientError::InvalidBaseUrl {
            url: options.base_url.clone(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: options.base_url.clone(),
                message: "URL cannot carry a path".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("invctl/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (name, value) = parse_header(raw)?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)));

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidBaseUrl {
                    url: self.base.to_string(),
                    message: "URL cannot carry a path".to_string(),
                })?;
            segments.pop_if_empty();
            segments.extend(request.segments.iter().map(|s| s.as_str()));
        }
        if request.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&request.query.encode()));
        }
        Ok(url)
    }

    /// Issues exactly one HTTP call. Any 2xx is a success; everything else,
    /// transport failures included, comes back as a `ClientError`.
    async fn send(&self, request: &ApiRequest) -> Result<(u16, Vec<u8>), ClientError> {
        let url = self.url_for(request)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport { source: e })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport { source: e })?;
        info!(
            method = %request.method,
            target = %request.target(),
            status = status.as_u16(),
            "response received"
        );

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message_from_body(&bytes),
            });
        }
        Ok((status.as_u16(), bytes.to_vec()))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let (status, bytes) = self.send(request).await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode { status, source: e })
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        match request.expect {
            Expect::Empty => self.send(request).await.map(|_| ApiResponse::Empty),
            Expect::Record => self.fetch(request).await.map(ApiResponse::Record),
            Expect::Records => self.fetch(request).await.map(ApiResponse::Records),
            Expect::Json => self.fetch(request).await.map(ApiResponse::Json),
        }
    }

    /// Returns the `status` the service reports on its health endpoint.
    pub async fn health(&self) -> Result<String, ClientError> {
        let value: Value = self.fetch(&ApiRequest::health()).await?;
        Ok(value
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("UNKNOWN")
            .to_string())
    }
}
