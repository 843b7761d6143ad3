use crate::config::ClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

/// A response as received, before any classification
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: header::HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: header::HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = header::HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// Why a request produced no response at all
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl TransportFailure {
    /// Timeouts and connection failures may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportFailure::Timeout(_) | TransportFailure::Connect(_)
        )
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        let kind = FailureKind::of(&e);
        // reqwest puts the full URL in Display; keep query strings out of logs
        let message = e.without_url().to_string();
        match kind {
            FailureKind::Timeout => TransportFailure::Timeout(message),
            FailureKind::Connect => TransportFailure::Connect(message),
            FailureKind::Other => TransportFailure::Other(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Timeout,
    Connect,
    Other,
}

impl FailureKind {
    fn of(e: &reqwest::Error) -> Self {
        Self::classify(e.is_timeout(), e.is_connect())
    }

    /// Timeouts win over connection errors; everything else is permanent
    fn classify(timeout: bool, connect: bool) -> Self {
        if timeout {
            FailureKind::Timeout
        } else if connect {
            FailureKind::Connect
        } else {
            FailureKind::Other
        }
    }
}

/// Issues a single GET request. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> std::result::Result<RawResponse, TransportFailure>;
}

/// reqwest-backed transport with the GitHub default headers
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("Invalid user agent: {e}")))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        // Add authentication if token is provided
        if let Some(token) = &config.token {
            let mut auth_value = header::HeaderValue::from_str(&format!("token {token}"))
                .map_err(|e| Error::Config(format!("Invalid GitHub token: {e}")))?;
            auth_value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> std::result::Result<RawResponse, TransportFailure> {
        debug!("GitHub API request: GET {}", url);

        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(TransportFailure::from_reqwest)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(TransportFailure::from_reqwest)?;

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
