//! Transports that carry a [`TableRequest`] to the server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use url::Url;

use crate::error::ApiError;
use crate::error::Error;
use crate::wire::TablePage;
use crate::wire::TableRequest;
use crate::wire::TableResponse;

/// Sends a table request and returns the page the server answered with.
///
/// The controller issues one call per state change and may have several in
/// flight at once; implementations must not assume calls resolve in order.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use datatable_lib::error::Error;
/// use datatable_lib::transport::Transport;
/// use datatable_lib::wire::{TablePage, TableRequest};
///
/// struct Empty;
///
/// #[async_trait]
/// impl Transport for Empty {
///     async fn fetch(&self, _request: &TableRequest) -> Result<TablePage, Error> {
///         Ok(TablePage::default())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches one page.
    async fn fetch(&self, request: &TableRequest) -> Result<TablePage, Error>;
}

/// Transport that POSTs the request as JSON over HTTP.
///
/// Cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// let transport = HttpTransport::builder()
///     .url("https://example.com/api/table")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

struct HttpTransportInner {
    url: Url,
    http_client: Client,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a new builder for constructing a transport.
    pub fn builder() -> HttpTransportBuilder<Missing> {
        HttpTransportBuilder::new()
    }

    /// Returns the endpoint URL.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &TableRequest) -> Result<TablePage, Error> {
        let mut builder = self
            .inner
            .http_client
            .post(self.inner.url.clone())
            .headers(self.inner.headers.clone())
            .json(request);

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(ApiError::http(status.as_u16(), body).into());
        }

        let parsed = TableResponse::from_body(&body)?;
        Ok(parsed.into())
    }
}

impl HttpTransport {
    fn classify(&self, err: reqwest::Error) -> Error {
        match self.inner.timeout {
            Some(timeout) if err.is_timeout() => ApiError::Timeout(timeout).into(),
            _ => ApiError::Network(err).into(),
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.inner.url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing an [`HttpTransport`].
///
/// The endpoint URL is required and must be set before `build` is available.
pub struct HttpTransportBuilder<U> {
    url: U,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl HttpTransportBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            headers: Vec::new(),
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the endpoint URL.
    pub fn url(self, url: impl Into<String>) -> HttpTransportBuilder<Set<String>> {
        HttpTransportBuilder {
            url: Set(url.into()),
            headers: self.headers,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for HttpTransportBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> HttpTransportBuilder<U> {
    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("Authorization", value)
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl HttpTransportBuilder<Set<String>> {
    /// Builds the [`HttpTransport`].
    ///
    /// Fails if the URL or a header does not parse, or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<HttpTransport, Error> {
        let url = Url::parse(&self.url.0)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.url.0, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!("unsupported scheme '{}'", url.scheme())).into());
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_request(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_request(format!("header value for '{name}': {e}")))?;
            headers.insert(name, value);
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build().map_err(ApiError::from)?
            }
        };

        Ok(HttpTransport {
            inner: Arc::new(HttpTransportInner {
                url,
                http_client,
                headers,
                timeout: self.timeout,
            }),
        })
    }
}
