//! XM HTTP client

#[cfg(not(target_arch = "wasm32"))]
pub mod config;
pub mod detection;
pub mod error;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod unauthorized;

use bytes::Bytes;
use error::ClientError;
use interceptor::{
    DetectUnauthorized, JsonContentType, NormalizeBody, RequestInterceptor, ResponseInterceptor,
    TokenHeader,
};
use request::OutgoingRequest;
use reqwest::{Client, ClientBuilder, Method};
use response::{ApiResult, ResponseBody};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use unauthorized::UnauthorizedHandler;
use xm_core::{KeyValueStore, MemoryStore};

#[cfg(not(target_arch = "wasm32"))]
use config::{ClientConfig, DEFAULT_TIMEOUT_SECS};

/// XM API client
///
/// Cheap to clone; clones share the transport and the interceptor chains.
#[derive(Clone)]
pub struct XmClient {
    client: Client,
    base_url: String,
    request_interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
    response_interceptors: Arc<[Arc<dyn ResponseInterceptor>]>,
}

impl XmClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> XmClientBuilder {
        XmClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path` relative to the base URL
    ///
    /// Absolute URLs (`http://...`, `//host/...`) bypass the base URL.
    pub fn request(&self, method: Method, path: &str) -> OutgoingRequest {
        OutgoingRequest::new(method, join_url(&self.base_url, path))
    }

    pub fn get(&self, path: &str) -> OutgoingRequest {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> OutgoingRequest {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> OutgoingRequest {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> OutgoingRequest {
        self.request(Method::DELETE, path)
    }

    /// Send a request and return the normalized response body
    ///
    /// A body that arrived as an empty string is returned as
    /// `Value::String("")`.
    pub async fn send(&self, request: OutgoingRequest) -> Result<Value, ClientError> {
        let method = request.method.clone();
        let url = request.url.clone();

        let response = self.transmit(request).await?;
        let body = ResponseBody::read(response).await.map_err(|e| {
            error!(%method, %url, "response error: {e}");
            ClientError::from(e)
        })?;

        let body = self
            .response_interceptors
            .iter()
            .try_fold(body, |body, interceptor| interceptor.on_response(body))?;

        Ok(body.into_value())
    }

    /// Send a request and deserialize the normalized body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: OutgoingRequest,
    ) -> Result<T, ClientError> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request whose answer is a `{ code, msg, data }` envelope and
    /// unwrap its `data`
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: OutgoingRequest,
    ) -> Result<Option<T>, ClientError> {
        let value = self.send(request).await?;
        ApiResult::<T>::from_value(value)?.into_data()
    }

    /// Send a request and return the raw response bytes
    ///
    /// Request interceptors apply; response interceptors do not, since the
    /// body is not JSON.
    pub async fn send_raw(&self, request: OutgoingRequest) -> Result<Bytes, ClientError> {
        let method = request.method.clone();
        let url = request.url.clone();

        let response = self.transmit(request).await?;
        response.bytes().await.map_err(|e| {
            error!(%method, %url, "response error: {e}");
            ClientError::from(e)
        })
    }

    /// Run the request interceptors, transmit, and reject non-success statuses
    async fn transmit(&self, mut request: OutgoingRequest) -> Result<reqwest::Response, ClientError> {
        let method = request.method.clone();
        let url = request.url.clone();

        let prepared = self
            .request_interceptors
            .iter()
            .try_for_each(|interceptor| interceptor.on_request(&mut request))
            .and_then(|()| request.into_reqwest(&self.client));

        let builder = match prepared {
            Ok(builder) => builder,
            Err(e) => {
                error!(%method, %url, "request error: {e}");
                return Err(e);
            }
        };

        debug!(%method, %url, "Sending request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(%method, %url, "response error: {e}");
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(%method, %url, status = status.as_u16(), "Received response");
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            let err = ClientError::from_status(status, message);
            error!(%method, %url, status = status.as_u16(), "response error: {err}");
            Err(err)
        }
    }

    /// POST `body` as JSON and return the normalized response
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        let request = self.post(path).json(body)?;
        self.send(request).await
    }
}

/// Builder for XmClient
#[derive(Default)]
pub struct XmClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    storage: Option<Arc<dyn KeyValueStore>>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    unauthorized_handlers: Vec<Arc<dyn UnauthorizedHandler>>,
    without_defaults: bool,
}

impl XmClientBuilder {
    /// Start from a loaded [`ClientConfig`]
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::default()
            .base_url(config.base_url.clone())
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout (ignored on wasm32, where the browser owns it)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the store the `token` header is read from
    pub fn storage(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(store);
        self
    }

    /// Append a request interceptor; it runs after the default ones
    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Append a response interceptor; it runs after the default ones
    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Subscribe to unauthorized responses
    pub fn on_unauthorized(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.unauthorized_handlers.push(handler);
        self
    }

    /// Use only the explicitly added interceptors
    pub fn without_default_interceptors(mut self) -> Self {
        self.without_defaults = true;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<XmClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let timeout = self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
            client_builder = client_builder.timeout(timeout);
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| format!("xm-client/{}", env!("CARGO_PKG_VERSION"))),
        );

        let client = client_builder.build()?;

        let mut request_interceptors: Vec<Arc<dyn RequestInterceptor>> = Vec::new();
        let mut response_interceptors: Vec<Arc<dyn ResponseInterceptor>> = Vec::new();

        if !self.without_defaults {
            let storage: Arc<dyn KeyValueStore> = match self.storage {
                Some(storage) => storage,
                None => Arc::new(MemoryStore::new()),
            };
            request_interceptors.push(Arc::new(JsonContentType));
            request_interceptors.push(Arc::new(TokenHeader::new(storage)));
            response_interceptors.push(Arc::new(NormalizeBody));
            response_interceptors.push(Arc::new(DetectUnauthorized::new(
                self.unauthorized_handlers,
            )));
        }

        request_interceptors.extend(self.request_interceptors);
        response_interceptors.extend(self.response_interceptors);

        debug!(
            %base_url,
            request_interceptors = request_interceptors.len(),
            response_interceptors = response_interceptors.len(),
            "Built XM client"
        );

        Ok(XmClient {
            client,
            base_url,
            request_interceptors: request_interceptors.into(),
            response_interceptors: response_interceptors.into(),
        })
    }
}

fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    url.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Join `base` and `path` with exactly one `/` between them
fn join_url(base: &str, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }

    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{path}", base.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_inserts_single_slash() {
        let client = XmClient::new("http://localhost:9090").unwrap();
        assert_eq!(
            client.get("user/selectAll").url,
            "http://localhost:9090/user/selectAll"
        );
        assert_eq!(
            client.get("/user/selectAll").url,
            "http://localhost:9090/user/selectAll"
        );
        assert_eq!(client.get("").url, "http://localhost:9090");
    }

    #[test]
    fn test_absolute_url_bypasses_base() {
        let client = XmClient::new("http://localhost:9090/").unwrap();
        assert_eq!(client.get("http://other/x").url, "http://other/x");
        assert_eq!(client.get("https://other/x").url, "https://other/x");
        assert_eq!(client.get("//cdn.example.com/a").url, "//cdn.example.com/a");
    }

    #[test]
    fn test_join_with_relative_base() {
        assert_eq!(join_url("", "/user/selectAll"), "/user/selectAll");
        assert_eq!(join_url("/api", "detect"), "/api/detect");
        assert_eq!(join_url("http://host/api", "/?page=1"), "http://host/api/?page=1");
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("http://a"));
        assert!(is_absolute_url("svn+ssh://a"));
        assert!(!is_absolute_url("/path?next=http://a"));
        assert!(!is_absolute_url("1http://a"));
    }
}
