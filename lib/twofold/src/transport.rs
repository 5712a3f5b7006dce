//! HTTP transport built on hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::util::BoxCloneSyncService;
use tower::{Layer, ServiceExt};
use tower_service::Service;

use crate::config::{TransportConfig, TransportConfigBuilder};
use crate::middleware::LoggingLayer;
use crate::{Error, Request, Response, Result, Transport};

/// Type-erased service the middleware stack is composed of.
pub type BoxedService = BoxCloneSyncService<Request<Bytes>, Response, Error>;

/// Future type for the Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// HTTPS-or-HTTP connector using rustls with the Mozilla root certificates.
fn https_connector(config: &TransportConfig) -> HttpsConnector<HttpConnector> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// Flatten an error and its sources into one message.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// ============================================================================
// Connection (innermost service)
// ============================================================================

#[derive(Clone)]
struct Connection {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: Arc<TransportConfig>,
}

impl Connection {
    fn new(config: TransportConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(&config));

        Self {
            client,
            config: Arc::new(config),
        }
    }

    fn build_hyper_request(&self, request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &self.config.default_headers {
            if !headers.keys().any(|key| key.eq_ignore_ascii_case(name)) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::transport(format!("invalid request: {e}")))
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn round_trip(&self, request: http::Request<Full<Bytes>>) -> Result<Response> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| Error::transport(describe(&e)))?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::transport(describe(&e)))?
            .to_bytes();

        Ok(Response::new(status, headers, body))
    }

    async fn send(&self, request: Request<Bytes>) -> Result<Response> {
        let hyper_request = self.build_hyper_request(request)?;
        let timeout = self.config.timeout;

        tokio::time::timeout(timeout, self.round_trip(hyper_request))
            .await
            .map_err(|_| Error::transport(timed_out(timeout)))?
    }
}

fn timed_out(timeout: Duration) -> String {
    format!("request timed out after {}ms", timeout.as_millis())
}

impl Service<Request<Bytes>> for Connection {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let connection = self.clone();
        Box::pin(async move { connection.send(request).await })
    }
}

// ============================================================================
// Public Transport
// ============================================================================

/// HTTP transport using hyper-util with connection pooling, TLS, and Tower
/// middleware support.
///
/// # Example
///
/// ```ignore
/// use twofold::HyperTransport;
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: BoxedService,
    config: Arc<TransportConfig>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration and no middleware.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        let connection = Connection::new(config);
        let config = Arc::clone(&connection.config);
        Self {
            service: BoxCloneSyncService::new(connection),
            config,
        }
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response>> + Send {
        self.service.clone().oneshot(request)
    }
}

impl Service<Request<Bytes>> for HyperTransport {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        Box::pin(self.service.call(request))
    }
}

/// Builder for [`HyperTransport`].
///
/// Layers are applied in order: first added = outermost.
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: TransportConfigBuilder,
    layers: Vec<LayerFn>,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Set the whole-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.default_header(name, value);
        self
    }

    /// Add a Tower layer around the transport.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response, Error = Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send + 'static,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneSyncService::new(layer.layer(service))
        }));
        self
    }

    /// Log each request at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log each request at debug level, headers included.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the transport with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let connection = Connection::new(self.config.build());
        let config = Arc::clone(&connection.config);

        let mut service = BoxCloneSyncService::new(connection);
        // Wrap innermost-first so the first layer added ends up outermost.
        for layer_fn in self.layers.iter().rev() {
            service = layer_fn(service);
        }

        HyperTransport { service, config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(describe(&io), "refused");
    }

    #[test]
    fn timed_out_message() {
        assert_eq!(
            timed_out(Duration::from_millis(250)),
            "request timed out after 250ms"
        );
    }

    #[tokio::test]
    async fn transport_default() {
        let transport = HyperTransport::new();
        assert_eq!(transport.config().timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn transport_builder() {
        let transport = HyperTransport::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_per_host(16)
            .default_header("User-Agent", "twofold-test")
            .with_logging()
            .build();

        assert_eq!(transport.config().timeout, Duration::from_secs(60));
        assert_eq!(transport.config().pool_idle_per_host, 16);
        assert!(format!("{transport:?}").contains("HyperTransport"));
    }

    #[tokio::test]
    async fn default_headers_do_not_override_request_headers() {
        let connection = Connection::new(
            TransportConfig::builder()
                .default_header("accept", "text/plain")
                .default_header("User-Agent", "twofold")
                .build(),
        );
        let url = url::Url::parse("http://localhost/items").expect("url");
        let request = Request::get(url)
            .header("Accept", "application/json")
            .build();
        let (method, url, headers, _) = request.into_parts();

        let hyper_request = connection
            .build_hyper_request(Request::from_parts(method, url, headers, None))
            .expect("valid request");

        let accept: Vec<_> = hyper_request.headers().get_all("accept").iter().collect();
        assert_eq!(accept, vec!["application/json"]);
        assert_eq!(hyper_request.headers()["user-agent"], "twofold");
    }
}
