//! The terminal HTTP sender every request ends in.
//!
//! [`Transport`] is a cloneable, type-erased Tower service from
//! [`Request`] to [`Response`]. The default is [`HttpTransport`] (hyper-util
//! with rustls); [`Transport::from_service`] accepts any Tower service, which
//! is how tests and custom stacks plug in.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use tracing::debug;

use crate::{
    Error, Request, Response, Result,
    config::{TransportConfig, TransportConfigBuilder},
};

/// Type-erased service used for layer composition.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future returned by [`Transport::send`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

// ============================================================================
// Transport
// ============================================================================

/// Cloneable handle on the service that actually sends requests.
///
/// The boxed service sits behind a mutex so the handle is `Sync`; the lock is
/// only held while cloning the service.
#[derive(Clone)]
pub struct Transport {
    service: Arc<Mutex<BoxedService>>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Default for Transport {
    fn default() -> Self {
        HttpTransport::builder().build()
    }
}

impl Transport {
    /// The default hyper transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap any Tower service.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let transport = Transport::from_service(tower::service_fn(|request: Request| async move {
    ///     Ok::<_, Error>(Response::new(200, HashMap::new(), Bytes::new()))
    /// }));
    /// ```
    pub fn from_service<S>(service: S) -> Self
    where
        S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        Self {
            service: Arc::new(Mutex::new(BoxCloneService::new(service))),
        }
    }

    /// Send a request.
    #[must_use]
    pub fn send(&self, request: Request<Bytes>) -> TransportFuture {
        let service = self
            .service
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(service.oneshot(request))
    }
}

// ============================================================================
// Hyper transport
// ============================================================================

/// HTTP transport using hyper-util with connection pooling and rustls.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport with the given configuration.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(config.connect_timeout));

        Self { inner, config }
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    /// The transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn to_hyper_request(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    fn response_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
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

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }

    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let method = request.method();
        let url = request.url().to_string();
        let start = Instant::now();

        let hyper_request = Self::to_hyper_request(request)?;
        let exchange = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(Self::map_hyper_error)?;

            let status = response.status().as_u16();
            let headers = Self::response_headers(response.headers());
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok::<_, Error>(Response::new(status, headers, body))
        };

        let response = tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)??;

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(%method, %url, status = response.status(), elapsed_ms, "exchange completed");

        Ok(response)
    }
}

impl Service<Request<Bytes>> for HttpTransport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}

/// Create an HTTPS connector with rustls and Mozilla root certificates.
fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for a [`Transport`] backed by [`HttpTransport`].
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use tentacle::HttpTransport;
/// use tower::limit::ConcurrencyLimitLayer;
///
/// let transport = HttpTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .layer(ConcurrencyLimitLayer::new(8))
///     .build();
/// ```
#[derive(Default)]
pub struct TransportBuilder {
    config: TransportConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for TransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl TransportBuilder {
    /// Set the request timeout.
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

    /// Add a Tower layer around the hyper service.
    ///
    /// Layers are applied in order: first added = innermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Build the transport with all configured layers.
    #[must_use]
    pub fn build(self) -> Transport {
        let transport = HttpTransport::with_config(self.config.build());
        let mut service: BoxedService = BoxCloneService::new(transport);

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        Transport {
            service: Arc::new(Mutex::new(service)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    #[test]
    fn http_transport_config() {
        let transport = HttpTransport::with_config(
            TransportConfig::builder()
                .timeout(Duration::from_secs(60))
                .build(),
        );
        assert_eq!(transport.config().timeout, Duration::from_secs(60));
        assert!(format!("{transport:?}").contains("HttpTransport"));
    }

    #[test]
    fn builder_counts_layers() {
        let builder = HttpTransport::builder()
            .layer(tower::layer::util::Identity::new())
            .layer(tower::layer::util::Identity::new());
        assert!(format!("{builder:?}").contains("layers_count: 2"));
    }

    #[tokio::test]
    async fn from_service_sends_through_service() {
        let transport = Transport::from_service(tower::service_fn(
            |request: Request<Bytes>| async move {
                let status = if request.method() == Method::Delete { 204 } else { 200 };
                Ok::<_, Error>(Response::new(status, HashMap::new(), Bytes::new()))
            },
        ));

        let url = url::Url::parse("https://api.github.com/gists/1").expect("url");
        let response = transport
            .send(Request::builder(Method::Delete, url).build())
            .await
            .expect("response");

        assert_eq!(response.status(), 204);
    }

    #[test]
    fn to_hyper_request_copies_parts() {
        let url = url::Url::parse("https://api.github.com/user").expect("url");
        let request = Request::builder(Method::Patch, url)
            .header("authorization", "token abc")
            .body(Bytes::from("{}"))
            .build();

        let hyper_request = HttpTransport::to_hyper_request(request).expect("hyper request");
        assert_eq!(hyper_request.method(), http::Method::PATCH);
        assert_eq!(hyper_request.uri(), "https://api.github.com/user");
        assert_eq!(
            hyper_request.headers().get("authorization").map(|v| v.as_bytes()),
            Some("token abc".as_bytes())
        );
    }
}
