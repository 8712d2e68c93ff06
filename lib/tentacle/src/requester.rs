//! The request executor.
//!
//! A [`Requester`] holds endpoint defaults, an optional hook chain and a
//! transport. [`Requester::request`] merges a route and parameters onto the
//! defaults, runs the hook chain and finally sends the request through the
//! transport.

use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::{Endpoint, Error, HookChain, HookFuture, Response, Result, Transport};

/// Route-templated request executor, optionally bound to a hook chain.
///
/// Cloning is cheap: the transport and the hook are shared.
#[derive(Debug, Clone, Default)]
pub struct Requester {
    defaults: Endpoint,
    hook: Option<HookChain>,
    transport: Transport,
    timeout: Option<Duration>,
}

impl Requester {
    /// An executor sending through `transport`, with library defaults.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self {
            defaults: Endpoint::default(),
            hook: None,
            transport,
            timeout: None,
        }
    }

    /// A new executor whose defaults are ours merged with `params`.
    ///
    /// `params` uses the same shape as a call's parameters, including the
    /// reserved `headers`, `mediaType` and `baseUrl` keys.
    pub fn defaults(&self, params: Value) -> Result<Self> {
        Ok(Self {
            defaults: self.defaults.merge("", params)?,
            ..self.clone()
        })
    }

    /// Replace the endpoint defaults.
    #[must_use]
    pub fn with_endpoint(mut self, defaults: Endpoint) -> Self {
        self.defaults = defaults;
        self
    }

    /// Route every request through `hook`.
    #[must_use]
    pub fn with_hook(mut self, hook: HookChain) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Bound each HTTP exchange by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The endpoint defaults.
    #[must_use]
    pub const fn endpoint_defaults(&self) -> &Endpoint {
        &self.defaults
    }

    /// Build the endpoint for a call without sending it.
    pub fn endpoint(&self, route: &str, params: Value) -> Result<Endpoint> {
        self.defaults.merge(route, params)
    }

    /// Send a request.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let response = requester
    ///     .request("GET /repos/{owner}/{repo}", json!({"owner": "octocat", "repo": "hello-world"}))
    ///     .await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on an invalid route, a transport error, or a status >= 400
    /// ([`Error::Http`] with the response body).
    pub async fn request(&self, route: &str, params: Value) -> Result<Response<Bytes>> {
        let endpoint = self.endpoint(route, params)?;
        self.send(endpoint).await
    }

    /// Run an already built endpoint through the hook and the transport.
    #[must_use]
    pub fn send(&self, endpoint: Endpoint) -> HookFuture {
        let transport = self.transport.clone();
        let timeout = self.timeout;
        let terminal = move |endpoint: Endpoint| dispatch(transport.clone(), timeout, endpoint);

        match &self.hook {
            Some(hook) => hook.invoke(endpoint, terminal),
            None => Box::pin(terminal(endpoint)),
        }
    }
}

async fn dispatch(
    transport: Transport,
    timeout: Option<Duration>,
    endpoint: Endpoint,
) -> Result<Response<Bytes>> {
    let request = endpoint.to_request()?;
    let exchange = transport.send(request);

    let response = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)??,
        None => exchange.await?,
    };

    if response.is_error() {
        let status = response.status();
        let message = error_message(status, response.body());
        return Err(Error::http_with_body(status, message, response.into_body()));
    }

    Ok(response)
}

/// The API's `message` field when the body carries one, else the reason phrase.
fn error_message(status: u16, body: &Bytes) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|body| body.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            http::StatusCode::from_u16(status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("unknown status")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::{Hook, Method, Request};

    fn recording_transport(
        status: u16,
        body: &'static str,
    ) -> (Transport, Arc<Mutex<Vec<Request<Bytes>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let transport = Transport::from_service(tower::service_fn(move |request: Request<Bytes>| {
            sink.lock().expect("lock").push(request);
            async move { Ok::<_, Error>(Response::new(status, HashMap::new(), Bytes::from(body))) }
        }));
        (transport, seen)
    }

    #[tokio::test]
    async fn request_expands_route_and_sends() {
        let (transport, seen) = recording_transport(200, "{}");
        let requester = Requester::new(transport);

        requester
            .request(
                "GET /repos/{owner}/{repo}",
                json!({"owner": "octocat", "repo": "hello-world"}),
            )
            .await
            .expect("response");

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method(), Method::Get);
        assert_eq!(
            seen[0].url().as_str(),
            "https://api.github.com/repos/octocat/hello-world"
        );
    }

    #[tokio::test]
    async fn error_status_carries_message_and_body() {
        let (transport, _) = recording_transport(404, r#"{"message":"Not Found"}"#);

        let err = Requester::new(transport)
            .request("GET /repos/{owner}/{repo}", json!({"owner": "o", "repo": "r"}))
            .await
            .expect_err("404");

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(err.body(), Some(&Bytes::from(r#"{"message":"Not Found"}"#)));
    }

    #[tokio::test]
    async fn error_status_without_json_uses_reason_phrase() {
        let (transport, _) = recording_transport(502, "upstream down");

        let err = Requester::new(transport)
            .request("/", Value::Null)
            .await
            .expect_err("502");

        assert_eq!(err.to_string(), "HTTP error 502: Bad Gateway");
    }

    #[tokio::test]
    async fn defaults_merge_reserved_keys() {
        let (transport, seen) = recording_transport(200, "{}");
        let requester = Requester::new(transport)
            .defaults(json!({
                "baseUrl": "https://ghe.example.com/api/v3",
                "headers": {"X-Trace": "1"},
            }))
            .expect("defaults");

        requester.request("GET /user", Value::Null).await.expect("response");

        let seen = seen.lock().expect("lock");
        assert_eq!(seen[0].url().as_str(), "https://ghe.example.com/api/v3/user");
        assert_eq!(seen[0].header("x-trace"), Some("1"));
    }

    #[tokio::test]
    async fn hook_wraps_the_transport() {
        let (transport, seen) = recording_transport(200, "{}");
        let hook = Hook::new();
        hook.before("request", |endpoint: &mut Endpoint| {
            endpoint.set_header("x-hooked", "yes");
            Ok(())
        });

        Requester::new(transport)
            .with_hook(hook.chain("request"))
            .request("GET /user", Value::Null)
            .await
            .expect("response");

        assert_eq!(seen.lock().expect("lock")[0].header("x-hooked"), Some("yes"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bounds_the_exchange() {
        let transport = Transport::from_service(tower::service_fn(|_: Request<Bytes>| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, Error>(Response::new(200, HashMap::new(), Bytes::new()))
        }));

        let err = Requester::new(transport)
            .with_timeout(Some(Duration::from_secs(1)))
            .request("GET /user", Value::Null)
            .await
            .expect_err("timeout");

        assert!(err.is_timeout());
    }

    #[test]
    fn endpoint_builds_without_sending() {
        let endpoint = Requester::default()
            .endpoint("POST /gists", json!({"public": true}))
            .expect("endpoint");
        assert_eq!(endpoint.method, Method::Post);
        assert_eq!(endpoint.params.get("public"), Some(&json!(true)));
    }
}
