//! Request logging plugin.
//!
//! Logs one line per request through the client's [`Log`](crate::Log):
//! `GET /repos/octocat/hello-world - 200 in 42ms` at info level, or at error
//! level when the request fails.

use std::sync::LazyLock;
use std::time::Instant;

use tracing::{Instrument, Level, span};

use crate::{Endpoint, Next, Plugin, Properties, REQUEST_HOOK};

static REQUEST_LOG: LazyLock<Plugin> = LazyLock::new(|| {
    Plugin::new(|client, _options| {
        let log = client.log().clone();
        client
            .hook()
            .wrap(REQUEST_HOOK, move |next: Next, endpoint: Endpoint| {
                let log = log.clone();
                let method = endpoint.method;
                let path = request_path(&endpoint);
                let span = span!(Level::DEBUG, "request_log", %method, %path);

                async move {
                    let start = Instant::now();
                    let result = next.run(endpoint).await;
                    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                    match &result {
                        Ok(response) => log.info(
                            &format!("{method} {path} - {} in {elapsed_ms}ms", response.status()),
                            None,
                        ),
                        Err(err) => {
                            let status = err
                                .status()
                                .map_or_else(|| "error".to_string(), |status| status.to_string());
                            log.error(&format!("{method} {path} - {status} in {elapsed_ms}ms"), None);
                        }
                    }
                    result
                }
                .instrument(span)
            });
        Properties::new()
    })
});

/// The request-logging plugin.
///
/// Every call returns the same plugin, so adding it twice to a client type
/// is a no-op.
#[must_use]
pub fn request_log() -> Plugin {
    REQUEST_LOG.clone()
}

/// Path and query of the request, without the base URL.
fn request_path(endpoint: &Endpoint) -> String {
    endpoint.to_request().map_or_else(
        |_| endpoint.url.clone(),
        |request| {
            let url = request.url();
            match url.query() {
                Some(query) => format!("{}?{query}", url.path()),
                None => url.path().to_string(),
            }
        },
    )
}
