//! Client configuration.
//!
//! [`Options`] is what [`Client::new`](crate::Client::new) and
//! [`ClientType::defaults`](crate::ClientType::defaults) accept. Every field
//! is optional; [`Options::merge`] layers one set of options over another
//! with the same rules the client type uses for its accumulated defaults.

use std::collections::HashMap;
use std::time::Duration;

use crate::{Auth, LogOptions, Transport};

/// Options forwarded to the request executor.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Upper bound on each HTTP exchange.
    pub timeout: Option<Duration>,
    /// Custom transport replacing the default hyper one.
    pub transport: Option<Transport>,
}

impl RequestOptions {
    /// Per-field merge: fields set in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            timeout: overrides.timeout.or(self.timeout),
            transport: overrides.transport.or(self.transport),
        }
    }
}

/// Media type negotiation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTypeOptions {
    /// API previews to opt into.
    pub previews: Option<Vec<String>>,
    /// Response format, e.g. `raw` or `diff`.
    pub format: Option<String>,
}

impl MediaTypeOptions {
    /// Per-field merge: fields set in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            previews: overrides.previews.or(self.previews),
            format: overrides.format.or(self.format),
        }
    }
}

/// Client options.
///
/// # Example
///
/// ```
/// use tentacle::Options;
///
/// let options = Options::default()
///     .base_url("https://github.example.com/api/v3")
///     .user_agent("my-app/1.0")
///     .previews(["squirrel-girl"])
///     .time_zone("Europe/Paris");
///
/// assert_eq!(options.time_zone.as_deref(), Some("Europe/Paris"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// URL prefix for relative routes.
    pub base_url: Option<String>,
    /// Default headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
    /// Request executor options.
    pub request: RequestOptions,
    /// Media type negotiation.
    pub media_type: MediaTypeOptions,
    /// Sent as the `time-zone` header.
    pub time_zone: Option<String>,
    /// Credential or authentication strategy.
    pub auth: Option<Auth>,
    /// Prepended to the default user agent.
    pub user_agent: Option<String>,
    /// Logger overrides.
    pub log: LogOptions,
}

impl Options {
    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the credential or authentication strategy.
    #[must_use]
    pub fn auth(mut self, auth: impl Into<Auth>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Set the API previews.
    #[must_use]
    pub fn previews<I, S>(mut self, previews: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_type.previews = Some(previews.into_iter().map(Into::into).collect());
        self
    }

    /// Set the response format.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.media_type.format = Some(format.into());
        self
    }

    /// Set the `time-zone` header.
    #[must_use]
    pub fn time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Set the custom user agent prefix.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Replace the transport.
    #[must_use]
    pub fn transport(mut self, transport: Transport) -> Self {
        self.request.transport = Some(transport);
        self
    }

    /// Set the logger overrides.
    #[must_use]
    pub fn log(mut self, log: LogOptions) -> Self {
        self.log = log;
        self
    }

    /// Layer `overrides` on top of `self`.
    ///
    /// Scalar options set in `overrides` replace ours; `headers` is extended
    /// key by key; `request`, `media_type` and `log` merge field by field.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        let mut headers = HashMap::with_capacity(self.headers.len() + overrides.headers.len());
        extend_lowercase(&mut headers, self.headers);
        extend_lowercase(&mut headers, overrides.headers);
        Self {
            base_url: overrides.base_url.or(self.base_url),
            headers,
            request: self.request.merge(overrides.request),
            media_type: self.media_type.merge(overrides.media_type),
            time_zone: overrides.time_zone.or(self.time_zone),
            auth: overrides.auth.or(self.auth),
            user_agent: overrides.user_agent.or(self.user_agent),
            log: self.log.merge(overrides.log),
        }
    }
}

/// Insert `source` with lowercased names; exact lowercase keys win ties.
fn extend_lowercase(target: &mut HashMap<String, String>, source: HashMap<String, String>) {
    let mut source: Vec<_> = source.into_iter().collect();
    source.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
    for (name, value) in source {
        target.insert(name.to_ascii_lowercase(), value);
    }
}
