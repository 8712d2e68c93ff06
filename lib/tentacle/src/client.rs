//! The client instance.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::user_agent::user_agent;
use crate::{
    ClientType, Endpoint, Error, Graphql, Hook, Log, Options, Properties, Requester, Response,
    Result,
};

/// Hook chain every REST and GraphQL call runs through.
pub const REQUEST_HOOK: &str = "request";

/// A configured API client.
///
/// Every client owns its [`Hook`]; the bound [`Requester`] and [`Graphql`]
/// executors route through its `"request"` chain, so interceptors registered
/// by plugins or authentication apply to both.
///
/// # Example
///
/// ```ignore
/// use serde_json::json;
/// use tentacle::{Client, Options};
///
/// let client = Client::new(Options::default().auth("ghp_xxx").user_agent("my-app/1.0"))?;
/// let repo = client
///     .request("GET /repos/{owner}/{repo}", json!({"owner": "octocat", "repo": "hello-world"}))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    requester: Requester,
    graphql: Graphql,
    hook: Hook,
    log: Log,
    properties: Properties,
}

impl Client {
    /// Build a client from the base type.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable `base_url`, an invalid header, or an auth
    /// token that cannot be sent as a header.
    pub fn new(options: Options) -> Result<Self> {
        ClientType::default().build(options)
    }

    pub(crate) fn from_type(client_type: &ClientType, options: Options) -> Result<Self> {
        let options = client_type.default_options().clone().merge(options);
        let hook = Hook::new();

        let mut defaults = Endpoint::default();
        let agent = user_agent(options.user_agent.as_deref());
        check_header("user-agent", &agent)?;
        defaults.set_header("user-agent", agent);

        if let Some(base_url) = &options.base_url {
            url::Url::parse(base_url).map_err(|err| {
                Error::invalid_config(format!("invalid base URL '{base_url}': {err}"))
            })?;
            defaults.base_url.clone_from(base_url);
        }
        // Uppercase sorts first, so an exact lowercase key is applied last.
        let mut headers: Vec<_> = options.headers.iter().collect();
        headers.sort_unstable_by_key(|(name, _)| name.as_str());
        for (name, value) in headers {
            check_header(name, value)?;
            defaults.set_header(name, value.as_str());
        }
        if let Some(previews) = &options.media_type.previews {
            defaults.media_type.previews.clone_from(previews);
        }
        if let Some(format) = &options.media_type.format {
            defaults.media_type.format.clone_from(format);
        }
        if let Some(time_zone) = &options.time_zone {
            check_header("time-zone", time_zone)?;
            defaults.set_header("time-zone", time_zone.as_str());
        }

        if let Some(auth) = &options.auth {
            auth.install(&mut defaults, &hook)?;
        }

        let requester = Requester::new(options.request.transport.clone().unwrap_or_default())
            .with_endpoint(defaults)
            .with_hook(hook.chain(REQUEST_HOOK))
            .with_timeout(options.request.timeout);
        let graphql = Graphql::with_custom_request(requester.clone());

        let mut client = Self {
            requester,
            graphql,
            hook,
            log: Log::new(options.log.clone()),
            properties: Properties::new(),
        };

        for plugin in client_type.plugin_list() {
            let properties = plugin.apply(&client, &options);
            client.properties.extend(properties);
        }
        debug!(
            plugins = client_type.plugin_count(),
            properties = client.properties.len(),
            "client assembled"
        );

        Ok(client)
    }

    /// Send a REST request.
    ///
    /// # Errors
    ///
    /// See [`Requester::request`].
    pub async fn request(&self, route: &str, params: Value) -> Result<Response<Bytes>> {
        self.requester.request(route, params).await
    }

    /// Send a REST request and decode the JSON response body.
    pub async fn request_json<T: DeserializeOwned>(&self, route: &str, params: Value) -> Result<T> {
        self.request(route, params).await?.json()
    }

    /// The bound request executor.
    #[must_use]
    pub const fn requester(&self) -> &Requester {
        &self.requester
    }

    /// The bound GraphQL executor.
    #[must_use]
    pub const fn graphql(&self) -> &Graphql {
        &self.graphql
    }

    /// The instance hook collection.
    #[must_use]
    pub const fn hook(&self) -> &Hook {
        &self.hook
    }

    /// The instance logger.
    #[must_use]
    pub const fn log(&self) -> &Log {
        &self.log
    }

    /// The merged request defaults.
    #[must_use]
    pub const fn defaults(&self) -> &Endpoint {
        self.requester.endpoint_defaults()
    }

    /// A plugin-contributed property.
    #[must_use]
    pub fn property<T: std::any::Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.properties.get(name)
    }

    /// Every plugin-contributed property.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }
}

fn check_header(name: &str, value: &str) -> Result<()> {
    http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::invalid_config(format!("invalid header name '{name}'")))?;
    http::HeaderValue::from_str(value)
        .map_err(|_| Error::invalid_config(format!("invalid value for header '{name}'")))?;
    Ok(())
}
