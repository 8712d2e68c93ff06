//! Extensible API client core with plugins and request hooks.
//!
//! A [`ClientType`] accumulates default [`Options`] and [`Plugin`]s; each
//! [`Client`] built from it owns a [`Hook`] whose `"request"` chain wraps
//! every REST and GraphQL call. Authentication, logging, caching or retry
//! logic plug in as interceptors on that chain.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use tentacle::prelude::*;
//! use tentacle::plugins::request_log;
//!
//! let github = ClientType::default()
//!     .defaults(Options::default().user_agent("my-app/1.0"))
//!     .plugin(request_log());
//!
//! let client = github.build(Options::default().auth("ghp_xxx"))?;
//! client.hook().before("request", |endpoint| {
//!     endpoint.set_header("x-github-api-version", "2022-11-28");
//!     Ok(())
//! });
//!
//! let issues = client
//!     .request("GET /repos/{owner}/{repo}/issues", json!({"owner": "octocat", "repo": "hello-world"}))
//!     .await?;
//! let viewer = client.graphql().query("{ viewer { login } }", json!(null)).await?;
//! ```

mod auth;
mod client;
mod config;
mod graphql;
mod log;
mod options;
mod plugin;
pub mod plugins;
pub mod prelude;
mod requester;
mod transport;
mod user_agent;

pub use auth::{Auth, AuthStrategy, with_authorization_prefix};
pub use client::{Client, REQUEST_HOOK};
pub use config::{TransportConfig, TransportConfigBuilder};
pub use graphql::Graphql;
pub use log::{Log, LogFn, LogOptions};
pub use options::{MediaTypeOptions, Options, RequestOptions};
pub use plugin::{ClientType, Plugin, Properties};
pub use requester::Requester;
pub use transport::{BoxedService, HttpTransport, Transport, TransportBuilder, TransportFuture};
pub use user_agent::{VERSION, default_user_agent};

// Re-export tower for transport layer composition
pub use tower;

// Re-export core types
pub use tentacle_core::{
    ContentType, DEFAULT_ACCEPT, DEFAULT_BASE_URL, Endpoint, Error, Hook, HookChain, HookFuture,
    HookId, Interceptor, MediaType, Method, Next, Parameters, Request, RequestBuilder, Response,
    Result, from_json, to_json,
};
