//! Core types for the tentacle API client.
//!
//! This crate provides the transport-independent foundation:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types
//! - [`Response`] - HTTP response type
//! - [`Error`] and [`Result`] - Error handling
//! - [`Endpoint`] - Route template, headers, media type and parameters of a call
//! - [`Hook`] - Named interceptor chains every request runs through

mod body;
mod endpoint;
mod error;
pub mod hook;
mod method;
pub mod prelude;
mod request;
mod response;

pub use body::{ContentType, from_json, to_json};
pub use endpoint::{DEFAULT_ACCEPT, DEFAULT_BASE_URL, Endpoint, MediaType, Parameters};
pub use error::{Error, Result};
pub use hook::{Hook, HookChain, HookFuture, HookId, Interceptor, Next};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;
