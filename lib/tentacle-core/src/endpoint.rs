//! Endpoint description: route templating and media type negotiation.
//!
//! An [`Endpoint`] is what flows through the hook pipeline. It keeps the
//! route template and the parameters apart until [`Endpoint::to_request`]
//! turns it into a concrete [`Request`], so interceptors can still inspect
//! or rewrite `{owner}`-style parameters.
//!
//! # Example
//!
//! ```
//! use tentacle_core::{Endpoint, Method};
//! use serde_json::json;
//!
//! let endpoint = Endpoint::default()
//!     .merge("GET /repos/{owner}/{repo}/issues", json!({
//!         "owner": "octocat",
//!         "repo": "hello-world",
//!         "state": "open",
//!     }))
//!     .expect("valid route");
//!
//! let request = endpoint.to_request().expect("valid request");
//! assert_eq!(request.method(), Method::Get);
//! assert_eq!(
//!     request.url().as_str(),
//!     "https://api.github.com/repos/octocat/hello-world/issues?state=open"
//! );
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::{ContentType, Error, Method, Request, Result};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// `accept` header used when none is configured.
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json";

/// Characters escaped when a parameter is substituted into a path.
const PATH_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Request parameters, keyed by name.
pub type Parameters = serde_json::Map<String, Value>;

/// Media type negotiation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaType {
    /// API previews to opt into, in order.
    pub previews: Vec<String>,
    /// Response format (e.g. `raw`, `diff`), empty for the default.
    pub format: String,
}

/// A request description: method, URL template, headers and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// HTTP method.
    pub method: Method,
    /// URL prefix for relative URLs.
    pub base_url: String,
    /// Absolute URL or path template such as `/repos/{owner}/{repo}`.
    pub url: String,
    /// Headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
    /// Media type negotiation.
    pub media_type: MediaType,
    /// Parameters for the URL template, query string or body.
    pub params: Parameters,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            method: Method::Get,
            base_url: DEFAULT_BASE_URL.to_string(),
            url: String::new(),
            headers: HashMap::from([("accept".to_string(), DEFAULT_ACCEPT.to_string())]),
            media_type: MediaType::default(),
            params: Parameters::new(),
        }
    }
}

impl Endpoint {
    /// Sets a header, lowercasing its name.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets a header in place, lowercasing its name.
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Header value by (case-insensitive) name.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Merge a route (`"GET /path"`, `"/path"` or an absolute URL) and
    /// per-call parameters onto these defaults.
    ///
    /// The reserved parameters `headers`, `mediaType` and `baseUrl` update the
    /// corresponding fields instead of being sent.
    pub fn merge(&self, route: &str, params: Value) -> Result<Self> {
        let mut endpoint = self.clone();

        let route = route.trim();
        if !route.is_empty() {
            match route.split_once(char::is_whitespace) {
                Some((method, url)) => {
                    endpoint.method = method.parse()?;
                    endpoint.url = url.trim().to_string();
                }
                None => endpoint.url = route.to_string(),
            }
        }

        let params = match params {
            Value::Object(params) => params,
            Value::Null => Parameters::new(),
            other => {
                return Err(Error::invalid_request(format!(
                    "parameters must be an object, got {other}"
                )));
            }
        };

        for (key, value) in params {
            if let Some(value) = endpoint.merge_reserved(&key, value) {
                endpoint.params.insert(key, value);
            }
        }

        Ok(endpoint)
    }

    /// Applies a reserved parameter, handing back any other value.
    fn merge_reserved(&mut self, key: &str, value: Value) -> Option<Value> {
        match (key, value) {
            ("headers", Value::Object(headers)) => {
                for (name, value) in headers {
                    if let Some(value) = param_to_string(&value) {
                        self.set_header(name, value);
                    }
                }
                None
            }
            ("mediaType", Value::Object(media_type)) => {
                self.merge_media_type(&media_type);
                None
            }
            ("baseUrl", Value::String(base_url)) => {
                self.base_url = base_url;
                None
            }
            (_, value) => Some(value),
        }
    }

    fn merge_media_type(&mut self, media_type: &Parameters) {
        if let Some(format) = media_type.get("format").and_then(Value::as_str) {
            self.media_type.format = format.to_string();
        }
        if let Some(previews) = media_type.get("previews").and_then(Value::as_array) {
            for preview in previews.iter().filter_map(Value::as_str) {
                if !self.media_type.previews.iter().any(|p| p == preview) {
                    self.media_type.previews.push(preview.to_string());
                }
            }
        }
    }

    /// The `accept` header after applying previews and format.
    #[must_use]
    pub fn accept(&self) -> String {
        let accept = self.get_header("accept").unwrap_or(DEFAULT_ACCEPT);
        let format = self.media_type.format.as_str();

        if !self.media_type.previews.is_empty() {
            let suffix = if format.is_empty() {
                "+json".to_string()
            } else {
                format!(".{format}")
            };
            return self
                .media_type
                .previews
                .iter()
                .map(|preview| format!("application/vnd.github.{preview}-preview{suffix}"))
                .collect::<Vec<_>>()
                .join(",");
        }

        if !format.is_empty() && accept.starts_with("application/vnd") {
            return format!("application/vnd.github.v3.{format}");
        }

        accept.to_string()
    }

    /// The absolute URL with the template expanded, before the query string.
    ///
    /// Parameters consumed by the template are removed from `params`.
    fn expand_url(&self, params: &mut Parameters) -> Result<String> {
        let mut path = String::with_capacity(self.url.len());
        let mut rest = self.url.as_str();

        while let Some((before, after)) = rest.split_once('{') {
            path.push_str(before);
            let Some((name, tail)) = after.split_once('}') else {
                path.push('{');
                rest = after;
                continue;
            };
            let value = params
                .remove(name)
                .as_ref()
                .and_then(param_to_string)
                .ok_or_else(|| Error::MissingParameter(name.to_string()))?;
            path.extend(utf8_percent_encode(&value, PATH_PARAM));
            rest = tail;
        }
        path.push_str(rest);

        if path.starts_with("http://") || path.starts_with("https://") {
            Ok(path)
        } else {
            Ok(format!("{}{path}", self.base_url.trim_end_matches('/')))
        }
    }

    /// Turn this endpoint into a concrete HTTP request.
    ///
    /// Leftover parameters become the query string for `GET`/`HEAD` and the
    /// JSON body otherwise; a `data` parameter is sent as the raw body.
    pub fn to_request(&self) -> Result<Request<Bytes>> {
        let mut params = self.params.clone();
        let mut url = url::Url::parse(&self.expand_url(&mut params)?)?;

        let mut headers = self.headers.clone();
        headers.insert("accept".to_string(), self.accept());

        let mut body = None;
        if self.method.uses_query() {
            if !params.is_empty() {
                let mut query = url.query_pairs_mut();
                for (name, value) in &params {
                    if let Some(value) = param_to_string(value) {
                        query.append_pair(name, &value);
                    }
                }
            }
        } else if let Some(data) = params.remove("data") {
            let (content_type, bytes) = match data {
                Value::String(text) => (ContentType::PlainText, Bytes::from(text)),
                other => (ContentType::Json, crate::to_json(&other)?),
            };
            headers
                .entry("content-type".to_string())
                .or_insert_with(|| content_type.to_string());
            body = Some(bytes);
        } else if !params.is_empty() {
            headers
                .entry("content-type".to_string())
                .or_insert_with(|| ContentType::Json.to_string());
            body = Some(crate::to_json(&params)?);
        }

        let builder = Request::builder(self.method, url).headers(headers);
        Ok(match body {
            Some(body) => builder.body(body).build(),
            None => builder.build(),
        })
    }
}

/// String form of a parameter; `None` for `null`.
fn param_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(param_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merge_parses_method_and_url() {
        let endpoint = Endpoint::default()
            .merge("POST /repos/{owner}/{repo}/issues", Value::Null)
            .expect("route");
        assert_eq!(endpoint.method, Method::Post);
        assert_eq!(endpoint.url, "/repos/{owner}/{repo}/issues");

        let endpoint = Endpoint::default().merge("/zen", Value::Null).expect("route");
        assert_eq!(endpoint.method, Method::Get);
        assert_eq!(endpoint.url, "/zen");
    }

    #[test]
    fn merge_rejects_unknown_method_and_non_object_params() {
        assert!(Endpoint::default().merge("FETCH /zen", Value::Null).is_err());
        assert!(Endpoint::default().merge("GET /zen", json!([1, 2])).is_err());
    }

    #[test]
    fn merge_does_not_touch_defaults() {
        let defaults = Endpoint::default();
        let _ = defaults
            .merge("GET /user", json!({"headers": {"X-Custom": "1"}}))
            .expect("route");
        assert_eq!(defaults, Endpoint::default());
    }

    #[test]
    fn merge_reserved_parameters() {
        let endpoint = Endpoint::default()
            .merge(
                "GET /user",
                json!({
                    "headers": {"If-None-Match": "\"abc\""},
                    "mediaType": {"previews": ["squirrel-girl"], "format": "raw"},
                    "baseUrl": "https://ghe.example.com/api/v3",
                    "per_page": 100,
                }),
            )
            .expect("route");

        assert_eq!(endpoint.get_header("if-none-match"), Some("\"abc\""));
        assert_eq!(endpoint.media_type.previews, vec!["squirrel-girl"]);
        assert_eq!(endpoint.media_type.format, "raw");
        assert_eq!(endpoint.base_url, "https://ghe.example.com/api/v3");
        assert_eq!(endpoint.params.len(), 1);
    }

    #[test]
    fn merge_appends_new_previews_only() {
        let mut defaults = Endpoint::default();
        defaults.media_type.previews = vec!["jean-grey".to_string()];
        let endpoint = defaults
            .merge(
                "GET /search",
                json!({"mediaType": {"previews": ["jean-grey", "symmetra"]}}),
            )
            .expect("route");
        assert_eq!(endpoint.media_type.previews, vec!["jean-grey", "symmetra"]);
    }

    #[test]
    fn to_request_expands_and_encodes_path() {
        let request = Endpoint::default()
            .merge(
                "GET /repos/{owner}/{repo}/contents/{path}",
                json!({"owner": "octocat", "repo": "hello world", "path": "a/b.md"}),
            )
            .expect("route")
            .to_request()
            .expect("request");
        assert_eq!(
            request.url().as_str(),
            "https://api.github.com/repos/octocat/hello%20world/contents/a%2Fb.md"
        );
    }

    #[test]
    fn to_request_missing_parameter() {
        let err = Endpoint::default()
            .merge("GET /repos/{owner}/{repo}", json!({"owner": "octocat"}))
            .expect("route")
            .to_request()
            .expect_err("repo is missing");
        assert!(matches!(err, Error::MissingParameter(name) if name == "repo"));
    }

    #[test]
    fn to_request_leftover_params_become_json_body() {
        let request = Endpoint::default()
            .merge(
                "POST /repos/{owner}/{repo}/issues",
                json!({"owner": "octocat", "repo": "hello-world", "title": "Found a bug"}),
            )
            .expect("route")
            .to_request()
            .expect("request");
        assert_eq!(request.header("content-type"), Some("application/json; charset=utf-8"));
        let body: Value = crate::from_json(request.body().expect("body")).expect("json");
        assert_eq!(body, json!({"title": "Found a bug"}));
    }

    #[test]
    fn to_request_data_parameter_is_raw_body() {
        let request = Endpoint::default()
            .merge("POST /markdown/raw", json!({"data": "Hello **world**"}))
            .expect("route")
            .to_request()
            .expect("request");
        assert_eq!(request.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(request.body(), Some(&Bytes::from("Hello **world**")));
    }

    #[test]
    fn to_request_absolute_url_ignores_base_url() {
        let request = Endpoint::default()
            .merge("GET https://uploads.github.com/meta", Value::Null)
            .expect("route")
            .to_request()
            .expect("request");
        assert_eq!(request.url().as_str(), "https://uploads.github.com/meta");
    }

    #[test]
    fn accept_with_format_and_previews() {
        let mut endpoint = Endpoint::default();
        assert_eq!(endpoint.accept(), DEFAULT_ACCEPT);

        endpoint.media_type.format = "diff".to_string();
        assert_eq!(endpoint.accept(), "application/vnd.github.v3.diff");

        endpoint.media_type.previews = vec!["mercy".to_string(), "nebula".to_string()];
        assert_eq!(
            endpoint.accept(),
            "application/vnd.github.mercy-preview.diff,application/vnd.github.nebula-preview.diff"
        );

        endpoint.media_type.format.clear();
        assert_eq!(
            endpoint.accept(),
            "application/vnd.github.mercy-preview+json,application/vnd.github.nebula-preview+json"
        );
    }

    #[test]
    fn accept_format_keeps_custom_accept() {
        let mut endpoint = Endpoint::default().header("Accept", "application/json");
        endpoint.media_type.format = "raw".to_string();
        assert_eq!(endpoint.accept(), "application/json");
    }
}
