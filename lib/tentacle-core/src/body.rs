//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json; charset=utf-8`).
    Json,
    /// Plain text content type (`text/plain; charset=utf-8`).
    PlainText,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::PlainText => "text/plain; charset=utf-8",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use tentacle_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Issue { title: String }
///
/// let issue = Issue { title: "Found a bug".to_string() };
/// let bytes = to_json(&issue).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"title":"Found a bug"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so the error names the field that failed
/// (e.g., "owner.login").
///
/// # Example
///
/// ```
/// use tentacle_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { login: String }
///
/// let user: User = from_json(br#"{"login":"octocat"}"#).expect("deserialize");
/// assert_eq!(user, User { login: "octocat".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Repo {
        owner: Owner,
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Owner {
        login: String,
    }

    #[test]
    fn from_json_reports_field_path() {
        let err = from_json::<Repo>(br#"{"owner":{"login":42}}"#).expect_err("type mismatch");
        match err {
            crate::Error::JsonDeserialization { path, .. } => assert_eq!(path, "owner.login"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn content_type_display() {
        assert_eq!(ContentType::Json.to_string(), "application/json; charset=utf-8");
        assert_eq!(ContentType::PlainText.as_str(), "text/plain; charset=utf-8");
    }
}
