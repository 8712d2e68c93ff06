//! Authentication adapter.
//!
//! The `auth` option is either a static token or a strategy object:
//!
//! - [`Auth::Token`] becomes a default `authorization` header, with a scheme
//!   prefix derived from the token's shape (see [`with_authorization_prefix`]).
//! - [`Auth::Strategy`] gets the `"request"` [`HookChain`] and registers its
//!   own interceptor, so it can compute a fresh header for every request.

use std::future::Future;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{Endpoint, Error, Hook, HookChain, Next, Result};

/// Scheme words recognized at the start of an authorization value.
const SCHEMES: [&str; 3] = ["basic", "bearer", "token"];

/// A strategy that installs its own interceptor on the `"request"` chain.
pub trait AuthStrategy: Send + Sync {
    /// Register the interceptor(s) computing authorization.
    fn install(&self, request: &HookChain);
}

/// The `auth` option.
#[derive(Clone)]
pub enum Auth {
    /// A static credential sent as the `authorization` header.
    Token(String),
    /// A strategy installing its own request interceptor.
    Strategy(Arc<dyn AuthStrategy>),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::Strategy(_) => f.write_str("Strategy(..)"),
        }
    }
}

impl From<&str> for Auth {
    fn from(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}

impl From<String> for Auth {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

impl Auth {
    /// Wrap a strategy object.
    pub fn strategy(strategy: impl AuthStrategy + 'static) -> Self {
        Self::Strategy(Arc::new(strategy))
    }

    /// A strategy that asks `callback` for a token before every request.
    ///
    /// `Ok(None)` sends the request unauthenticated.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let auth = Auth::callback(move || {
    ///     let tokens = tokens.clone();
    ///     async move { Ok(Some(tokens.current().await?)) }
    /// });
    /// ```
    pub fn callback<F, Fut>(callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<String>>> + Send + 'static,
    {
        Self::strategy(CallbackAuth {
            callback: Arc::new(callback),
        })
    }

    /// Resolve this credential onto the request defaults or the hook.
    pub(crate) fn install(&self, defaults: &mut Endpoint, hook: &Hook) -> Result<()> {
        match self {
            Self::Token(token) if token.trim().is_empty() => Ok(()),
            Self::Token(token) => {
                let authorization = with_authorization_prefix(token.trim());
                http::HeaderValue::from_str(&authorization).map_err(|_| {
                    Error::invalid_config("auth token is not a valid header value")
                })?;
                defaults.set_header("authorization", authorization);
                Ok(())
            }
            Self::Strategy(strategy) => {
                strategy.install(&hook.chain("request"));
                Ok(())
            }
        }
    }
}

/// Strategy behind [`Auth::callback`].
struct CallbackAuth<F> {
    callback: Arc<F>,
}

impl<F, Fut> AuthStrategy for CallbackAuth<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<String>>> + Send + 'static,
{
    fn install(&self, request: &HookChain) {
        let callback = Arc::clone(&self.callback);
        request.wrap(move |next: Next, mut endpoint: Endpoint| {
            let token = callback();
            async move {
                if let Some(token) = token.await?.filter(|token| !token.is_empty()) {
                    endpoint.set_header("authorization", with_authorization_prefix(&token));
                }
                next.run(endpoint).await
            }
        });
    }
}

/// Derive the `authorization` header value from a credential.
///
/// - values starting with `basic`, `bearer` or `token` and whitespace are kept
/// - base64 of `user:password` gets `basic`
/// - three dot-separated segments (a JWT) get `bearer`
/// - anything else gets `token`
#[must_use]
pub fn with_authorization_prefix(authorization: &str) -> String {
    if has_scheme(authorization) {
        return authorization.to_string();
    }
    if is_basic_credentials(authorization) {
        return format!("basic {authorization}");
    }
    if authorization.split('.').count() == 3 {
        return format!("bearer {authorization}");
    }
    format!("token {authorization}")
}

fn has_scheme(authorization: &str) -> bool {
    authorization
        .split_once(char::is_whitespace)
        .is_some_and(|(scheme, _)| SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)))
}

fn is_basic_credentials(authorization: &str) -> bool {
    let Ok(decoded) = STANDARD.decode(authorization) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    decoded.split_once(':').is_some_and(|(user, _)| {
        !user.is_empty()
            && user
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}
