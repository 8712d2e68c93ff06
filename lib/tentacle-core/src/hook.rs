//! Named interceptor chains wrapping an asynchronous terminal operation.
//!
//! A [`Hook`] holds one ordered chain of interceptors per name (the client
//! uses `"request"`). [`Hook::invoke`] runs the named chain around a terminal
//! function: the last-registered interceptor runs first and each interceptor
//! receives a [`Next`] continuation for the rest of the chain.
//!
//! ```text
//! wrap(I1); wrap(I2);
//! invoke  ->  I2 -> I1 -> terminal
//! ```
//!
//! Every invocation works on a snapshot of the chain taken when
//! [`Hook::invoke`] is called, so interceptors registered while requests are
//! in flight only affect later invocations.
//!
//! # Example
//!
//! ```
//! use tentacle_core::{Endpoint, Hook, Response};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hook = Hook::new();
//! hook.before("request", |endpoint: &mut Endpoint| {
//!     endpoint.set_header("x-request-source", "docs");
//!     Ok(())
//! });
//!
//! let response = hook
//!     .invoke("request", Endpoint::default(), |endpoint| async move {
//!         let source = endpoint.get_header("x-request-source").unwrap_or_default();
//!         Ok(Response::new(200, Default::default(), bytes::Bytes::from(source.to_string())))
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(response.body().as_ref(), b"docs");
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::{Endpoint, Error, Response, Result};

/// Future returned by interceptors and terminals.
pub type HookFuture = BoxFuture<'static, Result<Response<Bytes>>>;

/// A registered interceptor: receives the continuation and the endpoint.
pub type Interceptor = Arc<dyn Fn(Next, Endpoint) -> HookFuture + Send + Sync>;

type Terminal = Arc<dyn Fn(Endpoint) -> HookFuture + Send + Sync>;

/// Handle identifying a registered interceptor, used with [`Hook::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

#[derive(Clone)]
struct Registered {
    id: HookId,
    interceptor: Interceptor,
}

/// The rest of a chain, terminal included.
///
/// Cloning is cheap; an interceptor may call [`Next::run`] several times
/// (e.g. to retry) or not at all (to short-circuit).
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Registered]>,
    index: usize,
    terminal: Terminal,
}

impl Next {
    /// Run the next-inner interceptor, or the terminal when none is left.
    #[must_use]
    pub fn run(&self, endpoint: Endpoint) -> HookFuture {
        let inner = self
            .index
            .checked_sub(1)
            .and_then(|index| self.chain.get(index).map(|entry| (index, entry)));

        match inner {
            Some((index, entry)) => {
                let next = Self {
                    chain: Arc::clone(&self.chain),
                    index,
                    terminal: Arc::clone(&self.terminal),
                };
                (entry.interceptor)(next, endpoint)
            }
            None => (self.terminal)(endpoint),
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.index)
            .finish_non_exhaustive()
    }
}

/// Keyed collection of interceptor chains.
///
/// Clones share the same chains.
#[derive(Clone, Default)]
pub struct Hook {
    chains: Arc<RwLock<HashMap<String, Vec<Registered>>>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        let mut debug = f.debug_map();
        for (name, chain) in chains.iter() {
            debug.entry(name, &chain.len());
        }
        debug.finish()
    }
}

impl Hook {
    /// Create an empty hook collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle bound to a single chain name.
    #[must_use]
    pub fn chain(&self, name: impl Into<String>) -> HookChain {
        HookChain {
            hook: self.clone(),
            name: name.into(),
        }
    }

    /// Append an interceptor to the named chain.
    ///
    /// The interceptor receives the rest of the chain as [`Next`] and
    /// decides whether, how often, and with which endpoint to continue.
    pub fn wrap<F, Fut>(&self, name: impl Into<String>, interceptor: F) -> HookId
    where
        F: Fn(Next, Endpoint) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
    {
        let interceptor: Interceptor =
            Arc::new(move |next, endpoint| interceptor(next, endpoint).boxed());
        self.register(name.into(), interceptor)
    }

    /// Append an already boxed interceptor to the named chain.
    pub fn register(&self, name: impl Into<String>, interceptor: Interceptor) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.chains
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.into())
            .or_default()
            .push(Registered { id, interceptor });
        id
    }

    /// Run `f` on the endpoint before the rest of the chain.
    ///
    /// An error returned by `f` short-circuits the chain.
    pub fn before<F>(&self, name: impl Into<String>, f: F) -> HookId
    where
        F: Fn(&mut Endpoint) -> Result<()> + Send + Sync + 'static,
    {
        self.wrap(name, move |next: Next, mut endpoint: Endpoint| {
            let prepared = f(&mut endpoint);
            async move {
                prepared?;
                next.run(endpoint).await
            }
        })
    }

    /// Run `f` on a successful response.
    ///
    /// An error returned by `f` replaces the response.
    pub fn after<F>(&self, name: impl Into<String>, f: F) -> HookId
    where
        F: Fn(&Response<Bytes>, &Endpoint) -> Result<()> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.wrap(name, move |next: Next, endpoint: Endpoint| {
            let f = Arc::clone(&f);
            async move {
                let response = next.run(endpoint.clone()).await?;
                f(&response, &endpoint)?;
                Ok(response)
            }
        })
    }

    /// Run `f` when the rest of the chain fails.
    ///
    /// `f` may recover with a response or return a (possibly different) error.
    pub fn error<F>(&self, name: impl Into<String>, f: F) -> HookId
    where
        F: Fn(Error, &Endpoint) -> Result<Response<Bytes>> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.wrap(name, move |next: Next, endpoint: Endpoint| {
            let f = Arc::clone(&f);
            async move {
                match next.run(endpoint.clone()).await {
                    Ok(response) => Ok(response),
                    Err(error) => f(error, &endpoint),
                }
            }
        })
    }

    /// Remove a registered interceptor. Returns `false` if it was not found.
    pub fn remove(&self, name: &str, id: HookId) -> bool {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        let Some(chain) = chains.get_mut(name) else {
            return false;
        };
        let before = chain.len();
        chain.retain(|entry| entry.id != id);
        before != chain.len()
    }

    /// Number of interceptors registered on the named chain.
    #[must_use]
    pub fn len(&self, name: &str) -> usize {
        self.chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Returns `true` if no interceptor is registered on the named chain.
    #[must_use]
    pub fn is_empty(&self, name: &str) -> bool {
        self.len(name) == 0
    }

    /// Run the named chain around `terminal`.
    ///
    /// The chain is snapshotted before this returns.
    pub fn invoke<F, Fut>(&self, name: &str, endpoint: Endpoint, terminal: F) -> HookFuture
    where
        F: Fn(Endpoint) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
    {
        let terminal: Terminal = Arc::new(move |endpoint| terminal(endpoint).boxed());
        let chain: Arc<[Registered]> = self
            .chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or_else(|| Arc::from(Vec::new()), |chain| Arc::from(chain.as_slice()));

        let next = Next {
            index: chain.len(),
            chain,
            terminal,
        };
        next.run(endpoint)
    }
}

/// A [`Hook`] handle bound to one chain name.
///
/// This is the registration capability handed to authentication strategies
/// for the `"request"` chain.
#[derive(Debug, Clone)]
pub struct HookChain {
    hook: Hook,
    name: String,
}

impl HookChain {
    /// The chain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// See [`Hook::wrap`].
    pub fn wrap<F, Fut>(&self, interceptor: F) -> HookId
    where
        F: Fn(Next, Endpoint) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
    {
        self.hook.wrap(self.name.as_str(), interceptor)
    }

    /// See [`Hook::before`].
    pub fn before<F>(&self, f: F) -> HookId
    where
        F: Fn(&mut Endpoint) -> Result<()> + Send + Sync + 'static,
    {
        self.hook.before(self.name.as_str(), f)
    }

    /// See [`Hook::after`].
    pub fn after<F>(&self, f: F) -> HookId
    where
        F: Fn(&Response<Bytes>, &Endpoint) -> Result<()> + Send + Sync + 'static,
    {
        self.hook.after(self.name.as_str(), f)
    }

    /// See [`Hook::error`].
    pub fn error<F>(&self, f: F) -> HookId
    where
        F: Fn(Error, &Endpoint) -> Result<Response<Bytes>> + Send + Sync + 'static,
    {
        self.hook.error(self.name.as_str(), f)
    }

    /// See [`Hook::remove`].
    pub fn remove(&self, id: HookId) -> bool {
        self.hook.remove(&self.name, id)
    }

    /// See [`Hook::invoke`].
    pub fn invoke<F, Fut>(&self, endpoint: Endpoint, terminal: F) -> HookFuture
    where
        F: Fn(Endpoint) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
    {
        self.hook.invoke(&self.name, endpoint, terminal)
    }
}
