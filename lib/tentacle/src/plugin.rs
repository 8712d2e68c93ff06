//! Plugins and client types.
//!
//! A [`ClientType`] is an immutable template: accumulated default
//! [`Options`] plus an ordered list of [`Plugin`]s. Deriving a type with
//! [`ClientType::defaults`] or [`ClientType::plugin`] never touches the
//! parent, so a base type can be shared and specialized freely.
//!
//! ```text
//! ClientType::default()
//!     .defaults(a)          // instances see merge(a, options)
//!     .plugin(p1)           // p1 runs first
//!     .plugins([p2, p1])    // p1 already present: skipped
//!     .build(options)       // -> Client, p1 then p2 applied
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{Client, Options, Result};

// ============================================================================
// Properties
// ============================================================================

/// Values contributed to a client by its plugins, keyed by name.
///
/// Merging is last-write-wins per key.
#[derive(Clone, Default)]
pub struct Properties {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_set().entries(keys).finish()
    }
}

impl Properties {
    /// Empty properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Properties::insert`].
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a property, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Arc::new(value));
    }

    /// A property, if present with type `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref()
    }

    /// Returns `true` if a property is set under `name`, whatever its type.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there is no property.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge `other` in, its values winning.
    pub fn extend(&mut self, other: Self) {
        self.values.extend(other.values);
    }
}

// ============================================================================
// Plugin
// ============================================================================

type PluginFn = dyn Fn(&Client, &Options) -> Properties + Send + Sync;

/// A function run against every new client of a type.
///
/// It may register hooks on [`Client::hook`] and returns the properties it
/// contributes. Clones of a plugin are the same plugin; two plugins built
/// from separate [`Plugin::new`] calls are different.
#[derive(Clone)]
pub struct Plugin(Arc<PluginFn>);

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Plugin")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

impl Plugin {
    /// Wrap a plugin function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Client, &Options) -> Properties + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Identity comparison.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn apply(&self, client: &Client, options: &Options) -> Properties {
        (self.0)(client, options)
    }
}

// ============================================================================
// ClientType
// ============================================================================

/// Immutable client template.
#[derive(Debug, Clone, Default)]
pub struct ClientType {
    plugins: Arc<[Plugin]>,
    defaults: Arc<Options>,
}

impl ClientType {
    /// A derived type whose instances see `options` merged under their own.
    ///
    /// `.defaults(a).defaults(b)` behaves like `.defaults(a.merge(b))`.
    #[must_use]
    pub fn defaults(&self, options: Options) -> Self {
        Self {
            plugins: Arc::clone(&self.plugins),
            defaults: Arc::new(Options::clone(&self.defaults).merge(options)),
        }
    }

    /// A derived type with `plugin` appended, unless already present.
    #[must_use]
    pub fn plugin(&self, plugin: Plugin) -> Self {
        self.plugins([plugin])
    }

    /// A derived type with each new plugin appended in order.
    ///
    /// Plugins already present, in the parent or earlier in the batch, are
    /// skipped.
    #[must_use]
    pub fn plugins(&self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        let mut all = self.plugins.to_vec();
        for plugin in plugins {
            if !all.iter().any(|known| known.same_as(&plugin)) {
                all.push(plugin);
            }
        }
        Self {
            plugins: Arc::from(all),
            defaults: Arc::clone(&self.defaults),
        }
    }

    /// Number of accumulated plugins.
    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if `plugin` is part of this type.
    #[must_use]
    pub fn has_plugin(&self, plugin: &Plugin) -> bool {
        self.plugins.iter().any(|known| known.same_as(plugin))
    }

    /// The accumulated default options.
    #[must_use]
    pub fn default_options(&self) -> &Options {
        &self.defaults
    }

    pub(crate) fn plugin_list(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Build a client instance.
    ///
    /// # Errors
    ///
    /// Fails fast on invalid configuration, see [`Client::new`].
    pub fn build(&self, options: Options) -> Result<Client> {
        Client::from_type(self, options)
    }
}
