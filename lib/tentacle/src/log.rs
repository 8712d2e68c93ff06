//! Instance logger.
//!
//! Every [`Client`](crate::Client) carries a [`Log`] with four levels. By
//! default `debug` and `info` are silent while `warn` and `error` emit
//! `tracing` events; each level can be replaced through [`LogOptions`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, warn};

/// A logging function: message plus optional structured details.
pub type LogFn = Arc<dyn Fn(&str, Option<&Value>) + Send + Sync>;

fn noop() -> LogFn {
    Arc::new(|_message: &str, _details: Option<&Value>| {})
}

fn tracing_warn() -> LogFn {
    Arc::new(|message: &str, details: Option<&Value>| match details {
        Some(details) => warn!(%details, "{message}"),
        None => warn!("{message}"),
    })
}

fn tracing_error() -> LogFn {
    Arc::new(|message: &str, details: Option<&Value>| match details {
        Some(details) => error!(%details, "{message}"),
        None => error!("{message}"),
    })
}

/// Overrides for the instance logger. Unset levels keep their default.
#[derive(Clone, Default)]
pub struct LogOptions {
    debug: Option<LogFn>,
    info: Option<LogFn>,
    warn: Option<LogFn>,
    error: Option<LogFn>,
}

impl std::fmt::Debug for LogOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogOptions")
            .field("debug", &self.debug.is_some())
            .field("info", &self.info.is_some())
            .field("warn", &self.warn.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

macro_rules! log_option_setter {
    ($level:ident) => {
        #[doc = concat!("Replace the `", stringify!($level), "` function.")]
        #[must_use]
        pub fn $level<F>(mut self, f: F) -> Self
        where
            F: Fn(&str, Option<&Value>) + Send + Sync + 'static,
        {
            self.$level = Some(Arc::new(f));
            self
        }
    };
}

impl LogOptions {
    log_option_setter!(debug);
    log_option_setter!(info);
    log_option_setter!(warn);
    log_option_setter!(error);

    /// Per-level merge: levels set in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            debug: overrides.debug.or(self.debug),
            info: overrides.info.or(self.info),
            warn: overrides.warn.or(self.warn),
            error: overrides.error.or(self.error),
        }
    }
}

/// The instance logger.
#[derive(Clone)]
pub struct Log {
    debug: LogFn,
    info: LogFn,
    warn: LogFn,
    error: LogFn,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            debug: noop(),
            info: noop(),
            warn: tracing_warn(),
            error: tracing_error(),
        }
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log").finish_non_exhaustive()
    }
}

impl Log {
    /// Build a logger from overrides on top of the defaults.
    #[must_use]
    pub fn new(options: LogOptions) -> Self {
        let defaults = Self::default();
        Self {
            debug: options.debug.unwrap_or(defaults.debug),
            info: options.info.unwrap_or(defaults.info),
            warn: options.warn.unwrap_or(defaults.warn),
            error: options.error.unwrap_or(defaults.error),
        }
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str, details: Option<&Value>) {
        (self.debug)(message, details);
    }

    /// Log at info level.
    pub fn info(&self, message: &str, details: Option<&Value>) {
        (self.info)(message, details);
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str, details: Option<&Value>) {
        (self.warn)(message, details);
    }

    /// Log at error level.
    pub fn error(&self, message: &str, details: Option<&Value>) {
        (self.error)(message, details);
    }
}
