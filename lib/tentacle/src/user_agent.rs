//! `user-agent` header computation.

/// Version of this crate, part of the default user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Platform-identifying user agent, e.g. `tentacle/0.1.0 (linux; x86_64)`.
#[must_use]
pub fn default_user_agent() -> String {
    format!(
        "tentacle/{VERSION} ({}; {})",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Prefix the default user agent with a caller-supplied one.
///
/// Empty segments are dropped so no stray separator is left behind.
pub(crate) fn user_agent(custom: Option<&str>) -> String {
    let default = default_user_agent();
    [custom.unwrap_or_default().trim(), default.as_str()]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
