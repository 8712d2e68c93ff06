//! Plugins bundled with the client.

mod request_log;

pub use request_log::request_log;
