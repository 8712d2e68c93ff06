//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tentacle::prelude::*;
//! ```

pub use crate::{
    Auth, AuthStrategy, Client, ClientType, Endpoint, Error, Graphql, Hook, HookChain, LogOptions,
    Method, Next, Options, Plugin, Properties, Requester, Response, Result, Transport,
};
pub use serde::{Deserialize, Serialize};
