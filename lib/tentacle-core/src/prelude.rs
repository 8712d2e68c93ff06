//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tentacle_core::prelude::*;
//! ```

pub use crate::{
    Endpoint, Error, Hook, HookChain, MediaType, Method, Next, Parameters, Request, Response,
    Result, from_json, to_json,
};
