//! Prelude module for convenient imports.
//!
//! ```ignore
//! use twofold::prelude::*;
//! ```

pub use crate::{
    Deferred, DeferredState, Dispatcher, Error, Failure, HyperTransport, Inline, JsonCodec,
    MainLoop, MainQueue, Method, Outcome, Request, RequestBuilder, RequestExecutor, Response,
    Result, StatusCode, Transport, main_queue,
};
pub use serde::{Deserialize, Serialize};
