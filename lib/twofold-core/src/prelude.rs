//! Prelude module for convenient imports.
//!
//! ```ignore
//! use twofold_core::prelude::*;
//! ```

pub use crate::{
    Codec, Deferred, DeferredState, Dispatcher, Error, Failure, JsonCodec, Method, Outcome,
    Request, RequestBuilder, Response, Result, Transport,
};
