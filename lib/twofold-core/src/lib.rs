//! Core types for twofold.
//!
//! This crate provides the transport-agnostic building blocks:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - request descriptors with a typed body
//! - [`Response`] - buffered HTTP response
//! - [`Codec`] and [`JsonCodec`] - body encoding and decoding
//! - [`Error`], [`Failure`] and [`Outcome`] - error handling
//! - [`Deferred`] - settle-once value with chained observers
//! - [`Transport`] - the seam to an HTTP client
//! - [`Dispatcher`] - the context outcomes are delivered on

mod codec;
mod deferred;
mod dispatch;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use codec::{Codec, ContentType, JsonCodec, from_json, to_json};
pub use deferred::{Deferred, DeferredState, Rejecter, Resolver};
pub use dispatch::{Dispatcher, Inline, Job};
pub use error::{Error, Failure, Outcome, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::Transport;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
