//! Single-request HTTP helper with dual-shape decoding.
//!
//! Describe a request, pick the shape a successful body decodes to and the
//! shape the server uses for errors, and get exactly one outcome back.
//!
//! # Example
//!
//! ```ignore
//! use twofold::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! pub struct ApiError {
//!     message: String,
//! }
//!
//! let executor = RequestExecutor::new(HyperTransport::new());
//! let request = Request::parse(Method::Get, "https://api.example.com/user/1")?.build();
//! let outcome: Outcome<User, ApiError> = executor.execute(request).await;
//! ```
//!
//! Callback and [`Deferred`] delivery go through a [`Dispatcher`]; see
//! [`main_queue`] for delivering every outcome on one context.

mod config;
mod executor;
mod main_queue;
pub mod middleware;
pub mod prelude;
mod transport;

pub use config::{TransportConfig, TransportConfigBuilder};
pub use executor::{RequestExecutor, RequestExecutorBuilder, decode_outcome};
pub use main_queue::{MainLoop, MainQueue, main_queue};
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use twofold_core::{
    Codec, ContentType, Deferred, DeferredState, Dispatcher, Error, Failure, Inline, Job,
    JsonCodec, Method, Outcome, Rejecter, Request, RequestBuilder, Resolver, Response, Result,
    Transport, from_json, to_json,
};

// Re-export http types for status codes and headers
pub use twofold_core::{StatusCode, header};

pub use url;
