//! Tower middleware for [`crate::HyperTransport`].
//!
//! Layers wrap the transport, not the executor: they see encoded requests and
//! raw responses, before any decoding happens.
//!
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//!
//! # Example
//!
//! ```ignore
//! use twofold::HyperTransport;
//! use twofold::middleware::LoggingLayer;
//!
//! let transport = HyperTransport::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
