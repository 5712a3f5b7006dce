//! The transport seam.
//!
//! A [`Transport`] sends one encoded request and hands back the buffered
//! response. Connection pooling, TLS and timeouts live behind it. The executor
//! receives its transport at construction, so tests pass a fake one.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Sends encoded HTTP requests.
///
/// # Example
///
/// ```ignore
/// use twofold_core::{Error, Request, Response, Result, Transport};
/// use bytes::Bytes;
///
/// struct Offline;
///
/// impl Transport for Offline {
///     async fn send(&self, _request: Request<Bytes>) -> Result<Response> {
///         Err(Error::transport("The Internet connection appears to be offline."))
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Send a request and return the response.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transport`] for network failures of any kind:
    /// - no connectivity
    /// - TLS errors
    /// - timeouts
    /// - a body that could not be read
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response>> + Send {
        (**self).send(request)
    }
}
