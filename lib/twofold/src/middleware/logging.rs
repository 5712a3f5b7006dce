//! Request/response logging middleware.
//!
//! Logs at the transport boundary with `tracing`: one event when the request
//! leaves, one when the response (or transport error) comes back.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Request, Response, Result};

/// Layer that adds request/response logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Verbosity of the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level, with headers and body sizes.
    Debug,
    /// Info level, summary only.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a logging layer that logs at info level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let level = self.level;
        let span = span!(Level::INFO, "transport", %method, %url);

        // The clone may not be ready; the one that was polled is.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let start = Instant::now();
                match level {
                    LogLevel::Debug => debug!(
                        headers = ?request.headers(),
                        body_len = request.body().map_or(0, Bytes::len),
                        "sending request"
                    ),
                    LogLevel::Info => info!("sending request"),
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if !response.has_body() => {
                        warn!(status = response.status(), elapsed_ms, "response without body");
                    }
                    Ok(response) => match level {
                        LogLevel::Debug => debug!(
                            status = response.status(),
                            body_len = response.body().len(),
                            elapsed_ms,
                            "response received"
                        ),
                        LogLevel::Info => info!(status = response.status(), elapsed_ms, "response received"),
                    },
                    Err(err) => warn!(error = %err, elapsed_ms, "transport failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tower::ServiceExt;
    use tower::service_fn;

    use super::*;
    use crate::Method;

    #[test]
    fn logging_layer_levels() {
        assert_eq!(LoggingLayer::new().level(), LogLevel::Info);
        assert_eq!(LoggingLayer::debug().level(), LogLevel::Debug);
    }

    #[tokio::test]
    async fn logging_passes_results_through() {
        let inner = service_fn(|_request: Request<Bytes>| async {
            Ok::<_, Error>(Response::new(201, HashMap::new(), Bytes::from("{}")))
        });
        let url = url::Url::parse("http://localhost/users").expect("url");
        let request = Request::post(url).body(Bytes::from("{}")).build();

        let response = LoggingLayer::debug()
            .layer(inner)
            .oneshot(request)
            .await
            .expect("response");
        assert_eq!(response.status(), 201);
    }

    #[tokio::test]
    async fn logging_passes_errors_through() {
        let inner = service_fn(|_request: Request<Bytes>| async {
            Err::<Response, _>(Error::transport("offline"))
        });
        let url = url::Url::parse("http://localhost/users").expect("url");

        let err = LoggingLayer::new()
            .layer(inner)
            .oneshot(Request::from_parts(Method::Get, url, HashMap::new(), None))
            .await
            .expect_err("transport error");
        assert_eq!(err, Error::transport("offline"));
    }
}
