//! Single-request execution with dual-shape decoding.
//!
//! [`RequestExecutor`] turns a [`Request`] descriptor into exactly one
//! [`Outcome`]:
//!
//! 1. The body, if any, is encoded by the [`Codec`] and `Content-Type` is set.
//!    An encoding failure ends here with [`Error::Encoding`]; nothing is sent.
//! 2. The [`Transport`] sends the request. A transport failure ends with
//!    [`Error::Transport`], an empty body with [`Error::NoData`].
//! 3. The body is decoded as the success shape `S`, whatever the status code.
//!    Failing that, as the error shape `E` ([`Failure::Domain`]). Failing
//!    both, [`Error::UnexpectedFormat`].
//!
//! The outcome is returned from [`RequestExecutor::execute`], handed to a
//! callback by [`RequestExecutor::execute_with`], or used to settle a
//! [`Deferred`] by [`RequestExecutor::execute_deferred`]. Callbacks always go
//! through the executor's [`Dispatcher`].

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, debug_span, warn};

use crate::{
    Codec, Deferred, Dispatcher, Error, Failure, Inline, JsonCodec, Outcome, Request, Response,
    Result, Transport,
};

/// Executes requests against a [`Transport`] and decodes their outcome.
///
/// Cheap to clone: all parts are shared.
///
/// # Example
///
/// ```ignore
/// use twofold::prelude::*;
///
/// #[derive(Debug, Deserialize)]
/// struct User { id: u64, name: String }
///
/// #[derive(Debug, Deserialize)]
/// struct ApiError { message: String }
///
/// let executor = RequestExecutor::new(HyperTransport::new());
/// let request = Request::parse(Method::Get, "https://api.example.com/user/1")?.build();
///
/// match executor.execute::<_, User, ApiError>(request).await {
///     Ok(user) => println!("{}", user.name),
///     Err(Failure::Domain(err)) => println!("server said: {}", err.message),
///     Err(Failure::Internal(err)) => println!("request failed: {err}"),
/// }
/// ```
pub struct RequestExecutor<T, C = JsonCodec, D = Inline> {
    transport: Arc<T>,
    codec: Arc<C>,
    dispatcher: Arc<D>,
}

impl<T, C, D> Clone for RequestExecutor<T, C, D> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            codec: Arc::clone(&self.codec),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<T, C, D> std::fmt::Debug for RequestExecutor<T, C, D>
where
    T: std::fmt::Debug,
    C: std::fmt::Debug,
    D: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("transport", &self.transport)
            .field("codec", &self.codec)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<T: Transport> RequestExecutor<T> {
    /// Executor with the JSON codec, delivering outcomes inline.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::builder(transport).build()
    }

    /// Start configuring an executor around `transport`.
    #[must_use]
    pub fn builder(transport: T) -> RequestExecutorBuilder<T> {
        RequestExecutorBuilder {
            transport,
            codec: JsonCodec,
            dispatcher: Inline,
        }
    }
}

impl<T, C, D> RequestExecutor<T, C, D>
where
    T: Transport,
    C: Codec,
    D: Dispatcher,
{
    /// The transport requests are sent with.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `request` and decode the body as `S`, else as `E`.
    ///
    /// Never fails outside the returned [`Outcome`].
    pub async fn execute<B, S, E>(&self, request: Request<B>) -> Outcome<S, E>
    where
        B: Serialize,
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        let span = debug_span!("http_request", method = %request.method(), url = %request.url());

        async move {
            let wire = encode_request(self.codec.as_ref(), request).map_err(|err| {
                warn!(error = %err, "request body could not be encoded");
                Failure::Internal(err)
            })?;

            debug!("sending request");
            let response = self.transport.send(wire).await.map_err(|err| {
                warn!(error = %err, "transport failed");
                Failure::Internal(as_transport_error(err))
            })?;

            decode_outcome(self.codec.as_ref(), &response)
        }
        .instrument(span)
        .await
    }

    /// Execute `request` in the background and deliver the outcome to
    /// `callback` through the dispatcher.
    ///
    /// The callback never runs before this method returns, even when the
    /// request fails locally.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn execute_with<B, S, E, F>(&self, request: Request<B>, callback: F)
    where
        B: Serialize + Send + 'static,
        S: DeserializeOwned + Send + 'static,
        E: DeserializeOwned + Send + 'static,
        F: FnOnce(Outcome<S, E>) + Send + 'static,
    {
        let executor = self.clone();
        tokio::spawn(async move {
            let outcome = executor.execute(request).await;
            executor
                .dispatcher
                .dispatch(Box::new(move || callback(outcome)));
        });
    }

    /// Execute `request` in the background and settle the returned
    /// [`Deferred`] with the outcome, through the dispatcher.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn execute_deferred<B, S, E>(&self, request: Request<B>) -> Deferred<S, Failure<E>>
    where
        B: Serialize + Send + 'static,
        S: DeserializeOwned + Send + Sync + 'static,
        E: DeserializeOwned + Send + Sync + 'static,
    {
        Deferred::new(|resolver, rejecter| {
            self.execute_with(request, move |outcome: Outcome<S, E>| {
                let _ = match outcome {
                    Ok(value) => resolver.resolve(value),
                    Err(failure) => rejecter.reject(failure),
                };
            });
        })
    }
}

/// Builder for [`RequestExecutor`].
#[derive(Debug)]
pub struct RequestExecutorBuilder<T, C = JsonCodec, D = Inline> {
    transport: T,
    codec: C,
    dispatcher: D,
}

impl<T, C, D> RequestExecutorBuilder<T, C, D> {
    /// Use another codec for request and response bodies.
    #[must_use]
    pub fn codec<C2: Codec>(self, codec: C2) -> RequestExecutorBuilder<T, C2, D> {
        RequestExecutorBuilder {
            transport: self.transport,
            codec,
            dispatcher: self.dispatcher,
        }
    }

    /// Deliver callbacks through `dispatcher`.
    #[must_use]
    pub fn dispatcher<D2: Dispatcher>(self, dispatcher: D2) -> RequestExecutorBuilder<T, C, D2> {
        RequestExecutorBuilder {
            transport: self.transport,
            codec: self.codec,
            dispatcher,
        }
    }

    /// Build the executor.
    #[must_use]
    pub fn build(self) -> RequestExecutor<T, C, D> {
        RequestExecutor {
            transport: Arc::new(self.transport),
            codec: Arc::new(self.codec),
            dispatcher: Arc::new(self.dispatcher),
        }
    }
}

/// Encode the descriptor body into a wire request.
///
/// Caller headers are copied as they are; `Content-Type` is set to the
/// codec's media type only when there is a body.
fn encode_request<C, B>(codec: &C, request: Request<B>) -> Result<Request<Bytes>>
where
    C: Codec,
    B: Serialize,
{
    let (method, url, mut headers, body) = request.into_parts();

    let body = match body {
        Some(value) => {
            let bytes = codec.encode(&value).map_err(|err| match err {
                Error::Encoding(_) => err,
                other => Error::encoding(other.to_string()),
            })?;
            headers.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
            headers.insert(
                "Content-Type".to_string(),
                codec.content_type().as_str().to_string(),
            );
            Some(bytes)
        }
        None => None,
    };

    Ok(Request::from_parts(method, url, headers, body))
}

fn as_transport_error(err: Error) -> Error {
    match err {
        Error::Transport(_) => err,
        other => Error::transport(other.to_string()),
    }
}

/// Decode a response into an outcome.
///
/// The success shape wins whenever it decodes; the status code is not
/// consulted.
pub fn decode_outcome<C, S, E>(codec: &C, response: &Response) -> Outcome<S, E>
where
    C: Codec,
    S: DeserializeOwned,
    E: DeserializeOwned,
{
    let status = response.status();
    if !response.has_body() {
        debug!(status, "response has no body");
        return Err(Failure::Internal(Error::NoData));
    }
    let body = response.body();

    match codec.decode::<S>(body) {
        Ok(value) => {
            debug!(status, "decoded success shape");
            Ok(value)
        }
        Err(success_err) => match codec.decode::<E>(body) {
            Ok(domain) => {
                debug!(status, %success_err, "decoded error shape");
                Err(Failure::Domain(domain))
            }
            Err(error_err) => {
                warn!(status, %success_err, %error_err, "response matched neither shape");
                Err(Failure::Internal(Error::UnexpectedFormat))
            }
        },
    }
}
