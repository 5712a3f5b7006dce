//! Error types for twofold.
//!
//! Two families meet here:
//! - [`Error`] covers everything that goes wrong around the request itself
//!   (encoding, transport, empty body, unrecognized body).
//! - The caller's own error shape, decoded from the response body.
//!
//! [`Failure`] is the tagged union of both, so an infrastructure error never
//! has to pretend to be a domain error.

use std::fmt;

use derive_more::{Display, Error, From};

// ============================================================================
// Infrastructure Error
// ============================================================================

/// Errors produced by twofold itself rather than decoded from a response.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum Error {
    /// The request body could not be serialized. No request was sent.
    #[display("encoding error: {_0}")]
    #[from(skip)]
    Encoding(#[error(not(source))] String),

    /// Network, connectivity, TLS or timeout failure reported by the transport.
    #[display("transport error: {_0}")]
    #[from(skip)]
    Transport(#[error(not(source))] String),

    /// The transport succeeded but the response carried no body.
    #[display("no data received")]
    #[from(skip)]
    NoData,

    /// The response body matched neither the success nor the error shape.
    #[display("unexpected response format")]
    #[from(skip)]
    UnexpectedFormat,

    /// A body could not be decoded into the requested type.
    #[display("decoding error at '{path}': {message}")]
    #[from(skip)]
    Decoding {
        /// JSON path to the mismatch (e.g. `user.address.city`).
        path: String,
        /// Codec message.
        message: String,
    },

    /// The target address could not be parsed.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an encoding error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a decoding error with path context.
    #[must_use]
    pub fn decoding(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decoding {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is an encoding error.
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }

    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the response had no body.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Returns `true` if the body matched neither expected shape.
    #[must_use]
    pub const fn is_unexpected_format(&self) -> bool {
        matches!(self, Self::UnexpectedFormat)
    }
}

// ============================================================================
// Failure
// ============================================================================

/// The failure side of an [`Outcome`].
///
/// Either the caller's error shape `E`, decoded from the response body, or an
/// infrastructure [`Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure<E> {
    /// The response body decoded as the caller's error shape.
    Domain(E),
    /// Encoding, transport, empty body or unrecognized body.
    Internal(Error),
}

/// Result of a single request: the success shape, or a [`Failure`].
pub type Outcome<S, E> = std::result::Result<S, Failure<E>>;

impl<E> Failure<E> {
    /// Returns `true` if the server answered with the error shape.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    /// Returns `true` if this is an infrastructure failure.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// The decoded domain error, if any.
    #[must_use]
    pub const fn domain(&self) -> Option<&E> {
        match self {
            Self::Domain(err) => Some(err),
            Self::Internal(_) => None,
        }
    }

    /// The infrastructure error, if any.
    #[must_use]
    pub const fn internal(&self) -> Option<&Error> {
        match self {
            Self::Domain(_) => None,
            Self::Internal(err) => Some(err),
        }
    }

    /// Transform the domain error, leaving infrastructure errors untouched.
    pub fn map_domain<F, E2>(self, f: F) -> Failure<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Domain(err) => Failure::Domain(f(err)),
            Self::Internal(err) => Failure::Internal(err),
        }
    }

    /// Collapse into the caller's error type.
    ///
    /// Requires the error shape to know how to represent an infrastructure
    /// error, through `From<Error>`.
    pub fn into_inner(self) -> E
    where
        E: From<Error>,
    {
        match self {
            Self::Domain(err) => err,
            Self::Internal(err) => E::from(err),
        }
    }
}

impl<E> From<Error> for Failure<E> {
    fn from(err: Error) -> Self {
        Self::Internal(err)
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(err) => write!(f, "{err}"),
            Self::Internal(err) => write!(f, "{err}"),
        }
    }
}

impl<E> std::error::Error for Failure<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(err) => Some(err),
            Self::Internal(err) => Some(err),
        }
    }
}
