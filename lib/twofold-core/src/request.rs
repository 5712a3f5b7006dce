//! Request descriptors.
//!
//! A [`Request`] describes one HTTP call: method, target URL, headers and an
//! optional body. The body stays a typed value until the executor encodes it,
//! so encoding failures surface as an outcome rather than at build time.
//!
//! # Example
//!
//! ```
//! use twofold_core::{Method, Request};
//!
//! let request = Request::builder(Method::Get, "https://api.example.com/user/1".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .query("verbose", "true")
//!     .build();
//!
//! assert_eq!(request.url().as_str(), "https://api.example.com/user/1?verbose=true");
//! ```

use std::collections::HashMap;

use url::Url;

use crate::{Method, Result};

/// An HTTP request with method, URL, headers, and optional body.
///
/// `B` is the body type: any serializable value for a descriptor, [`bytes::Bytes`]
/// once encoded for the transport.
#[derive(Debug, Clone)]
pub struct Request<B = ()> {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl Request<()> {
    /// Creates a new [`RequestBuilder`] without a body.
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder<()> {
        RequestBuilder::new(method, url)
    }

    /// Parses `url` and creates a new [`RequestBuilder`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if `url` cannot be parsed.
    pub fn parse(method: Method, url: &str) -> Result<RequestBuilder<()>> {
        Ok(RequestBuilder::new(method, Url::parse(url)?))
    }

    /// Creates a GET request builder.
    #[must_use]
    pub fn get(url: Url) -> RequestBuilder<()> {
        RequestBuilder::new(Method::Get, url)
    }

    /// Creates a POST request builder.
    #[must_use]
    pub fn post(url: Url) -> RequestBuilder<()> {
        RequestBuilder::new(Method::Post, url)
    }

    /// Creates a PUT request builder.
    #[must_use]
    pub fn put(url: Url) -> RequestBuilder<()> {
        RequestBuilder::new(Method::Put, url)
    }

    /// Creates a DELETE request builder.
    #[must_use]
    pub fn delete(url: Url) -> RequestBuilder<()> {
        RequestBuilder::new(Method::Delete, url)
    }
}

impl<B> Request<B> {
    /// Reassembles a request from its parts.
    #[must_use]
    pub fn from_parts(
        method: Method,
        url: Url,
        headers: HashMap<String, String>,
        body: Option<B>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = ()> {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl RequestBuilder<()> {
    /// Creates a new builder without a body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }
}

impl<B> RequestBuilder<B> {
    /// Sets a header, replacing any previous value for the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Appends multiple query parameters to the URL.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        {
            let mut query = self.url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(&name, &value);
            }
        }
        self
    }

    /// Sets the request body.
    ///
    /// The body is encoded by the executor's codec when the request runs.
    #[must_use]
    pub fn body<T>(self, body: T) -> RequestBuilder<T> {
        RequestBuilder {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: Some(body),
        }
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_url() -> Url {
        Url::parse("https://api.example.com/users").expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::builder(Method::Get, users_url())
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://api.example.com/users");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert!(request.body().is_none());
    }

    #[test]
    fn request_builder_with_query() {
        let request = Request::get(users_url())
            .query("page", "1")
            .query_pairs([("limit".to_string(), "10".to_string())])
            .build();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/users?page=1&limit=10"
        );
    }

    #[test]
    fn request_builder_with_body() {
        #[derive(Debug, PartialEq, serde::Serialize)]
        struct NewUser {
            name: String,
        }

        let request = Request::post(users_url())
            .body(NewUser {
                name: "Ana".to_string(),
            })
            .build();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(
            request.body(),
            Some(&NewUser {
                name: "Ana".to_string()
            })
        );
    }

    #[test]
    fn header_keys_are_unique() {
        let request = Request::put(users_url())
            .header("X-Trace", "a")
            .headers([("X-Trace".to_string(), "b".to_string())])
            .build();

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("X-Trace"), Some("b"));
    }

    #[test]
    fn parse_rejects_invalid_url() {
        let err = Request::parse(Method::Delete, "not a url").expect_err("invalid");
        assert!(matches!(err, crate::Error::InvalidUrl(_)));
    }

    #[test]
    fn into_parts_roundtrip() {
        let request = Request::delete(users_url()).header("A", "1").build();
        let (method, url, headers, body) = request.into_parts();
        let rebuilt = Request::from_parts(method, url, headers, body);

        assert_eq!(rebuilt.method(), Method::Delete);
        assert_eq!(rebuilt.header("A"), Some("1"));
    }
}
