use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use bytes::Bytes;
use http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    request::Parts,
    Extensions, HeaderMap, HeaderValue, Method, Uri, Version,
};

use crate::{impl_deref, impl_display};

pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024; // 2 mb

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyLimit(pub usize);

impl_deref!(BodyLimit : usize);
impl_display!(BodyLimit);

impl Default for BodyLimit {
    fn default() -> Self {
        Self(DEFAULT_BODY_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalAddr(pub SocketAddr);

impl_deref!(LocalAddr : SocketAddr);
impl_display!(LocalAddr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteAddr(pub SocketAddr);

impl_deref!(RemoteAddr : SocketAddr);
impl_display!(RemoteAddr);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginalUri(pub Uri);

impl_deref!(OriginalUri : Uri);
impl_display!(OriginalUri);

const UNSPECIFIED_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

/// The request descriptor handed to every unit of a chain.
///
/// Units annotate a request through [`Head::extensions`] and [`Head::headers`];
/// later units and the main handler observe those annotations.
#[derive(Debug, Clone)]
pub struct Request {
    pub head: Head,
    pub body: Bytes,
}

impl Request {
    pub fn new(
        request: http::Request<Bytes>,
        local_addr: LocalAddr,
        remote_addr: RemoteAddr,
    ) -> Self {
        let (
            Parts {
                method,
                uri,
                version,
                headers,
                extensions,
                ..
            },
            body,
        ) = request.into_parts();

        Self {
            head: Head {
                method,
                uri: uri.clone(),
                version,
                headers,
                extensions,
                local_addr,
                remote_addr,
                original_uri: OriginalUri(uri),
            },
            body,
        }
    }

    pub fn extensions(&self) -> &Extensions {
        &self.head.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.head.extensions
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        &self.head.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap<HeaderValue> {
        &mut self.head.headers
    }
}

/// Builds a request that was not received over a socket, both addresses are
/// `0.0.0.0:0`.
impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        Self::new(
            request,
            LocalAddr(UNSPECIFIED_ADDR),
            RemoteAddr(UNSPECIFIED_ADDR),
        )
    }
}

#[derive(Clone)]
#[non_exhaustive]
pub struct Head {
    /// The request's method
    pub method: Method,

    /// The request's URI
    pub uri: Uri,

    /// The request's version
    pub version: Version,

    /// The request's headers
    pub headers: HeaderMap<HeaderValue>,

    /// The request's extensions
    pub extensions: Extensions,

    pub(crate) local_addr: LocalAddr,

    pub(crate) remote_addr: RemoteAddr,

    pub(crate) original_uri: OriginalUri,
}

impl fmt::Debug for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Head")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("headers", &self.headers)
            // .field("extensions", &self.extensions)
            .field("local_addr", &self.local_addr)
            .field("remote_addr", &self.remote_addr)
            .field("original_uri", &self.original_uri)
            .finish()
    }
}

impl Head {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn content_length(&self) -> Option<usize> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok()?.parse::<usize>().ok())
    }

    pub fn local_addr(&self) -> LocalAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> RemoteAddr {
        self.remote_addr
    }

    pub fn original_uri(&self) -> &OriginalUri {
        &self.original_uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_original_uri() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/users?page=2")
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, "2")
            .body(Bytes::from_static(b"{}"))
            .unwrap();

        let local = LocalAddr("127.0.0.1:9612".parse().unwrap());
        let remote = RemoteAddr("10.0.0.7:51000".parse().unwrap());

        let mut req = Request::new(request, local, remote);
        req.head.uri = Uri::from_static("/rewritten");

        assert_eq!(req.head.original_uri().to_string(), "/users?page=2");
        assert_eq!(req.head.content_type(), Some("application/json"));
        assert_eq!(req.head.content_length(), Some(2));
        assert_eq!(req.head.local_addr(), local);
        assert_eq!(req.head.remote_addr().to_string(), "10.0.0.7:51000");
        assert_eq!(req.body, Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_from_http_request() {
        let req = Request::from(http::Request::new(Bytes::new()));

        assert_eq!(*req.head.local_addr(), UNSPECIFIED_ADDR);
        assert_eq!(*req.head.remote_addr(), UNSPECIFIED_ADDR);
        assert_eq!(req.head.content_length(), None);
    }

    #[test]
    fn test_annotations() {
        #[derive(Debug, Clone, PartialEq)]
        struct RequestId(&'static str);

        let mut req = Request::from(http::Request::new(Bytes::new()));
        req.extensions_mut().insert(RequestId("abc"));
        req.headers_mut()
            .insert("x-request-id", HeaderValue::from_static("abc"));

        assert_eq!(req.extensions().get::<RequestId>(), Some(&RequestId("abc")));
        assert_eq!(req.headers()["x-request-id"], "abc");
    }

    #[test]
    fn test_body_limit_default() {
        assert_eq!(*BodyLimit::default(), DEFAULT_BODY_LIMIT);
        assert_eq!(BodyLimit(1024).to_string(), "1024");
    }
}
