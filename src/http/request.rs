//! Transport-independent request handed to the dispatcher.
//!
//! # Responsibilities
//! - Carry method, path, query, headers and the buffered body
//! - Generate request IDs for the transport layer
//! - Expose a cooperative cancellation flag to handlers
//!
//! # Design Decisions
//! - Body is fully buffered before dispatch (size bounded by config)
//! - Cancellation is a flag the handler polls, never a preemption

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request as HttpRequest};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// An inbound request as delivered by the host transport.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    cancelled: Arc<AtomicBool>,
}

impl Request {
    /// Build a request from a method and a request target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a request from already-parsed HTTP parts and a buffered body.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Share a cancellation flag owned by the transport.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// True once the transport has given up on this request.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &HttpRequest<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;

    #[test]
    fn test_target_split() {
        let req = Request::new(Method::GET, "/search?q=rust&page=2");
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query(), Some("q=rust&page=2"));

        let req = Request::new(Method::GET, "/plain");
        assert_eq!(req.query(), None);
    }

    #[test]
    fn test_from_parts() {
        let (parts, _) = HttpRequest::builder()
            .method(Method::POST)
            .uri("http://example.com/api/items?x=1")
            .header(CONTENT_TYPE, "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(&parts, Bytes::from_static(b"{}"));
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/api/items");
        assert_eq!(req.query(), Some("x=1"));
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(&req.body()[..], b"{}");
    }

    #[test]
    fn test_cancellation_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let req = Request::new(Method::GET, "/").with_cancellation(flag.clone());
        assert!(!req.is_cancelled());
        flag.store(true, Ordering::Release);
        assert!(req.is_cancelled());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let mut make = UuidRequestId;
        let req = HttpRequest::builder().body(()).unwrap();
        let a = make.make_request_id(&req).unwrap();
        let b = make.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
        assert!(Uuid::parse_str(a.header_value().to_str().unwrap()).is_ok());
    }
}
