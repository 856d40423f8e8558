//! Per-request context and handler chain execution.
//!
//! # Responsibilities
//! - Expose request data (method, path, params, query, form, body)
//! - Drive the resolved handler chain with a cursor
//! - Buffer the response written by handlers
//!
//! # Chain semantics
//! ```text
//! [mw_api] → [mw_admin] → [route handler | not found]
//!     ▲ cursor
//! ```
//! `next()` runs exactly one more handler. A handler that returns without
//! calling `next()` ends the chain there. `fail()` moves the cursor past the
//! end, so nothing after it runs.
//!
//! A context is created for one request and dropped after its response is
//! produced; it is never shared between requests.

use std::fmt;
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::app::handler::HandlerFunc;
use crate::http::render::TemplateEngine;
use crate::http::request::{Request, X_REQUEST_ID};
use crate::http::response::Response;
use crate::routing::Params;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Failure to decode a request body into a caller type.
///
/// Returned to the handler; nothing is written to the response.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mutable state of one request flowing through the handler chain.
pub struct Context {
    request: Request,
    params: Params,
    handlers: Vec<HandlerFunc>,
    index: usize,
    aborted: bool,
    response: Response,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl Context {
    pub(crate) fn new(
        request: Request,
        handlers: Vec<HandlerFunc>,
        params: Params,
        templates: Option<Arc<dyn TemplateEngine>>,
    ) -> Self {
        Self {
            request,
            params,
            handlers,
            index: 0,
            aborted: false,
            response: Response::new(),
            templates,
        }
    }

    /// Run the next handler in the chain, if any.
    pub fn next(&mut self) {
        if let Some(handler) = self.handlers.get(self.index).cloned() {
            self.index += 1;
            handler(self);
        }
    }

    /// Stop the chain and respond with `{"message": message}`.
    pub fn fail(&mut self, code: StatusCode, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(
            status = code.as_u16(),
            path = %self.request.path(),
            message = %message,
            "Chain aborted"
        );
        self.index = self.handlers.len();
        self.aborted = true;
        self.json(code, &json!({ "message": message }));
    }

    /// True if `fail` was called on this request.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Path parameter bound by the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// First query-string value for `key`, percent-decoded.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.request.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// First form value for `key` from a urlencoded request body.
    pub fn post_form(&self, key: &str) -> Option<String> {
        let is_form = self
            .header(CONTENT_TYPE.as_str())
            .and_then(|ct| ct.get(..FORM_URLENCODED.len()))
            .is_some_and(|media| media.eq_ignore_ascii_case(FORM_URLENCODED));
        if !is_form {
            return None;
        }
        url::form_urlencoded::parse(self.request.body())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    /// Decode the JSON body into `T`.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let body = self.request.body();
        if body.is_empty() {
            return Err(BindError::EmptyBody);
        }
        Ok(serde_json::from_slice(body)?)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// Cooperative cancellation check for long-running handlers.
    pub fn is_cancelled(&self) -> bool {
        self.request.is_cancelled()
    }

    pub fn status(&mut self, code: StatusCode) {
        self.response.set_status(code);
    }

    /// Status written so far (200 if nothing set it).
    pub fn status_code(&self) -> StatusCode {
        self.response.status()
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = name, "Ignoring invalid response header"),
        }
    }

    /// Plain text response.
    pub fn string(&mut self, code: StatusCode, body: impl fmt::Display) {
        self.write(code, "text/plain", body.to_string().into_bytes());
    }

    /// Raw bytes; content type is left to the caller.
    pub fn data(&mut self, code: StatusCode, data: impl Into<Vec<u8>>) {
        self.status(code);
        self.response.set_body(data.into());
    }

    /// JSON response. An encoding failure becomes a 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => self.write(code, "application/json", body),
            Err(e) => {
                tracing::error!(error = %e, path = %self.request.path(), "JSON encoding failed");
                self.write(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    e.to_string().into_bytes(),
                );
            }
        }
    }

    /// Render template `name` with `data`. Any failure becomes `fail(500, ..)`.
    pub fn html<T: Serialize + ?Sized>(&mut self, code: StatusCode, name: &str, data: &T) {
        let Some(engine) = self.templates.clone() else {
            self.fail(StatusCode::INTERNAL_SERVER_ERROR, "no template engine configured");
            return;
        };
        let rendered = serde_json::to_value(data)
            .map_err(|e| e.to_string())
            .and_then(|value| engine.render(name, &value).map_err(|e| e.to_string()));

        match rendered {
            Ok(body) => self.write(code, "text/html", body),
            Err(message) => {
                tracing::warn!(template = name, error = %message, "Template render failed");
                self.fail(StatusCode::INTERNAL_SERVER_ERROR, message);
            }
        }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }

    fn write(&mut self, code: StatusCode, content_type: &'static str, body: Vec<u8>) {
        self.status(code);
        self.response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.response.set_body(body);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("params", &self.params)
            .field("index", &self.index)
            .field("chain_len", &self.handlers.len())
            .field("aborted", &self.aborted)
            .field("status", &self.response.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::render::RenderError;
    use std::sync::Mutex;

    fn context(request: Request, handlers: Vec<HandlerFunc>) -> Context {
        Context::new(request, handlers, Params::new(), None)
    }

    fn get(target: &str) -> Request {
        Request::new(Method::GET, target)
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str, call_next: bool) -> HandlerFunc {
        let log = Arc::clone(log);
        Arc::new(move |c: &mut Context| {
            log.lock().unwrap().push(name);
            if call_next {
                c.next();
            }
        })
    }

    #[test]
    fn test_next_runs_chain_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut c = context(
            get("/"),
            vec![
                recorder(&log, "a", true),
                recorder(&log, "b", true),
                recorder(&log, "c", false),
            ],
        );
        c.next();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_handler_without_next_stops_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut c = context(
            get("/"),
            vec![recorder(&log, "a", false), recorder(&log, "b", false)],
        );
        c.next();
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_code_after_next_runs_after_downstream() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer_log = Arc::clone(&log);
        let outer: HandlerFunc = Arc::new(move |c: &mut Context| {
            outer_log.lock().unwrap().push("before");
            c.next();
            outer_log.lock().unwrap().push("after");
        });
        let mut c = context(get("/"), vec![outer, recorder(&log, "inner", false)]);
        c.next();
        assert_eq!(*log.lock().unwrap(), vec!["before", "inner", "after"]);
    }

    #[test]
    fn test_fail_halts_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let guard: HandlerFunc = Arc::new(|c: &mut Context| {
            c.fail(StatusCode::FORBIDDEN, "forbidden");
            c.next();
        });
        let mut c = context(get("/"), vec![guard, recorder(&log, "route", false)]);
        c.next();

        assert!(log.lock().unwrap().is_empty());
        assert!(c.is_aborted());
        let res = c.into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "message": "forbidden" }));
    }

    #[test]
    fn test_query_and_params() {
        let mut params = Params::new();
        params.insert("id".into(), "42".into());
        let c = Context::new(get("/u/42?name=gee%20ktutu&x=1&x=2"), Vec::new(), params, None);

        assert_eq!(c.param("id"), Some("42"));
        assert_eq!(c.param("missing"), None);
        assert_eq!(c.query("name").as_deref(), Some("gee ktutu"));
        assert_eq!(c.query("x").as_deref(), Some("1"));
        assert_eq!(c.query("nope"), None);
    }

    #[test]
    fn test_post_form_requires_urlencoded_body() {
        let req = Request::new(Method::POST, "/login")
            .with_header(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED))
            .with_body("username=ox&password=a%26b");
        let c = context(req, Vec::new());
        assert_eq!(c.post_form("username").as_deref(), Some("ox"));
        assert_eq!(c.post_form("password").as_deref(), Some("a&b"));

        let req = Request::new(Method::POST, "/login").with_body("username=ox");
        let c = context(req, Vec::new());
        assert_eq!(c.post_form("username"), None);
    }

    #[test]
    fn test_post_form_media_type_is_case_insensitive() {
        let req = Request::new(Method::POST, "/login")
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("Application/X-WWW-Form-Urlencoded; charset=utf-8"),
            )
            .with_body("username=ox");
        let c = context(req, Vec::new());
        assert_eq!(c.post_form("username").as_deref(), Some("ox"));
    }

    #[test]
    fn test_bind() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Login {
            user: String,
        }

        let c = context(get("/").with_body(r#"{"user":"ox"}"#), Vec::new());
        assert_eq!(c.bind::<Login>().unwrap(), Login { user: "ox".into() });

        let c = context(get("/").with_body("{not json"), Vec::new());
        assert!(matches!(c.bind::<Login>(), Err(BindError::Json(_))));

        let c = context(get("/"), Vec::new());
        assert!(matches!(c.bind::<Login>(), Err(BindError::EmptyBody)));
        // Decode failure never writes a response on its own.
        assert_eq!(c.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_string_and_data_writers() {
        let mut c = context(get("/"), Vec::new());
        c.string(StatusCode::OK, format_args!("hello {}", "ox"));
        assert_eq!(c.response().text(), "hello ox");
        assert_eq!(c.response().header("content-type"), Some("text/plain"));

        c.set_header("Content-Type", "image/png");
        c.data(StatusCode::ACCEPTED, vec![1u8, 2, 3]);
        assert_eq!(c.status_code(), StatusCode::ACCEPTED);
        assert_eq!(c.response().body(), &[1, 2, 3]);
        assert_eq!(c.response().header("content-type"), Some("image/png"));
    }

    #[test]
    fn test_invalid_header_ignored() {
        let mut c = context(get("/"), Vec::new());
        c.set_header("bad header", "x");
        c.set_header("x-ok", "bad\nvalue");
        assert!(c.response().headers().is_empty());
    }

    #[test]
    fn test_json_encode_failure_is_500() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cannot encode"))
            }
        }

        let mut c = context(get("/"), Vec::new());
        c.json(StatusCode::OK, &Broken);
        assert_eq!(c.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(c.response().text().contains("cannot encode"));
    }

    struct Echo;

    impl TemplateEngine for Echo {
        fn render(&self, name: &str, data: &serde_json::Value) -> Result<Vec<u8>, RenderError> {
            match name {
                "hello.tmpl" => Ok(format!("<p>{}</p>", data["name"].as_str().unwrap_or("")).into_bytes()),
                _ => Err(format!("template {} not found", name).into()),
            }
        }
    }

    #[test]
    fn test_html_renders_through_engine() {
        let mut c = Context::new(get("/"), Vec::new(), Params::new(), Some(Arc::new(Echo)));
        c.html(StatusCode::OK, "hello.tmpl", &json!({ "name": "ox" }));
        assert_eq!(c.response().text(), "<p>ox</p>");
        assert_eq!(c.response().header("content-type"), Some("text/html"));
    }

    #[test]
    fn test_html_failure_becomes_fail_500() {
        let mut c = Context::new(get("/"), Vec::new(), Params::new(), Some(Arc::new(Echo)));
        c.html(StatusCode::OK, "missing.tmpl", &json!({}));
        assert!(c.is_aborted());
        assert_eq!(c.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(c.response().text().contains("missing.tmpl"));

        let mut c = context(get("/"), Vec::new());
        c.html(StatusCode::OK, "hello.tmpl", &json!({}));
        assert_eq!(c.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
