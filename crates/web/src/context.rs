//! Per-request state: request data, bound path parameters, the handler chain
//! with its cursor, and the response being built.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use mime::Mime;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tracing::error;

use crate::{HandlerFunc, PathParams};

const TEXT_PLAIN_UTF_8: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
const TEXT_HTML_UTF_8: HeaderValue = HeaderValue::from_static("text/html; charset=utf-8");
const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// The context of one HTTP request.
///
/// Created for every inbound request and dropped once the response has been
/// built. Handlers read the request through it, write the response into it
/// and drive the rest of the handler chain with [`Context::next`].
pub struct Context {
    method: Method,
    /// percent-decoded `uri.path()`
    path: String,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: PathParams,

    handlers: Vec<HandlerFunc>,
    /// position of the next handler to run; only ever grows
    index: usize,
    aborted: bool,

    status: StatusCode,
    response_headers: HeaderMap,
    response_body: BytesMut,
}

impl Context {
    pub fn new(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: decode_path(parts.uri.path()),
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: PathParams::empty(),
            handlers: Vec::new(),
            index: 0,
            aborted: false,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: BytesMut::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The percent-decoded request path, without the query string.
    ///
    /// Routing and group prefixes see this form; [`Context::uri`] keeps the
    /// path as sent.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parsed `Content-Type` of the request, if present and well formed
    pub fn content_type(&self) -> Option<Mime> {
        self.headers.get(header::CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Value bound to the path parameter `name`, or `""` when there is none.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).unwrap_or_default()
    }

    /// First value of the query string key `key`.
    pub fn query(&self, key: &str) -> Option<String> {
        first_value(self.uri.query()?.as_bytes(), key)
    }

    /// First value of the form field `key`, when the request carries an
    /// `application/x-www-form-urlencoded` body.
    pub fn post_form(&self, key: &str) -> Option<String> {
        let content_type = self.content_type()?;
        if content_type.essence_str() != mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            return None;
        }
        first_value(&self.body, key)
    }

    /// Runs the next handler of the chain.
    ///
    /// The call returns once that handler, and everything it ran in turn,
    /// has returned. Calling it again after the chain is exhausted, or after
    /// [`Context::abort`], does nothing.
    pub fn next(&mut self) {
        let Some(handler) = self.handlers.get(self.index).map(Arc::clone) else {
            return;
        };
        self.index += 1;
        handler(self);
    }

    /// Stops the chain: no handler that has not started yet will run.
    pub fn abort(&mut self) {
        self.index = self.handlers.len();
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Aborts the chain and answers with `{"message": message}`.
    pub fn fail(&mut self, code: StatusCode, message: &str) {
        self.abort();
        self.response_headers.clear();
        self.response_body.clear();
        self.json(code, &serde_json::json!({ "message": message }));
    }

    pub fn status(&mut self, code: StatusCode) {
        self.status = code;
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn response_body(&self) -> &[u8] {
        &self.response_body
    }

    pub fn string(&mut self, code: StatusCode, text: impl AsRef<str>) {
        self.set_header(header::CONTENT_TYPE, TEXT_PLAIN_UTF_8);
        self.status(code);
        self.response_body.extend_from_slice(text.as_ref().as_bytes());
    }

    /// Writes `value` as JSON; a value that fails to serialize turns the
    /// response into a `500` carrying the error text.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(encoded) => {
                self.set_header(header::CONTENT_TYPE, APPLICATION_JSON);
                self.status(code);
                self.response_body.extend_from_slice(&encoded);
            }
            Err(e) => {
                error!(cause = %e, path = %self.path(), "failed to encode json response");
                self.response_body.clear();
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }

    pub fn data(&mut self, code: StatusCode, data: impl AsRef<[u8]>) {
        self.status(code);
        self.response_body.extend_from_slice(data.as_ref());
    }

    pub fn html(&mut self, code: StatusCode, html: impl AsRef<str>) {
        self.set_header(header::CONTENT_TYPE, TEXT_HTML_UTF_8);
        self.status(code);
        self.response_body.extend_from_slice(html.as_ref().as_bytes());
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.response_body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.response_headers;
        response
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    pub(crate) fn push_handler(&mut self, handler: HandlerFunc) {
        self.handlers.push(handler);
    }

    pub(crate) fn extend_handlers(&mut self, handlers: impl IntoIterator<Item = HandlerFunc>) {
        self.handlers.extend(handlers);
    }
}

impl From<Request<Bytes>> for Context {
    fn from(request: Request<Bytes>) -> Self {
        Self::new(request)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("params", &self.params)
            .field("handlers", &self.handlers.len())
            .field("index", &self.index)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Falls back to the raw path when the decoded bytes are not UTF-8.
fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8().map_or_else(|_e| raw.to_owned(), Cow::into_owned)
}

fn first_value(encoded: &[u8], key: &str) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(encoded)
        .ok()?
        .into_iter()
        .find_map(|(name, value)| (name == key).then_some(value))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde::Serializer;

    use super::*;
    use crate::handler::handler_fn;

    fn context(method: Method, uri: &str) -> Context {
        Context::new(Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap())
    }

    fn recording(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> HandlerFunc {
        let log = Arc::clone(log);
        handler_fn(move |ctx: &mut Context| {
            log.lock().unwrap().push(format!("{name}-enter"));
            ctx.next();
            log.lock().unwrap().push(format!("{name}-exit"));
        })
    }

    #[test]
    fn chain_wraps_before_and_after() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(Method::GET, "/");
        ctx.extend_handlers([recording(&log, "M1"), recording(&log, "M2"), recording(&log, "M3")]);
        let handler_log = Arc::clone(&log);
        ctx.push_handler(handler_fn(move |_ctx: &mut Context| handler_log.lock().unwrap().push("H".to_owned())));

        ctx.next();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["M1-enter", "M2-enter", "M3-enter", "H", "M3-exit", "M2-exit", "M1-exit"]
        );
    }

    #[test]
    fn handler_without_next_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(Method::GET, "/");
        ctx.push_handler(recording(&log, "M1"));
        ctx.push_handler(handler_fn(|ctx: &mut Context| ctx.string(StatusCode::UNAUTHORIZED, "denied")));
        ctx.push_handler(recording(&log, "H"));

        ctx.next();

        assert_eq!(*log.lock().unwrap(), vec!["M1-enter", "M1-exit"]);
        assert_eq!(ctx.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn repeated_next_never_reruns_a_handler() {
        let count = Arc::new(Mutex::new(0));
        let mut ctx = context(Method::GET, "/");
        let counter = Arc::clone(&count);
        ctx.push_handler(handler_fn(|ctx: &mut Context| {
            ctx.next();
            ctx.next();
            ctx.next();
        }));
        ctx.push_handler(handler_fn(move |_ctx: &mut Context| *counter.lock().unwrap() += 1));

        ctx.next();
        ctx.next();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn abort_stops_outer_next_calls() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(Method::GET, "/");
        ctx.push_handler(handler_fn(|ctx: &mut Context| {
            ctx.fail(StatusCode::FORBIDDEN, "no entry");
            ctx.next();
        }));
        ctx.push_handler(recording(&log, "H"));

        ctx.next();

        assert!(ctx.is_aborted());
        assert!(log.lock().unwrap().is_empty());
        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body().as_ref(), br#"{"message":"no entry"}"#);
    }

    #[test]
    fn param_defaults_to_empty() {
        let mut ctx = context(Method::GET, "/p/go/doc");
        ctx.set_params([("lang", "go")].into_iter().collect());

        assert_eq!(ctx.param("lang"), "go");
        assert_eq!(ctx.param("missing"), "");
    }

    #[test]
    fn decodes_path_once() {
        let ctx = context(Method::GET, "/files/a%20b/c%2Fd?q=%20");

        assert_eq!(ctx.path(), "/files/a b/c/d");
        assert_eq!(ctx.uri().path(), "/files/a%20b/c%2Fd");
        assert_eq!(context(Method::GET, "/100%25").path(), "/100%");
    }

    #[test]
    fn keeps_raw_path_when_not_utf8() {
        let ctx = context(Method::GET, "/bytes/%FF%FE");

        assert_eq!(ctx.path(), "/bytes/%FF%FE");
    }

    #[test]
    fn reads_query_values() {
        let ctx = context(Method::GET, "/search?q=rust+web&page=2&q=ignored");

        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query("q").as_deref(), Some("rust web"));
        assert_eq!(ctx.query("page").as_deref(), Some("2"));
        assert_eq!(ctx.query("missing"), None);
        assert_eq!(context(Method::GET, "/search").query("q"), None);
    }

    #[test]
    fn reads_form_values_only_for_form_bodies() {
        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
            .body(Bytes::from_static(b"username=sprig&password=p%40ss"))
            .unwrap();
        let ctx = Context::new(request);

        assert_eq!(ctx.post_form("username").as_deref(), Some("sprig"));
        assert_eq!(ctx.post_form("password").as_deref(), Some("p@ss"));

        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(b"username=sprig"))
            .unwrap();
        assert_eq!(Context::new(request).post_form("username"), None);
    }

    #[test]
    fn writes_text_html_and_data() {
        let mut ctx = context(Method::GET, "/");
        ctx.string(StatusCode::CREATED, "hello ");
        ctx.data(StatusCode::CREATED, b"world");
        let response = ctx.into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.body().as_ref(), b"hello world");

        let mut ctx = context(Method::GET, "/");
        ctx.set_header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        ctx.html(StatusCode::OK, "<h1>sprig</h1>");
        let response = ctx.into_response();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.body().as_ref(), b"<h1>sprig</h1>");
    }

    #[test]
    fn writes_json() {
        let mut ctx = context(Method::GET, "/");
        ctx.json(StatusCode::OK, &serde_json::json!({ "name": "sprig" }));
        let response = ctx.into_response();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), br#"{"name":"sprig"}"#);
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot encode"))
        }
    }

    #[test]
    fn json_failure_becomes_internal_error() {
        let mut ctx = context(Method::GET, "/");
        ctx.json(StatusCode::OK, &Unserializable);
        let response = ctx.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.body().as_ref(), b"cannot encode");
    }
}
