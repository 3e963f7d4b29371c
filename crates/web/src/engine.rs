//! The [`Engine`]: a [`Router`] plus prefix groups carrying middleware.

use std::convert::Infallible;
use std::fmt;
use std::net::ToSocketAddrs;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response};
use sprig_http::handler::Handler;
use tracing::info;

use crate::middleware::{logger, recovery};
use crate::server::{Server, ServerError};
use crate::{Context, HandlerFunc, Router};

/// Registers one handler-adding method per HTTP method.
macro_rules! method_route {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Registers a handler for `", stringify!($method), "` requests matching `pattern`.")]
        pub fn $name<H>(&mut self, pattern: &str, handler: H) -> &mut Self
        where
            H: Fn(&mut Context) + Send + Sync + 'static,
        {
            self.add_route(Method::$method, pattern, handler)
        }
    };
}

macro_rules! method_routes {
    () => {
        method_route!(get, GET);
        method_route!(post, POST);
        method_route!(put, PUT);
        method_route!(delete, DELETE);
        method_route!(patch, PATCH);
        method_route!(head, HEAD);
        method_route!(options, OPTIONS);
    };
}

struct Group {
    prefix: String,
    middlewares: Vec<HandlerFunc>,
}

/// Routes requests through group middleware to the matching handler.
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, StatusCode};
/// use sprig_web::{Context, Engine};
///
/// let mut engine = Engine::new();
/// engine.get("/hello/:name", |ctx: &mut Context| {
///     let greeting = format!("hello {}", ctx.param("name"));
///     ctx.string(StatusCode::OK, greeting);
/// });
///
/// let response = engine.serve(Request::get("/hello/sprig").body(Bytes::new()).unwrap());
/// assert_eq!(response.body().as_ref(), b"hello sprig");
/// ```
pub struct Engine {
    router: Router,
    /// index 0 is the root group with an empty prefix
    groups: Vec<Group>,
}

impl Engine {
    pub fn new() -> Self {
        Self { router: Router::new(), groups: vec![Group { prefix: String::new(), middlewares: Vec::new() }] }
    }

    /// An engine with [`logger`] and [`recovery`] installed on the root group.
    pub fn default_engine() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(logger()).use_middleware(recovery());
        engine
    }

    /// Creates a group whose routes and middleware apply under `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.push_group(prefix.to_owned())
    }

    fn push_group(&mut self, prefix: String) -> RouterGroup<'_> {
        self.groups.push(Group { prefix, middlewares: Vec::new() });
        let index = self.groups.len() - 1;
        RouterGroup { engine: self, index }
    }

    fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup { engine: self, index: 0 }
    }

    /// Adds middleware applying to every request.
    pub fn use_middleware<H>(&mut self, middleware: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root().use_middleware(middleware);
        self
    }

    pub fn add_route<H>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root().add_route(method, pattern, handler);
        self
    }

    method_routes!();

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Queues the middleware of every group whose prefix starts the request
    /// path, then dispatches through the router.
    pub fn handle(&self, ctx: &mut Context) {
        let middlewares: Vec<HandlerFunc> = self
            .groups
            .iter()
            .filter(|group| ctx.path().starts_with(&group.prefix))
            .flat_map(|group| group.middlewares.iter().map(Arc::clone))
            .collect();

        ctx.extend_handlers(middlewares);
        self.router.handle(ctx);
    }

    pub fn serve(&self, request: Request<Bytes>) -> Response<Bytes> {
        let mut ctx = Context::new(request);
        self.handle(&mut ctx);
        ctx.into_response()
    }

    /// Serves on `address` until the process ends.
    ///
    /// Returns only when the listener can't be set up.
    pub async fn run<A: ToSocketAddrs>(self, address: A) -> Result<(), ServerError> {
        Server::builder().engine(self).address(address).build()?.start().await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes: Vec<&str> = self.groups.iter().map(|group| group.prefix.as_str()).collect();
        f.debug_struct("Engine").field("router", &self.router).field("groups", &prefixes).finish()
    }
}

#[async_trait]
impl Handler for Engine {
    type Error = Infallible;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Self::Error> {
        Ok(self.serve(req))
    }
}

/// A prefix under which routes and middleware are registered.
///
/// Borrowed from the [`Engine`] it was created from; nested groups extend the
/// prefix of their parent.
pub struct RouterGroup<'engine> {
    engine: &'engine mut Engine,
    index: usize,
}

impl RouterGroup<'_> {
    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.index].prefix
    }

    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let prefix = format!("{}{prefix}", self.prefix());
        self.engine.push_group(prefix)
    }

    pub fn use_middleware<H>(&mut self, middleware: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.engine.groups[self.index].middlewares.push(Arc::new(middleware));
        self
    }

    pub fn add_route<H>(&mut self, method: Method, component: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        let pattern = format!("{}{component}", self.prefix());
        info!(%method, %pattern, "route registered");
        self.engine.router.add_route(method, &pattern, Arc::new(handler));
        self
    }

    method_routes!();
}

impl fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup").field("prefix", &self.prefix()).finish_non_exhaustive()
    }
}
