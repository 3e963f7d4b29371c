//! A small HTTP request dispatcher built on `sprig-http`.
//!
//! Routes are registered per HTTP method against patterns made of static
//! segments, `:name` parameters and a trailing `*name` wildcard. Every request
//! runs through a chain of handlers held by its [`Context`]: the middleware of
//! each group whose prefix starts the request path, followed by the matched
//! route handler or a built-in `404` handler.
//!
//! ```no_run
//! use http::StatusCode;
//! use sprig_web::{Context, Engine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut engine = Engine::default_engine();
//!     engine.get("/", |ctx: &mut Context| ctx.html(StatusCode::OK, "<h1>Hello Sprig</h1>"));
//!
//!     let mut v1 = engine.group("/v1");
//!     v1.get("/hello/:name", |ctx: &mut Context| {
//!         let greeting = format!("hello {}, you're at {}", ctx.param("name"), ctx.path());
//!         ctx.string(StatusCode::OK, greeting);
//!     });
//!
//!     if let Err(e) = engine.run("127.0.0.1:9999").await {
//!         eprintln!("server stopped: {e}");
//!     }
//! }
//! ```

mod context;
mod engine;
mod handler;
mod params;
mod server;

pub mod middleware;
pub mod pattern;
pub mod router;
pub mod trie;

pub use context::Context;
pub use engine::{Engine, RouterGroup};
pub use handler::{HandlerFunc, handler_fn};
pub use params::PathParams;
pub use router::Router;
pub use server::{Server, ServerBuilder, ServerError};
