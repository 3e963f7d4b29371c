//! A minimal asynchronous HTTP/1.1 server primitive
//!
//! This crate reads requests off a byte stream, hands each one to a
//! [`handler::Handler`] as an `http::Request<Bytes>` and writes the returned
//! `http::Response<Bytes>` back. Bodies are buffered in full on both sides.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use sprig_http::connection::HttpConnection;
//! use sprig_http::handler::make_handler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             match connection.process(handler).await {
//!                 Ok(()) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!("service has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request<Bytes>) -> Result<Response<Bytes>, Infallible> {
//!     info!("request path {}", request.uri().path());
//!     Ok(Response::new(Bytes::from_static(b"Hello World!\r\n")))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: connection lifecycle, keep-alive and expect-continue
//! - [`protocol`]: request header, message and error types
//! - [`codec`]: request decoding and response encoding
//! - [`handler`]: the handler trait and [`handler::make_handler`]
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only, no TLS
//! - Request bodies must use `Content-Length`; chunked requests are answered with 501
//! - Maximum header size: 8KB, maximum number of headers: 64
//! - Maximum request body: 4MiB unless configured otherwise

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
