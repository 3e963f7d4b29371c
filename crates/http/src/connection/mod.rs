//! HTTP connection handling module
//!
//! [`HttpConnection`] drives one client connection: it decodes requests,
//! hands each fully read request to a [`Handler`](crate::handler::Handler)
//! and writes the response back, keeping the connection alive when the
//! request allows it.

mod http_connection;

pub use http_connection::HttpConnection;
