//! HTTP response encoder for fully buffered responses
//!
//! Serializes the status line, the headers and the body of an
//! `http::Response<Bytes>`. `Content-Length` is always rewritten from the body
//! length and any `Transfer-Encoding` header is dropped, since bodies are
//! never streamed. [`HeadResponse`] writes only the head of a response.

use crate::protocol::SendError;

use bytes::{BufMut, Bytes, BytesMut};
use http::response::Parts;
use http::{header, HeaderValue, Response};
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Response<Bytes>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, response: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = response.into_parts();
        encode_head(parts, body.len(), dst)?;
        dst.put_slice(&body);
        Ok(())
    }
}

/// A response to a `HEAD` request.
///
/// Encoded with the `Content-Length` of the body it wraps, while the body
/// itself is never written.
#[derive(Debug)]
pub struct HeadResponse(pub Response<Bytes>);

impl Encoder<HeadResponse> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, HeadResponse(response): HeadResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = response.into_parts();
        encode_head(parts, body.len(), dst)
    }
}

fn encode_head(mut parts: Parts, body_len: usize, dst: &mut BytesMut) -> Result<(), SendError> {
    dst.reserve(INIT_HEADER_SIZE);

    // responses are always written as HTTP/1.1, which HTTP/1.0 clients accept
    write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", parts.status.as_str(), parts.status.canonical_reason().unwrap_or(""))?;

    parts.headers.remove(header::TRANSFER_ENCODING);
    parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body_len));

    for (header_name, header_value) in &parts.headers {
        dst.put_slice(header_name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(header_value.as_ref());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
    Ok(())
}

/// Fast writer implementation for writing to BytesMut.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
