//! HTTP request decoder module
//!
//! Decodes a byte stream into a sequence of [`Message`] items: one
//! `Message::Header` per request followed by its `Message::Payload` items, the
//! last of which is always [`PayloadItem::Eof`].
//!
//! # Example
//!
//! ```no_run
//! use sprig_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let header = decoder.decode(&mut buffer);
//! let eof = decoder.decode(&mut buffer);
//! ```

use crate::codec::header_decoder::HeaderDecoder;
use crate::codec::payload_decoder::PayloadDecoder;
use crate::ensure;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Default upper bound for a request body, 4 MiB.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 4 * 1024 * 1024;

/// A decoder for HTTP requests that handles both headers and payload
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: Currently parsing headers
/// - `Some(PayloadDecoder)`: Currently parsing payload
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
    max_body_size: u64,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` with [`DEFAULT_MAX_BODY_SIZE`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder rejecting bodies larger than `max_body_size` bytes
    pub fn with_max_body_size(max_body_size: u64) -> Self {
        Self { header_decoder: HeaderDecoder, payload_decoder: None, max_body_size }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_max_body_size(DEFAULT_MAX_BODY_SIZE)
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHeader, PayloadSize)>;
    type Error = ParseError;

    /// Attempts to decode an HTTP request from the provided buffer
    ///
    /// - `Ok(Some(Message::Header(_)))`: Successfully decoded request headers
    /// - `Ok(Some(Message::Payload(_)))`: Successfully decoded a payload chunk or the end of it
    /// - `Ok(None)`: Need more data to proceed
    /// - `Err(_)`: Encountered a parsing error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // parse payload if have payload_decoder
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // no need payload decoder in this request now
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        // parse request
        let message = match self.header_decoder.decode(src)? {
            Some((header, payload_size)) => {
                ensure!(
                    payload_size.len() <= self.max_body_size,
                    ParseError::too_large_body(payload_size.len(), self.max_body_size)
                );
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((header, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Method;
    use indoc::indoc;

    #[test]
    fn decodes_header_body_and_eof() {
        let str = indoc! {r##"
        POST /users HTTP/1.1
        Host: 127.0.0.1:8080
        Content-Length: 5

        hello"##};

        let mut buffer = BytesMut::from(str);
        let mut decoder = RequestDecoder::new();

        let Some(Message::Header((header, payload_size))) = decoder.decode(&mut buffer).unwrap() else {
            panic!("expect request header");
        };
        assert_eq!(header.method(), &Method::POST);
        assert_eq!(payload_size, PayloadSize::Length(5));

        let Some(Message::Payload(item)) = decoder.decode(&mut buffer).unwrap() else {
            panic!("expect payload chunk");
        };
        assert_eq!(item, PayloadItem::Chunk(Bytes::from_static(b"hello")));

        let Some(Message::Payload(item)) = decoder.decode(&mut buffer).unwrap() else {
            panic!("expect payload eof");
        };
        assert!(item.is_eof());

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn pipelined_requests() {
        let mut buffer = BytesMut::from("GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n");
        let mut decoder = RequestDecoder::new();

        let mut paths = vec![];
        while let Some(message) = decoder.decode(&mut buffer).unwrap() {
            if let Message::Header((header, _)) = message {
                paths.push(header.uri().path().to_string());
            }
        }

        assert_eq!(paths, vec!["/a", "/b"]);
    }

    #[test]
    fn rejects_body_over_limit() {
        let str = indoc! {r##"
        POST /upload HTTP/1.1
        Content-Length: 11

        "##};

        let mut buffer = BytesMut::from(str);
        let mut decoder = RequestDecoder::with_max_body_size(10);

        let result = decoder.decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::TooLargeBody { current_size: 11, max_size: 10 })));
    }
}
