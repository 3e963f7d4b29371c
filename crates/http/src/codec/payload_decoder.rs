use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::protocol::{ParseError, PayloadItem, PayloadSize};

/// Decodes a `Content-Length` framed request body into chunks.
///
/// Yields every buffered byte up to the announced length as a
/// [`PayloadItem::Chunk`], then a single [`PayloadItem::Eof`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadDecoder {
    remaining: u64,
}

impl PayloadDecoder {
    pub fn fix_length(length: u64) -> Self {
        Self { remaining: length }
    }

    pub fn empty() -> Self {
        Self { remaining: 0 }
    }

    #[inline]
    pub fn is_finish(&self) -> bool {
        self.remaining == 0
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => Self::fix_length(length),
            PayloadSize::Empty => Self::empty(),
        }
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.is_finish() {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let chunk_len = usize::try_from(self.remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
        self.remaining -= chunk_len as u64;

        Ok(Some(PayloadItem::Chunk(src.split_to(chunk_len).freeze())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn empty_payload_is_eof() {
        let mut buffer = BytesMut::from("GET / HTTP/1.1");
        let mut decoder = PayloadDecoder::empty();

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
        assert_eq!(buffer.len(), 14);
    }

    #[test]
    fn splits_at_announced_length() {
        let mut buffer = BytesMut::from("helloGET");
        let mut decoder = PayloadDecoder::fix_length(5);

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"hello"))));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
        assert_eq!(&buffer[..], b"GET");
    }

    #[test]
    fn waits_for_more_bytes() {
        let mut buffer = BytesMut::from("hel");
        let mut decoder = PayloadDecoder::fix_length(5);

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"hel"))));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"lo");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"lo"))));
        assert!(decoder.is_finish());
    }
}
