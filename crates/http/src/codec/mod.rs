//! HTTP codec module for encoding and decoding HTTP messages
//!
//! - Request handling:
//!   - [`RequestDecoder`]: decodes incoming HTTP requests, header first, then payload
//!   - header parsing via [`HeaderDecoder`]
//!   - `Content-Length` payload framing via [`PayloadDecoder`]
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: encodes fully buffered outgoing HTTP responses
//!   - [`HeadResponse`]: a response to `HEAD`, written without its body

mod header_decoder;
mod payload_decoder;
mod request_decoder;
mod response_encoder;

pub use header_decoder::HeaderDecoder;
pub use payload_decoder::PayloadDecoder;
pub use request_decoder::{DEFAULT_MAX_BODY_SIZE, RequestDecoder};
pub use response_encoder::{HeadResponse, ResponseEncoder};
