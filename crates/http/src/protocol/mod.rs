//! Core HTTP protocol types shared by the codec and the connection loop.
//!
//! - **Message Handling** (`message`): [`Message`], [`PayloadItem`] and
//!   [`PayloadSize`] describe what the request decoder yields
//! - **Request Processing** (`request`): [`RequestHeader`] wraps the
//!   parsed request line and headers
//! - **Error Handling** (`error`): [`HttpError`], [`ParseError`] and
//!   [`SendError`]

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
