use std::error::Error;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use http::{Method, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Encoder, FramedRead, FramedWrite};
use tracing::{debug, error, info};

use crate::codec::{HeadResponse, RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, RequestHeader, SendError};

/// An HTTP connection that manages request processing and response writing
///
/// `HttpConnection` handles the full lifecycle of an HTTP/1.1 connection:
/// - Reading and decoding requests
/// - Answering the expect-continue mechanism
/// - Collecting the request body before the handler runs
/// - Writing responses back and keeping the connection alive when allowed
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> std::fmt::Debug for HttpConnection<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection").finish_non_exhaustive()
    }
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_decoder(reader, writer, RequestDecoder::new())
    }

    pub fn with_max_body_size(reader: R, writer: W, max_body_size: u64) -> Self {
        Self::with_decoder(reader, writer, RequestDecoder::with_max_body_size(max_body_size))
    }

    fn with_decoder(reader: R, writer: W, decoder: RequestDecoder) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, decoder, 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Header((header, payload_size)))) => {
                    let keep_alive = header.keep_alive();
                    self.do_process(header, payload_size, handler.as_ref()).await?;
                    if !keep_alive {
                        debug!("request asks to close, shutdown this connection");
                        self.framed_write.get_mut().shutdown().await.map_err(SendError::io)?;
                        return Ok(());
                    }
                }

                Some(Ok(Message::Payload(_))) => {
                    error!("error status because payload has been read in do_process");
                    self.do_send_response(build_error_response(StatusCode::BAD_REQUEST)).await?;
                    return Err(ParseError::invalid_body("need header while receive body").into());
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {}", e);
                    self.do_send_response(build_error_response(status_for(&e))).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    async fn do_process<H>(&mut self, header: RequestHeader, payload_size: PayloadSize, handler: &H) -> Result<(), HttpError>
    where
        H: Handler,
    {
        // nothing to continue with when no body was announced
        if header.expect_continue() && !payload_size.is_empty() {
            let writer = self.framed_write.get_mut();
            writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
            writer.flush().await.map_err(SendError::io)?;
            info!("receive expect request header, sent continue response");
        }

        let body = match self.read_body().await {
            Ok(body) => body,
            Err(e) => {
                error!("can't read request body, cause {}", e);
                self.do_send_response(build_error_response(status_for(&e))).await?;
                return Err(e.into());
            }
        };

        let is_head = header.method() == Method::HEAD;
        let request = header.body(body);
        let response_result = handler.call(request).await;

        self.send_response(response_result, is_head).await
    }

    async fn read_body(&mut self) -> Result<Bytes, ParseError> {
        let mut body = BytesMut::new();
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => body.extend_from_slice(&bytes),
                Some(Ok(Message::Payload(PayloadItem::Eof))) => return Ok(body.freeze()),
                Some(Ok(Message::Header(_))) => return Err(ParseError::invalid_body("receive header while reading body")),
                Some(Err(e)) => return Err(e),
                None => return Err(ParseError::invalid_body("connection closed before body completed")),
            }
        }
    }

    async fn send_response<E>(&mut self, response_result: Result<Response<Bytes>, E>, is_head: bool) -> Result<(), HttpError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        match response_result {
            Ok(response) if is_head => self.do_send_response(HeadResponse(response)).await,
            Ok(response) => self.do_send_response(response).await,
            Err(e) => {
                error!("handle response error, cause: {}", e.into());
                self.do_send_response(build_error_response(StatusCode::INTERNAL_SERVER_ERROR)).await
            }
        }
    }

    async fn do_send_response<I>(&mut self, response: I) -> Result<(), HttpError>
    where
        ResponseEncoder: Encoder<I, Error = SendError>,
    {
        self.framed_write.send(response).await?;
        Ok(())
    }
}

fn status_for(e: &ParseError) -> StatusCode {
    match e {
        ParseError::TooLargeHeader { .. } | ParseError::TooManyHeaders { .. } => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
        ParseError::TooLargeBody { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ParseError::UnsupportedTransferEncoding { .. } => StatusCode::NOT_IMPLEMENTED,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status_code;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use indoc::indoc;
    use std::convert::Infallible;
    use tokio::io::{AsyncReadExt, DuplexStream};

    use crate::handler::make_handler;

    fn spawn_echo_server() -> DuplexStream {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);

        let handler = Arc::new(make_handler(|req: Request<Bytes>| async move {
            let text = format!("{} {} {}", req.method(), req.uri().path(), String::from_utf8_lossy(req.body()));
            Ok::<_, Infallible>(Response::new(Bytes::from(text)))
        }));

        tokio::spawn(async move {
            let _ = HttpConnection::new(reader, writer).process(handler).await;
        });

        client
    }

    async fn read_all(mut client: DuplexStream) -> String {
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn serves_request_with_body() {
        let mut client = spawn_echo_server();

        let request = indoc! {r##"
        POST /users HTTP/1.1
        Host: 127.0.0.1:8080
        Content-Length: 5

        hello"##};
        client.write_all(request.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let response = read_all(client).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("content-length: 17\r\n"));
        assert!(response.ends_with("POST /users hello"));
    }

    #[tokio::test]
    async fn keeps_connection_alive_between_requests() {
        let mut client = spawn_echo_server();

        client.write_all(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n").await.unwrap();
        client.shutdown().await.unwrap();

        let response = read_all(client).await;
        assert_eq!(response.matches("HTTP/1.1 200 OK").count(), 2);
        assert!(response.contains("GET /a "));
        assert!(response.contains("GET /b "));
    }

    #[tokio::test]
    async fn closes_when_asked() {
        let mut client = spawn_echo_server();

        client.write_all(b"GET /a HTTP/1.1\r\nConnection: close\r\n\r\nGET /b HTTP/1.1\r\n\r\n").await.unwrap();

        let response = read_all(client).await;
        assert_eq!(response.matches("HTTP/1.1 200 OK").count(), 1);
        assert!(!response.contains("GET /b"));
    }

    #[tokio::test]
    async fn answers_expect_continue() {
        let mut client = spawn_echo_server();

        client.write_all(b"POST /upload HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 2\r\n\r\n").await.unwrap();

        let mut buf = [0u8; 25];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"HTTP/1.1 100 Continue\r\n\r\n");

        client.write_all(b"ok").await.unwrap();
        client.shutdown().await.unwrap();

        let response = read_all(client).await;
        assert!(response.ends_with("POST /upload ok"));
    }

    #[tokio::test]
    async fn no_continue_without_body() {
        let mut client = spawn_echo_server();

        client.write_all(b"GET /status HTTP/1.1\r\nExpect: 100-continue\r\nConnection: close\r\n\r\n").await.unwrap();

        let response = read_all(client).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(!response.contains("100 Continue"));
    }

    #[tokio::test]
    async fn head_response_has_no_body() {
        let mut client = spawn_echo_server();

        client.write_all(b"HEAD /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n").await.unwrap();
        client.shutdown().await.unwrap();

        let response = read_all(client).await;
        assert_eq!(
            response,
            "HTTP/1.1 200 OK\r\ncontent-length: 8\r\n\r\nHTTP/1.1 200 OK\r\ncontent-length: 7\r\n\r\nGET /b "
        );
    }

    #[tokio::test]
    async fn bad_request_on_parse_error() {
        let mut client = spawn_echo_server();

        client.write_all(b"POST /users HTTP/1.1\r\nContent-Length: nope\r\n\r\n").await.unwrap();

        let response = read_all(client).await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn internal_error_when_handler_fails() {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);

        let handler = Arc::new(make_handler(|_req: Request<Bytes>| async move {
            Err::<Response<Bytes>, _>(std::io::Error::other("boom"))
        }));
        tokio::spawn(async move {
            let _ = HttpConnection::new(reader, writer).process(handler).await;
        });

        client.write_all(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();

        let response = read_all(client).await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }
}
