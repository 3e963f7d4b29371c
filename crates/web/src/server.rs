use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use sprig_http::codec::DEFAULT_MAX_BODY_SIZE;
use sprig_http::connection::HttpConnection;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::Engine;

#[derive(Debug)]
pub struct ServerBuilder {
    engine: Option<Engine>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    max_body_size: u64,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { engine: None, address: None, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }

    /// Address to listen on; resolution errors surface from [`ServerBuilder::build`].
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Largest accepted request body, in bytes. Larger requests get a `413`.
    pub fn max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn build(self) -> Result<Server, ServerError> {
        let engine = self.engine.ok_or(ServerError::MissingEngine)?;
        let address = self.address.ok_or(ServerError::MissingAddress)?.map_err(|source| ServerError::InvalidAddress { source })?;
        Ok(Server { engine: Arc::new(engine), address, max_body_size: self.max_body_size })
    }
}

#[derive(Debug)]
pub struct Server {
    engine: Arc<Engine>,
    address: Vec<SocketAddr>,
    max_body_size: u64,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("engine must be set")]
    MissingEngine,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },
    #[error("failed to bind listener: {source}")]
    Bind { source: io::Error },
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the configured address and serves until the process ends.
    ///
    /// Only a failure to bind is reported; errors on single connections are
    /// logged and never stop the server.
    pub async fn start(self) -> Result<(), ServerError> {
        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return Err(ServerError::Bind { source: e });
            }
        };

        for (method, pattern) in self.engine.router().routes() {
            info!(%method, pattern, "serving route");
        }

        self.serve(tcp_listener).await;
        Ok(())
    }

    /// Accepts connections from an already bound listener, forever.
    pub async fn serve(self, tcp_listener: TcpListener) {
        loop {
            let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let engine = Arc::clone(&self.engine);
            let max_body_size = self.max_body_size;

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::with_max_body_size(reader, writer, max_body_size);
                match connection.process(engine).await {
                    Ok(()) => {
                        info!("finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!("service has error, cause {}, connection shutdown", e);
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use indoc::indoc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::*;
    use crate::Context;

    fn hello_engine() -> Engine {
        let mut engine = Engine::default_engine();
        engine.get("/hello/:name", |ctx: &mut Context| {
            let greeting = format!("hello {}", ctx.param("name"));
            ctx.string(StatusCode::OK, greeting);
        });
        engine.post("/echo", |ctx: &mut Context| {
            let body = ctx.body().clone();
            ctx.data(StatusCode::OK, body);
        });
        engine
    }

    async fn spawn_server(max_body_size: u64) -> SocketAddr {
        let server = Server::builder().engine(hello_engine()).address("127.0.0.1:0").max_body_size(max_body_size).build().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener));
        address
    }

    async fn exchange(address: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(address).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn build_requires_engine_and_address() {
        let result = Server::builder().address("127.0.0.1:9999").build();
        assert!(matches!(result, Err(ServerError::MissingEngine)));

        let result = Server::builder().engine(Engine::new()).build();
        assert!(matches!(result, Err(ServerError::MissingAddress)));

        let result = Server::builder().engine(Engine::new()).address("not an address").build();
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn start_reports_bind_failure() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = occupied.local_addr().unwrap();

        let result = Engine::new().run(address).await;

        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn serves_routes_over_tcp() {
        let address = spawn_server(DEFAULT_MAX_BODY_SIZE).await;

        let response = exchange(address, "GET /hello/sprig HTTP/1.1\r\nConnection: close\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("content-type: text/plain; charset=utf-8\r\n"));
        assert!(response.ends_with("\r\n\r\nhello sprig"));

        let request = indoc! {"
            POST /echo HTTP/1.1
            Content-Length: 4
            Connection: close

            ping"};
        let response = exchange(address, request).await;
        assert!(response.ends_with("\r\n\r\nping"));
    }

    #[tokio::test]
    async fn answers_not_found_over_tcp() {
        let address = spawn_server(DEFAULT_MAX_BODY_SIZE).await;

        let response = exchange(address, "GET /nothing/here HTTP/1.1\r\nConnection: close\r\n\r\n").await;

        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.ends_with("\r\n\r\n404 NOT FOUND: /nothing/here\n"));
    }

    #[tokio::test]
    async fn rejects_oversized_body() {
        let address = spawn_server(8).await;

        let response = exchange(address, "POST /echo HTTP/1.1\r\nContent-Length: 9\r\n\r\n").await;

        assert!(response.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }
}
