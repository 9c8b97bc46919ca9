//! Core HTTP server runtime.
//!
//! This module is responsible only for networking concerns:
//! - binding a listener on one of the resolved addresses,
//! - accepting TCP connections,
//! - reading raw byte chunks from each connection and feeding them to the
//!   incremental parser,
//! - writing serialized responses back.
//!
//! Higher-level HTTP semantics, such as request reassembly and response
//! generation, are delegated to the [`http`](crate::http) and
//! [`handler`](crate::handler) modules. The parser never sees a socket; this
//! loop is the byte-chunk source that drives it, and it alone owns timeouts,
//! size limits, and transport errors.
//!
//! ## Request handling flow
//!
//! 1. Accept a TCP connection and hand it to the [`ExecutionStrategy`]
//! 2. Read chunks from the stream, feeding each to a [`RequestParser`]
//! 3. Once the parser reports completion, pass the [`HttpRequest`] to
//!    [`handler::handle_request`](crate::handler::handle_request)
//! 4. Serialize and write the response, then close the connection
//!
//! Parse failures and oversized requests are answered with the matching
//! error response before closing; transport failures just drop the
//! connection.

use async_std::io;
use async_std::net::{TcpListener, TcpStream};
use async_std::prelude::*;
use async_std::task;
use std::net::SocketAddr;
use tracing::{debug, trace};

use crate::config::config;
use crate::handler;
use crate::http::parser::{ParseError, RequestParser};
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::http::status::HttpStatus;

/// Errors that can interrupt reading a request from the stream. Transport
/// variants drop the connection; protocol variants map to an error response.
enum ReadError {
    Io(std::io::Error),
    ConnectionClosed,
    Parser(ParseError),
    HeadersTooLarge,
    BodyTooLarge,
}

impl ReadError {
    fn into_http_status(self) -> HttpStatus {
        match self {
            ReadError::Parser(_) => HttpStatus::BadRequest,
            ReadError::HeadersTooLarge | ReadError::BodyTooLarge => HttpStatus::PayloadTooLarge,
            ReadError::Io(_) | ReadError::ConnectionClosed => HttpStatus::InternalServerError,
        }
    }
}

/// Seam between the accept loop and whatever runs a connection: spawn a
/// task, hand off to a pool, register with an event loop. The parser core
/// never depends on the choice made here.
pub trait ExecutionStrategy {
    fn submit(&self, stream: TcpStream) -> task::JoinHandle<()>;
}

/// Default strategy: one async task per connection.
pub struct TaskPerConnection;

impl ExecutionStrategy for TaskPerConnection {
    fn submit(&self, stream: TcpStream) -> task::JoinHandle<()> {
        task::spawn(serve_connection(stream))
    }
}

/// Listener-owned registry of per-connection task handles.
///
/// Every connection has exactly one owner here; nothing about a connection
/// lives in process-global state. Draining the registry awaits all
/// connections still in flight.
struct ConnectionRegistry {
    handles: Vec<task::JoinHandle<()>>,
}

impl ConnectionRegistry {
    fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    fn register(&mut self, handle: task::JoinHandle<()>) {
        self.handles.push(handle);
    }

    async fn drain(self) {
        for handle in self.handles {
            handle.await;
        }
    }
}

pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Bind to the first workable address in the resolved list.
    pub async fn bind(addrs: &[SocketAddr]) -> std::io::Result<Server> {
        let mut last_err = None;

        for addr in addrs {
            match TcpListener::bind(*addr).await {
                Ok(listener) => {
                    debug!(%addr, "listener bound");
                    return Ok(Server { listener });
                }
                Err(err) => {
                    debug!(%addr, %err, "bind failed, trying next address");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no address to bind")
        }))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the listener fails, submitting each one to
    /// the execution strategy and keeping ownership of its handle.
    pub async fn run<S: ExecutionStrategy>(self, strategy: S) -> std::io::Result<()> {
        let mut registry = ConnectionRegistry::new();

        while let Ok((stream, _addr)) = self.listener.accept().await {
            registry.register(strategy.submit(stream));
        }

        registry.drain().await;
        Ok(())
    }
}

/// Reads and incrementally parses one HTTP request from the stream.
///
/// Each network read yields a chunk of arbitrary size, which is pushed into
/// the parser as-is; the parser is the one tracking protocol boundaries.
/// Size limits are enforced here, outside the parser: a header section that
/// outgrows `max_header_size` or a declared body beyond `max_body_size`
/// aborts the read.
async fn read_request(stream: &mut TcpStream) -> Result<HttpRequest, ReadError> {
    let mut parser = RequestParser::new();
    let mut buffer = vec![0; config().chunk_size];

    while !parser.request_finished() {
        let n = match io::timeout(config().read_timeout, stream.read(&mut buffer)).await {
            Ok(0) => return Err(ReadError::ConnectionClosed),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReadError::Io(e)),
        };

        parser.push_chunk(&buffer[..n]).map_err(ReadError::Parser)?;

        if !parser.header_finished() {
            if parser.buffered_header_len() > config().max_header_size {
                return Err(ReadError::HeadersTooLarge);
            }
        } else if parser.content_length() > config().max_body_size {
            return Err(ReadError::BodyTooLarge);
        }
    }

    Ok(parser.into_request())
}

/// Writes the serialized response head and body back to the client.
async fn write_response(stream: &mut TcpStream, response: &HttpResponse) -> std::io::Result<()> {
    let headers = response.build_headers();
    stream.write_all(headers.as_bytes()).await?;
    stream.write_all(&response.body).await?;
    Ok(())
}

/// Handles a single client connection: reads one request, generates the
/// response, writes it back, and lets the connection close.
pub async fn serve_connection(mut stream: TcpStream) {
    let peer = stream.peer_addr().ok();
    trace!(?peer, "connection accepted");

    let response = match read_request(&mut stream).await {
        Ok(req) => {
            debug!(?peer, request_line = %req.request_line, "request complete");
            handler::handle_request(&req)
        }
        Err(ReadError::ConnectionClosed) => return,
        Err(ReadError::Io(err)) => {
            debug!(?peer, %err, "i/o error while reading request");
            return;
        }
        Err(err) => handler::handle_error(err.into_http_status()),
    };

    let write = write_response(&mut stream, &response);
    if let Err(err) = io::timeout(config().write_timeout, write).await {
        debug!(?peer, %err, "failed to write response");
    }
}
