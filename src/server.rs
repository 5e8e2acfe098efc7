//! Server dispatch loop.
//!
//! Each connection negotiates [`Options`], then reads requests in a loop.
//! Every well-formed request runs in its own task; responses go back in
//! completion order, serialized by a per-connection write lock. Requests
//! that cannot be dispatched get an error response without spawning.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::codec::{CodecType, Header};
use crate::control::{read_json_line, Options};
use crate::error::Result;
use crate::handler::{Argv, MethodType, RpcService, Service, ServiceRegistry};
use crate::protocol::{CodecReader, CodecWriter, DEFAULT_MAX_FRAME_SIZE};

/// Error text sent when a method outlives the handle timeout.
pub const HANDLE_TIMEOUT_ERROR: &str = "request handle timeout";

static DEFAULT_SERVER: OnceLock<Arc<Server>> = OnceLock::new();

type SharedWriter<W> = Arc<tokio::sync::Mutex<CodecWriter<W>>>;

/// A request read off the wire.
struct Request {
    header: Header,
    /// Resolved target and decoded argument, or the error to report.
    dispatch: std::result::Result<(Arc<Service>, Arc<MethodType>, Argv), String>,
}

/// RPC server: a service registry plus the per-connection dispatch loop.
pub struct Server {
    registry: ServiceRegistry,
    max_frame_size: usize,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Create a server with no services.
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistry::new(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Limit the size of incoming frames.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Publish the methods of `receiver`.
    pub fn register<S: RpcService>(&self, receiver: S) -> Result<()> {
        self.registry.register(receiver)
    }

    /// Publish the methods of a shared `receiver`.
    pub fn register_arc<S: RpcService>(&self, receiver: Arc<S>) -> Result<()> {
        self.registry.register_arc(receiver)
    }

    /// The underlying registry.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Accept connections until the listener fails, serving each in its
    /// own task.
    pub async fn accept(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("rpc server: accept error: {}", e);
                    return Err(e.into());
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!("rpc server: set_nodelay failed for {}: {}", peer, e);
            }

            tracing::debug!("rpc server: accepted connection from {}", peer);
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                server.serve_conn(stream).await;
            });
        }
    }

    /// Serve one connection until the peer hangs up or the stream fails.
    ///
    /// Waits for every in-flight handler before closing the stream.
    pub async fn serve_conn<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        let options = match read_options(&mut reader).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!("rpc server: negotiation failed, closing: {}", e);
                return;
            }
        };

        let codec = options.codec_type;
        let handle_timeout = options.handle_timeout;
        let mut reader = CodecReader::with_max_frame_size(reader, codec, self.max_frame_size);
        let writer: SharedWriter<_> =
            Arc::new(tokio::sync::Mutex::new(CodecWriter::new(writer, codec)));
        tracing::debug!("rpc server: serving connection, codec {}", codec);

        let mut handlers = JoinSet::new();
        loop {
            let request = match self.read_request(&mut reader).await {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("rpc server: read request failed: {}", e);
                    break;
                }
            };

            match request.dispatch {
                Ok((service, method, argv)) => {
                    handlers.spawn(handle_request(
                        Arc::clone(&writer),
                        request.header,
                        service,
                        method,
                        argv,
                        codec,
                        handle_timeout,
                    ));
                }
                Err(message) => send_error(&writer, request.header, message).await,
            }

            while let Some(finished) = handlers.try_join_next() {
                log_handler_exit(finished);
            }
        }

        tracing::debug!("rpc server: draining {} handlers", handlers.len());
        while let Some(finished) = handlers.join_next().await {
            log_handler_exit(finished);
        }

        if let Err(e) = writer.lock().await.close().await {
            tracing::debug!("rpc server: error closing stream: {}", e);
        }
        tracing::debug!("rpc server: connection closed");
    }

    /// Read one header+body pair and resolve it.
    ///
    /// `Ok(None)` on clean end of stream. Stream errors end the
    /// connection; lookup and decode errors only fail this request.
    async fn read_request<R>(&self, reader: &mut CodecReader<R>) -> Result<Option<Request>>
    where
        R: AsyncRead + Unpin,
    {
        let header = match reader.read_header().await? {
            Some(header) => header,
            None => return Ok(None),
        };
        let body = reader.read_body().await?;

        let dispatch = self
            .registry
            .lookup(&header.service_method)
            .map_err(|e| e.to_string())
            .and_then(|(service, method)| {
                let argv = method
                    .new_argv(reader.codec(), &body)
                    .map_err(|e| format!("rpc server: read argv err: {}", e))?;
                Ok((service, method, argv))
            });

        Ok(Some(Request { header, dispatch }))
    }
}

/// Process-wide server used by [`register`] and [`accept`].
pub fn default_server() -> &'static Arc<Server> {
    DEFAULT_SERVER.get_or_init(|| Arc::new(Server::new()))
}

/// Publish the methods of `receiver` on the default server.
pub fn register<S: RpcService>(receiver: S) -> Result<()> {
    default_server().register(receiver)
}

/// Serve connections from `listener` with the default server.
pub async fn accept(listener: TcpListener) -> Result<()> {
    Arc::clone(default_server()).accept(listener).await
}

async fn read_options<R>(reader: &mut R) -> Result<Options>
where
    R: AsyncBufRead + Unpin,
{
    let options: Options = read_json_line(reader).await?;
    options.validate()?;
    Ok(options)
}

fn log_handler_exit(finished: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = finished {
        tracing::error!("rpc server: handler task failed: {}", e);
    }
}

/// Run one method and write its response.
///
/// The invocation runs as its own task. With a non-zero `handle_timeout`
/// it is raced against the timer; if the timer wins the caller gets
/// [`HANDLE_TIMEOUT_ERROR`] and the invocation's eventual result is
/// dropped.
async fn handle_request<W>(
    writer: SharedWriter<W>,
    header: Header,
    service: Arc<Service>,
    method: Arc<MethodType>,
    argv: Argv,
    codec: CodecType,
    handle_timeout: Duration,
) where
    W: AsyncWrite + Unpin + Send,
{
    let invocation = tokio::spawn(service.call(&method, argv));

    let joined = if handle_timeout.is_zero() {
        invocation.await
    } else {
        match tokio::time::timeout(handle_timeout, invocation).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::debug!(
                    "rpc server: {} (seq {}) exceeded {:?}",
                    header.service_method,
                    header.seq,
                    handle_timeout
                );
                send_error(&writer, header, HANDLE_TIMEOUT_ERROR.to_string()).await;
                return;
            }
        }
    };

    let reply = match joined {
        Ok(Ok(reply)) => reply,
        Ok(Err(message)) => return send_error(&writer, header, message).await,
        Err(e) => {
            let message = format!("rpc server: method {} failed: {}", header.service_method, e);
            return send_error(&writer, header, message).await;
        }
    };

    let body = match reply.encode(codec) {
        Ok(body) => body,
        Err(e) => {
            let message = format!("rpc server: encode reply err: {}", e);
            return send_error(&writer, header, message).await;
        }
    };
    if let Err(e) = writer.lock().await.write_encoded(&header, &body).await {
        tracing::debug!("rpc server: write response failed: {}", e);
    }
}

/// Write `{header with error, ()}`.
async fn send_error<W>(writer: &SharedWriter<W>, header: Header, message: String)
where
    W: AsyncWrite + Unpin,
{
    let header = Header {
        error: message,
        ..header
    };
    if let Err(e) = writer.lock().await.write(&header, &()).await {
        tracing::debug!("rpc server: write error response failed: {}", e);
    }
}
