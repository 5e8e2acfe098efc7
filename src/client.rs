//! Client multiplexer.
//!
//! A [`Client`] owns one connection. Any number of tasks can issue calls
//! through it concurrently; each call gets a sequence number and a
//! pending entry, and a background receive task routes every response
//! back to its caller by sequence number.
//!
//! Lifecycle:
//! 1. Send [`Options`] as a JSON line
//! 2. Spawn the send task and the receive task
//! 3. Calls register and queue `Header` + args for the send task, which
//!    writes whole messages in sequence order
//! 4. When the stream fails or [`Client::close`] is called, every pending
//!    call is failed with the terminating cause
//!
//! # Example
//!
//! ```no_run
//! use simrpc::{Client, Options};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::dial("127.0.0.1:8080", Options::default()).await?;
//!     let sum: i64 = client.call("Foo.Sum", &(3, 4)).await?;
//!     println!("3 + 4 = {}", sum);
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::codec::{CodecType, Header};
use crate::control::{write_json_line, Options};
use crate::error::{Result, RpcError};
use crate::protocol::{encode_message, CodecReader, CodecWriter};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Messages queued for the send task before `async_call` waits.
const OUTBOUND_CAPACITY: usize = 1024;

/// Raw reply body, or the error the call ended with.
type Outcome = std::result::Result<Bytes, RpcError>;

/// A call waiting for its response.
struct PendingCall {
    service_method: String,
    /// Decodes the reply into the caller's type and wakes the caller.
    complete: Box<dyn FnOnce(Outcome) + Send>,
}

impl PendingCall {
    fn complete(self, outcome: Outcome) {
        (self.complete)(outcome)
    }
}

/// An encoded request on its way to the send task.
struct Outbound {
    seq: u64,
    message: Vec<u8>,
}

/// Sequence counter and pending calls, always mutated together.
struct CallState {
    seq: u64,
    pending: HashMap<u64, PendingCall>,
    /// Set by `close()`.
    closing: bool,
    /// Set when either background task stops.
    shutdown: bool,
}

struct ClientInner {
    codec: CodecType,
    options: Options,
    state: Mutex<CallState>,
    /// Queue to the send task. Messages leave in the order they were
    /// queued, which is sequence order.
    outbound: mpsc::Sender<Outbound>,
    /// Flipped once to stop both background tasks.
    stop: watch::Sender<bool>,
    send_task: Mutex<Option<JoinHandle<()>>>,
}

impl ClientInner {
    /// Assign the next sequence number, register the call and queue its
    /// message, all under the state lock.
    ///
    /// Hands the call back if the connection is closing or shut down, or
    /// the header cannot be encoded.
    fn enqueue_call(
        &self,
        call: PendingCall,
        permit: mpsc::Permit<'_, Outbound>,
        body: &[u8],
    ) -> std::result::Result<u64, (PendingCall, RpcError)> {
        let mut state = self.state.lock();
        if state.closing || state.shutdown {
            return Err((call, RpcError::ShutDown));
        }

        let seq = state.seq;
        let header = Header::request(&call.service_method, seq);
        let message = match encode_message(self.codec, &header, body) {
            Ok(message) => message,
            Err(e) => return Err((call, e)),
        };

        state.seq += 1;
        state.pending.insert(seq, call);
        permit.send(Outbound { seq, message });
        Ok(seq)
    }

    fn remove_call(&self, seq: u64) -> Option<PendingCall> {
        self.state.lock().pending.remove(&seq)
    }

    fn mark_shutdown(&self) {
        self.state.lock().shutdown = true;
    }

    /// Mark the connection shut down and fail every pending call.
    fn terminate_calls(&self, cause: &RpcError) {
        let calls: Vec<(u64, PendingCall)> = {
            let mut state = self.state.lock();
            state.shutdown = true;
            state.pending.drain().collect()
        };

        for (seq, call) in calls {
            tracing::debug!(
                "rpc client: failing pending call {} ({}): {}",
                seq,
                call.service_method,
                cause
            );
            call.complete(Err(cause.for_pending()));
        }
    }
}

/// Resolves once the client is told to stop.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Handle to a multiplexed RPC connection.
///
/// Cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Connect over TCP and negotiate.
    ///
    /// `options.connect_timeout` bounds the TCP connect and the
    /// negotiation together; zero means no limit.
    pub async fn dial<A: ToSocketAddrs>(addr: A, options: Options) -> Result<Self> {
        let timeout = options.connect_timeout;
        let connect = async move {
            let stream = TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            Client::new(stream, options).await
        };

        if timeout.is_zero() {
            return connect.await;
        }
        tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| RpcError::ConnectTimeout)?
    }

    /// Negotiate on an established stream and start the background tasks.
    pub async fn new<S>(stream: S, options: Options) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let options = options.normalized();
        let (reader, mut writer) = tokio::io::split(stream);
        write_json_line(&mut writer, &options).await?;

        let codec = options.codec_type;
        let (outbound, queue) = mpsc::channel(OUTBOUND_CAPACITY);
        let (stop, stop_rx) = watch::channel(false);
        let inner = Arc::new(ClientInner {
            codec,
            options,
            state: Mutex::new(CallState {
                seq: 1,
                pending: HashMap::new(),
                closing: false,
                shutdown: false,
            }),
            outbound,
            stop,
            send_task: Mutex::new(None),
        });

        let writer = CodecWriter::new(Box::new(writer) as BoxedWriter, codec);
        let send_task = tokio::spawn(send_loop(inner.clone(), writer, queue, stop_rx.clone()));
        *inner.send_task.lock() = Some(send_task);

        let reader = CodecReader::new(Box::new(reader) as BoxedReader, codec);
        tokio::spawn(receive_loop(inner.clone(), reader, stop_rx));

        Ok(Client { inner })
    }

    /// The options this connection was negotiated with.
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Issue a call without waiting for its response.
    ///
    /// The request is handed to the connection's send task, so dropping
    /// this future or the returned [`Call`] never leaves a partial
    /// message on the wire. The `Call` resolves once the response
    /// arrives, the send fails, or the connection shuts down. Dropping it
    /// does not retract the request; the response is discarded when it
    /// arrives.
    pub async fn async_call<A, R>(&self, service_method: &str, args: &A) -> Call<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let mut call = Call {
            seq: None,
            service_method: service_method.to_string(),
            rx,
        };

        let body = match self.inner.codec.encode(args) {
            Ok(body) => body,
            Err(e) => {
                let _ = tx.send(Err(e));
                return call;
            }
        };

        let codec = self.inner.codec;
        let pending = PendingCall {
            service_method: service_method.to_string(),
            complete: Box::new(move |outcome: Outcome| {
                let result = outcome.and_then(|body| codec.decode::<R>(&body));
                let _ = tx.send(result);
            }),
        };

        // Nothing is registered until a queue slot is held
        let permit = match self.inner.outbound.reserve().await {
            Ok(permit) => permit,
            Err(_) => {
                pending.complete(Err(RpcError::ShutDown));
                return call;
            }
        };

        match self.inner.enqueue_call(pending, permit, &body) {
            Ok(seq) => call.seq = Some(seq),
            Err((pending, e)) => pending.complete(Err(e)),
        }
        call
    }

    /// Call `service_method` and wait for the reply.
    pub async fn call<A, R>(&self, service_method: &str, args: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        self.async_call(service_method, args).await.await
    }

    /// Call `service_method`, giving up when `cancel` resolves first.
    ///
    /// On cancellation this returns [`RpcError::Cancelled`] at once. The
    /// request stays on the wire and its pending entry stays registered
    /// until the response arrives or the connection shuts down.
    pub async fn call_until<A, R, C>(&self, service_method: &str, args: &A, cancel: C) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
        C: Future,
    {
        let call = self.async_call(service_method, args).await;
        tokio::select! {
            biased;
            result = call => result,
            _ = cancel => Err(RpcError::Cancelled),
        }
    }

    /// Call `service_method`, giving up after `timeout`.
    pub async fn call_timeout<A, R>(
        &self,
        service_method: &str,
        args: &A,
        timeout: Duration,
    ) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        self.call_until(service_method, args, tokio::time::sleep(timeout))
            .await
    }

    /// Close the connection.
    ///
    /// Stops the send task, even in the middle of a write to a peer that
    /// is not reading, and shuts the stream down. Every pending call
    /// fails with [`RpcError::ShutDown`]. Returns `ShutDown` if the client
    /// was already closed.
    pub async fn close(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.closing {
                return Err(RpcError::ShutDown);
            }
            state.closing = true;
        }

        self.inner.stop.send_replace(true);
        let send_task = self.inner.send_task.lock().take();
        if let Some(send_task) = send_task {
            if let Err(e) = send_task.await {
                tracing::debug!("rpc client: send task failed: {}", e);
            }
        }
        Ok(())
    }

    /// True iff the client is neither closed nor shut down.
    pub fn is_available(&self) -> bool {
        let state = self.inner.state.lock();
        !state.closing && !state.shutdown
    }

    /// Number of calls waiting for a response.
    pub fn pending_calls(&self) -> usize {
        self.inner.state.lock().pending.len()
    }
}

/// Writes queued requests one whole message at a time.
///
/// A failed write completes its own call with the write error and fails
/// every other pending call. Once stopped, queued requests fail and the
/// stream is shut down.
async fn send_loop(
    inner: Arc<ClientInner>,
    mut writer: CodecWriter<BoxedWriter>,
    mut queue: mpsc::Receiver<Outbound>,
    mut stop: watch::Receiver<bool>,
) {
    let cause = loop {
        let next = tokio::select! {
            biased;
            _ = stopped(&mut stop) => None,
            next = queue.recv() => next,
        };
        let Some(Outbound { seq, message }) = next else {
            break RpcError::ShutDown;
        };

        let written = tokio::select! {
            biased;
            _ = stopped(&mut stop) => Err(RpcError::ShutDown),
            written = writer.write_message(&message) => written,
        };
        if let Err(e) = written {
            let cause = e.for_pending();
            inner.mark_shutdown();
            if let Some(call) = inner.remove_call(seq) {
                call.complete(Err(e));
            }
            break cause;
        }
    };

    inner.mark_shutdown();
    queue.close();
    while let Some(Outbound { seq, .. }) = queue.recv().await {
        if let Some(call) = inner.remove_call(seq) {
            call.complete(Err(cause.for_pending()));
        }
    }
    if !matches!(cause, RpcError::ShutDown) {
        // Calls already written are lost with the stream
        inner.terminate_calls(&cause);
        inner.stop.send_replace(true);
    }

    if let Err(e) = writer.close().await {
        tracing::debug!("rpc client: error closing stream: {}", e);
    }
}

/// Reads responses until the stream ends, then fails what is left.
async fn receive_loop(
    inner: Arc<ClientInner>,
    mut reader: CodecReader<BoxedReader>,
    mut stop: watch::Receiver<bool>,
) {
    let cause = loop {
        let header = tokio::select! {
            _ = stopped(&mut stop) => break RpcError::ShutDown,
            header = reader.read_header() => match header {
                Ok(Some(header)) => header,
                Ok(None) => {
                    break RpcError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed by peer",
                    ))
                }
                Err(e) => break e,
            },
        };

        let call = inner.remove_call(header.seq);
        let body = tokio::select! {
            _ = stopped(&mut stop) => Err(RpcError::ShutDown),
            body = reader.read_body() => body,
        };

        match (call, body) {
            (call, Err(e)) => {
                if let Some(call) = call {
                    call.complete(Err(e.for_pending()));
                }
                break e;
            }
            (None, Ok(_)) => {
                tracing::debug!(
                    "rpc client: discarding response for unknown call {}",
                    header.seq
                );
            }
            (Some(call), Ok(_)) if header.is_error() => {
                call.complete(Err(RpcError::Remote(header.error)));
            }
            (Some(call), Ok(body)) => call.complete(Ok(body)),
        }
    };

    match &cause {
        RpcError::ShutDown => tracing::debug!("rpc client: connection closed"),
        other => tracing::debug!("rpc client: receive loop ended: {}", other),
    }
    inner.terminate_calls(&cause);
    inner.stop.send_replace(true);
}

/// An issued call. Resolves to the reply or the error the call ended with.
#[must_use = "a Call does nothing unless awaited"]
pub struct Call<R> {
    seq: Option<u64>,
    service_method: String,
    rx: oneshot::Receiver<Result<R>>,
}

impl<R> Call<R> {
    /// Sequence number, or `None` if the call never reached the wire.
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    /// The `Service.Method` this call targets.
    pub fn service_method(&self) -> &str {
        &self.service_method
    }
}

impl<R> Future for Call<R> {
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RpcError::ShutDown)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::read_json_line;
    use tokio::io::{BufReader, DuplexStream, ReadBuf, ReadHalf, WriteHalf};

    type FakeReader = CodecReader<BufReader<ReadHalf<DuplexStream>>>;
    type FakeWriter = CodecWriter<WriteHalf<DuplexStream>>;

    /// Server end that speaks the protocol by hand.
    async fn fake_server(stream: DuplexStream) -> (FakeReader, FakeWriter) {
        let (reader, writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);
        let options: Options = read_json_line(&mut reader).await.unwrap();
        (
            CodecReader::new(reader, options.codec_type),
            CodecWriter::new(writer, options.codec_type),
        )
    }

    async fn connected() -> (Client, FakeReader, FakeWriter) {
        let (client_end, server_end) = tokio::io::duplex(64 * 1024);
        let client = Client::new(client_end, Options::default()).await.unwrap();
        let (reader, writer) = fake_server(server_end).await;
        (client, reader, writer)
    }

    #[tokio::test]
    async fn test_responses_routed_by_seq_not_order() {
        let (client, mut reader, mut writer) = connected().await;

        let first = client.async_call::<_, String>("Echo.Say", "first").await;
        let second = client.async_call::<_, String>("Echo.Say", "second").await;

        let mut requests = Vec::new();
        for _ in 0..2 {
            let header = reader.read_header().await.unwrap().unwrap();
            let text: String = reader.read_body_into().await.unwrap();
            requests.push((header, text));
        }

        // Answer in reverse order
        for (header, text) in requests.into_iter().rev() {
            let reply = Header {
                error: String::new(),
                ..header
            };
            writer.write(&reply, &text).await.unwrap();
        }

        assert_eq!(first.await.unwrap(), "first");
        assert_eq!(second.await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_error_header_and_unknown_seq() {
        let (client, mut reader, mut writer) = connected().await;

        let call = client.async_call::<_, i64>("Foo.Sum", &(1, 2)).await;
        let header = reader.read_header().await.unwrap().unwrap();
        reader.discard_body().await.unwrap();

        // Stray response first; it must be skipped without breaking framing
        writer
            .write(&Header::request("Foo.Sum", 999), &12345i64)
            .await
            .unwrap();
        let reply = Header {
            error: "boom".to_string(),
            ..header
        };
        writer.write(&reply, &()).await.unwrap();

        match call.await {
            Err(RpcError::Remote(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected remote error, got {:?}", other),
        }
        assert!(client.is_available());
    }

    #[tokio::test]
    async fn test_close_fails_pending_and_rejects_new_calls() {
        let (client, _reader, _writer) = connected().await;

        let pending = client.async_call::<_, i64>("Foo.Sum", &(1, 2)).await;
        assert_eq!(pending.seq(), Some(1));

        client.close().await.unwrap();
        assert!(matches!(pending.await, Err(RpcError::ShutDown)));
        assert!(!client.is_available());
        assert!(matches!(client.close().await, Err(RpcError::ShutDown)));

        let late = client.async_call::<_, i64>("Foo.Sum", &(1, 2)).await;
        assert_eq!(late.seq(), None);
        assert!(matches!(late.await, Err(RpcError::ShutDown)));
    }

    #[tokio::test]
    async fn test_peer_hangup_fails_every_pending_call() {
        let (client, reader, writer) = connected().await;

        let mut calls = Vec::new();
        for i in 0..5i64 {
            calls.push(client.async_call::<_, i64>("Foo.Sum", &(i, i)).await);
        }
        assert_eq!(client.pending_calls(), 5);

        let mut reader = reader;
        for _ in 0..5 {
            reader.read_header().await.unwrap().unwrap();
            reader.discard_body().await.unwrap();
        }
        drop(reader);
        drop(writer);

        for call in calls {
            assert!(matches!(call.await, Err(RpcError::ConnectionLost(_))));
        }
        assert_eq!(client.pending_calls(), 0);
        assert!(!client.is_available());
    }

    #[tokio::test]
    async fn test_cancelled_call_stays_registered() {
        let (client, mut reader, mut writer) = connected().await;

        let result: Result<i64> = client
            .call_timeout("Foo.Sum", &(1, 2), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(RpcError::Cancelled)));
        assert_eq!(client.pending_calls(), 1);

        let header = reader.read_header().await.unwrap().unwrap();
        reader.discard_body().await.unwrap();
        writer.write(&header, &3i64).await.unwrap();

        // The late reply resolves and drops the entry
        let follow_up = client.async_call::<_, i64>("Foo.Sum", &(2, 2)).await;
        let header = reader.read_header().await.unwrap().unwrap();
        reader.discard_body().await.unwrap();
        writer.write(&header, &4i64).await.unwrap();
        assert_eq!(follow_up.await.unwrap(), 4);
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_sequence_numbers_strictly_increase_on_wire() {
        let (client, mut reader, _writer) = connected().await;

        let mut tasks = Vec::new();
        for i in 0..20i64 {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                client.async_call::<_, i64>("Foo.Sum", &(i, i)).await.seq()
            }));
        }

        let mut issued = Vec::new();
        for task in tasks {
            issued.push(task.await.unwrap().unwrap());
        }

        let mut on_wire = Vec::new();
        for _ in 0..20 {
            on_wire.push(reader.read_header().await.unwrap().unwrap().seq);
            reader.discard_body().await.unwrap();
        }

        assert!(on_wire.windows(2).all(|w| w[0] < w[1]));
        issued.sort_unstable();
        assert_eq!(issued, on_wire);
        assert_eq!(on_wire, (1..=20).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_close_unblocks_stalled_send() {
        // The server end is never read, so the send stalls
        let (client_end, _server_end) = tokio::io::duplex(256);
        let client = Client::new(client_end, Options::default()).await.unwrap();

        let big = vec![7u8; 64 * 1024];
        let call = client.async_call::<_, ()>("Foo.Big", &big).await;
        assert_eq!(call.seq(), Some(1));

        let closed = tokio::time::timeout(Duration::from_secs(2), client.close()).await;
        assert!(matches!(closed, Ok(Ok(()))));

        let result = tokio::time::timeout(Duration::from_secs(2), call).await;
        assert!(matches!(result, Ok(Err(RpcError::ShutDown))));
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_call_keeps_framing_intact() {
        let (client_end, server_end) = tokio::io::duplex(1024);
        let client = Client::new(client_end, Options::default()).await.unwrap();

        // Caller gives up while the large request is still being written
        let big = vec![1u8; 200 * 1024];
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            client.call::<_, Vec<u8>>("Echo.Say", &big),
        )
        .await;
        assert!(abandoned.is_err());

        let (mut reader, mut writer) = fake_server(server_end).await;
        let header = reader.read_header().await.unwrap().unwrap();
        let body: Vec<u8> = reader.read_body_into().await.unwrap();
        assert_eq!(header.seq, 1);
        assert_eq!(body, big);

        let follow_up = {
            let client = client.clone();
            tokio::spawn(async move { client.call::<_, Vec<u8>>("Echo.Say", &vec![2u8; 10]).await })
        };
        let header = reader.read_header().await.unwrap().unwrap();
        let body: Vec<u8> = reader.read_body_into().await.unwrap();
        assert_eq!(header.seq, 2);
        writer.write(&header, &body).await.unwrap();

        assert_eq!(follow_up.await.unwrap().unwrap(), vec![2u8; 10]);
        assert_eq!(client.pending_calls(), 1);
    }

    /// Reads from one duplex and writes to another, so each direction can
    /// be broken on its own.
    struct Joined {
        read: DuplexStream,
        write: DuplexStream,
    }

    impl AsyncRead for Joined {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.read).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for Joined {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Pin::new(&mut self.write).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.write).poll_flush(cx)
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.write).poll_shutdown(cx)
        }
    }

    #[tokio::test]
    async fn test_failed_send_completes_call_with_write_error() {
        let (read_client, _read_server) = tokio::io::duplex(1024);
        let (write_client, write_server) = tokio::io::duplex(1024);
        let stream = Joined {
            read: read_client,
            write: write_client,
        };
        let client = Client::new(stream, Options::default()).await.unwrap();

        // Requests can no longer be delivered; responses still could be
        drop(write_server);

        let call = client.async_call::<_, i64>("Foo.Sum", &(1, 2)).await;
        assert_eq!(call.seq(), Some(1));
        assert!(matches!(call.await, Err(RpcError::Io(_))));
        assert_eq!(client.pending_calls(), 0);
        assert!(!client.is_available());

        let late = client.async_call::<_, i64>("Foo.Sum", &(1, 2)).await;
        assert!(matches!(late.await, Err(RpcError::ShutDown)));
    }
}
