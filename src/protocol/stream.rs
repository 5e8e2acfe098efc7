//! Header/body reader and writer over an async byte stream.
//!
//! [`CodecReader`] and [`CodecWriter`] are the two halves of a negotiated
//! codec. Reads and writes strictly alternate header then body. The
//! writer sends one header+body pair per call and flushes; callers that
//! share a writer must serialize access to it themselves.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::frame_buffer::FrameBuffer;
use super::wire_format::{put_frame, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};
use crate::codec::{CodecType, Header};
use crate::error::{Result, RpcError};

/// Read buffer size per syscall.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Reading half of a codec.
pub struct CodecReader<R> {
    reader: R,
    codec: CodecType,
    frames: FrameBuffer,
    chunk: Vec<u8>,
}

impl<R: AsyncRead + Unpin> CodecReader<R> {
    /// Create a reader with the default frame size limit.
    pub fn new(reader: R, codec: CodecType) -> Self {
        Self::with_max_frame_size(reader, codec, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a reader with a custom frame size limit.
    pub fn with_max_frame_size(reader: R, codec: CodecType, max_frame_size: usize) -> Self {
        Self {
            reader,
            codec,
            frames: FrameBuffer::with_max_frame_size(max_frame_size),
            chunk: vec![0u8; READ_CHUNK_SIZE],
        }
    }

    /// The negotiated codec.
    pub fn codec(&self) -> CodecType {
        self.codec
    }

    /// Read the next frame. `Ok(None)` means the peer closed the stream
    /// cleanly between frames.
    ///
    /// Cancel safe: buffered bytes survive a dropped future.
    async fn read_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(frame) = self.frames.next_frame()? {
                return Ok(Some(frame));
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                if self.frames.at_frame_boundary() {
                    return Ok(None);
                }
                return Err(RpcError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream closed mid-frame",
                )));
            }
            self.frames.extend(&self.chunk[..n]);
        }
    }

    /// Read the next header. `Ok(None)` on clean end of stream.
    pub async fn read_header(&mut self) -> Result<Option<Header>> {
        match self.read_frame().await? {
            Some(frame) => Ok(Some(self.codec.decode(&frame)?)),
            None => Ok(None),
        }
    }

    /// Read the raw body that follows a header.
    pub async fn read_body(&mut self) -> Result<Bytes> {
        self.read_frame().await?.ok_or_else(|| {
            RpcError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed before body",
            ))
        })
    }

    /// Read and decode the body that follows a header.
    pub async fn read_body_into<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.read_body().await?;
        self.codec.decode(&body)
    }

    /// Consume the body that follows a header and ignore it.
    pub async fn discard_body(&mut self) -> Result<()> {
        self.read_body().await.map(|_| ())
    }
}

/// Encode a header and an already encoded body as one wire message.
pub fn encode_message(codec: CodecType, header: &Header, body: &[u8]) -> Result<Vec<u8>> {
    let header = codec.encode(header)?;
    let mut buf = Vec::with_capacity(2 * LENGTH_PREFIX_SIZE + header.len() + body.len());
    put_frame(&mut buf, &header)?;
    put_frame(&mut buf, body)?;
    Ok(buf)
}

/// Writing half of a codec.
///
/// A message is either written whole or the writer is broken: after a
/// failed write, or a write whose future was dropped part way, the stream
/// is unusable and every later write fails with [`RpcError::ShutDown`].
pub struct CodecWriter<W> {
    writer: W,
    codec: CodecType,
    broken: bool,
    shut_down: bool,
}

impl<W: AsyncWrite + Unpin> CodecWriter<W> {
    /// Create a writer for the negotiated codec.
    pub fn new(writer: W, codec: CodecType) -> Self {
        Self {
            writer,
            codec,
            broken: false,
            shut_down: false,
        }
    }

    /// The negotiated codec.
    pub fn codec(&self) -> CodecType {
        self.codec
    }

    /// Whether a previous write failed, was interrupted, or the writer
    /// was closed.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Encode and write a header followed by `body`.
    pub async fn write<T: Serialize + ?Sized>(&mut self, header: &Header, body: &T) -> Result<()> {
        let body = self.codec.encode(body)?;
        self.write_encoded(header, &body).await
    }

    /// Write a header followed by an already encoded body.
    pub async fn write_encoded(&mut self, header: &Header, body: &[u8]) -> Result<()> {
        let message = encode_message(self.codec, header, body)?;
        self.write_message(&message).await
    }

    /// Write a message built by [`encode_message`] and flush.
    pub async fn write_message(&mut self, message: &[u8]) -> Result<()> {
        if self.broken {
            return Err(RpcError::ShutDown);
        }

        // Stays set if this future is dropped before the message is out
        self.broken = true;
        if let Err(e) = self.write_all_and_flush(message).await {
            tracing::warn!("codec write failed, closing stream: {}", e);
            let _ = self.shut_down().await;
            return Err(e.into());
        }
        self.broken = false;
        Ok(())
    }

    async fn write_all_and_flush(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(buf).await?;
        self.writer.flush().await
    }

    async fn shut_down(&mut self) -> std::io::Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.writer.shutdown().await
    }

    /// Shut down the stream. Later writes fail with `ShutDown`.
    pub async fn close(&mut self) -> Result<()> {
        self.broken = true;
        self.shut_down().await?;
        Ok(())
    }
}
