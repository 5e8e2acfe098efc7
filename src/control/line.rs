//! Newline-delimited JSON for the control plane.
//!
//! Writes use an explicit `\n` and flush immediately: the peer blocks on
//! a complete line before it selects a codec. Reads never consume past
//! the newline, so the bytes that follow stay in the buffered reader for
//! the codec.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, RpcError};

/// Longest accepted control line, newline included.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Write a value as a single JSON line and flush.
///
/// # Errors
///
/// Returns error if serialization or the write fails.
pub async fn write_json_line<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one JSON line and decode it.
///
/// # Errors
///
/// Returns [`RpcError::Negotiation`] if the stream ends before a full
/// line, or the line exceeds [`MAX_LINE_LENGTH`].
pub async fn read_json_line<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = Vec::new();
    let n = reader
        .take(MAX_LINE_LENGTH as u64)
        .read_until(b'\n', &mut line)
        .await?;

    if n == 0 {
        return Err(RpcError::Negotiation(
            "connection closed before options".to_string(),
        ));
    }
    if line.last() != Some(&b'\n') {
        return Err(RpcError::Negotiation(format!(
            "options line truncated or longer than {} bytes",
            MAX_LINE_LENGTH
        )));
    }

    Ok(serde_json::from_slice(&line)?)
}
