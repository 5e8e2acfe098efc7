//! Wire format for length-delimited frames.
//!
//! Every encoded header and every encoded body travels as one frame:
//! ```text
//! ┌──────────┬───────────────────┐
//! │ Length   │ Encoded value     │
//! │ 4 bytes  │ Length bytes      │
//! │ uint32 BE│                   │
//! └──────────┴───────────────────┘
//! ```
//!
//! A message is always two frames: the header, then the body.

use crate::error::{Result, RpcError};

/// Length prefix size in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum frame size (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Encode a frame length prefix (Big Endian).
///
/// # Example
///
/// ```
/// use simrpc::protocol::encode_length;
///
/// assert_eq!(encode_length(258).unwrap(), [0, 0, 1, 2]);
/// ```
pub fn encode_length(len: usize) -> Result<[u8; LENGTH_PREFIX_SIZE]> {
    let len = u32::try_from(len).map_err(|_| RpcError::FrameTooLarge {
        size: len,
        max: u32::MAX as usize,
    })?;
    Ok(len.to_be_bytes())
}

/// Decode a frame length prefix.
///
/// Returns `None` if the buffer is too short.
pub fn decode_length(buf: &[u8]) -> Option<usize> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return None;
    }
    Some(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize)
}

/// Append one frame (prefix + payload) to `out`.
pub fn put_frame(out: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
    out.extend_from_slice(&encode_length(payload.len())?);
    out.extend_from_slice(payload);
    Ok(())
}
