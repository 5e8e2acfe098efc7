//! Reassembly of length-prefixed frames from arbitrary read chunks.
//!
//! Bytes land in a `BytesMut`; complete payloads are split off and frozen
//! without copying. Two states:
//! - `WaitingForLength`: fewer than 4 prefix bytes buffered
//! - `WaitingForPayload`: prefix consumed, `remaining` payload bytes due

use bytes::{Bytes, BytesMut};

use super::wire_format::{decode_length, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};
use crate::error::{Result, RpcError};

/// Where the parser is within the current frame.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Waiting for a complete length prefix.
    WaitingForLength,
    /// Length parsed, waiting for payload bytes.
    WaitingForPayload { remaining: usize },
}

/// Turns a byte stream back into frames.
pub struct FrameBuffer {
    /// Bytes read but not yet returned as frames.
    buffer: BytesMut,
    state: State,
    /// Maximum allowed frame size.
    max_frame_size: usize,
}

impl FrameBuffer {
    /// Buffer with the default 64 MiB frame limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Buffer rejecting frames longer than `max_frame_size`.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForLength,
            max_frame_size,
        }
    }

    /// Append `data`; frames are pulled with [`next_frame`](Self::next_frame).
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Pop the next complete frame, or `Ok(None)` until more bytes arrive.
    ///
    /// Fails with [`RpcError::FrameTooLarge`] as soon as an oversized
    /// prefix is seen, before its payload is buffered.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.state {
                State::WaitingForLength => {
                    let len = match decode_length(&self.buffer) {
                        Some(len) => len,
                        None => return Ok(None),
                    };

                    if len > self.max_frame_size {
                        return Err(RpcError::FrameTooLarge {
                            size: len,
                            max: self.max_frame_size,
                        });
                    }

                    let _ = self.buffer.split_to(LENGTH_PREFIX_SIZE);
                    self.state = State::WaitingForPayload { remaining: len };
                }

                State::WaitingForPayload { remaining } => {
                    if self.buffer.len() < remaining {
                        return Ok(None);
                    }

                    let payload = self.buffer.split_to(remaining).freeze();
                    self.state = State::WaitingForLength;
                    return Ok(Some(payload));
                }
            }
        }
    }

    /// True when no partial frame is buffered.
    pub fn at_frame_boundary(&self) -> bool {
        self.buffer.is_empty() && matches!(self.state, State::WaitingForLength)
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForLength => "WaitingForLength",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::put_frame;

    fn make_frame_bytes(payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        put_frame(&mut bytes, payload).unwrap();
        bytes
    }

    /// Append `data` and drain every frame it completes.
    fn feed(buffer: &mut FrameBuffer, data: &[u8]) -> Result<Vec<Bytes>> {
        buffer.extend(data);
        let mut frames = Vec::new();
        while let Some(frame) = buffer.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    #[test]
    fn test_header_and_body_in_one_read() {
        let mut buffer = FrameBuffer::new();
        let mut data = make_frame_bytes(b"header");
        data.extend(make_frame_bytes(b"body"));

        let frames = feed(&mut buffer, &data).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], b"header");
        assert_eq!(&frames[1][..], b"body");
        assert!(buffer.at_frame_boundary());
    }

    #[test]
    fn test_fragmented_length_prefix() {
        let mut buffer = FrameBuffer::new();
        let frame_bytes = make_frame_bytes(b"test");

        assert!(feed(&mut buffer, &frame_bytes[..2]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForLength");
        assert!(!buffer.at_frame_boundary());

        let frames = feed(&mut buffer, &frame_bytes[2..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"test");
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = b"this is a longer payload that will be fragmented";
        let frame_bytes = make_frame_bytes(payload);

        let partial_len = LENGTH_PREFIX_SIZE + 10;
        assert!(feed(&mut buffer, &frame_bytes[..partial_len]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        let frames = feed(&mut buffer, &frame_bytes[partial_len..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], payload);
        assert!(buffer.at_frame_boundary());
    }

    #[test]
    fn test_empty_payload() {
        let mut buffer = FrameBuffer::new();
        let frames = feed(&mut buffer, &make_frame_bytes(b"")).unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn test_max_frame_validation() {
        let mut buffer = FrameBuffer::with_max_frame_size(100);
        let result = feed(&mut buffer, &1000u32.to_be_bytes());

        assert!(matches!(
            result,
            Err(RpcError::FrameTooLarge { size: 1000, max: 100 })
        ));
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let frame_bytes = make_frame_bytes(b"hi");

        let mut all_frames = Vec::new();
        for byte in &frame_bytes {
            all_frames.extend(feed(&mut buffer, &[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(&all_frames[0][..], b"hi");
    }
}
