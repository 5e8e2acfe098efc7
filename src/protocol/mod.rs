//! Protocol module - framing and the codec stream halves.
//!
//! This module implements the data plane after negotiation:
//! - 4-byte length-prefixed frames
//! - Frame buffer for accumulating partial reads
//! - [`CodecReader`] / [`CodecWriter`] for header+body messages

mod frame_buffer;
mod stream;
mod wire_format;

pub use frame_buffer::FrameBuffer;
pub use stream::{encode_message, CodecReader, CodecWriter};
pub use wire_format::{
    decode_length, encode_length, put_frame, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE,
};
