//! Control plane module - connection negotiation.
//!
//! The control plane is a single JSON line sent by the client right
//! after the stream is established, before any codec is selected.
//! After it, all communication happens through the negotiated codec.
//!
//! # Workflow
//!
//! 1. Client connects
//! 2. Client writes [`Options`] as one JSON line
//! 3. Server validates the magic number and codec type
//! 4. Header+body messages begin in the negotiated codec
//!
//! # Example
//!
//! ```
//! use simrpc::codec::CodecType;
//! use simrpc::control::{Options, MAGIC_NUMBER};
//! use std::time::Duration;
//!
//! let options = Options::default()
//!     .with_codec(CodecType::Json)
//!     .with_handle_timeout(Duration::from_secs(1));
//! assert_eq!(options.magic_number, MAGIC_NUMBER);
//! ```

mod line;
mod options;

pub use line::{read_json_line, write_json_line, MAX_LINE_LENGTH};
pub use options::{Options, DEFAULT_CONNECT_TIMEOUT, MAGIC_NUMBER};
