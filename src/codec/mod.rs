//! Codec module - message header and body formats.
//!
//! Every message on the wire is a [`Header`] followed by exactly one body
//! value. Both are encoded with the body format selected during
//! negotiation:
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (default)
//! - [`JsonCodec`] - JSON using `serde_json`
//!
//! [`CodecType`] is the negotiated identifier and the only thing the
//! client and server hold on to. They never match on it themselves.
//!
//! # Example
//!
//! ```
//! use simrpc::codec::{CodecType, Header};
//!
//! let codec: CodecType = "json".parse().unwrap();
//! let header = Header::request("Foo.Sum", 1);
//! let encoded = codec.encode(&header).unwrap();
//! let decoded: Header = codec.decode(&encoded).unwrap();
//! assert_eq!(decoded, header);
//! ```

mod json;
mod msgpack;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

use crate::error::{Result, RpcError};

/// Message header preceding every body on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Target in `Service.Method` form.
    pub service_method: String,
    /// Call correlation id, chosen by the client.
    pub seq: u64,
    /// Empty on success; otherwise the error message.
    pub error: String,
}

impl Header {
    /// Header for an outbound call.
    pub fn request(service_method: &str, seq: u64) -> Self {
        Self {
            service_method: service_method.to_string(),
            seq,
            error: String::new(),
        }
    }

    /// Whether this header reports an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Negotiated body format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecType {
    /// MessagePack with named struct fields.
    #[default]
    MsgPack,
    /// JSON.
    Json,
}

impl CodecType {
    /// Identifier sent during negotiation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecType::MsgPack => "msgpack",
            CodecType::Json => "json",
        }
    }

    /// Encode a value with this format.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            CodecType::MsgPack => MsgPackCodec::encode(value),
            CodecType::Json => JsonCodec::encode(value),
        }
    }

    /// Decode a value with this format.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            CodecType::MsgPack => MsgPackCodec::decode(bytes),
            CodecType::Json => JsonCodec::decode(bytes),
        }
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecType {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "msgpack" => Ok(CodecType::MsgPack),
            "json" => Ok(CodecType::Json),
            other => Err(RpcError::Negotiation(format!(
                "unsupported codec type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_type_from_str() {
        assert_eq!("msgpack".parse::<CodecType>().unwrap(), CodecType::MsgPack);
        assert_eq!("json".parse::<CodecType>().unwrap(), CodecType::Json);
        assert!(matches!(
            "gob".parse::<CodecType>(),
            Err(RpcError::Negotiation(_))
        ));
    }

    #[test]
    fn test_codec_type_serde_matches_identifier() {
        for codec in [CodecType::MsgPack, CodecType::Json] {
            let json = serde_json::to_string(&codec).unwrap();
            assert_eq!(json, format!("\"{}\"", codec.as_str()));
        }
    }

    #[test]
    fn test_header_with_error_survives_both_formats() {
        let header = Header {
            service_method: "Foo.Sum".to_string(),
            seq: u64::MAX,
            error: "rpc server: can't find method Nope".to_string(),
        };

        for codec in [CodecType::MsgPack, CodecType::Json] {
            let decoded: Header = codec.decode(&codec.encode(&header).unwrap()).unwrap();
            assert_eq!(decoded, header);
            assert!(decoded.is_error());
        }
    }

    #[test]
    fn test_request_header_has_no_error() {
        let header = Header::request("Foo.Sum", 7);
        assert_eq!(header.seq, 7);
        assert!(!header.is_error());
    }
}
