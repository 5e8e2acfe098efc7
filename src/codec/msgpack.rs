//! MsgPack body format using `rmp-serde`.
//!
//! Structs are written with `to_vec_named` (struct-as-map), so a peer can
//! add or reorder fields without breaking positional decoding.

use crate::error::Result;

/// MessagePack body format.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Args {
        num1: i64,
        num2: i64,
    }

    #[test]
    fn test_struct_encodes_as_map() {
        let encoded = MsgPackCodec::encode(&Args { num1: 3, num2: 4 }).unwrap();

        // 0x82 = fixmap with 2 entries; positional encoding would be 0x92
        assert_eq!(encoded[0], 0x82);

        let decoded: Args = MsgPackCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, Args { num1: 3, num2: 4 });
    }

    #[test]
    fn test_unit_encodes_as_nil() {
        // The error-response sentinel body
        let encoded = MsgPackCodec::encode(&()).unwrap();
        assert_eq!(encoded, vec![0xc0]);
    }

    #[test]
    fn test_binary_payload() {
        let data: Vec<u8> = vec![0x01, 0x02, 0x03];
        let encoded = MsgPackCodec::encode(&serde_bytes::Bytes::new(&data)).unwrap();
        assert_eq!(encoded[0], 0xc4, "Expected bin8 format");

        let decoded: serde_bytes::ByteBuf = MsgPackCodec::decode(&encoded).unwrap();
        assert_eq!(decoded.as_ref(), &data);
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let result: Result<Args> = MsgPackCodec::decode(b"not valid msgpack");
        assert!(result.is_err());
    }
}
