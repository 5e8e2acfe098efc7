//! Negotiation options exchanged at connection start.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::CodecType;
use crate::error::{Result, RpcError};

/// Fixed sentinel identifying the protocol.
pub const MAGIC_NUMBER: u32 = 114514;

/// Default limit for TCP connect plus negotiation.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options sent by the client as the first line of every connection.
///
/// A zero duration means "no limit".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Must equal [`MAGIC_NUMBER`].
    pub magic_number: u32,
    /// Body format for the rest of the connection.
    pub codec_type: CodecType,
    /// Client-side limit for connect plus negotiation.
    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    pub connect_timeout: Duration,
    /// Server-side limit for each method invocation.
    #[serde(rename = "handle_timeout_ms", with = "duration_ms")]
    pub handle_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            magic_number: MAGIC_NUMBER,
            codec_type: CodecType::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handle_timeout: Duration::ZERO,
        }
    }
}

impl Options {
    /// Set the body format.
    pub fn with_codec(mut self, codec_type: CodecType) -> Self {
        self.codec_type = codec_type;
        self
    }

    /// Set the connect timeout (zero disables it).
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-call handle timeout (zero disables it).
    pub fn with_handle_timeout(mut self, timeout: Duration) -> Self {
        self.handle_timeout = timeout;
        self
    }

    /// Force the protocol magic number, whatever the caller put there.
    pub fn normalized(mut self) -> Self {
        self.magic_number = MAGIC_NUMBER;
        self
    }

    /// Check the options received from a peer.
    pub fn validate(&self) -> Result<()> {
        if self.magic_number != MAGIC_NUMBER {
            return Err(RpcError::Negotiation(format!(
                "invalid magic number {:#x}",
                self.magic_number
            )));
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
