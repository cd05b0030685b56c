//! Unwrap the CBOR framing around a reassembled UR message.
//!
//! A `ur:bytes` message is a CBOR byte string whose content is the real payload.
//! Senders also put the structure itself in the message without the byte string
//! wrapper, in which case the whole message is the payload.

use minicbor::{Decoder, data::Type};
use tracing::debug;

use crate::error::{Result, ToUrError as _, UrError};
use crate::ur_type::UrType;

/// Message bytes recovered from one or more UR fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredPayload {
    /// CBOR encoded message as transported by the UR
    pub cbor: Vec<u8>,
    /// Type declared in the `ur:<type>/` prefix
    pub ur_type: UrType,
}

/// Payload with the outer CBOR framing removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub bytes: Vec<u8>,
    pub ur_type: UrType,
}

impl RecoveredPayload {
    pub fn new(cbor: Vec<u8>, ur_type: UrType) -> Self {
        Self { cbor, ur_type }
    }
}

/// Strip the outer framing: the content of a (possibly tagged) byte string, or
/// the message itself if it holds any other single CBOR item
///
/// # Errors
/// `MalformedEnvelope` if the message is not exactly one well-formed CBOR item
pub fn decode(payload: &RecoveredPayload) -> Result<DecodedPayload> {
    let cbor = payload.cbor.as_slice();
    let mut decoder = Decoder::new(cbor);

    if cbor.is_empty() {
        return Err(UrError::MalformedEnvelope("empty UR message".into()));
    }

    while decoder.datatype().map_err_malformed()? == Type::Tag {
        decoder.tag().map_err_malformed()?;
    }

    let bytes = match decoder.datatype().map_err_malformed()? {
        Type::Bytes | Type::BytesIndef => {
            let mut bytes = Vec::new();
            for chunk in decoder.bytes_iter().map_err_malformed()? {
                bytes.extend_from_slice(chunk.map_err_malformed()?);
            }
            bytes
        }
        other => {
            debug!("UR message is a bare {other:?}, using it as the payload");
            decoder.skip().map_err_malformed()?;
            cbor.to_vec()
        }
    };

    let consumed = decoder.position();
    if consumed != cbor.len() {
        return Err(UrError::MalformedEnvelope(format!(
            "{} trailing bytes after the UR message",
            cbor.len() - consumed
        )));
    }

    Ok(DecodedPayload { bytes, ur_type: payload.ur_type.clone() })
}
