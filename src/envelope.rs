//! Binary envelope around the exported account table.
//!
//! The unwrapped UR payload is CBOR `[header, [entry, ...]]`, optionally
//! compressed with zlib, gzip or raw deflate. The decompressor is injected
//! through [`Inflate`] so callers and tests can swap it out.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use folio_ur::{
    DecodedPayload, UrType, Value,
    cbor::{self, CborError},
};
use tracing::{debug, warn};

use crate::config::ImportConfig;

/// Decompress a byte string that may hold a compressed envelope
pub trait Inflate: Send + Sync {
    fn inflate(&self, compressed: &[u8]) -> Result<Vec<u8>, InflateError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InflateError {
    #[error("not a zlib, gzip or deflate stream")]
    NotCompressed,

    #[error("inflated data exceeds {0} bytes")]
    TooLarge(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("failed to decode account envelope: {0}")]
    DecodeError(String),

    #[error("unsupported payload shape for ur:{ur_type}")]
    UnsupportedPayloadShape { ur_type: UrType },
}

/// Top-level array of an account export
#[derive(Debug, Clone, PartialEq)]
pub struct AccountEnvelope {
    /// Element 0, opaque
    pub header: Value,
    /// Element 1, raw account entries
    pub entries: Vec<Value>,
}

/// [`Inflate`] backed by flate2, tries zlib, gzip and raw deflate in that order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlateInflater {
    max_len: u64,
}

impl FlateInflater {
    pub fn new(max_len: u64) -> Self {
        Self { max_len }
    }

    fn read_capped(&self, reader: impl Read) -> Result<Vec<u8>, InflateError> {
        let mut inflated = Vec::new();
        reader
            .take(self.max_len.saturating_add(1))
            .read_to_end(&mut inflated)
            .map_err(|_| InflateError::NotCompressed)?;

        if inflated.len() as u64 > self.max_len {
            return Err(InflateError::TooLarge(self.max_len));
        }

        if inflated.is_empty() {
            return Err(InflateError::NotCompressed);
        }

        Ok(inflated)
    }
}

impl Inflate for FlateInflater {
    fn inflate(&self, compressed: &[u8]) -> Result<Vec<u8>, InflateError> {
        let attempts: [InflateAttempt<'_>; 3] = [
            &|| self.read_capped(ZlibDecoder::new(compressed)),
            &|| self.read_capped(GzDecoder::new(compressed)),
            &|| self.read_capped(DeflateDecoder::new(compressed)),
        ];

        first_inflated(&attempts)
    }
}

type InflateAttempt<'a> = &'a dyn Fn() -> Result<Vec<u8>, InflateError>;

/// Run the attempts in order and stop at the first success, `TooLarge` wins
/// over `NotCompressed` when all of them fail
fn first_inflated(attempts: &[InflateAttempt<'_>]) -> Result<Vec<u8>, InflateError> {
    let mut error = InflateError::NotCompressed;
    for attempt in attempts {
        match attempt() {
            Ok(inflated) => return Ok(inflated),
            Err(too_large @ InflateError::TooLarge(_)) => error = too_large,
            Err(InflateError::NotCompressed) => {}
        }
    }

    Err(error)
}

impl Default for FlateInflater {
    fn default() -> Self {
        Self::new(ImportConfig::DEFAULT_MAX_INFLATED_LEN)
    }
}

/// Turns an unwrapped UR payload into an [`AccountEnvelope`]
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder<I = FlateInflater> {
    inflater: I,
    expected_ur_type: UrType,
    max_depth: usize,
}

impl EnvelopeDecoder<FlateInflater> {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(FlateInflater::new(config.max_inflated_len), config)
    }
}

impl<I: Inflate> EnvelopeDecoder<I> {
    pub fn new(inflater: I, config: &ImportConfig) -> Self {
        Self {
            inflater,
            expected_ur_type: UrType::from(config.expected_ur_type.as_str()),
            max_depth: config.max_nesting_depth as usize,
        }
    }

    /// Decode the payload, inflating it first when the plain CBOR does not
    /// have the envelope shape
    ///
    /// # Errors
    /// `UnsupportedPayloadShape` for a different UR type or a well-formed
    /// structure of the wrong shape, `DecodeError` if neither the plain nor the
    /// inflated bytes are valid CBOR
    pub fn decode(&self, payload: &DecodedPayload) -> Result<AccountEnvelope, EnvelopeError> {
        if payload.ur_type != self.expected_ur_type {
            warn!("expected ur:{}, got ur:{}", self.expected_ur_type, payload.ur_type);
            return Err(self.unsupported(payload));
        }

        let (node, plain_error) = match self.decode_structure(&payload.bytes) {
            Ok(node) => (node, None),
            Err(error) => {
                debug!("payload is not plain CBOR ({error}), trying to inflate");
                (Value::Bytes(payload.bytes.clone()), Some(error))
            }
        };

        let node = match into_envelope(node) {
            Ok(envelope) => return Ok(envelope),
            Err(node) => node,
        };

        // a compressed stream can sit inside a byte string or be the payload itself
        let plain_is_raw = plain_error.is_some();
        let mut candidates = vec![node];
        if !plain_is_raw {
            candidates.push(Value::Bytes(payload.bytes.clone()));
        }

        for candidate in candidates {
            if let Ok(envelope) = into_envelope(self.try_decompress_and_redecode(candidate)) {
                debug!("decoded compressed envelope, entries: {}", envelope.entries.len());
                return Ok(envelope);
            }
        }

        match plain_error {
            Some(error) => {
                warn!(
                    "ur:{} payload is neither CBOR nor compressed CBOR: {}",
                    payload.ur_type,
                    folio_util::hex_preview(&payload.bytes, 16)
                );
                Err(EnvelopeError::DecodeError(error.to_string()))
            }
            None => Err(self.unsupported(payload)),
        }
    }

    /// Inflate a byte string node and decode the result, returning the node
    /// unchanged if it is not a byte string or either step fails
    pub fn try_decompress_and_redecode(&self, node: Value) -> Value {
        let Value::Bytes(bytes) = node.untagged() else {
            debug!("{} node is not compressed", node.kind());
            return node;
        };

        let inflated = match self.inflater.inflate(bytes) {
            Ok(inflated) => inflated,
            Err(error) => {
                debug!("inflate failed: {error}");
                return node;
            }
        };

        match self.decode_structure(&inflated) {
            Ok(redecoded) => redecoded,
            Err(error) => {
                debug!("inflated {} bytes are not CBOR: {error}", inflated.len());
                node
            }
        }
    }

    pub fn decode_structure(&self, bytes: &[u8]) -> Result<Value, CborError> {
        cbor::decode_structure_with_depth(bytes, self.max_depth)
    }

    fn unsupported(&self, payload: &DecodedPayload) -> EnvelopeError {
        EnvelopeError::UnsupportedPayloadShape { ur_type: payload.ur_type.clone() }
    }
}

/// Top-level array with at least two elements whose second element is an array
fn has_envelope_shape(node: &Value) -> bool {
    matches!(
        node.untagged().as_array(),
        Some([_, entries, ..]) if entries.untagged().as_array().is_some()
    )
}

fn into_envelope(node: Value) -> Result<AccountEnvelope, Value> {
    if !has_envelope_shape(&node) {
        return Err(node);
    }

    match node.into_untagged() {
        Value::Array(items) => {
            let mut items = items.into_iter();
            let header = items.next().unwrap_or(Value::Null);
            let entries = match items.next().map(Value::into_untagged) {
                Some(Value::Array(entries)) => entries,
                _ => Vec::new(),
            };

            Ok(AccountEnvelope { header, entries })
        }
        other => Err(other),
    }
}
