//! Decode arbitrary CBOR into a [`Value`] tree

use minicbor::{Decoder, data::Type};

use super::value::Value;

/// Default limit on array/map/tag nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CborError {
    #[error("empty input")]
    Empty,

    #[error("malformed CBOR at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("{0} trailing bytes after the top-level item")]
    TrailingBytes(usize),

    #[error("unsupported CBOR item at byte {0}")]
    Unsupported(usize),
}

type Result<T, E = CborError> = std::result::Result<T, E>;

/// Decode exactly one CBOR item spanning all of `bytes`
pub fn decode_structure(bytes: &[u8]) -> Result<Value> {
    decode_structure_with_depth(bytes, DEFAULT_MAX_DEPTH)
}

/// Like [`decode_structure`] with an explicit nesting limit
pub fn decode_structure_with_depth(bytes: &[u8], max_depth: usize) -> Result<Value> {
    if bytes.is_empty() {
        return Err(CborError::Empty);
    }

    let mut reader = ValueReader { decoder: Decoder::new(bytes), max_depth };
    let value = reader.read_value(0)?;

    let consumed = reader.decoder.position();
    if consumed < bytes.len() {
        return Err(CborError::TrailingBytes(bytes.len() - consumed));
    }

    Ok(value)
}

fn malformed(position: usize, error: impl std::fmt::Display) -> CborError {
    CborError::Malformed { position, message: error.to_string() }
}

struct ValueReader<'b> {
    decoder: Decoder<'b>,
    max_depth: usize,
}

impl ValueReader<'_> {
    fn read_value(&mut self, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            return Err(CborError::TooDeep(self.max_depth));
        }

        let position = self.decoder.position();
        let datatype = self.decoder.datatype().map_err(|e| malformed(position, e))?;
        let at = |e: minicbor::decode::Error| malformed(position, e);

        let value = match datatype {
            Type::Bool => Value::Bool(self.decoder.bool().map_err(at)?),
            Type::Null => {
                self.decoder.null().map_err(at)?;
                Value::Null
            }
            Type::Undefined => {
                self.decoder.undefined().map_err(at)?;
                Value::Undefined
            }

            Type::U8 | Type::U16 | Type::U32 | Type::U64 => {
                Value::Integer(self.decoder.u64().map_err(at)?.into())
            }
            Type::I8 | Type::I16 | Type::I32 | Type::I64 => {
                Value::Integer(self.decoder.i64().map_err(at)?.into())
            }
            // negative integers below i64::MIN
            Type::Int => Value::Integer(self.decoder.int().map_err(at)?.into()),

            Type::F16 => Value::Float(self.decoder.f16().map_err(at)?.into()),
            Type::F32 => Value::Float(self.decoder.f32().map_err(at)?.into()),
            Type::F64 => Value::Float(self.decoder.f64().map_err(at)?),

            Type::Simple => Value::Simple(self.decoder.simple().map_err(at)?),

            Type::Bytes | Type::BytesIndef => {
                let mut bytes = Vec::new();
                for chunk in self.decoder.bytes_iter().map_err(at)? {
                    bytes.extend_from_slice(chunk.map_err(at)?);
                }
                Value::Bytes(bytes)
            }

            Type::String | Type::StringIndef => {
                let mut text = String::new();
                for chunk in self.decoder.str_iter().map_err(at)? {
                    text.push_str(chunk.map_err(at)?);
                }
                Value::Text(text)
            }

            Type::Array | Type::ArrayIndef => {
                let len = self.decoder.array().map_err(at)?;
                let mut items = Vec::with_capacity(self.capacity_hint(len));

                match len {
                    Some(len) => {
                        for _ in 0..len {
                            items.push(self.read_value(depth + 1)?);
                        }
                    }
                    None => {
                        while !self.at_break()? {
                            items.push(self.read_value(depth + 1)?);
                        }
                    }
                }

                Value::Array(items)
            }

            Type::Map | Type::MapIndef => {
                let len = self.decoder.map().map_err(at)?;
                let mut entries = Vec::with_capacity(self.capacity_hint(len));

                match len {
                    Some(len) => {
                        for _ in 0..len {
                            let key = self.read_value(depth + 1)?;
                            let value = self.read_value(depth + 1)?;
                            entries.push((key, value));
                        }
                    }
                    None => {
                        while !self.at_break()? {
                            let key = self.read_value(depth + 1)?;
                            let value = self.read_value(depth + 1)?;
                            entries.push((key, value));
                        }
                    }
                }

                Value::Map(entries)
            }

            Type::Tag => {
                let tag = self.decoder.tag().map_err(at)?;
                let inner = self.read_value(depth + 1)?;
                Value::Tagged(tag.as_u64(), Box::new(inner))
            }

            Type::Break => return Err(malformed(position, "unexpected break")),
            _ => return Err(CborError::Unsupported(position)),
        };

        Ok(value)
    }

    /// Consumes the break byte that ends an indefinite-length container
    fn at_break(&mut self) -> Result<bool> {
        let position = self.decoder.position();
        let datatype = self.decoder.datatype().map_err(|e| malformed(position, e))?;

        if datatype != Type::Break {
            return Ok(false);
        }

        self.decoder.set_position(position + 1);
        Ok(true)
    }

    /// Declared lengths are untrusted, never reserve more slots than bytes remain
    fn capacity_hint(&self, declared: Option<u64>) -> usize {
        let remaining = self.decoder.input().len().saturating_sub(self.decoder.position());
        let declared = declared.and_then(|len| usize::try_from(len).ok()).unwrap_or(0);
        declared.min(remaining)
    }
}
