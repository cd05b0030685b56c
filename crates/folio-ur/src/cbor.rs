//! Schema-less CBOR decoding.
//!
//! Typed UR payloads are decoded field by field with `minicbor` directly; payloads
//! whose shape is only known by convention (positional arrays, optional layers)
//! are decoded into a [`Value`] tree first and inspected through its accessors.

pub mod decode;
pub mod value;

pub use decode::{CborError, DEFAULT_MAX_DEPTH, decode_structure, decode_structure_with_depth};
pub use value::Value;
