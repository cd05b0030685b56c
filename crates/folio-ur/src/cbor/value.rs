//! Generic CBOR value tree for payloads without a fixed schema.
//!
//! Accessors are total: a type mismatch yields `None` rather than an error, so
//! callers can walk loosely-shaped positional arrays without panicking.

/// A decoded CBOR data item
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Major types 0 and 1, wide enough for the full CBOR integer range
    Integer(i128),
    Float(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Entries in wire order, keys are not deduplicated
    Map(Vec<(Value, Value)>),
    Tagged(u64, Box<Value>),
    /// Unassigned simple values (other than false/true/null/undefined)
    Simple(u8),
    Null,
    Undefined,
}

impl Value {
    /// Integer value if it fits in an `i64`
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(int) => i64::try_from(*int).ok(),
            _ => None,
        }
    }

    /// Any numeric value as a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Integer(int) => Some(*int as f64),
            Self::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Element `index` of an array, `None` for non-arrays or out of range
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// `null` and `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// The item inside any number of semantic tags
    pub fn untagged(&self) -> &Value {
        let mut value = self;
        while let Self::Tagged(_, inner) = value {
            value = inner;
        }

        value
    }

    /// Owned variant of [`Value::untagged`]
    pub fn into_untagged(self) -> Value {
        let mut value = self;
        loop {
            match value {
                Self::Tagged(_, inner) => value = *inner,
                other => return other,
            }
        }
    }

    /// Short type name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Tagged(_, _) => "tagged",
            Self::Simple(_) => "simple",
            Self::Null => "null",
            Self::Undefined => "undefined",
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Self::Integer(int.into())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_return_none_on_mismatch() {
        let text = Value::from("btc");
        assert_eq!(text.as_text(), Some("btc"));
        assert_eq!(text.as_integer(), None);
        assert_eq!(text.as_array(), None);
        assert_eq!(text.get(0), None);

        let int = Value::from(101_i64);
        assert_eq!(int.as_integer(), Some(101));
        assert_eq!(int.as_float(), Some(101.0));
        assert_eq!(int.as_bool(), None);
        assert!(int.is_number());
    }

    #[test]
    fn test_integer_outside_i64_is_absent() {
        let huge = Value::Integer(i128::from(u64::MAX));
        assert_eq!(huge.as_integer(), None);
        assert_eq!(huge.as_float(), Some(u64::MAX as f64));
    }

    #[test]
    fn test_get_indexes_arrays_only() {
        let array = Value::from(vec![Value::Null, Value::from(7_i64)]);
        assert_eq!(array.get(1), Some(&Value::from(7_i64)));
        assert_eq!(array.get(2), None);
        assert!(array.get(0).unwrap().is_nullish());

        let map = Value::Map(vec![(Value::from(0_i64), Value::from(7_i64))]);
        assert_eq!(map.get(0), None);
        assert_eq!(map.as_map().map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_untagged_strips_nested_tags() {
        let tagged = Value::Tagged(24, Box::new(Value::Tagged(1, Box::new(Value::from("x")))));
        assert_eq!(tagged.untagged(), &Value::from("x"));
        assert_eq!(tagged.kind(), "tagged");
        assert_eq!(tagged.into_untagged(), Value::from("x"));
    }
}
