use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq, uniffi::Error)]
#[uniffi::export(Display)]
pub enum UrError {
    #[error("Failed to parse UR: {0}")]
    UrParseError(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Malformed UR envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Failed to decode CBOR: {0}")]
    CborDecodeError(String),
}

pub type Result<T> = std::result::Result<T, UrError>;

/// Helper trait to convert any error to UrError
pub trait ToUrError<T> {
    fn map_err_ur_parse(self) -> Result<T>;
    fn map_err_malformed(self) -> Result<T>;
}

impl<T, E: std::fmt::Display> ToUrError<T> for std::result::Result<T, E> {
    fn map_err_ur_parse(self) -> Result<T> {
        self.map_err(|e| UrError::UrParseError(e.to_string()))
    }

    fn map_err_malformed(self) -> Result<T> {
        self.map_err(|e| UrError::MalformedEnvelope(e.to_string()))
    }
}
