//! UR type tags as declared in the `ur:<type>/...` prefix

use std::fmt;

/// The UR type carried in the scheme, e.g. `bytes` for generic binary payloads
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum UrType {
    /// bytes - Raw CBOR byte string
    Bytes,
    /// crypto-account - BCR-2020-015 account descriptor
    CryptoAccount,
    /// crypto-hdkey - HD key (xpub/xprv)
    CryptoHdkey,
    /// crypto-output - Output descriptor
    CryptoOutput,
    /// crypto-psbt - Partially Signed Bitcoin Transaction
    CryptoPsbt,
    /// Unknown type with raw string
    Unknown(String),
}

impl UrType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bytes => "bytes",
            Self::CryptoAccount => "crypto-account",
            Self::CryptoHdkey => "crypto-hdkey",
            Self::CryptoOutput => "crypto-output",
            Self::CryptoPsbt => "crypto-psbt",
            Self::Unknown(other) => other,
        }
    }
}

impl From<&str> for UrType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "bytes" => Self::Bytes,
            "crypto-account" => Self::CryptoAccount,
            "crypto-hdkey" => Self::CryptoHdkey,
            "crypto-output" => Self::CryptoOutput,
            "crypto-psbt" => Self::CryptoPsbt,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for UrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
