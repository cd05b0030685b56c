pub mod coerce;
pub mod normalize;

use serde::{Deserialize, Serialize};

pub use normalize::normalize;

/// A field that senders encode either as raw bytes or as text
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Enum, Serialize, Deserialize)]
pub enum BytesOrText {
    Bytes(Vec<u8>),
    Text(String),
}

/// Wallet fields of an exported account, positional in the export
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record, Serialize, Deserialize)]
pub struct WalletInfo {
    pub derivation_path: String,
    pub chain_code: BytesOrText,
    pub name: String,
    pub internal1: bool,
    pub internal2: bool,
    pub extra_bytes: BytesOrText,
    /// Extended public key, the unique key of an account
    pub xpub: String,
}

/// A watch-only account recovered from a scanned export
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: i64,
    /// Always equal to `id`
    pub index: i64,
    /// Coin type tag as exported, e.g. `btc` or `eth_testnet`
    pub coin_type: String,
    pub block: i64,
    pub wallet: WalletInfo,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Hash,
    Eq,
    PartialEq,
    uniffi::Enum,
    strum::EnumIter,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum CoinType {
    Btc,
    Eth,
    Kas,
    Sol,
    #[strum(disabled)]
    Unknown,
}

/// Display metadata for a coin
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct CoinMeta {
    pub name: String,
    pub symbol: String,
    /// Hex color, e.g. `#F7931A`
    pub color: String,
}

impl BytesOrText {
    /// Text as is, bytes as lowercase hex
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Bytes(bytes) => hex::encode(bytes),
            Self::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Text(text) => text.is_empty(),
        }
    }
}

impl AccountRecord {
    pub fn xpub(&self) -> &str {
        &self.wallet.xpub
    }

    /// The part of the coin type before any `_` suffix
    pub fn base_coin_type(&self) -> &str {
        self.coin_type.split('_').next().unwrap_or_default()
    }

    pub fn coin(&self) -> CoinType {
        CoinType::from_type_tag(&self.coin_type)
    }

    /// Ticker used when querying balances, e.g. `BTC` for `btc_segwit`
    pub fn api_symbol(&self) -> String {
        self.base_coin_type().to_uppercase()
    }

    pub fn coin_meta(&self) -> CoinMeta {
        match self.coin().known_meta() {
            Some((name, symbol, color)) => CoinMeta {
                name: name.to_string(),
                symbol: symbol.to_string(),
                color: color.to_string(),
            },
            None => CoinMeta {
                name: self.coin_type.clone(),
                symbol: self.api_symbol(),
                color: CoinType::UNKNOWN_COLOR.to_string(),
            },
        }
    }
}

impl CoinType {
    pub const UNKNOWN_COLOR: &'static str = "#8b5cf6";

    /// Parse a coin type tag, ignoring any `_` suffix and case
    pub fn from_type_tag(tag: &str) -> Self {
        let base = tag.split('_').next().unwrap_or_default();
        base.parse().unwrap_or(Self::Unknown)
    }

    /// (name, symbol, color)
    fn known_meta(self) -> Option<(&'static str, &'static str, &'static str)> {
        let meta = match self {
            Self::Btc => ("Bitcoin", "BTC", "#F7931A"),
            Self::Eth => ("Ethereum", "ETH", "#627EEA"),
            Self::Kas => ("Kaspa", "KAS", "#70C7BA"),
            Self::Sol => ("Solana", "SOL", "#9945FF"),
            Self::Unknown => return None,
        };

        Some(meta)
    }
}

mod ffi {
    use super::*;
    use strum::IntoEnumIterator as _;

    #[uniffi::export]
    pub fn account_coin_meta(account: AccountRecord) -> CoinMeta {
        account.coin_meta()
    }

    #[uniffi::export]
    pub fn account_api_symbol(account: AccountRecord) -> String {
        account.api_symbol()
    }

    #[uniffi::export]
    pub fn supported_coin_types() -> Vec<CoinType> {
        CoinType::iter().filter(|coin| *coin != CoinType::Unknown).collect()
    }

    #[uniffi::export]
    pub fn bytes_or_text_to_string(value: BytesOrText) -> String {
        value.to_display_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn account(coin_type: &str) -> AccountRecord {
        AccountRecord {
            id: 1,
            index: 1,
            coin_type: coin_type.to_string(),
            block: 0,
            wallet: WalletInfo {
                derivation_path: "m/44'/0'/0'".to_string(),
                chain_code: BytesOrText::Bytes(vec![0xab, 0xcd]),
                name: String::new(),
                internal1: false,
                internal2: false,
                extra_bytes: BytesOrText::Text(String::new()),
                xpub: "xpub-1".to_string(),
            },
        }
    }

    #[test]
    fn test_coin_type_ignores_suffix_and_case() {
        assert_eq!(CoinType::from_type_tag("btc"), CoinType::Btc);
        assert_eq!(CoinType::from_type_tag("BTC_segwit"), CoinType::Btc);
        assert_eq!(CoinType::from_type_tag("Sol_testnet"), CoinType::Sol);
        assert_eq!(CoinType::from_type_tag("doge"), CoinType::Unknown);
        assert_eq!(CoinType::from_type_tag("unknown"), CoinType::Unknown);
        assert_eq!(CoinType::from_type_tag(""), CoinType::Unknown);
    }

    #[test]
    fn test_known_coin_meta() {
        assert_eq!(
            account("eth").coin_meta(),
            CoinMeta {
                name: "Ethereum".to_string(),
                symbol: "ETH".to_string(),
                color: "#627EEA".to_string(),
            }
        );
        assert_eq!(account("kas_main").coin_meta().name, "Kaspa");
    }

    #[test]
    fn test_unknown_coin_meta_falls_back_to_type_tag() {
        assert_eq!(
            account("doge_legacy").coin_meta(),
            CoinMeta {
                name: "doge_legacy".to_string(),
                symbol: "DOGE".to_string(),
                color: "#8b5cf6".to_string(),
            }
        );
    }

    #[test]
    fn test_api_symbol() {
        assert_eq!(account("btc_segwit").api_symbol(), "BTC");
        assert_eq!(account("sol").api_symbol(), "SOL");
        assert_eq!(account("btc").base_coin_type(), "btc");
    }

    #[test]
    fn test_bytes_or_text_display() {
        assert_eq!(BytesOrText::Bytes(vec![0xde, 0xad]).to_display_string(), "dead");
        assert_eq!(BytesOrText::Text("cc==".into()).to_display_string(), "cc==");
        assert!(BytesOrText::Bytes(vec![]).is_empty());
    }

    #[test]
    fn test_account_record_serializes() {
        let json = serde_json::to_value(account("btc")).unwrap();
        assert_eq!(json["wallet"]["xpub"], "xpub-1");
        assert_eq!(json["wallet"]["chain_code"]["Bytes"], serde_json::json!([0xab, 0xcd]));
    }
}
