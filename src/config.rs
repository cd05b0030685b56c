use serde::{Deserialize, Serialize};

/// Limits and expectations applied when decoding a scanned account export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct ImportConfig {
    /// UR type the account export must declare, anything else is rejected
    pub expected_ur_type: String,
    /// Upper bound on the declared size of a multi-part UR message, checked
    /// before any part is buffered
    pub max_message_len: u64,
    /// Upper bound on the size of an inflated envelope
    pub max_inflated_len: u64,
    /// Upper bound on array/map nesting in the decoded envelope
    pub max_nesting_depth: u32,
}

impl ImportConfig {
    pub const DEFAULT_UR_TYPE: &'static str = "bytes";
    pub const DEFAULT_MAX_MESSAGE_LEN: u64 = 1024 * 1024;
    pub const DEFAULT_MAX_INFLATED_LEN: u64 = 4 * 1024 * 1024;
    pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 64;

    pub fn new() -> Self {
        Self {
            expected_ur_type: Self::DEFAULT_UR_TYPE.to_string(),
            max_message_len: Self::DEFAULT_MAX_MESSAGE_LEN,
            max_inflated_len: Self::DEFAULT_MAX_INFLATED_LEN,
            max_nesting_depth: Self::DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

folio_macros::impl_default_for!(ImportConfig);

#[uniffi::export]
fn default_import_config() -> ImportConfig {
    ImportConfig::new()
}
