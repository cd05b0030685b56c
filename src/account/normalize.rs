//! Positional account entries to [`AccountRecord`]s.
//!
//! Entry layout: `[reserved, id, type, block, wallet]` with wallet
//! `[derivation_path, chain_code, name, internal1, internal2, extra_bytes, xpub]`.
//! Only minimum lengths are checked, extra trailing elements are ignored.

use folio_ur::Value;
use tracing::{debug, warn};

use super::{
    AccountRecord, WalletInfo,
    coerce::{coerce_bool, coerce_bytes_or_text, coerce_number, coerce_string, native_integer},
};

/// Why an entry was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SkipReason {
    #[display("entry is not an array")]
    NotAnArray,
    #[display("entry has {_0} elements, need at least 5")]
    EntryTooShort(usize),
    #[display("account id is not a number")]
    NonNumericId,
    #[display("wallet is not an array")]
    WalletNotAnArray,
    #[display("wallet has {_0} elements, need at least 7")]
    WalletTooShort(usize),
}

/// Normalize every well-formed entry, in input order, skipping the rest
pub fn normalize(entries: &[Value]) -> Vec<AccountRecord> {
    let records = entries
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| match normalize_entry(entry) {
            Ok(record) => Some(record),
            Err(reason) => {
                warn!("skipping account entry {position}: {reason}");
                None
            }
        })
        .collect::<Vec<_>>();

    debug!("normalized {} of {} account entries", records.len(), entries.len());
    records
}

/// Normalize a single entry
pub fn normalize_entry(entry: &Value) -> Result<AccountRecord, SkipReason> {
    let fields = entry.untagged().as_array().ok_or(SkipReason::NotAnArray)?;

    // fields[0] is reserved
    let [_, id, coin_type, block, wallet, ..] = fields else {
        return Err(SkipReason::EntryTooShort(fields.len()));
    };

    let id = native_integer(id).ok_or(SkipReason::NonNumericId)?;

    let wallet = wallet.untagged().as_array().ok_or(SkipReason::WalletNotAnArray)?;
    let [derivation_path, chain_code, name, internal1, internal2, extra_bytes, xpub, ..] = wallet
    else {
        return Err(SkipReason::WalletTooShort(wallet.len()));
    };

    let wallet = WalletInfo {
        derivation_path: coerce_string(derivation_path),
        chain_code: coerce_bytes_or_text(chain_code),
        name: coerce_string(name),
        internal1: coerce_bool(internal1),
        internal2: coerce_bool(internal2),
        extra_bytes: coerce_bytes_or_text(extra_bytes),
        xpub: coerce_string(xpub),
    };

    Ok(AccountRecord {
        id,
        index: id,
        coin_type: coerce_string(coin_type),
        block: coerce_number(block, 0),
        wallet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        account::BytesOrText,
        test_fixtures::{self, Entry},
    };
    use folio_ur::cbor::decode_structure;
    use pretty_assertions::assert_eq;

    fn entries_of(table: &[u8]) -> Vec<Value> {
        match decode_structure(table).unwrap() {
            Value::Array(mut items) => match items.remove(1) {
                Value::Array(entries) => entries,
                other => panic!("entries should be an array, got {other:?}"),
            },
            other => panic!("table should be an array, got {other:?}"),
        }
    }

    fn wallet_fields(len: usize) -> Value {
        let fields = [
            Value::from("m/84'/0'/0'"),
            Value::Bytes(vec![0xcc]),
            Value::from("Savings"),
            Value::from("yes"),
            Value::from(0_i64),
            Value::Null,
            Value::from("xpub-wallet"),
        ];

        Value::Array(fields.into_iter().cycle().take(len).collect())
    }

    fn entry(id: Value, wallet: Value) -> Value {
        Value::Array(vec![Value::from(0_i64), id, Value::from("btc"), Value::from("900"), wallet])
    }

    #[test]
    fn test_single_btc_entry() {
        let entries = entries_of(&test_fixtures::single_btc_table());
        let records = normalize(&entries);

        assert_eq!(
            records,
            vec![AccountRecord {
                id: 101,
                index: 101,
                coin_type: "btc".to_string(),
                block: 500,
                wallet: WalletInfo {
                    derivation_path: "m/44'/0'/0'".to_string(),
                    chain_code: BytesOrText::Text("cc==".to_string()),
                    name: String::new(),
                    internal1: false,
                    internal2: false,
                    extra_bytes: BytesOrText::Text(String::new()),
                    xpub: "xpub6abc...".to_string(),
                },
            }]
        );
    }

    #[test]
    fn test_one_malformed_entry_of_five() {
        let mut entries = entries_of(&test_fixtures::account_table(&test_fixtures::five_entries()));

        // truncate the third entry's wallet to 4 fields
        let Value::Array(fields) = &mut entries[2] else { panic!("entry should be an array") };
        let Value::Array(wallet) = &mut fields[4] else { panic!("wallet should be an array") };
        wallet.truncate(4);

        let records = normalize(&entries);
        let ids = records.iter().map(|record| record.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_records_keep_input_order() {
        let table = test_fixtures::account_table(&[
            Entry::new(9, "sol", 3, "xpub-c"),
            Entry::new(1, "btc", 2, "xpub-a"),
            Entry::new(5, "eth", 1, "xpub-b"),
        ]);

        let xpubs = normalize(&entries_of(&table))
            .into_iter()
            .map(|record| record.wallet.xpub)
            .collect::<Vec<_>>();

        assert_eq!(xpubs, vec!["xpub-c", "xpub-a", "xpub-b"]);
    }

    #[test]
    fn test_fixture_fields_are_mapped() {
        let table = test_fixtures::account_table(&[Entry::new(4, "sol_testnet", 1, "xpub-sol")]);
        let record = normalize(&entries_of(&table)).remove(0);

        assert_eq!(record.index, 4);
        assert_eq!(record.coin_type, "sol_testnet");
        assert_eq!(record.wallet.chain_code, BytesOrText::Bytes(test_fixtures::CHAIN_CODE.to_vec()));
        assert_eq!(record.wallet.name, "Main");
        assert!(!record.wallet.internal1);
        assert!(record.wallet.internal2);
        assert_eq!(record.wallet.extra_bytes, BytesOrText::Bytes(vec![]));
    }

    #[test]
    fn test_lenient_field_coercion() {
        let record = normalize_entry(&entry(Value::from(3_i64), wallet_fields(7))).unwrap();

        assert_eq!(record.block, 900);
        assert!(record.wallet.internal1);
        assert!(!record.wallet.internal2);
        assert_eq!(record.wallet.extra_bytes, BytesOrText::Text(String::new()));
        assert_eq!(record.wallet.xpub, "xpub-wallet");
    }

    #[test]
    fn test_long_entries_are_accepted() {
        let mut long = entry(Value::from(3_i64), wallet_fields(10));
        if let Value::Array(fields) = &mut long {
            fields.push(Value::from("trailing"));
        }

        assert!(normalize_entry(&long).is_ok());
    }

    #[test]
    fn test_skip_reasons() {
        let cases = [
            (Value::from("nope"), SkipReason::NotAnArray),
            (Value::Array(vec![Value::Null; 4]), SkipReason::EntryTooShort(4)),
            (entry(Value::from("101"), wallet_fields(7)), SkipReason::NonNumericId),
            (entry(Value::Null, wallet_fields(7)), SkipReason::NonNumericId),
            (entry(Value::from(1_i64), Value::from("wallet")), SkipReason::WalletNotAnArray),
            (entry(Value::from(1_i64), wallet_fields(6)), SkipReason::WalletTooShort(6)),
        ];

        for (value, reason) in cases {
            assert_eq!(normalize_entry(&value), Err(reason), "{value:?}");
        }
    }

    #[test]
    fn test_empty_and_all_invalid_batches() {
        assert!(normalize(&[]).is_empty());
        assert!(normalize(&[Value::Null, Value::from(1_i64)]).is_empty());
    }
}
