//! Account export payloads built the way a hardware wallet emits them

use std::io::Write as _;

use flate2::{
    Compression,
    write::{DeflateEncoder, GzEncoder, ZlibEncoder},
};
use foundation_ur::UR;
use minicbor::Encoder;

pub const CHAIN_CODE: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

/// One row of the account table
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub id: u32,
    pub coin_type: &'static str,
    pub block: u64,
    pub xpub: &'static str,
}

impl Entry {
    pub const fn new(id: u32, coin_type: &'static str, block: u64, xpub: &'static str) -> Self {
        Self { id, coin_type, block, xpub }
    }
}

/// `[0xFF, [[0, id, type, block, [path, chain_code, name, false, true, extra, xpub]], ...]]`
pub fn account_table(entries: &[Entry]) -> Vec<u8> {
    let mut cbor = Vec::new();
    let mut encoder = Encoder::new(&mut cbor);

    encoder.array(2).unwrap();
    encoder.u8(0xFF).unwrap();
    encoder.array(entries.len() as u64).unwrap();

    for entry in entries {
        encoder.array(5).unwrap();
        encoder.u8(0).unwrap().u32(entry.id).unwrap().str(entry.coin_type).unwrap();
        encoder.u64(entry.block).unwrap();

        encoder.array(7).unwrap();
        encoder.str("m/44'/0'/0'").unwrap().bytes(&CHAIN_CODE).unwrap().str("Main").unwrap();
        encoder.bool(false).unwrap().bool(true).unwrap().bytes(&[]).unwrap();
        encoder.str(entry.xpub).unwrap();
    }

    cbor
}

/// The single entry table `[0xFF, [[0, 101, "btc", 500, ["m/44'/0'/0'", "cc==", "", false, false, "", "xpub6abc..."]]]]`
pub fn single_btc_table() -> Vec<u8> {
    let mut cbor = Vec::new();
    let mut encoder = Encoder::new(&mut cbor);

    encoder.array(2).unwrap();
    encoder.u8(0xFF).unwrap();
    encoder.array(1).unwrap();
    encoder.array(5).unwrap();
    encoder.u8(0).unwrap().u32(101).unwrap().str("btc").unwrap().u32(500).unwrap();
    encoder.array(7).unwrap();
    encoder.str("m/44'/0'/0'").unwrap().str("cc==").unwrap().str("").unwrap();
    encoder.bool(false).unwrap().bool(false).unwrap().str("").unwrap();
    encoder.str("xpub6abc...").unwrap();

    cbor
}

/// Wrap `bytes` in a CBOR byte string, the `ur:bytes` message format
pub fn byte_string(bytes: &[u8]) -> Vec<u8> {
    let mut cbor = Vec::new();
    Encoder::new(&mut cbor).bytes(bytes).unwrap();
    cbor
}

/// Single-part `ur:bytes` string carrying `table`
pub fn ur_bytes(table: &[u8]) -> String {
    UR::new("bytes", &byte_string(table)).to_string()
}

pub fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn raw_deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn five_entries() -> [Entry; 5] {
    [
        Entry::new(1, "btc", 800_000, "xpub-btc"),
        Entry::new(2, "eth", 19_000_000, "xpub-eth"),
        Entry::new(3, "kas", 0, "xpub-kas"),
        Entry::new(4, "sol_testnet", 1, "xpub-sol"),
        Entry::new(5, "doge", 42, "xpub-doge"),
    ]
}
