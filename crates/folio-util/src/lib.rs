pub mod result_ext;

/// Hex preview of the first `max_len` bytes, for log lines about binary payloads
pub fn hex_preview(bytes: &[u8], max_len: usize) -> String {
    if bytes.len() <= max_len {
        return hex::encode(bytes);
    }

    format!("{}..({} bytes)", hex::encode(&bytes[..max_len]), bytes.len())
}
