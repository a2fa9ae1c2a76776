//! Transport-safe encoding for binary payloads.
//!
//! Export files are binary (often zip/tar archives) and must be turned into
//! text before they are returned through the tool protocol.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode raw bytes as standard base64 (with padding).
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a standard base64 string back into bytes.
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded.trim())
}

/// Length of the base64 text that `encode_payload` produces for `len` input bytes.
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}
