//! Uppercase hex rendering for identifiers and payloads in log lines

/// Render one byte as two uppercase hex characters
pub fn byte_to_hex(b: u8) -> String {
    hex::encode_upper([b])
}

/// Render a byte slice as uppercase hex, two characters per byte, no separators
pub fn to_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}
