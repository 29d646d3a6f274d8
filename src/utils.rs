/// Utility functions for byte reading, rounding and formatting
use time::macros::format_description;
use time::OffsetDateTime;

/// Round to a fixed number of decimal places
///
/// Decoded values are rounded the way downstream consumers expect them,
/// e.g. 2 decimals for temperature so that `4860 / 200` reads `24.3`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn be_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

pub fn be_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

pub fn be_u24(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([0, data[offset], data[offset + 1], data[offset + 2]])
}

pub fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Join a 9-bit air-quality index from its high byte and one flag bit
pub fn nine_bit(high: u8, flags: u8, lsb_bit: u8) -> u16 {
    (u16::from(high) << 1) | u16::from((flags >> lsb_bit) & 1)
}

/// Render MAC bytes as colon separated upper-case hex
pub fn colon_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Normalize a MAC rendering to upper-case colon form
///
/// Accepts `cbb8334c884f`, `CB:B8:33:4C:88:4F` or `cb-b8-...`. Returns
/// `None` when the text is not an even run of hex digits.
pub fn normalize_mac(mac: &str) -> Option<String> {
    let digits: String = mac.chars().filter(|c| !matches!(c, ':' | '-')).collect();
    let bytes = hex::decode(digits).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(colon_mac(&bytes))
}

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format.
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(format).unwrap_or_else(|_| dt.to_string())
}
