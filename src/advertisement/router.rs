/// Picks the data format decoder for an advertisement element
use log::debug;

use super::chunk::RawChunk;
use crate::models::DataFormat;

/// Manufacturer specific data (FF) / Ruuvi Innovations Ltd. (0x0499, little-endian)
const RUUVI_PREFIX: [u8; 3] = [0xFF, 0x99, 0x04];
/// Service data (16) / Eddystone (0xFEAA, little-endian)
const EDDYSTONE_PREFIX: [u8; 3] = [0x16, 0xAA, 0xFE];
/// Complete local name (09) "Ruuvi "
const RUUVI_NAME_PREFIX: &[u8] = b"\x09Ruuvi ";

const URL_MARKER: &[u8] = b"ruu.vi/#";
const SHORT_URL_MARKER: &[u8] = b"r/";
/// Base64 characters holding the measurement in formats 2 and 4
const URL_PAYLOAD_LEN: usize = 8;

/// Bytes that should go to one data format decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub format: DataFormat,
    /// For manufacturer formats this starts at the format byte, for URL
    /// formats it is the encoded text after the URL prefix.
    pub data: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Measurement(Candidate<'a>),
    /// The beacon is a Ruuvi device but this packet carries no measurement
    Discovery,
}

/// Route an element to its decoder
///
/// Returns `None` for anything that is not a known Ruuvi layout.
pub fn route(chunk: RawChunk<'_>) -> Option<Route<'_>> {
    let bytes = chunk.as_bytes();

    if let Some(rest) = bytes.strip_prefix(&RUUVI_PREFIX[..]) {
        let format = match rest.first().copied()? {
            0x03 => DataFormat::V3,
            0x05 => DataFormat::V5,
            0x06 => DataFormat::V6,
            0xE1 => DataFormat::E1,
            other => {
                debug!("Unsupported Ruuvi data format 0x{:02X}", other);
                return None;
            }
        };
        return Some(Route::Measurement(Candidate { format, data: rest }));
    }

    if let Some(rest) = bytes.strip_prefix(&EDDYSTONE_PREFIX[..]) {
        let encoded =
            find_after(rest, URL_MARKER).or_else(|| find_after(rest, SHORT_URL_MARKER))?;
        let format = if encoded.len() > URL_PAYLOAD_LEN {
            DataFormat::V4
        } else {
            DataFormat::V2
        };
        return Some(Route::Measurement(Candidate {
            format,
            data: encoded,
        }));
    }

    if bytes.starts_with(RUUVI_NAME_PREFIX) {
        return Some(Route::Discovery);
    }

    None
}

fn find_after<'a>(haystack: &'a [u8], marker: &[u8]) -> Option<&'a [u8]> {
    haystack
        .windows(marker.len())
        .position(|w| w == marker)
        .map(|i| &haystack[i + marker.len()..])
}
