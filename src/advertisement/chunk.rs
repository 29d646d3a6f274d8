/// Length-prefixed element walking over raw advertisement payloads
use log::debug;

use crate::error::DecodeError;

/// Manufacturer specific data
pub const MANUFACTURER_DATA: u8 = 0xFF;
/// Service data with a 16-bit UUID
pub const SERVICE_DATA: u8 = 0x16;
/// Complete local name
pub const COMPLETE_LOCAL_NAME: u8 = 0x09;

/// One advertisement element with its length prefix removed
///
/// The first byte is the element type, the rest is its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    bytes: &'a [u8],
}

impl<'a> RawChunk<'a> {
    /// Wrap bytes that already start with the element type, e.g. an element
    /// rebuilt from data the Bluetooth stack parsed for us.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn kind(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// Type byte followed by data
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn data(&self) -> &'a [u8] {
        self.bytes.get(1..).unwrap_or_default()
    }

    fn is_candidate(&self) -> bool {
        matches!(
            self.kind(),
            Some(MANUFACTURER_DATA | SERVICE_DATA | COMPLETE_LOCAL_NAME)
        )
    }
}

/// Find the first manufacturer data, service data or name element
///
/// Returns `Ok(None)` when the payload is walked to the end without a
/// candidate, and `ShortData` when an element claims more bytes than the
/// payload holds, which means a beacon was heard but the capture is cut.
/// A single byte left after the last element is the receiver's signal
/// strength, not a length prefix.
pub fn extract_chunk(payload: &[u8]) -> Result<Option<RawChunk<'_>>, DecodeError> {
    let mut rest = payload;

    while let Some((&len, tail)) = rest.split_first() {
        if tail.is_empty() {
            debug!("Ignoring trailing byte 0x{:02X}", len);
            break;
        }
        let len = usize::from(len);
        if len > tail.len() {
            debug!(
                "Advertisement element declares {} bytes, {} remain",
                len,
                tail.len()
            );
            return Err(DecodeError::ShortData {
                declared: len,
                available: tail.len(),
            });
        }

        let (element, next) = tail.split_at(len);
        let chunk = RawChunk::new(element);
        if chunk.is_candidate() {
            return Ok(Some(chunk));
        }
        rest = next;
    }

    Ok(None)
}
