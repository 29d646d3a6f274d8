/// Multi-record history packets of air-quality devices
///
/// A packet starts with a 5-byte header:
/// - Byte 0: Destination
/// - Byte 1: Source
/// - Byte 2: Operation (0x20 multi-record write)
/// - Byte 3: Record count, 0 marks the end of the log
/// - Byte 4: Record length (38)
///
/// followed by `count` records of 38 bytes: a big-endian timestamp (bytes
/// 0-3) and bytes 0-33 of an E1 advertisement (bytes 4-37).
use log::debug;

use crate::decoders::dfe1;
use crate::models::HistoryRecord;
use crate::utils::be_u32;

pub const HEADER_LEN: usize = 5;
pub const RECORD_LEN: usize = 38;
pub const MULTI_RECORD_WRITE: u8 = 0x20;

const TIMESTAMP_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchHeader {
    pub destination: u8,
    pub source: u8,
    pub operation: u8,
    pub count: u8,
    pub record_len: u8,
}

impl BatchHeader {
    pub fn parse(packet: &[u8]) -> Option<Self> {
        let header = packet.get(..HEADER_LEN)?;
        Some(Self {
            destination: header[0],
            source: header[1],
            operation: header[2],
            count: header[3],
            record_len: header[4],
        })
    }

    pub fn is_end(&self) -> bool {
        self.count == 0
    }

    fn is_supported(&self) -> bool {
        self.operation == MULTI_RECORD_WRITE && usize::from(self.record_len) == RECORD_LEN
    }
}

/// Decode every complete, valid record of one packet
///
/// Records that run past the packet end or fail validation are skipped;
/// the rest of the packet is still decoded. The end marker yields nothing.
pub fn decode(packet: &[u8]) -> Vec<HistoryRecord> {
    let header = match BatchHeader::parse(packet) {
        Some(header) => header,
        None => {
            debug!("History packet shorter than its header: {} bytes", packet.len());
            return Vec::new();
        }
    };
    if header.is_end() {
        return Vec::new();
    }
    if !header.is_supported() {
        debug!(
            "Unsupported history batch: operation=0x{:02X}, record length={}",
            header.operation, header.record_len
        );
        return Vec::new();
    }

    let body = &packet[HEADER_LEN..];
    (0..usize::from(header.count))
        .filter_map(|i| {
            let start = i * RECORD_LEN;
            let record = match body.get(start..start + RECORD_LEN) {
                Some(record) => record,
                None => {
                    debug!("History record {} is truncated", i);
                    return None;
                }
            };
            let decoded = decode_record(record);
            if decoded.is_none() {
                debug!("History record {} is not an E1 record", i);
            }
            decoded
        })
        .collect()
}

/// Decode one 38-byte record
pub fn decode_record(record: &[u8]) -> Option<HistoryRecord> {
    if record.len() < RECORD_LEN {
        return None;
    }
    let timestamp = be_u32(record, 0);
    let fields = dfe1::decode_fields(&record[TIMESTAMP_LEN..RECORD_LEN])?;
    Some(fields.into_record(timestamp))
}
