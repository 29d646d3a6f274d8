/// Single-measurement history records of RuuviTag log downloads
///
/// Every record is one 11-byte packet:
/// - Byte 0: Log command (0x3A)
/// - Byte 1: Measurement (0x30 temperature, 0x31 humidity, 0x32 pressure)
/// - Byte 2: Operation
/// - Bytes 3-6: Timestamp (unsigned 32-bit, seconds since epoch)
/// - Bytes 7-8: Reserved
/// - Bytes 9-10: Value (0.01°C, 0.01% or hPa)
use log::debug;

use super::frame::LOG_COMMAND;
use crate::error::DecodeError;
use crate::models::HistoryRecord;
use crate::utils::{be_i16, be_u16, be_u32, round_to};

pub const RECORD_LEN: usize = 11;

const TEMPERATURE: u8 = 0x30;
const HUMIDITY: u8 = 0x31;
const PRESSURE: u8 = 0x32;

/// Decode a record, `None` for anything that is not a legacy record
///
/// Air-quality data is routinely offered to this decoder and rejected here.
pub fn decode(packet: &[u8]) -> Option<HistoryRecord> {
    match try_decode(packet) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!("Skipping history packet: {}", e);
            None
        }
    }
}

pub fn try_decode(packet: &[u8]) -> Result<HistoryRecord, DecodeError> {
    if packet.len() != RECORD_LEN {
        return Err(DecodeError::MalformedRecord("record is not 11 bytes"));
    }
    if packet[0] != LOG_COMMAND {
        return Err(DecodeError::MalformedRecord("missing log command byte"));
    }

    let mut record = HistoryRecord {
        timestamp: be_u32(packet, 3),
        ..Default::default()
    };
    match packet[1] {
        TEMPERATURE => record.temperature = Some(round_to(f64::from(be_i16(packet, 9)) * 0.01, 2)),
        HUMIDITY => record.humidity = Some(round_to(f64::from(be_u16(packet, 9)) * 0.01, 2)),
        PRESSURE => record.pressure = Some(f64::from(be_u16(packet, 9))),
        _ => return Err(DecodeError::MalformedRecord("unknown measurement")),
    }

    Ok(record)
}
