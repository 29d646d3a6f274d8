/// Caller-side bookkeeping for one log download
use log::{debug, warn};

use super::air::{self, BatchHeader};
use super::frame::{classify, FrameClass, LOG_COMMAND};
use super::legacy;
use crate::models::HistoryRecord;

/// Log read operation
pub const LOG_READ: u8 = 0x11;
/// Air-quality devices answer as endpoint 0x3B
pub const AIR_QUALITY_ENDPOINT: u8 = 0x3B;

/// Which record layout a device sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryProtocol {
    /// One measurement per 11-byte packet
    Legacy,
    /// Batches of 38-byte E1 records
    AirQuality,
}

impl HistoryProtocol {
    pub fn endpoint(self) -> u8 {
        match self {
            HistoryProtocol::Legacy => LOG_COMMAND,
            HistoryProtocol::AirQuality => AIR_QUALITY_ENDPOINT,
        }
    }
}

/// Request that starts a log download
///
/// Written to the device as `[endpoint, endpoint, 0x11, now, start]` with
/// both times as big-endian seconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogReadRequest {
    pub endpoint: u8,
    pub now: u32,
    pub start: u32,
}

impl LogReadRequest {
    pub fn new(protocol: HistoryProtocol, now: u32, start: u32) -> Self {
        Self {
            endpoint: protocol.endpoint(),
            now,
            start,
        }
    }

    pub fn to_bytes(&self) -> [u8; 11] {
        let mut bytes = [0u8; 11];
        bytes[0] = self.endpoint;
        bytes[1] = self.endpoint;
        bytes[2] = LOG_READ;
        bytes[3..7].copy_from_slice(&self.now.to_be_bytes());
        bytes[7..11].copy_from_slice(&self.start.to_be_bytes());
        bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Finished,
    /// The device reported an error, the download should be abandoned
    Failed,
}

/// Collects records from the notification packets of one download
///
/// The caller feeds packets in arrival order and stops once `push` returns
/// anything but `Continue`. Packets pushed after that are ignored.
#[derive(Debug)]
pub struct LogDownload {
    protocol: HistoryProtocol,
    records: Vec<HistoryRecord>,
    rejected: usize,
    progress: Progress,
}

impl LogDownload {
    pub fn new(protocol: HistoryProtocol) -> Self {
        Self {
            protocol,
            records: Vec::new(),
            rejected: 0,
            progress: Progress::Continue,
        }
    }

    pub fn push(&mut self, packet: &[u8]) -> Progress {
        if self.progress != Progress::Continue {
            return self.progress;
        }

        match classify(packet) {
            FrameClass::Ignore => {}
            FrameClass::Error => {
                warn!(
                    "Device aborted log download after {} records",
                    self.records.len()
                );
                self.progress = Progress::Failed;
            }
            FrameClass::End => self.finish(),
            FrameClass::Data => self.push_data(packet),
        }

        self.progress
    }

    fn push_data(&mut self, packet: &[u8]) {
        match self.protocol {
            HistoryProtocol::Legacy => match legacy::decode(packet) {
                Some(record) => self.records.push(record),
                None => self.rejected += 1,
            },
            HistoryProtocol::AirQuality => match BatchHeader::parse(packet) {
                Some(header) if header.is_end() => self.finish(),
                Some(header) => {
                    let records = air::decode(packet);
                    self.rejected += usize::from(header.count).saturating_sub(records.len());
                    self.records.extend(records);
                }
                None => self.rejected += 1,
            },
        }
    }

    fn finish(&mut self) {
        debug!(
            "Log download finished: {} records, {} rejected",
            self.records.len(),
            self.rejected
        );
        self.progress = Progress::Finished;
    }

    pub fn protocol(&self) -> HistoryProtocol {
        self.protocol
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Data packets or records that could not be decoded
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn into_records(self) -> Vec<HistoryRecord> {
        self.records
    }
}
