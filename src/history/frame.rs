//! Classification of log-download notification packets

/// Keep-alive sent while the device prepares the log
pub const HEARTBEAT: u8 = 0x05;
/// Log protocol command / all-sensors endpoint
pub const LOG_COMMAND: u8 = 0x3A;
const ERROR_MARKER: u8 = 0xF0;
const FILL: u8 = 0xFF;

const ERROR_MIN_LEN: usize = 11;
const END_MIN_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// Heartbeat, no payload
    Ignore,
    Data,
    /// The device aborted the download
    Error,
    /// No more records follow
    End,
}

/// Label one notification packet, first match wins
///
/// Error and end packets both end in a run of 0xFF, so they are told apart
/// by byte 2 and bytes 0-1 before anything falls through to `Data`.
pub fn classify(packet: &[u8]) -> FrameClass {
    if packet.first() == Some(&HEARTBEAT) {
        return FrameClass::Ignore;
    }
    if packet.len() >= ERROR_MIN_LEN && packet[2] == ERROR_MARKER && filled_from_3(packet) {
        return FrameClass::Error;
    }
    if packet.len() >= END_MIN_LEN
        && packet[0] == LOG_COMMAND
        && packet[1] == LOG_COMMAND
        && filled_from_3(packet)
    {
        return FrameClass::End;
    }
    FrameClass::Data
}

fn filled_from_3(packet: &[u8]) -> bool {
    packet[3..].iter().all(|&b| b == FILL)
}
