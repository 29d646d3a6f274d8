//! Decode RuuviTag Bluetooth LE advertisements and history log downloads.
//!
//! Two entry points cover the two byte streams a receiver sees:
//!
//! - Advertisement payloads go through [`decode_advertisement`]: the first
//!   manufacturer, service data or name element is located, routed by its
//!   prefix and decoded with the matching data format (2, 3, 4, 5, 6, E1).
//! - Notification packets of a log download go through
//!   [`history::classify`] and the record decoders, or through a
//!   [`LogDownload`] which does the bookkeeping for one session.
//!
//! Everything here is a pure function over a byte slice. Missing values are
//! reported as `None`, never as errors.
//!
//! ```
//! use rust_ruuvitag_decoder::{decode_hex_advertisement, Advertisement, SensorReading};
//!
//! let reading = decode_hex_advertisement(
//!     "0201061BFF99040512FC5394C37C0004FFFC040CAC364200CDCBB8334C884F",
//!     Some(0xC6),
//! )
//! .unwrap();
//! match reading {
//!     Advertisement::Measurement(SensorReading::Df5(data)) => {
//!         assert_eq!(data.temperature, Some(24.3));
//!         assert_eq!(data.rssi, Some(-58));
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod advertisement;
pub mod decoders;
pub mod error;
pub mod history;
pub mod models;
pub mod utils;

use log::debug;

pub use advertisement::{extract_chunk, route, Candidate, RawChunk, Route};
pub use error::DecodeError;
pub use history::{classify, FrameClass, HistoryProtocol, LogDownload, LogReadRequest, Progress};
pub use models::{
    Advertisement, DataFormat, Df3Data, Df5Data, Df6Data, E1Data, HistoryRecord, SensorReading,
    UrlData,
};
pub use utils::normalize_mac;

/// Decode one raw advertisement payload
///
/// `rssi` is the signal strength byte some receivers append after the
/// payload. Pass it separately: it is only meaningful to data format 5,
/// which reports it in its reading.
pub fn decode_advertisement(payload: &[u8], rssi: Option<u8>) -> Result<Advertisement, DecodeError> {
    let chunk = extract_chunk(payload)?.ok_or(DecodeError::NoChunk)?;
    decode_chunk(chunk, rssi)
}

/// Decode an advertisement given as hex text
pub fn decode_hex_advertisement(payload: &str, rssi: Option<u8>) -> Result<Advertisement, DecodeError> {
    let bytes = hex::decode(payload.trim()).map_err(|_| DecodeError::InvalidHex)?;
    decode_advertisement(&bytes, rssi)
}

/// Decode a single element, e.g. one rebuilt from manufacturer data that
/// the Bluetooth stack already parsed
pub fn decode_chunk(chunk: RawChunk<'_>, rssi: Option<u8>) -> Result<Advertisement, DecodeError> {
    let candidate = match route(chunk) {
        Some(Route::Measurement(candidate)) => candidate,
        Some(Route::Discovery) => return Ok(Advertisement::Discovery),
        None => return Err(DecodeError::UnrecognizedFormat),
    };

    let reading = match (candidate.format, rssi) {
        (DataFormat::V5, Some(rssi)) if candidate.data.len() >= decoders::df5::PAYLOAD_LEN => {
            let mut data = candidate.data[..decoders::df5::PAYLOAD_LEN].to_vec();
            data.push(rssi);
            decoders::decode(DataFormat::V5, &data)
        }
        (format, _) => decoders::decode(format, candidate.data),
    };

    match reading {
        Some(reading) => Ok(Advertisement::Measurement(reading)),
        None => {
            debug!("Data format {} payload rejected", candidate.format);
            Err(DecodeError::InvalidPayload(candidate.format))
        }
    }
}
