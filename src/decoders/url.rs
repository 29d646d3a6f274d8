/// Decoder for data formats 2 and 4 (Eddystone URL)
///
/// The measurement is base64url encoded after `ruu.vi/#`:
/// - Byte 0: Data format (2 or 4)
/// - Byte 1: Humidity (one lsb is 0.5%)
/// - Byte 2: Temperature integer part, bit 7 is the sign
/// - Byte 3: Temperature hundredths
/// - Bytes 4-5: Pressure (unsigned 16-bit, -50000 Pa offset)
///
/// Format 4 appends an identifier character after the 8 encoded characters.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use log::debug;

use crate::models::{DataFormat, UrlData};
use crate::utils::{be_u16, round_to};

const ENCODED_LEN: usize = 8;
const DECODED_LEN: usize = 6;

pub fn decode(encoded: &[u8]) -> Option<UrlData> {
    if encoded.len() < ENCODED_LEN {
        debug!("URL payload too short: {} characters", encoded.len());
        return None;
    }
    let (payload, identifier) = encoded.split_at(ENCODED_LEN);

    let data = match URL_SAFE_NO_PAD.decode(payload) {
        Ok(data) if data.len() == DECODED_LEN => data,
        Ok(data) => {
            debug!("URL payload decoded to {} bytes", data.len());
            return None;
        }
        Err(e) => {
            debug!("URL payload is not base64: {}", e);
            return None;
        }
    };

    let (data_format, identifier) = if identifier.is_empty() {
        (DataFormat::V2, None)
    } else {
        (
            DataFormat::V4,
            Some(String::from_utf8_lossy(identifier).into_owned()),
        )
    };

    Some(UrlData {
        data_format,
        temperature: temperature(data[2], data[3]),
        humidity: f64::from(data[1]) * 0.5,
        pressure: round_to((f64::from(be_u16(&data, 4)) + 50000.0) / 100.0, 2),
        identifier,
    })
}

fn temperature(integer: u8, fraction: u8) -> f64 {
    let magnitude = f64::from(integer & 0x7F) + f64::from(fraction) / 100.0;
    let value = if integer & 0x80 == 0 {
        magnitude
    } else {
        -magnitude
    };
    round_to(value, 2)
}
