pub mod df3;
pub mod df5;
pub mod df6;
pub mod dfe1;
pub mod url;

use crate::models::{DataFormat, SensorReading};
use crate::utils::round_to;

/// Decode a routed payload with the decoder for its data format
///
/// Returns `None` when the bytes do not fit the format's layout.
pub fn decode(format: DataFormat, data: &[u8]) -> Option<SensorReading> {
    match format {
        DataFormat::V2 | DataFormat::V4 => url::decode(data).map(SensorReading::Url),
        DataFormat::V3 => df3::decode(data).map(SensorReading::Df3),
        DataFormat::V5 => df5::decode(data).map(SensorReading::Df5),
        DataFormat::V6 => df6::decode(data).map(SensorReading::Df6),
        DataFormat::E1 => dfe1::decode(data).map(SensorReading::E1),
    }
}

// Field scaling shared by the 16-bit formats (5, 6 and E1). Rounding keeps
// every decimal of the step so a value re-encodes to its raw integer.

pub(crate) fn temperature(raw: i16) -> Option<f64> {
    (raw != i16::MIN).then(|| round_to(f64::from(raw) * 0.005, 3))
}

pub(crate) fn humidity(raw: u16) -> Option<f64> {
    (raw != u16::MAX).then(|| round_to(f64::from(raw) * 0.0025, 4))
}

/// hPa from Pa with a -50000 Pa offset
pub(crate) fn pressure(raw: u16) -> Option<f64> {
    (raw != u16::MAX).then(|| round_to((f64::from(raw) + 50000.0) / 100.0, 2))
}

/// µg/m³ in 0.1 steps
pub(crate) fn particulate(raw: u16) -> Option<f64> {
    (raw != u16::MAX).then(|| round_to(f64::from(raw) * 0.1, 1))
}

pub(crate) fn co2(raw: u16) -> Option<u16> {
    (raw != u16::MAX).then_some(raw)
}

/// VOC and NOx indexes are 9 bits, all ones is unavailable
pub(crate) fn air_index(raw: u16) -> Option<u16> {
    (raw != 0x1FF).then_some(raw)
}
