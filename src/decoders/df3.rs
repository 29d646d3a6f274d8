/// Decoder for data format 3 (RAWv1)
///
/// - Byte 0: Data format (3)
/// - Byte 1: Humidity (one lsb is 0.5%)
/// - Byte 2: Temperature integer part, sign and magnitude
/// - Byte 3: Temperature hundredths
/// - Bytes 4-5: Pressure (unsigned 16-bit, -50000 Pa offset)
/// - Bytes 6-11: Acceleration X, Y, Z (signed 16-bit, mG)
/// - Bytes 12-13: Battery voltage (unsigned 16-bit, mV)
use log::debug;

use crate::models::{DataFormat, Df3Data};
use crate::utils::{be_i16, be_u16, round_to};

pub const PAYLOAD_LEN: usize = 14;

pub fn decode(data: &[u8]) -> Option<Df3Data> {
    if data.len() < PAYLOAD_LEN || data[0] != 0x03 {
        debug!("Invalid data format 3 payload: len={}", data.len());
        return None;
    }

    let acceleration_x = be_i16(data, 6);
    let acceleration_y = be_i16(data, 8);
    let acceleration_z = be_i16(data, 10);

    Some(Df3Data {
        data_format: DataFormat::V3,
        humidity: f64::from(data[1]) * 0.5,
        temperature: temperature(data[2], data[3]),
        pressure: round_to((f64::from(be_u16(data, 4)) + 50000.0) / 100.0, 2),
        acceleration: magnitude(acceleration_x, acceleration_y, acceleration_z),
        acceleration_x,
        acceleration_y,
        acceleration_z,
        battery: be_u16(data, 12),
    })
}

fn temperature(integer: u8, fraction: u8) -> f64 {
    // As a signed byte a negative value is magnitude - 128
    let integer = integer as i8;
    let value = if integer < 0 {
        -((f64::from(integer) + 128.0) + f64::from(fraction) / 100.0)
    } else {
        f64::from(integer) + f64::from(fraction) / 100.0
    };
    round_to(value, 2)
}

pub(crate) fn magnitude(x: i16, y: i16, z: i16) -> f64 {
    let (x, y, z) = (f64::from(x), f64::from(y), f64::from(z));
    (x * x + y * y + z * z).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_payload() {
        let payload = hex::decode("03291A1ECE1EFC18F94202CA0B5300000000BB").unwrap();
        let data = decode(&payload).unwrap();
        assert_eq!(data.temperature, 26.3);
        assert_eq!(data.pressure, 1027.66);
        assert_eq!(data.humidity, 20.5);
        assert_eq!(data.battery, 2899);
        assert_eq!(data.acceleration_x, -1000);
        assert_eq!(data.acceleration_y, -1726);
        assert_eq!(data.acceleration_z, 714);
        assert!((data.acceleration - 2118.69).abs() < 0.01);
    }

    #[test]
    fn negative_temperature_is_sign_magnitude() {
        let payload = hex::decode("03FF9432C8000000000000000BB8").unwrap();
        let data = decode(&payload).unwrap();
        assert_eq!(data.temperature, -20.5);
        assert_eq!(data.humidity, 127.5);
        assert_eq!(data.pressure, 1012.0);
    }

    #[test]
    fn rejects_short_payload() {
        assert_eq!(decode(&hex::decode("03291A1ECE1EFC18").unwrap()), None);
    }
}
