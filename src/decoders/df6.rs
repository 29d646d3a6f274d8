/// Decoder for data format 6 (air quality, fits a BLE 4 advertisement)
///
/// - Byte 0: Data format (6)
/// - Bytes 1-2: Temperature (signed 16-bit, 0.005°C)
/// - Bytes 3-4: Humidity (unsigned 16-bit, 0.0025%)
/// - Bytes 5-6: Pressure (unsigned 16-bit, +50000 Pa offset)
/// - Bytes 7-8: PM2.5 (unsigned 16-bit, 0.1 µg/m³)
/// - Bytes 9-10: CO2 (unsigned 16-bit, ppm)
/// - Byte 11: VOC index bits 8..1
/// - Byte 12: NOx index bits 8..1
/// - Byte 13: Luminosity, logarithmic code
/// - Byte 14: Reserved
/// - Byte 15: Measurement sequence number
/// - Byte 16: Flags (bit 0 calibration in progress, bit 6 VOC bit 0, bit 7 NOx bit 0)
/// - Bytes 17-19: Last three bytes of the MAC address
use log::debug;

use crate::models::{DataFormat, Df6Data};
use crate::utils::{be_i16, be_u16, colon_mac, nine_bit, round_to};

const DATA_FORMAT: u8 = 6;
pub const PAYLOAD_LEN: usize = 20;

const VOC_LSB_BIT: u8 = 6;
const NOX_LSB_BIT: u8 = 7;
const CALIBRATION_BIT: u8 = 0x01;

const LUMINOSITY_NA: u8 = 255;
/// Code 254 maps to 65535 lux
const LUMINOSITY_MAX_CODE: f64 = 254.0;

pub fn decode(data: &[u8]) -> Option<Df6Data> {
    if data.len() < PAYLOAD_LEN || data[0] != DATA_FORMAT {
        debug!("Invalid data format 6 payload: len={}", data.len());
        return None;
    }

    let flags = data[16];

    Some(Df6Data {
        data_format: DataFormat::V6,
        temperature: super::temperature(be_i16(data, 1)),
        humidity: super::humidity(be_u16(data, 3)),
        pressure: super::pressure(be_u16(data, 5)),
        pm_2_5: super::particulate(be_u16(data, 7)),
        co2: super::co2(be_u16(data, 9)),
        voc: super::air_index(nine_bit(data[11], flags, VOC_LSB_BIT)),
        nox: super::air_index(nine_bit(data[12], flags, NOX_LSB_BIT)),
        luminosity: luminosity(data[13]),
        measurement_sequence_number: data[15],
        calibration_in_progress: flags & CALIBRATION_BIT != 0,
        mac: colon_mac(&data[17..PAYLOAD_LEN]),
    })
}

fn luminosity(code: u8) -> Option<f64> {
    match code {
        LUMINOSITY_NA => None,
        0 => Some(0.0),
        code => {
            let lux = (f64::from(code) * 65536f64.ln() / LUMINOSITY_MAX_CODE).exp() - 1.0;
            Some(round_to(lux, 2))
        }
    }
}
