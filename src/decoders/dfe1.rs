/// Decoder for data format E1 (extended air quality)
///
/// - Byte 0: Data format (0xE1)
/// - Bytes 1-2: Temperature (signed 16-bit, 0.005°C)
/// - Bytes 3-4: Humidity (unsigned 16-bit, 0.0025%)
/// - Bytes 5-6: Pressure (unsigned 16-bit, +50000 Pa offset)
/// - Bytes 7-14: PM1.0, PM2.5, PM4.0, PM10.0 (unsigned 16-bit each, 0.1 µg/m³)
/// - Bytes 15-16: CO2 (unsigned 16-bit, ppm)
/// - Byte 17: VOC index bits 8..1
/// - Byte 18: NOx index bits 8..1
/// - Bytes 19-21: Luminosity (unsigned 24-bit, 0.01 lux)
/// - Bytes 22-24: Reserved
/// - Bytes 25-27: Measurement sequence number (unsigned 24-bit)
/// - Byte 28: Flags (bit 0 calibration in progress, bit 6 NOx bit 0, bit 7 VOC bit 0)
/// - Bytes 29-33: Reserved
/// - Bytes 34-39: MAC address
///
/// Air-quality history records reuse bytes 0-33 of this layout.
use log::debug;

use crate::models::{DataFormat, E1Data, HistoryRecord};
use crate::utils::{be_i16, be_u16, be_u24, colon_mac, nine_bit, round_to};

pub const DATA_FORMAT: u8 = 0xE1;
pub const PAYLOAD_LEN: usize = 40;
/// Format byte through flags byte
pub(crate) const FIELDS_LEN: usize = 29;

const VOC_LSB_BIT: u8 = 7;
const NOX_LSB_BIT: u8 = 6;
const CALIBRATION_BIT: u8 = 0x01;
const LUMINOSITY_NA: u32 = 0xFF_FFFF;

/// Measurement fields shared by E1 advertisements and air-quality history
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AirQuality {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub pm_1_0: Option<f64>,
    pub pm_2_5: Option<f64>,
    pub pm_4_0: Option<f64>,
    pub pm_10_0: Option<f64>,
    pub co2: Option<u16>,
    pub voc: Option<u16>,
    pub nox: Option<u16>,
    pub luminosity: Option<f64>,
    pub measurement_sequence_number: u32,
    pub calibration_in_progress: bool,
}

/// Decode the E1 measurement fields, `data` starts at the format byte
pub(crate) fn decode_fields(data: &[u8]) -> Option<AirQuality> {
    if data.len() < FIELDS_LEN || data[0] != DATA_FORMAT {
        return None;
    }

    let flags = data[28];
    let luminosity = be_u24(data, 19);

    Some(AirQuality {
        temperature: super::temperature(be_i16(data, 1)),
        humidity: super::humidity(be_u16(data, 3)),
        pressure: super::pressure(be_u16(data, 5)),
        pm_1_0: super::particulate(be_u16(data, 7)),
        pm_2_5: super::particulate(be_u16(data, 9)),
        pm_4_0: super::particulate(be_u16(data, 11)),
        pm_10_0: super::particulate(be_u16(data, 13)),
        co2: super::co2(be_u16(data, 15)),
        voc: super::air_index(nine_bit(data[17], flags, VOC_LSB_BIT)),
        nox: super::air_index(nine_bit(data[18], flags, NOX_LSB_BIT)),
        luminosity: (luminosity != LUMINOSITY_NA)
            .then(|| round_to(f64::from(luminosity) * 0.01, 2)),
        measurement_sequence_number: be_u24(data, 25),
        calibration_in_progress: flags & CALIBRATION_BIT != 0,
    })
}

pub fn decode(data: &[u8]) -> Option<E1Data> {
    if data.len() < PAYLOAD_LEN {
        debug!("Invalid data format E1 payload: len={}", data.len());
        return None;
    }
    let fields = decode_fields(data)?;

    Some(E1Data {
        data_format: DataFormat::E1,
        temperature: fields.temperature,
        humidity: fields.humidity,
        pressure: fields.pressure,
        pm_1_0: fields.pm_1_0,
        pm_2_5: fields.pm_2_5,
        pm_4_0: fields.pm_4_0,
        pm_10_0: fields.pm_10_0,
        co2: fields.co2,
        voc: fields.voc,
        nox: fields.nox,
        luminosity: fields.luminosity,
        measurement_sequence_number: fields.measurement_sequence_number,
        calibration_in_progress: fields.calibration_in_progress,
        mac: colon_mac(&data[34..PAYLOAD_LEN]),
    })
}

impl AirQuality {
    pub(crate) fn into_record(self, timestamp: u32) -> HistoryRecord {
        HistoryRecord {
            timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            pm_1_0: self.pm_1_0,
            pm_2_5: self.pm_2_5,
            pm_4_0: self.pm_4_0,
            pm_10_0: self.pm_10_0,
            co2: self.co2,
            voc: self.voc,
            nox: self.nox,
            luminosity: self.luminosity,
            measurement_sequence_number: Some(self.measurement_sequence_number),
            calibration_in_progress: Some(self.calibration_in_progress),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// E1 bytes 0-33 with recognisable values, flags set as given
    pub(crate) fn sample_fields(flags: u8) -> Vec<u8> {
        let mut p = vec![DATA_FORMAT];
        p.extend_from_slice(&4860i16.to_be_bytes());
        p.extend_from_slice(&21396u16.to_be_bytes());
        p.extend_from_slice(&50044u16.to_be_bytes());
        for pm in [11u16, 25, 40, 52] {
            p.extend_from_slice(&pm.to_be_bytes());
        }
        p.extend_from_slice(&450u16.to_be_bytes());
        p.push(50); // VOC high bits
        p.push(1); // NOx high bits
        p.extend_from_slice(&[0x00, 0x30, 0x39]); // 123.45 lux
        p.extend_from_slice(&[0xFF; 3]);
        p.extend_from_slice(&[0x01, 0x02, 0x03]);
        p.push(flags);
        p.extend_from_slice(&[0xFF; 5]);
        p
    }

    #[test]
    fn decodes_measurement() {
        let mut payload = sample_fields(0x81);
        payload.extend_from_slice(&[0xCB, 0xB8, 0x33, 0x4C, 0x88, 0x4F]);
        let data = decode(&payload).unwrap();
        assert_eq!(data.temperature, Some(24.3));
        assert_eq!(data.humidity, Some(53.49));
        assert_eq!(data.pressure, Some(1000.44));
        assert_eq!(data.pm_1_0, Some(1.1));
        assert_eq!(data.pm_2_5, Some(2.5));
        assert_eq!(data.pm_4_0, Some(4.0));
        assert_eq!(data.pm_10_0, Some(5.2));
        assert_eq!(data.co2, Some(450));
        assert_eq!(data.voc, Some(101));
        assert_eq!(data.nox, Some(2));
        assert_eq!(data.luminosity, Some(123.45));
        assert_eq!(data.measurement_sequence_number, 0x010203);
        assert!(data.calibration_in_progress);
        assert_eq!(data.mac, "CB:B8:33:4C:88:4F");
    }

    #[test]
    fn nox_low_bit_comes_from_bit_6() {
        let mut payload = sample_fields(0x40);
        payload.extend_from_slice(&[0; 6]);
        let data = decode(&payload).unwrap();
        assert_eq!(data.voc, Some(100));
        assert_eq!(data.nox, Some(3));
        assert!(!data.calibration_in_progress);
    }

    #[test]
    fn sentinels_decode_to_absent() {
        let mut payload = vec![DATA_FORMAT, 0x80, 0x00];
        payload.extend_from_slice(&[0xFF; 16]);
        payload.extend_from_slice(&[0xFF; 3]);
        payload.extend_from_slice(&[0xFF; 3]);
        payload.extend_from_slice(&[0x00, 0x00, 0x09]);
        payload.push(0xC0);
        payload.extend_from_slice(&[0xFF; 11]);
        let data = decode(&payload).unwrap();
        assert_eq!(data.temperature, None);
        assert_eq!(data.humidity, None);
        assert_eq!(data.pressure, None);
        assert_eq!(data.pm_1_0, None);
        assert_eq!(data.pm_10_0, None);
        assert_eq!(data.co2, None);
        assert_eq!(data.voc, None);
        assert_eq!(data.nox, None);
        assert_eq!(data.luminosity, None);
        assert_eq!(data.measurement_sequence_number, 9);
    }

    #[test]
    fn advertisement_needs_mac_but_fields_do_not() {
        let fields = sample_fields(0);
        assert_eq!(decode(&fields), None);
        assert!(decode_fields(&fields).is_some());
        assert_eq!(decode_fields(&fields[..20]), None);
    }
}
