/// Decode RuuviTag data format 5 (RAWv2) into structured data
///
/// RuuviTag data format 5 uses a 24-byte payload with the following structure:
/// - Byte 0: Data format (5)
/// - Bytes 1-2: Temperature (signed 16-bit, 0.005°C resolution)
/// - Bytes 3-4: Humidity (unsigned 16-bit, 0.0025% resolution)
/// - Bytes 5-6: Pressure (unsigned 16-bit, +50000 Pa offset, 1 Pa resolution)
/// - Bytes 7-8: Acceleration X (signed 16-bit, mG)
/// - Bytes 9-10: Acceleration Y (signed 16-bit, mG)
/// - Bytes 11-12: Acceleration Z (signed 16-bit, mG)
/// - Bytes 13-14: Battery voltage (11 bits, +1600 mV) + TX power (5 bits, 2 dBm steps from -40)
/// - Byte 15: Movement counter
/// - Bytes 16-17: Measurement sequence number
/// - Bytes 18-23: MAC address
///
/// A 25th byte, when present, is the RSSI appended by the receiver.
/// Every all-ones (or -32768) field means "not available".
use log::debug;

use super::df3::magnitude;
use crate::models::{DataFormat, Df5Data};
use crate::utils::{be_i16, be_u16};

const DATA_FORMAT: u8 = 5;
pub const PAYLOAD_LEN: usize = 24;

const BATTERY_NA: u16 = 0b111_1111_1111;
const TX_POWER_NA: u16 = 0b1_1111;

pub fn decode(data: &[u8]) -> Option<Df5Data> {
    if data.len() < PAYLOAD_LEN || data[0] != DATA_FORMAT {
        debug!(
            "Invalid data format 5 payload: len={}, format={:?}",
            data.len(),
            data.first()
        );
        return None;
    }

    let temperature = super::temperature(be_i16(data, 1));
    let humidity = super::humidity(be_u16(data, 3));
    let pressure = super::pressure(be_u16(data, 5));

    // One invalid axis invalidates the whole vector
    let axes = [be_i16(data, 7), be_i16(data, 9), be_i16(data, 11)];
    let axes_valid = !axes.contains(&i16::MIN);
    let axis = |i: usize| axes_valid.then_some(axes[i]);

    let power_info = be_u16(data, 13);
    let battery = match power_info >> 5 {
        BATTERY_NA => None,
        raw => Some(raw + 1600),
    };
    let tx_power = match power_info & 0x1F {
        TX_POWER_NA => None,
        // at most 30 dBm, fits
        raw => Some(raw as i8 * 2 - 40),
    };

    Some(Df5Data {
        data_format: DataFormat::V5,
        humidity,
        temperature,
        pressure,
        acceleration: axes_valid.then(|| magnitude(axes[0], axes[1], axes[2])),
        acceleration_x: axis(0),
        acceleration_y: axis(1),
        acceleration_z: axis(2),
        tx_power,
        battery,
        movement_counter: data[15],
        measurement_sequence_number: be_u16(data, 16),
        mac: hex::encode(&data[18..PAYLOAD_LEN]),
        rssi: data.get(PAYLOAD_LEN).map(|&raw| rssi(raw)),
    })
}

/// BLE reports RSSI as a two's complement byte, values above 127 are negative dBm
fn rssi(raw: u8) -> i16 {
    if raw > 127 {
        i16::from(raw) - 256
    } else {
        i16::from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn payload(temperature: i16, humidity: u16, pressure: u16, battery: u16, tx: u16) -> Vec<u8> {
        let mut p = vec![DATA_FORMAT];
        p.extend_from_slice(&temperature.to_be_bytes());
        p.extend_from_slice(&humidity.to_be_bytes());
        p.extend_from_slice(&pressure.to_be_bytes());
        for axis in [4i16, -4, 1036] {
            p.extend_from_slice(&axis.to_be_bytes());
        }
        p.extend_from_slice(&((battery << 5) | tx).to_be_bytes());
        p.push(0x42);
        p.extend_from_slice(&205u16.to_be_bytes());
        p.extend_from_slice(&[0xCB, 0xB8, 0x33, 0x4C, 0x88, 0x4F]);
        p
    }

    #[test]
    fn decodes_reference_payload() {
        let payload =
            hex::decode("0512FC5394C37C0004FFFC040CAC364200CDCBB8334C884FC6").unwrap();
        let data = decode(&payload).unwrap();
        assert_eq!(data.temperature, Some(24.3));
        assert_eq!(data.humidity, Some(53.49));
        assert_eq!(data.pressure, Some(1000.44));
        assert_eq!(data.acceleration_x, Some(4));
        assert_eq!(data.acceleration_y, Some(-4));
        assert_eq!(data.acceleration_z, Some(1036));
        assert_eq!(data.tx_power, Some(4));
        assert_eq!(data.battery, Some(2977));
        assert_eq!(data.movement_counter, 66);
        assert_eq!(data.measurement_sequence_number, 205);
        assert_eq!(data.mac, "cbb8334c884f");
        assert_eq!(data.rssi, Some(-58));
    }

    #[test]
    fn smallest_humidity_step_survives() {
        let data = decode(&payload(1, 6, 0, 0, 0)).unwrap();
        assert_eq!(data.humidity, Some(0.015));
        assert_eq!(data.temperature, Some(0.005));
    }

    #[test]
    fn rssi_is_optional() {
        let payload = hex::decode("0512FC5394C37C0004FFFC040CAC364200CDCBB8334C884F").unwrap();
        assert_eq!(decode(&payload).unwrap().rssi, None);
        assert_eq!(rssi(0x28), 40);
        assert_eq!(rssi(0x80), -128);
    }

    #[test]
    fn sentinels_decode_to_absent() {
        let payload =
            hex::decode("058000FFFFFFFF800080008000FFFFFFFFFFFFFFFFFFFFFF").unwrap();
        let data = decode(&payload).unwrap();
        assert_eq!(data.temperature, None);
        assert_eq!(data.humidity, None);
        assert_eq!(data.pressure, None);
        assert_eq!(data.acceleration, None);
        assert_eq!(data.acceleration_x, None);
        assert_eq!(data.acceleration_y, None);
        assert_eq!(data.acceleration_z, None);
        assert_eq!(data.battery, None);
        assert_eq!(data.tx_power, None);
        assert_eq!(data.mac, "ffffffffffff");
    }

    #[test]
    fn single_invalid_axis_drops_all_axes() {
        let mut p = payload(0, 0, 0, 0, 0);
        p[9] = 0x80;
        p[10] = 0x00;
        let data = decode(&p).unwrap();
        assert_eq!(data.acceleration_x, None);
        assert_eq!(data.acceleration, None);
    }

    #[test]
    fn rejects_wrong_format_or_length() {
        let mut p = payload(0, 0, 0, 0, 0);
        p[0] = 3;
        assert_eq!(decode(&p), None);
        assert_eq!(decode(&payload(0, 0, 0, 0, 0)[..20]), None);
    }

    proptest! {
        #[test]
        fn scaled_fields_round_trip_within_resolution(
            temperature in -32767i16..=i16::MAX,
            humidity in 0u16..u16::MAX,
            pressure in 0u16..u16::MAX,
            battery in 0u16..BATTERY_NA,
            tx in 0u16..TX_POWER_NA,
        ) {
            let data = decode(&payload(temperature, humidity, pressure, battery, tx)).unwrap();

            let t = data.temperature.unwrap();
            prop_assert!((t - f64::from(temperature) * 0.005).abs() <= 0.005);
            prop_assert_eq!((t / 0.005).round() as i64, i64::from(temperature));
            let h = data.humidity.unwrap();
            prop_assert!((h - f64::from(humidity) * 0.0025).abs() <= 0.0025);
            prop_assert_eq!((h / 0.0025).round() as i64, i64::from(humidity));
            let p = data.pressure.unwrap();
            prop_assert_eq!((p * 100.0).round() as i64 - 50000, i64::from(pressure));
            prop_assert_eq!(data.battery, Some(battery + 1600));
            prop_assert_eq!(data.tx_power.map(i16::from), Some(tx as i16 * 2 - 40));
        }
    }
}
