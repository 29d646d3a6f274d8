use std::fmt;

use serde::{Serialize, Serializer};
use time::OffsetDateTime;

use crate::utils::format_datetime;

/// Advertisement data format versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// Eddystone URL, no identifier
    V2,
    V3,
    /// Eddystone URL with a trailing identifier
    V4,
    V5,
    V6,
    E1,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::V2 => write!(f, "2"),
            DataFormat::V3 => write!(f, "3"),
            DataFormat::V4 => write!(f, "4"),
            DataFormat::V5 => write!(f, "5"),
            DataFormat::V6 => write!(f, "6"),
            DataFormat::E1 => write!(f, "E1"),
        }
    }
}

// Numbered formats go out as numbers, E1 as a string
impl Serialize for DataFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataFormat::V2 => serializer.serialize_u8(2),
            DataFormat::V3 => serializer.serialize_u8(3),
            DataFormat::V4 => serializer.serialize_u8(4),
            DataFormat::V5 => serializer.serialize_u8(5),
            DataFormat::V6 => serializer.serialize_u8(6),
            DataFormat::E1 => serializer.serialize_str("E1"),
        }
    }
}

/// Data formats 2 and 4 (Eddystone URL)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlData {
    pub data_format: DataFormat,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// Format 4 only: opaque characters after the encoded measurement
    pub identifier: Option<String>,
}

/// Data format 3 (RAWv1)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Df3Data {
    pub data_format: DataFormat,
    pub humidity: f64,
    pub temperature: f64,
    pub pressure: f64,
    /// Total acceleration in mG
    pub acceleration: f64,
    pub acceleration_x: i16,
    pub acceleration_y: i16,
    pub acceleration_z: i16,
    /// mV
    pub battery: u16,
}

/// Data format 5 (RAWv2)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Df5Data {
    pub data_format: DataFormat,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub acceleration: Option<f64>,
    pub acceleration_x: Option<i16>,
    pub acceleration_y: Option<i16>,
    pub acceleration_z: Option<i16>,
    /// dBm
    pub tx_power: Option<i8>,
    /// mV
    pub battery: Option<u16>,
    pub movement_counter: u8,
    pub measurement_sequence_number: u16,
    /// Lower-case hex without separators
    pub mac: String,
    /// dBm, when the transport appended the signal strength byte
    pub rssi: Option<i16>,
}

/// Data format 6 (air quality, BLE 4 compatible)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Df6Data {
    pub data_format: DataFormat,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    /// µg/m³
    pub pm_2_5: Option<f64>,
    /// ppm
    pub co2: Option<u16>,
    pub voc: Option<u16>,
    pub nox: Option<u16>,
    /// lux
    pub luminosity: Option<f64>,
    pub measurement_sequence_number: u8,
    pub calibration_in_progress: bool,
    /// Last three address bytes, colon separated
    pub mac: String,
}

/// Data format E1 (extended air quality)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct E1Data {
    pub data_format: DataFormat,
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
    /// Colon separated upper-case hex
    pub mac: String,
}

/// A decoded measurement advertisement, one variant per wire layout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorReading {
    Url(UrlData),
    Df3(Df3Data),
    Df5(Df5Data),
    Df6(Df6Data),
    E1(E1Data),
}

impl SensorReading {
    pub fn data_format(&self) -> DataFormat {
        match self {
            SensorReading::Url(d) => d.data_format,
            SensorReading::Df3(_) => DataFormat::V3,
            SensorReading::Df5(_) => DataFormat::V5,
            SensorReading::Df6(_) => DataFormat::V6,
            SensorReading::E1(_) => DataFormat::E1,
        }
    }

    /// MAC address carried inside the payload, as rendered by its format
    pub fn mac(&self) -> Option<&str> {
        match self {
            SensorReading::Url(_) | SensorReading::Df3(_) => None,
            SensorReading::Df5(d) => Some(&d.mac),
            SensorReading::Df6(d) => Some(&d.mac),
            SensorReading::E1(d) => Some(&d.mac),
        }
    }

    pub fn temperature(&self) -> Option<f64> {
        match self {
            SensorReading::Url(d) => Some(d.temperature),
            SensorReading::Df3(d) => Some(d.temperature),
            SensorReading::Df5(d) => d.temperature,
            SensorReading::Df6(d) => d.temperature,
            SensorReading::E1(d) => d.temperature,
        }
    }

    pub fn humidity(&self) -> Option<f64> {
        match self {
            SensorReading::Url(d) => Some(d.humidity),
            SensorReading::Df3(d) => Some(d.humidity),
            SensorReading::Df5(d) => d.humidity,
            SensorReading::Df6(d) => d.humidity,
            SensorReading::E1(d) => d.humidity,
        }
    }

    pub fn pressure(&self) -> Option<f64> {
        match self {
            SensorReading::Url(d) => Some(d.pressure),
            SensorReading::Df3(d) => Some(d.pressure),
            SensorReading::Df5(d) => d.pressure,
            SensorReading::Df6(d) => d.pressure,
            SensorReading::E1(d) => d.pressure,
        }
    }
}

/// Outcome of decoding one advertisement
#[derive(Debug, Clone, PartialEq)]
pub enum Advertisement {
    Measurement(SensorReading),
    /// A supported beacon announced itself without a measurement
    Discovery,
}

/// One entry of a downloaded history log
///
/// Legacy tag logs populate exactly one measurement per record, air-quality
/// logs populate everything the device had available.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryRecord {
    /// Seconds since the Unix epoch
    pub timestamp: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_1_0: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_2_5: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_4_0: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_10_0: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voc: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nox: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luminosity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_sequence_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_in_progress: Option<bool>,
}

impl HistoryRecord {
    pub fn recorded_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(i64::from(self.timestamp)).ok()
    }
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.recorded_at() {
            Some(dt) => write!(f, "{}", format_datetime(&dt))?,
            None => write!(f, "@{}", self.timestamp)?,
        }
        if let Some(t) = self.temperature {
            write!(f, " temp={:.2}°C", t)?;
        }
        if let Some(h) = self.humidity {
            write!(f, " humidity={:.2}%", h)?;
        }
        if let Some(p) = self.pressure {
            write!(f, " pressure={:.2} hPa", p)?;
        }
        let particulates = [
            ("pm1.0", self.pm_1_0),
            ("pm2.5", self.pm_2_5),
            ("pm4.0", self.pm_4_0),
            ("pm10", self.pm_10_0),
        ];
        for (label, value) in particulates {
            if let Some(pm) = value {
                write!(f, " {}={:.1} µg/m³", label, pm)?;
            }
        }
        if let Some(co2) = self.co2 {
            write!(f, " co2={} ppm", co2)?;
        }
        if let Some(voc) = self.voc {
            write!(f, " voc={}", voc)?;
        }
        if let Some(nox) = self.nox {
            write!(f, " nox={}", nox)?;
        }
        if let Some(lux) = self.luminosity {
            write!(f, " luminosity={:.2} lx", lux)?;
        }
        if let Some(seq) = self.measurement_sequence_number {
            write!(f, " seq={}", seq)?;
        }
        if self.calibration_in_progress == Some(true) {
            write!(f, " (calibrating)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_format_serializes_as_number_or_e1() {
        assert_eq!(serde_json::to_string(&DataFormat::V5).unwrap(), "5");
        assert_eq!(serde_json::to_string(&DataFormat::E1).unwrap(), "\"E1\"");
        assert_eq!(DataFormat::E1.to_string(), "E1");
    }

    #[test]
    fn history_record_skips_absent_fields() {
        let record = HistoryRecord {
            timestamp: 1_700_000_000,
            humidity: Some(45.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["humidity"], 45.5);
        assert_eq!(record.to_string(), "14.11.2023 - 22:13:20 humidity=45.50%");
    }

    #[test]
    fn display_lists_every_populated_field() {
        let record = HistoryRecord {
            timestamp: 1_700_000_000,
            temperature: Some(24.3),
            pm_1_0: Some(1.1),
            pm_2_5: Some(2.5),
            pm_4_0: Some(4.0),
            pm_10_0: Some(5.2),
            co2: Some(450),
            luminosity: Some(123.45),
            measurement_sequence_number: Some(7),
            calibration_in_progress: Some(true),
            ..Default::default()
        };
        assert_eq!(
            record.to_string(),
            "14.11.2023 - 22:13:20 temp=24.30°C pm1.0=1.1 µg/m³ pm2.5=2.5 µg/m³ \
             pm4.0=4.0 µg/m³ pm10=5.2 µg/m³ co2=450 ppm luminosity=123.45 lx seq=7 (calibrating)"
        );
    }

    #[test]
    fn recorded_at_is_utc_epoch() {
        let record = HistoryRecord {
            timestamp: 1_700_000_000,
            ..Default::default()
        };
        let dt = record.recorded_at().unwrap();
        assert_eq!(dt.unix_timestamp(), 1_700_000_000);
        assert_eq!(dt.offset(), time::UtcOffset::UTC);
    }
}
