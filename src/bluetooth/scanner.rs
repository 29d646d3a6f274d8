/// Bluetooth Low Energy scanning for RuuviTag beacons
///
/// BlueZ parses advertisements before we see them, so every element the
/// decoder understands is rebuilt from the parsed device properties and fed
/// through `decode_chunk`.
use futures_util::StreamExt;
use log::{debug, error, warn};
use tokio::time::{sleep, Duration};

use bluer::{Adapter, Device, Uuid};
use rust_ruuvitag_decoder::advertisement::chunk::{
    COMPLETE_LOCAL_NAME, MANUFACTURER_DATA, SERVICE_DATA,
};
use rust_ruuvitag_decoder::{decode_chunk, normalize_mac, Advertisement, DecodeError, RawChunk};

use crate::config::ScannerConfig;

const RUUVI_MANUFACTURER_ID: u16 = 0x0499; // Ruuvi Innovations Ltd.
const EDDYSTONE_UUID: Uuid = Uuid::from_u128(0x0000FEAA_0000_1000_8000_00805F9B34FB);

/// One decoded advertisement and who sent it
#[derive(Debug, Clone)]
pub struct Sighting {
    pub address: String,
    pub name: Option<String>,
    pub advertisement: Advertisement,
}

pub async fn open_adapter(
    session: &bluer::Session,
    name: Option<&str>,
) -> Result<Adapter, Box<dyn std::error::Error>> {
    let adapter = match name {
        Some(name) => session.adapter(name),
        None => session.default_adapter().await,
    };
    let adapter = match adapter {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    // Ensure Bluetooth adapter is powered on
    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    Ok(adapter)
}

/// Scan for the configured duration and decode what every beacon advertised
pub async fn scan_for_ruuvitags(
    adapter: &Adapter,
    config: &ScannerConfig,
) -> Result<Vec<Sighting>, Box<dyn std::error::Error>> {
    let filter = bluer::DiscoveryFilter {
        transport: bluer::DiscoveryTransport::Le,
        duplicate_data: false,
        ..Default::default()
    };

    // Apply the discovery filter (warn if it fails, but continue)
    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    let discovery_handle = match adapter.discover_devices().await {
        Ok(mut stream) => tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                debug!("Discovery event: {:?}", event);
            }
        }),
        Err(e) => {
            error!("Failed to start device discovery: {}", e);
            return Err(e.into());
        }
    };

    sleep(Duration::from_secs(config.scan_duration_secs)).await;
    discovery_handle.abort();

    let devices = match adapter.device_addresses().await {
        Ok(devices) => devices,
        Err(e) => {
            error!("Failed to get device addresses: {}", e);
            return Err(e.into());
        }
    };

    let mut sightings = Vec::new();
    for addr in devices {
        let device = match adapter.device(addr) {
            Ok(device) => device,
            Err(_) => continue,
        };
        let address = device.address().to_string().to_uppercase();

        let advertisement = match read_advertisement(&device).await {
            Some(Ok(advertisement)) => advertisement,
            Some(Err(e)) => {
                debug!("Undecodable advertisement from {}: {}", address, e);
                continue;
            }
            None => continue,
        };

        // Tags using a random address are recognized by the MAC in their payload
        let payload_mac = match &advertisement {
            Advertisement::Measurement(reading) => reading.mac().and_then(normalize_mac),
            Advertisement::Discovery => None,
        };
        let name = config
            .name_for(&address)
            .or_else(|| payload_mac.as_deref().and_then(|mac| config.name_for(mac)))
            .map(str::to_string);

        if name.is_none() && !config.tags.is_empty() {
            continue;
        }

        sightings.push(Sighting {
            address,
            name,
            advertisement,
        });
    }

    Ok(sightings)
}

/// Rebuild the first Ruuvi element the device advertised and decode it
async fn read_advertisement(device: &Device) -> Option<Result<Advertisement, DecodeError>> {
    // BlueZ reports RSSI as i16, the decoder expects the raw two's complement byte
    let rssi = match device.rssi().await {
        Ok(Some(rssi)) => Some(rssi as i8 as u8),
        _ => None,
    };

    if let Ok(Some(manufacturer_data)) = device.manufacturer_data().await {
        if let Some(data) = manufacturer_data.get(&RUUVI_MANUFACTURER_ID) {
            let [lo, hi] = RUUVI_MANUFACTURER_ID.to_le_bytes();
            return Some(decode_rebuilt(&[MANUFACTURER_DATA, lo, hi], data, rssi));
        }
    }

    if let Ok(Some(service_data)) = device.service_data().await {
        if let Some(data) = service_data.get(&EDDYSTONE_UUID) {
            return Some(decode_rebuilt(&[SERVICE_DATA, 0xAA, 0xFE], data, rssi));
        }
    }

    match device.name().await {
        Ok(Some(name)) if name.starts_with("Ruuvi ") => {
            Some(decode_rebuilt(&[COMPLETE_LOCAL_NAME], name.as_bytes(), None))
        }
        _ => None,
    }
}

fn decode_rebuilt(prefix: &[u8], data: &[u8], rssi: Option<u8>) -> Result<Advertisement, DecodeError> {
    let mut bytes = Vec::with_capacity(prefix.len() + data.len());
    bytes.extend_from_slice(prefix);
    bytes.extend_from_slice(data);
    decode_chunk(RawChunk::new(&bytes), rssi)
}
