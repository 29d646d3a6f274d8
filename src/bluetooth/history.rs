/// History log download over the Nordic UART service
use futures_util::{pin_mut, StreamExt};
use log::{debug, info, warn};
use time::OffsetDateTime;
use tokio::time::{timeout, Duration};

use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, Address, Device, Uuid};
use rust_ruuvitag_decoder::{HistoryProtocol, HistoryRecord, LogDownload, LogReadRequest, Progress};

const NUS_SERVICE_UUID: Uuid = Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E);
/// Commands are written here
const NUS_RX_UUID: Uuid = Uuid::from_u128(0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E);
/// Log packets arrive here as notifications
const NUS_TX_UUID: Uuid = Uuid::from_u128(0x6E400003_B5A3_F393_E0A9_E50E24DCCA9E);

/// Download the records of the last `hours` hours from one tag
pub async fn download_history(
    adapter: &Adapter,
    address: Address,
    protocol: HistoryProtocol,
    hours: u32,
    idle_timeout: Duration,
) -> Result<Vec<HistoryRecord>, Box<dyn std::error::Error>> {
    let device = adapter.device(address)?;
    if !device.is_connected().await? {
        info!("Connecting to {}", address);
        device.connect().await?;
    }

    let result = read_log(&device, protocol, hours, idle_timeout).await;

    if let Err(e) = device.disconnect().await {
        debug!("Failed to disconnect from {}: {}", address, e);
    }
    result
}

async fn read_log(
    device: &Device,
    protocol: HistoryProtocol,
    hours: u32,
    idle_timeout: Duration,
) -> Result<Vec<HistoryRecord>, Box<dyn std::error::Error>> {
    let (rx, tx) = find_uart(device).await?;

    let notifications = tx.notify().await?;
    pin_mut!(notifications);

    let now = u32::try_from(OffsetDateTime::now_utc().unix_timestamp())?;
    let start = now.saturating_sub(hours.saturating_mul(3600));
    let request = LogReadRequest::new(protocol, now, start);
    debug!("TX: {}", hex::encode(request.to_bytes()));
    rx.write(&request.to_bytes()).await?;

    let mut download = LogDownload::new(protocol);
    loop {
        let packet = match timeout(idle_timeout, notifications.next()).await {
            Ok(Some(packet)) => packet,
            Ok(None) => return Err("Notification stream closed before the log ended".into()),
            Err(_) => {
                warn!(
                    "No log data for {} s, {} records received",
                    idle_timeout.as_secs(),
                    download.records().len()
                );
                return Err("Timed out waiting for log data".into());
            }
        };
        debug!("RX: {}", hex::encode(&packet));

        match download.push(&packet) {
            Progress::Continue => {}
            Progress::Finished => break,
            Progress::Failed => return Err("Device reported an error while reading its log".into()),
        }
    }

    if download.rejected() > 0 {
        warn!("{} history entries could not be decoded", download.rejected());
    }
    Ok(download.into_records())
}

/// Locate the write and notify characteristics of the UART service
async fn find_uart(
    device: &Device,
) -> Result<(Characteristic, Characteristic), Box<dyn std::error::Error>> {
    for service in device.services().await? {
        if service.uuid().await? != NUS_SERVICE_UUID {
            continue;
        }

        let mut rx = None;
        let mut tx = None;
        for characteristic in service.characteristics().await? {
            let uuid = characteristic.uuid().await?;
            if uuid == NUS_RX_UUID {
                rx = Some(characteristic);
            } else if uuid == NUS_TX_UUID {
                tx = Some(characteristic);
            }
        }

        if let (Some(rx), Some(tx)) = (rx, tx) {
            return Ok((rx, tx));
        }
    }

    Err("The device does not support the Nordic UART service".into())
}
