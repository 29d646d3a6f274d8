mod bluetooth;
mod config;

use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use time::OffsetDateTime;
use tokio::time::{sleep, Duration};

use bluer::{Adapter, Address};
use rust_ruuvitag_decoder::utils::format_datetime;
use rust_ruuvitag_decoder::{normalize_mac, Advertisement, HistoryProtocol, SensorReading};

use bluetooth::history::download_history;
use bluetooth::scanner::{open_adapter, scan_for_ruuvitags, Sighting};
use config::ScannerConfig;

const RETRY_DELAY_SECS: u64 = 5;

#[derive(Parser, Debug)]
#[command(author, version, about = "Read RuuviTag beacons and history logs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print decoded advertisements until interrupted (default)
    Scan,
    /// Download the history log of one tag
    History {
        /// Tag address, e.g. CB:B8:33:4C:88:4F
        mac: String,
        /// How far back to read
        #[arg(long, default_value_t = 24)]
        hours: u32,
        /// The tag sends air-quality records
        #[arg(long)]
        air_quality: bool,
    },
}

async fn scan_loop(adapter: &Adapter, config: &ScannerConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Scanning for RuuviTags");

    loop {
        let start_time = OffsetDateTime::now_utc();
        let sightings = match scan_for_ruuvitags(adapter, config).await {
            Ok(sightings) => sightings,
            Err(e) => {
                error!("Scan failed: {}", e);
                sleep(Duration::from_secs(RETRY_DELAY_SECS)).await;
                continue;
            }
        };

        info!("Scan started at {} complete", format_datetime(&start_time));
        for sighting in &sightings {
            report(sighting);
        }

        if sightings.is_empty() {
            warn!("No RuuviTags heard during this scan!");
        }
    }
}

fn report(sighting: &Sighting) {
    let who = sighting.name.as_deref().unwrap_or(sighting.address.as_str());
    match &sighting.advertisement {
        Advertisement::Discovery => info!("{}: advertises its name only", who),
        Advertisement::Measurement(reading) => {
            info!(
                "{}: format {}, temp={}, humidity={}, pressure={}",
                who,
                reading.data_format(),
                show(reading.temperature(), "°C"),
                show(reading.humidity(), "%"),
                show(reading.pressure(), " hPa"),
            );
            if let SensorReading::Df5(data) = reading {
                debug!("{}: rssi={:?} dBm, battery={:?} mV", who, data.rssi, data.battery);
            }
            debug!("{}: {:?}", who, reading);
        }
    }
}

fn show(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(value) => format!("{:.2}{}", value, unit),
        None => "n/a".to_string(),
    }
}

async fn read_history(
    adapter: &Adapter,
    config: &ScannerConfig,
    mac: &str,
    hours: u32,
    protocol: HistoryProtocol,
) -> Result<(), Box<dyn std::error::Error>> {
    let mac = normalize_mac(mac).ok_or_else(|| format!("Invalid MAC address '{}'", mac))?;
    let address: Address = mac.parse()?;
    let who = config.name_for(&mac).unwrap_or(mac.as_str()).to_string();

    info!("Reading {} hours of history from {}", hours, who);
    let records = download_history(
        adapter,
        address,
        protocol,
        hours,
        Duration::from_secs(config.history_timeout_secs),
    )
    .await?;

    for record in &records {
        info!("{}: {}", who, record);
    }
    info!("Received {} records from {}", records.len(), who);
    Ok(())
}

async fn run(command: Command, config: ScannerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };
    let adapter = open_adapter(&session, config.adapter.as_deref()).await?;

    match command {
        Command::Scan => scan_loop(&adapter, &config).await,
        Command::History {
            mac,
            hours,
            air_quality,
        } => {
            let protocol = if air_quality {
                HistoryProtocol::AirQuality
            } else {
                HistoryProtocol::Legacy
            };
            read_history(&adapter, &config, &mac, hours, protocol).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let args = Args::parse();

    // Load configuration
    let config = match ScannerConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                // Keep tx alive so rx never resolves
                std::future::pending::<()>().await;
            }
        }
    });

    tokio::select! {
        result = run(args.command.unwrap_or(Command::Scan), config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
