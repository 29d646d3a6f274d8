use std::collections::HashMap;
use std::env;
use std::error::Error;

use log::{debug, info};
use rust_ruuvitag_decoder::normalize_mac;

const DEFAULT_SCAN_DURATION_SECS: u64 = 20;
const DEFAULT_HISTORY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Upper-case colon MAC -> display name
    pub tags: HashMap<String, String>,
    /// Adapter to scan with, e.g. `hci1`. `None` picks the default adapter.
    pub adapter: Option<String>,
    pub scan_duration_secs: u64,
    /// Give up on a log download after this long without a notification
    pub history_timeout_secs: u64,
}

impl ScannerConfig {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_vars(env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, Box<dyn Error>> {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let mut tags = HashMap::new();

        // Try RUUVI_TAGS format first
        if let Some(ruuvi_tags) = vars.get("RUUVI_TAGS") {
            debug!("Found RUUVI_TAGS: '{}'", ruuvi_tags);
            for pair in ruuvi_tags.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (mac, name) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("Expected MAC=name in RUUVI_TAGS, got '{}'", pair))?;
                insert_tag(&mut tags, mac, name)?;
            }
        } else {
            // Fallback to individual environment variables
            for (key, value) in &vars {
                if let Some(index) = key
                    .strip_prefix("RUUVI_TAG_")
                    .and_then(|s| s.strip_suffix("_MAC"))
                {
                    let name_key = format!("RUUVI_TAG_{}_NAME", index);
                    if let Some(name) = vars.get(&name_key) {
                        insert_tag(&mut tags, value, name)?;
                    }
                }
            }
        }

        if tags.is_empty() {
            info!("No RuuviTags configured, reporting every beacon heard");
        }
        for (mac, name) in &tags {
            debug!("Tag: {} -> {}", mac, name);
        }

        let adapter = vars
            .get("BLUETOOTH_ADAPTER")
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(ScannerConfig {
            tags,
            adapter,
            scan_duration_secs: seconds(&vars, "SCAN_DURATION_SECS", DEFAULT_SCAN_DURATION_SECS)?,
            history_timeout_secs: seconds(
                &vars,
                "HISTORY_TIMEOUT_SECS",
                DEFAULT_HISTORY_TIMEOUT_SECS,
            )?,
        })
    }

    /// Configured name for any rendering of a MAC address
    pub fn name_for(&self, mac: &str) -> Option<&str> {
        let mac = normalize_mac(mac)?;
        self.tags.get(&mac).map(String::as_str)
    }

    pub fn is_wanted(&self, mac: &str) -> bool {
        self.tags.is_empty() || self.name_for(mac).is_some()
    }
}

fn insert_tag(tags: &mut HashMap<String, String>, mac: &str, name: &str) -> Result<(), Box<dyn Error>> {
    let (mac, name) = (mac.trim(), name.trim());
    if name.is_empty() {
        return Err(format!("Empty name for tag '{}'", mac).into());
    }
    let mac = normalize_mac(mac).ok_or_else(|| format!("Invalid MAC address '{}'", mac))?;
    tags.insert(mac, name.to_string());
    Ok(())
}

fn seconds(vars: &HashMap<String, String>, key: &str, default: u64) -> Result<u64, Box<dyn Error>> {
    match vars.get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("{} must be a number of seconds: {}", key, e).into()),
        None => Ok(default),
    }
}
