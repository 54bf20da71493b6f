//! Daemon settings
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `OSD_NETWORK_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use osd_network_apply::ApplierSettings;
use osd_network_config::{DEFAULT_NETWORK_DIR, DEFAULT_TIMESYNC_FILE};

pub const DEFAULT_SETTINGS_FILE: &str = "/etc/osd-network/daemon.toml";
const ENV_PREFIX: &str = "OSD_NETWORK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    /// Directory the networkd artifacts are written to
    pub network_config_dir: PathBuf,
    pub timesync_config_file: PathBuf,
    /// Network configuration provided at first boot
    pub network_seed_file: PathBuf,
    pub listen_address: String,
    pub api_apply_timeout_secs: u64,
    pub boot_apply_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub readiness_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub rollback_on_failure: bool,
    /// Units enabled and started once the boot configuration is up
    pub boot_units: Vec<String>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            network_config_dir: PathBuf::from(DEFAULT_NETWORK_DIR),
            timesync_config_file: PathBuf::from(DEFAULT_TIMESYNC_FILE),
            network_seed_file: PathBuf::from("/var/lib/osd-network/seed/network.json"),
            listen_address: "127.0.0.1:8443".to_string(),
            api_apply_timeout_secs: 10,
            boot_apply_timeout_secs: 60,
            poll_interval_ms: 500,
            readiness_timeout_secs: 10,
            command_timeout_secs: 60,
            rollback_on_failure: true,
            boot_units: Vec::new(),
        }
    }
}

impl DaemonSettings {
    /// Load settings, reading `path` if it exists.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&DaemonSettings::default())?)
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("boot_units"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn api_apply_timeout(&self) -> Duration {
        Duration::from_secs(self.api_apply_timeout_secs)
    }

    pub fn boot_apply_timeout(&self) -> Duration {
        Duration::from_secs(self.boot_apply_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn applier_settings(&self) -> ApplierSettings {
        ApplierSettings {
            network_dir: self.network_config_dir.clone(),
            timesync_file: self.timesync_config_file.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            readiness_timeout: Duration::from_secs(self.readiness_timeout_secs),
        }
    }
}
