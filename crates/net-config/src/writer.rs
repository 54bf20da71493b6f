//! Installation of generated artifacts into the live configuration paths

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use osd_network_core::{Result, SystemError};

use crate::artifact::ArtifactSet;

/// Default directory read by systemd-networkd at runtime
pub const DEFAULT_NETWORK_DIR: &str = "/run/systemd/network";
/// Default drop-in location for systemd-timesyncd
pub const DEFAULT_TIMESYNC_FILE: &str = "/run/systemd/timesyncd.conf.d/osd-network.conf";

/// Writes an [`ArtifactSet`] to disk, replacing whatever was there before.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    network_dir: PathBuf,
    timesync_file: PathBuf,
}

impl ArtifactWriter {
    pub fn new(network_dir: impl Into<PathBuf>, timesync_file: impl Into<PathBuf>) -> Self {
        Self {
            network_dir: network_dir.into(),
            timesync_file: timesync_file.into(),
        }
    }

    pub fn network_dir(&self) -> &Path {
        &self.network_dir
    }

    pub fn timesync_file(&self) -> &Path {
        &self.timesync_file
    }

    /// Wipe the network directory and write every artifact into it, then
    /// install or remove the time-sync drop-in.
    pub async fn write(&self, artifacts: &ArtifactSet) -> Result<()> {
        log::info!(
            "Writing {} network artifacts to {}",
            artifacts.len(),
            self.network_dir.display()
        );

        match fs::remove_dir_all(&self.network_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(SystemError::config_write(&self.network_dir, e).into()),
        }

        fs::create_dir_all(&self.network_dir)
            .await
            .map_err(|e| SystemError::config_write(&self.network_dir, e))?;

        for artifact in artifacts.iter() {
            let path = self.network_dir.join(&artifact.name);
            log::debug!("Writing {}", path.display());
            fs::write(&path, &artifact.contents)
                .await
                .map_err(|e| SystemError::config_write(&path, e))?;
        }

        self.write_timesync(artifacts.timesync()).await
    }

    async fn write_timesync(&self, contents: Option<&str>) -> Result<()> {
        let path = &self.timesync_file;

        match contents {
            Some(contents) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| SystemError::config_write(parent, e))?;
                }
                log::debug!("Writing {}", path.display());
                fs::write(path, contents)
                    .await
                    .map_err(|e| SystemError::config_write(path, e))?;
            }
            None => match fs::remove_file(path).await {
                Ok(()) => log::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(SystemError::config_write(path, e).into()),
            },
        }

        Ok(())
    }
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK_DIR, DEFAULT_TIMESYNC_FILE)
    }
}
