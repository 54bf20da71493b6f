//! Render command
//!
//! Shows the systemd-networkd artifacts a configuration produces, without
//! touching the host.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use osd_network_config::{ArtifactSet, ArtifactWriter, NetworkdGenerator};
use osd_network_validate::NetworkValidator;

use super::read_config;

/// Name of the time-sync drop-in inside a render output directory
pub const TIMESYNC_FILE_NAME: &str = "timesyncd.conf";

pub struct RenderCommand {
    generator: NetworkdGenerator,
    validator: NetworkValidator,
}

impl RenderCommand {
    pub fn new() -> Self {
        Self {
            generator: NetworkdGenerator::new(),
            validator: NetworkValidator::new(),
        }
    }

    /// Render `config_path`, printing the artifacts or writing them into
    /// `output`.
    pub async fn execute(&self, config_path: &Path, output: Option<&Path>) -> Result<()> {
        let artifacts = self.generate(config_path)?;

        match output {
            Some(dir) => {
                let writer = ArtifactWriter::new(dir, dir.join(TIMESYNC_FILE_NAME));
                writer
                    .write(&artifacts)
                    .await
                    .with_context(|| format!("Failed to write artifacts to {}", dir.display()))?;
                println!("Wrote {} artifacts to {}", artifacts.len(), dir.display());
            }
            None => print!("{}", Self::format(&artifacts)),
        }

        Ok(())
    }

    pub fn generate(&self, config_path: &Path) -> Result<ArtifactSet> {
        let config = read_config(config_path)?;
        self.validator
            .validate(&config)
            .with_context(|| "Semantic validation failed")?;
        Ok(self.generator.generate(&config))
    }

    /// Listing of every artifact in name order, each under a `# <name>`
    /// header.
    pub fn format(artifacts: &ArtifactSet) -> String {
        let mut out = String::new();

        for name in artifacts.sorted_names() {
            if let Some(artifact) = artifacts.get(name) {
                let _ = writeln!(out, "# {}\n{}", name, artifact.contents);
            }
        }
        if let Some(timesync) = artifacts.timesync() {
            let _ = writeln!(out, "# {}\n{}", TIMESYNC_FILE_NAME, timesync);
        }

        out
    }
}

impl Default for RenderCommand {
    fn default() -> Self {
        Self::new()
    }
}
