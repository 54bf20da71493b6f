//! Validate command

use std::path::Path;

use anyhow::{Context, Result};
use osd_network_validate::NetworkValidator;

use super::read_config;

pub struct ValidateCommand {
    validator: NetworkValidator,
}

impl ValidateCommand {
    pub fn new() -> Self {
        Self {
            validator: NetworkValidator::new(),
        }
    }

    pub fn execute(&self, config_path: &Path) -> Result<()> {
        println!("Validating network configuration: {}", config_path.display());

        let config = read_config(config_path)?;
        println!("✓ Syntax validation passed");

        self.validator
            .validate(&config)
            .with_context(|| "Semantic validation failed")?;
        println!("✓ Semantic validation passed");

        println!("Configuration is valid");
        Ok(())
    }
}

impl Default for ValidateCommand {
    fn default() -> Self {
        Self::new()
    }
}
