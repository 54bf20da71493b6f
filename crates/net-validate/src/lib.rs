//! OSD Network Validation
//!
//! Syntax and semantic checks run on a desired configuration before any
//! artifact is generated or any host state is touched.

pub mod semantic;
pub mod syntax;

pub use crate::syntax::SyntaxValidator;
pub use semantic::SemanticValidator;

use osd_network_core::{NetworkConfig, NetworkError, ValidationError};

/// Comprehensive network configuration validator
pub struct NetworkValidator {
    syntax_validator: SyntaxValidator,
    semantic_validator: SemanticValidator,
}

impl NetworkValidator {
    /// Create new network validator
    pub fn new() -> Self {
        Self {
            syntax_validator: SyntaxValidator::new(),
            semantic_validator: SemanticValidator::new(),
        }
    }

    /// Validate configuration with all validators.
    ///
    /// A configuration without any device is rejected outright; otherwise
    /// every syntax and semantic problem is reported in a single error.
    pub fn validate(&self, config: &NetworkConfig) -> Result<(), NetworkError> {
        if config.has_no_devices() {
            return Err(ValidationError::NoDevices.into());
        }

        let mut problems = self.syntax_validator.check_configuration(config);
        problems.extend(self.semantic_validator.check_configuration(config));

        if !problems.is_empty() {
            log::warn!(
                "Network configuration rejected with {} problem(s)",
                problems.len()
            );
            return Err(ValidationError::Invalid { problems }.into());
        }

        log::debug!("Network configuration validation passed");
        Ok(())
    }
}

impl Default for NetworkValidator {
    fn default() -> Self {
        Self::new()
    }
}
