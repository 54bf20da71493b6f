//! OSD Network Configuration
//!
//! Compiles a declarative network description into systemd-networkd and
//! systemd-timesyncd configuration and installs it on disk.

pub mod artifact;
pub mod networkd;
pub mod unit;
pub mod writer;

#[cfg(test)]
mod tests;

pub use artifact::{Artifact, ArtifactKind, ArtifactSet};
pub use networkd::NetworkdGenerator;
pub use writer::{ArtifactWriter, DEFAULT_NETWORK_DIR, DEFAULT_TIMESYNC_FILE};
