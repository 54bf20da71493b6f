//! OSD Network CLI
//!
//! Entry points for the network daemon and the command-line tools that
//! render, validate and apply network configurations.

pub mod commands;
pub mod settings;

#[cfg(test)]
mod tests;

pub use settings::DaemonSettings;
