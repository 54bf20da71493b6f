//! OSD Network Core
//!
//! Declarative description of the host network topology and the error
//! taxonomy shared by every stage of the apply pipeline.

pub mod bond;
pub mod error;
pub mod interface;
pub mod network;
pub mod types;
pub mod vlan;

pub use bond::BondConfig;
pub use error::{NetworkError, SystemError, ValidationError};
pub use interface::{InterfaceConfig, RouteConfig};
pub use network::{DnsConfig, NetworkConfig, NtpConfig, ProxyConfig};
pub use types::{AddressToken, Gateway, HwAddr};
pub use vlan::VlanConfig;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, NetworkError>;
