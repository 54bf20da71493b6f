//! VLAN configuration

use serde::{Deserialize, Serialize};

use crate::interface::RouteConfig;
use crate::types::{nonzero, AddressToken};

/// An 802.1Q VLAN device on top of an interface or bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanConfig {
    pub name: String,
    /// Logical name of the interface or bond carrying the tagged traffic
    pub parent: String,
    /// 802.1Q tag
    pub id: u16,
    #[serde(
        default,
        deserialize_with = "nonzero",
        skip_serializing_if = "Option::is_none"
    )]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub addresses: Vec<AddressToken>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl VlanConfig {
    /// Create new VLAN configuration
    pub fn new(name: impl Into<String>, parent: impl Into<String>, id: u16) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            id,
            mtu: None,
            addresses: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Add an address token
    pub fn with_address(mut self, address: impl Into<AddressToken>) -> Self {
        self.addresses.push(address.into());
        self
    }

    /// Add a route
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Set MTU
    pub fn with_mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Name of the kernel VLAN device.
    pub fn device_name(&self) -> String {
        format!("vl{}", self.name)
    }
}
