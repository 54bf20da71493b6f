//! Physical interface configuration

use serde::{Deserialize, Serialize};

use crate::types::{nonzero, AddressToken, Gateway, HwAddr};

/// Static route attached to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Destination in CIDR notation
    pub to: String,
    /// Next hop
    pub via: Gateway,
}

impl RouteConfig {
    pub fn new(to: impl Into<String>, via: impl Into<Gateway>) -> Self {
        Self {
            to: to.into(),
            via: via.into(),
        }
    }
}

/// A physical link, bound by permanent MAC address and exposed through a
/// VLAN-filtering bridge carrying its logical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub name: String,
    pub hwaddr: HwAddr,
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
    /// Port VLAN ID of the bridge
    #[serde(
        default,
        deserialize_with = "nonzero",
        skip_serializing_if = "Option::is_none"
    )]
    pub vlan: Option<u16>,
    #[serde(default)]
    pub lldp: bool,
}

impl InterfaceConfig {
    /// Create new interface configuration
    pub fn new(name: impl Into<String>, hwaddr: HwAddr) -> Self {
        Self {
            name: name.into(),
            hwaddr,
            mtu: None,
            addresses: Vec::new(),
            routes: Vec::new(),
            vlan: None,
            lldp: false,
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

    /// Set port VLAN ID
    pub fn with_pvid(mut self, pvid: u16) -> Self {
        self.vlan = Some(pvid);
        self
    }

    /// Enable LLDP
    pub fn with_lldp(mut self, lldp: bool) -> Self {
        self.lldp = lldp;
        self
    }
}
