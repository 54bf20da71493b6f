//! Bond configuration

use serde::{Deserialize, Serialize};

use crate::interface::RouteConfig;
use crate::types::{nonzero, AddressToken, HwAddr};

/// A bond of physical links, exposed through a VLAN-filtering bridge carrying
/// its logical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondConfig {
    pub name: String,
    /// Address of the bond device itself
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
    #[serde(
        default,
        deserialize_with = "nonzero",
        skip_serializing_if = "Option::is_none"
    )]
    pub vlan: Option<u16>,
    #[serde(default)]
    pub lldp: bool,
    /// Bonding policy, handed to the kernel verbatim
    pub mode: String,
    /// Permanent addresses of the member links
    #[serde(default)]
    pub members: Vec<HwAddr>,
}

impl BondConfig {
    /// Create new bond configuration
    pub fn new(name: impl Into<String>, hwaddr: HwAddr, mode: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hwaddr,
            mtu: None,
            addresses: Vec::new(),
            routes: Vec::new(),
            vlan: None,
            lldp: false,
            mode: mode.into(),
            members: Vec::new(),
        }
    }

    /// Add a member link
    pub fn with_member(mut self, member: HwAddr) -> Self {
        self.members.push(member);
        self
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

    /// Enable LLDP on the members
    pub fn with_lldp(mut self, lldp: bool) -> Self {
        self.lldp = lldp;
        self
    }

    /// Name of the kernel bond device enslaving the members.
    pub fn bond_device_name(&self) -> String {
        format!("bn{}", self.hwaddr.stripped())
    }
}
