//! Syntax validation for network configuration
//!
//! Checks each device in isolation: naming, address literals, routes and
//! numeric ranges.

use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;

use osd_network_core::{
    AddressToken, BondConfig, Gateway, InterfaceConfig, NetworkConfig, RouteConfig, VlanConfig,
};

/// Longest device name the kernel accepts
const MAX_DEVICE_NAME_LEN: usize = 15;

/// Syntax validator for network configurations
pub struct SyntaxValidator {
    /// Valid device name pattern
    device_name_regex: Regex,
    /// Valid VLAN tag range
    vlan_tag_range: std::ops::RangeInclusive<u16>,
    /// Valid MTU range
    mtu_range: std::ops::RangeInclusive<u32>,
}

impl SyntaxValidator {
    /// Create new syntax validator
    pub fn new() -> Self {
        Self {
            device_name_regex: Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]*$")
                .expect("device name pattern is valid"),
            vlan_tag_range: 1..=4094,
            mtu_range: 68..=65535,
        }
    }

    /// Collect every syntax problem in the configuration.
    pub fn check_configuration(&self, config: &NetworkConfig) -> Vec<String> {
        let mut problems = Vec::new();

        for iface in &config.interfaces {
            self.check_interface(iface, &mut problems);
        }
        for bond in &config.bonds {
            self.check_bond(bond, &mut problems);
        }
        for vlan in &config.vlans {
            self.check_vlan(vlan, &mut problems);
        }

        problems
    }

    fn check_interface(&self, iface: &InterfaceConfig, problems: &mut Vec<String>) {
        let context = format!("interface '{}'", iface.name);
        self.check_name(&iface.name, &context, problems);
        self.check_mtu(iface.mtu, &context, problems);
        self.check_pvid(iface.vlan, &context, problems);
        self.check_addresses(&iface.addresses, &context, problems);
        self.check_routes(&iface.routes, &context, problems);
    }

    fn check_bond(&self, bond: &BondConfig, problems: &mut Vec<String>) {
        let context = format!("bond '{}'", bond.name);
        self.check_name(&bond.name, &context, problems);
        self.check_mtu(bond.mtu, &context, problems);
        self.check_pvid(bond.vlan, &context, problems);
        self.check_addresses(&bond.addresses, &context, problems);
        self.check_routes(&bond.routes, &context, problems);

        if bond.mode.trim().is_empty() {
            problems.push(format!("{}: bonding mode is required", context));
        }
        if bond.members.is_empty() {
            problems.push(format!("{}: at least one member is required", context));
        }
    }

    fn check_vlan(&self, vlan: &VlanConfig, problems: &mut Vec<String>) {
        let context = format!("vlan '{}'", vlan.name);
        self.check_name(&vlan.name, &context, problems);
        if vlan.device_name().len() > MAX_DEVICE_NAME_LEN {
            problems.push(format!(
                "{}: device name '{}' exceeds {} characters",
                context,
                vlan.device_name(),
                MAX_DEVICE_NAME_LEN
            ));
        }
        if !self.vlan_tag_range.contains(&vlan.id) {
            problems.push(format!("{}: VLAN id {} out of range 1-4094", context, vlan.id));
        }
        self.check_mtu(vlan.mtu, &context, problems);
        self.check_addresses(&vlan.addresses, &context, problems);
        self.check_routes(&vlan.routes, &context, problems);
    }

    fn check_name(&self, name: &str, context: &str, problems: &mut Vec<String>) {
        if !self.device_name_regex.is_match(name) {
            problems.push(format!("{}: invalid device name", context));
        } else if name.len() > MAX_DEVICE_NAME_LEN {
            problems.push(format!(
                "{}: name exceeds {} characters",
                context, MAX_DEVICE_NAME_LEN
            ));
        }
    }

    fn check_mtu(&self, mtu: Option<u32>, context: &str, problems: &mut Vec<String>) {
        if let Some(mtu) = mtu {
            if !self.mtu_range.contains(&mtu) {
                problems.push(format!("{}: MTU {} out of range 68-65535", context, mtu));
            }
        }
    }

    fn check_pvid(&self, pvid: Option<u16>, context: &str, problems: &mut Vec<String>) {
        if let Some(pvid) = pvid {
            if !self.vlan_tag_range.contains(&pvid) {
                problems.push(format!("{}: PVID {} out of range 1-4094", context, pvid));
            }
        }
    }

    fn check_addresses(&self, addresses: &[AddressToken], context: &str, problems: &mut Vec<String>) {
        for address in addresses {
            if let AddressToken::Static(literal) = address {
                if literal.parse::<IpNet>().is_err() {
                    problems.push(format!(
                        "{}: address '{}' is neither a CIDR nor dhcp4/dhcp6/slaac",
                        context, literal
                    ));
                }
            }
        }
    }

    fn check_routes(&self, routes: &[RouteConfig], context: &str, problems: &mut Vec<String>) {
        for route in routes {
            if route.to.parse::<IpNet>().is_err() {
                problems.push(format!(
                    "{}: route destination '{}' is not a CIDR",
                    context, route.to
                ));
            }
            if let Gateway::Address(gateway) = &route.via {
                if gateway.parse::<IpAddr>().is_err() {
                    problems.push(format!(
                        "{}: route gateway '{}' is neither an IP address nor dhcp4/slaac",
                        context, gateway
                    ));
                }
            }
        }
    }
}

impl Default for SyntaxValidator {
    fn default() -> Self {
        Self::new()
    }
}
