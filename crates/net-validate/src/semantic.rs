//! Semantic validation for network configurations
//!
//! Checks relationships between devices: uniqueness and VLAN parents.

use std::collections::{HashMap, HashSet};

use osd_network_core::{HwAddr, NetworkConfig};

/// Semantic validator for network configurations
pub struct SemanticValidator {}

impl SemanticValidator {
    /// Create new semantic validator
    pub fn new() -> Self {
        Self {}
    }

    /// Collect every semantic problem in the configuration.
    pub fn check_configuration(&self, config: &NetworkConfig) -> Vec<String> {
        let mut problems = Vec::new();

        self.check_unique_names(config, &mut problems);
        self.check_unique_hwaddrs(config, &mut problems);
        self.check_vlan_parents(config, &mut problems);

        problems
    }

    /// Interfaces, bonds and VLANs share one namespace with the `vl<name>`
    /// devices created for VLANs.
    fn check_unique_names(&self, config: &NetworkConfig, problems: &mut Vec<String>) {
        let mut seen = HashSet::new();
        let names = config
            .interfaces
            .iter()
            .map(|i| i.name.clone())
            .chain(config.bonds.iter().map(|b| b.name.clone()))
            .chain(config.vlans.iter().map(|v| v.name.clone()))
            .chain(config.vlans.iter().map(|v| v.device_name()));

        for name in names {
            if seen.contains(&name) {
                problems.push(format!("duplicate device name '{}'", name));
            } else {
                seen.insert(name);
            }
        }
    }

    fn check_unique_hwaddrs(&self, config: &NetworkConfig, problems: &mut Vec<String>) {
        let mut owners: HashMap<HwAddr, String> = HashMap::new();
        let mut claim = |hwaddr: &HwAddr, owner: String| {
            if let Some(previous) = owners.get(hwaddr) {
                problems.push(format!(
                    "hardware address {} used by both {} and {}",
                    hwaddr, previous, owner
                ));
            } else {
                owners.insert(*hwaddr, owner);
            }
        };

        for iface in &config.interfaces {
            claim(&iface.hwaddr, format!("interface '{}'", iface.name));
        }
        for bond in &config.bonds {
            for member in &bond.members {
                claim(member, format!("a member of bond '{}'", bond.name));
            }
            // A bond may take the address of one of its own members
            if !bond.members.contains(&bond.hwaddr) {
                claim(&bond.hwaddr, format!("bond '{}'", bond.name));
            }
        }
    }

    fn check_vlan_parents(&self, config: &NetworkConfig, problems: &mut Vec<String>) {
        let parents: HashSet<&str> = config
            .interfaces
            .iter()
            .map(|i| i.name.as_str())
            .chain(config.bonds.iter().map(|b| b.name.as_str()))
            .collect();
        let mut tags = HashSet::new();

        for vlan in &config.vlans {
            if !parents.contains(vlan.parent.as_str()) {
                problems.push(format!(
                    "vlan '{}': parent '{}' is not a configured interface or bond",
                    vlan.name, vlan.parent
                ));
            }
            if !tags.insert((vlan.parent.as_str(), vlan.id)) {
                problems.push(format!(
                    "vlan '{}': tag {} already defined on '{}'",
                    vlan.name, vlan.id, vlan.parent
                ));
            }
        }
    }
}

impl Default for SemanticValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osd_network_core::{BondConfig, InterfaceConfig, VlanConfig};

    fn mac(s: &str) -> HwAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_duplicate_names_across_categories() {
        let config = NetworkConfig {
            interfaces: vec![InterfaceConfig::new("uplink", mac("aa:bb:cc:dd:ee:01"))],
            bonds: vec![BondConfig::new("uplink", mac("aa:bb:cc:dd:ee:02"), "802.3ad")
                .with_member(mac("aa:bb:cc:dd:ee:03"))],
            ..Default::default()
        };

        let problems = SemanticValidator::new().check_configuration(&config);
        assert_eq!(problems, vec!["duplicate device name 'uplink'".to_string()]);
    }

    #[test]
    fn test_member_reuses_interface_hwaddr() {
        let config = NetworkConfig {
            interfaces: vec![InterfaceConfig::new("uplink", mac("aa:bb:cc:dd:ee:01"))],
            bonds: vec![BondConfig::new("bond0", mac("aa:bb:cc:dd:ee:02"), "active-backup")
                .with_member(mac("AA:BB:CC:DD:EE:01"))],
            ..Default::default()
        };

        let problems = SemanticValidator::new().check_configuration(&config);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("aa:bb:cc:dd:ee:01"));
    }

    #[test]
    fn test_vlan_parents() {
        let config = NetworkConfig {
            interfaces: vec![InterfaceConfig::new("uplink", mac("aa:bb:cc:dd:ee:01"))],
            vlans: vec![
                VlanConfig::new("mgmt", "uplink", 10),
                VlanConfig::new("mgmt2", "uplink", 10),
                VlanConfig::new("storage", "missing", 20),
            ],
            ..Default::default()
        };

        let problems = SemanticValidator::new().check_configuration(&config);
        assert_eq!(problems.len(), 2, "{:?}", problems);
        assert!(problems.iter().any(|p| p.contains("tag 10")));
        assert!(problems.iter().any(|p| p.contains("'missing'")));
    }

    #[test]
    fn test_bond_may_reuse_own_member_hwaddr() {
        let config = NetworkConfig {
            bonds: vec![BondConfig::new("bond0", mac("aa:bb:cc:dd:ee:03"), "802.3ad")
                .with_member(mac("aa:bb:cc:dd:ee:03"))
                .with_member(mac("aa:bb:cc:dd:ee:04"))],
            ..Default::default()
        };
        assert!(SemanticValidator::new().check_configuration(&config).is_empty());

        // Another bond's member is still a conflict
        let config = NetworkConfig {
            bonds: vec![
                BondConfig::new("bond0", mac("aa:bb:cc:dd:ee:03"), "802.3ad")
                    .with_member(mac("aa:bb:cc:dd:ee:03")),
                BondConfig::new("bond1", mac("aa:bb:cc:dd:ee:03"), "802.3ad")
                    .with_member(mac("aa:bb:cc:dd:ee:05")),
            ],
            ..Default::default()
        };
        let problems = SemanticValidator::new().check_configuration(&config);
        assert_eq!(problems.len(), 1, "{:?}", problems);
        assert!(problems[0].contains("bond 'bond1'"));
    }

    #[test]
    fn test_vlan_device_name_collides_with_interface() {
        let config = NetworkConfig {
            interfaces: vec![
                InterfaceConfig::new("uplink", mac("aa:bb:cc:dd:ee:01")),
                InterfaceConfig::new("vlmgmt", mac("aa:bb:cc:dd:ee:02")),
            ],
            vlans: vec![VlanConfig::new("mgmt", "uplink", 10)],
            ..Default::default()
        };

        let problems = SemanticValidator::new().check_configuration(&config);
        assert_eq!(problems, vec!["duplicate device name 'vlmgmt'".to_string()]);
    }
}
