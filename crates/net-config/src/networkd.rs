//! systemd-networkd unit generation
//!
//! Turns a [`NetworkConfig`] into `.link`, `.netdev` and `.network` units.
//! File name prefixes fix the order networkd reads them in:
//!
//! * `00-`/`01-` rename physical links by permanent MAC
//! * `10-`/`11-`/`12-` create bridges, bonds and VLAN devices
//! * `20-`/`21-`/`22-` attach addressing and bind lower devices

use osd_network_core::{
    AddressToken, BondConfig, Gateway, HwAddr, InterfaceConfig, NetworkConfig, RouteConfig,
    VlanConfig,
};

use crate::artifact::{Artifact, ArtifactKind, ArtifactSet};
use crate::unit::UnitFile;

/// Addressing-related settings shared by interfaces, bonds and VLANs
struct Addressing<'a> {
    device: &'a str,
    addresses: &'a [AddressToken],
    routes: &'a [RouteConfig],
    pvid: Option<u16>,
}

/// Generator for systemd-networkd configuration
#[derive(Debug, Default, Clone)]
pub struct NetworkdGenerator;

impl NetworkdGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate the complete artifact set for a configuration.
    pub fn generate(&self, config: &NetworkConfig) -> ArtifactSet {
        let mut set = ArtifactSet::new();

        self.generate_links(config, &mut set);
        self.generate_netdevs(config, &mut set);
        self.generate_networks(config, &mut set);

        if !config.timeservers().is_empty() {
            set.set_timesync(self.timesync_contents(config.timeservers()));
        }

        set
    }

    fn generate_links(&self, config: &NetworkConfig, set: &mut ArtifactSet) {
        for iface in &config.interfaces {
            set.push(self.link_artifact("00", &iface.hwaddr));
        }

        for bond in &config.bonds {
            for member in &bond.members {
                set.push(self.link_artifact("01", member));
            }
        }
    }

    fn link_artifact(&self, prefix: &str, hwaddr: &HwAddr) -> Artifact {
        let mut unit = UnitFile::new();
        unit.section("Match").set("PermanentMACAddress", hwaddr);
        unit.section("Link")
            .set("NamePolicy", "")
            .set("Name", hwaddr.link_name());

        Artifact::new(
            &format!("{}-{}", prefix, hwaddr.link_name()),
            ArtifactKind::Link,
            unit.render(),
        )
    }

    fn generate_netdevs(&self, config: &NetworkConfig, set: &mut ArtifactSet) {
        for iface in &config.interfaces {
            set.push(self.bridge_netdev("10", &iface.name, &iface.hwaddr, iface.mtu));
        }

        for bond in &config.bonds {
            set.push(self.bond_netdev(bond));
            set.push(self.bridge_netdev("11", &bond.name, &bond.hwaddr, bond.mtu));
        }

        for vlan in &config.vlans {
            set.push(self.vlan_netdev(vlan));
        }
    }

    fn bridge_netdev(&self, prefix: &str, name: &str, hwaddr: &HwAddr, mtu: Option<u32>) -> Artifact {
        let mut unit = UnitFile::new();
        unit.section("NetDev")
            .set("Name", name)
            .set("Kind", "bridge")
            .set("MACAddress", hwaddr)
            .set_opt("MTUBytes", mtu);
        unit.section("Bridge").set("VLANFiltering", true);

        Artifact::new(
            &format!("{}-br{}", prefix, hwaddr.stripped()),
            ArtifactKind::Netdev,
            unit.render(),
        )
    }

    fn bond_netdev(&self, bond: &BondConfig) -> Artifact {
        let mut unit = UnitFile::new();
        unit.section("NetDev")
            .set("Name", bond.bond_device_name())
            .set("Kind", "bond")
            .set("MACAddress", bond.hwaddr)
            .set_opt("MTUBytes", bond.mtu);
        unit.section("Bond").set("Mode", &bond.mode);

        Artifact::new(
            &format!("11-{}", bond.bond_device_name()),
            ArtifactKind::Netdev,
            unit.render(),
        )
    }

    fn vlan_netdev(&self, vlan: &VlanConfig) -> Artifact {
        let mut unit = UnitFile::new();
        unit.section("NetDev")
            .set("Name", vlan.device_name())
            .set("Kind", "vlan")
            .set_opt("MTUBytes", vlan.mtu);
        unit.section("VLAN").set("Id", vlan.id);

        Artifact::new(
            &format!("12-{}", vlan.device_name()),
            ArtifactKind::Netdev,
            unit.render(),
        )
    }

    fn generate_networks(&self, config: &NetworkConfig, set: &mut ArtifactSet) {
        for iface in &config.interfaces {
            self.interface_networks(config, iface, set);
        }
        for bond in &config.bonds {
            self.bond_networks(config, bond, set);
        }
        for vlan in &config.vlans {
            let device = vlan.device_name();
            let addressing = Addressing {
                device: &device,
                addresses: &vlan.addresses,
                routes: &vlan.routes,
                pvid: None,
            };
            set.push(Artifact::new(
                &format!("22-{}", device),
                ArtifactKind::Network,
                self.addressing_contents(config, &addressing, &[]),
            ));
        }
    }

    fn interface_networks(&self, config: &NetworkConfig, iface: &InterfaceConfig, set: &mut ArtifactSet) {
        let addressing = Addressing {
            device: &iface.name,
            addresses: &iface.addresses,
            routes: &iface.routes,
            pvid: iface.vlan,
        };
        let children = self.vlan_children(config, &iface.name);
        set.push(Artifact::new(
            &format!("20-{}", iface.name),
            ArtifactKind::Network,
            self.addressing_contents(config, &addressing, &children),
        ));

        // Raw link joins the bridge carrying the logical name
        let mut unit = UnitFile::new();
        unit.section("Match").set("Name", iface.hwaddr.link_name());
        unit.section("Network")
            .set("Bridge", &iface.name)
            .set("LLDP", iface.lldp)
            .set("EmitLLDP", iface.lldp);
        set.push(Artifact::new(
            &format!("20-br{}", iface.hwaddr.stripped()),
            ArtifactKind::Network,
            unit.render(),
        ));
    }

    fn bond_networks(&self, config: &NetworkConfig, bond: &BondConfig, set: &mut ArtifactSet) {
        let bond_device = bond.bond_device_name();
        let addressing = Addressing {
            device: &bond.name,
            addresses: &bond.addresses,
            routes: &bond.routes,
            pvid: bond.vlan,
        };
        let children = self.vlan_children(config, &bond.name);
        set.push(Artifact::new(
            &format!("21-{}", bond.name),
            ArtifactKind::Network,
            self.addressing_contents(config, &addressing, &children),
        ));

        let mut unit = UnitFile::new();
        unit.section("Match").set("Name", &bond_device);
        unit.section("Network").set("Bridge", &bond.name);
        set.push(Artifact::new(
            &format!("21-br{}", bond.hwaddr.stripped()),
            ArtifactKind::Network,
            unit.render(),
        ));

        for (index, member) in bond.members.iter().enumerate() {
            let mut unit = UnitFile::new();
            unit.section("Match").set("Name", member.link_name());
            unit.section("Network")
                .set("Bond", &bond_device)
                .set("LLDP", bond.lldp)
                .set("EmitLLDP", bond.lldp);
            set.push(Artifact::new(
                &format!("21-{}-dev{}", bond_device, index),
                ArtifactKind::Network,
                unit.render(),
            ));
        }
    }

    /// VLAN devices stacked on the named interface or bond.
    fn vlan_children(&self, config: &NetworkConfig, parent: &str) -> Vec<String> {
        config
            .vlans
            .iter()
            .filter(|v| v.parent == parent)
            .map(VlanConfig::device_name)
            .collect()
    }

    fn addressing_contents(
        &self,
        config: &NetworkConfig,
        addressing: &Addressing<'_>,
        vlan_children: &[String],
    ) -> String {
        let mut unit = UnitFile::new();
        unit.section("Match").set("Name", addressing.device);
        unit.section("DHCP")
            .set("ClientIdentifier", "mac")
            .set("RouteMetric", 100)
            .set("UseMTU", true);

        let network = unit.section("Network");
        for child in vlan_children {
            network.set("VLAN", child);
        }
        if !config.search_domains().is_empty() {
            network.set("Domains", config.search_domains().join(" "));
        }
        for nameserver in config.nameservers() {
            network.set("DNS", nameserver);
        }
        for timeserver in config.timeservers() {
            network.set("NTP", timeserver);
        }

        if addressing.addresses.is_empty() {
            network
                .set("LinkLocalAddressing", "no")
                .set("ConfigureWithoutCarrier", "yes");
        } else {
            network.set("LinkLocalAddressing", "ipv6");
        }

        let mut dhcp4 = false;
        let mut dhcp6 = false;
        let mut slaac = false;
        for address in addressing.addresses {
            match address {
                AddressToken::Dhcp4 => dhcp4 = true,
                AddressToken::Dhcp6 => dhcp6 = true,
                AddressToken::Slaac => slaac = true,
                AddressToken::Static(literal) => {
                    network.set("Address", literal);
                }
            }
        }

        network.set("IPv6AcceptRA", slaac);
        let dhcp = match (dhcp4, dhcp6) {
            (true, true) => Some("yes"),
            (true, false) => Some("ipv4"),
            (false, true) => Some("ipv6"),
            (false, false) => None,
        };
        network.set_opt("DHCP", dhcp);

        for route in addressing.routes {
            let gateway = match &route.via {
                Gateway::Dhcp4 => "_dhcp4",
                Gateway::Slaac => "_ipv6ra",
                Gateway::Address(literal) => literal.as_str(),
            };
            unit.section("Route")
                .set("Gateway", gateway)
                .set("Destination", &route.to);
        }

        if let Some(pvid) = addressing.pvid {
            unit.section("BridgeVLAN")
                .set("VLAN", "1-4094")
                .set("PVID", pvid);
        }

        unit.render()
    }

    fn timesync_contents(&self, timeservers: &[String]) -> String {
        let mut unit = UnitFile::new();
        unit.section("Time").set("FallbackNTP", timeservers.join(" "));
        unit.render()
    }
}
