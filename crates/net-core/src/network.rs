//! Root network configuration aggregate

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bond::BondConfig;
use crate::interface::InterfaceConfig;
use crate::vlan::VlanConfig;
use crate::Result;

/// Host naming and resolver settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub search_domains: Vec<String>,
    #[serde(default)]
    pub nameservers: Vec<String>,
}

/// Time servers handed to every network and to the time-sync service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NtpConfig {
    #[serde(default)]
    pub timeservers: Vec<String>,
}

/// Proxy environment overrides, applied or cleared as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyConfig {
    pub variables: BTreeMap<String, String>,
}

impl ProxyConfig {
    pub fn new(variables: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            variables: variables.into_iter().collect(),
        }
    }
}

/// Desired network state of the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
    #[serde(default)]
    pub bonds: Vec<BondConfig>,
    #[serde(default)]
    pub vlans: Vec<VlanConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntp: Option<NtpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl NetworkConfig {
    /// True when no interface, bond or VLAN is defined.
    pub fn has_no_devices(&self) -> bool {
        self.interfaces.is_empty() && self.bonds.is_empty() && self.vlans.is_empty()
    }

    /// Fully qualified hostname, or an empty string when none is configured.
    pub fn hostname(&self) -> String {
        match &self.dns {
            Some(dns) if !dns.hostname.is_empty() => {
                if dns.domain.is_empty() {
                    dns.hostname.clone()
                } else {
                    format!("{}.{}", dns.hostname, dns.domain)
                }
            }
            _ => String::new(),
        }
    }

    /// Configured time servers, empty when NTP is unset.
    pub fn timeservers(&self) -> &[String] {
        self.ntp
            .as_ref()
            .map(|ntp| ntp.timeservers.as_slice())
            .unwrap_or(&[])
    }

    /// Search domains, empty when DNS is unset.
    pub fn search_domains(&self) -> &[String] {
        self.dns
            .as_ref()
            .map(|dns| dns.search_domains.as_slice())
            .unwrap_or(&[])
    }

    /// Name servers, empty when DNS is unset.
    pub fn nameservers(&self) -> &[String] {
        self.dns
            .as_ref()
            .map(|dns| dns.nameservers.as_slice())
            .unwrap_or(&[])
    }

    /// Overlay a partial JSON document onto a copy of this configuration.
    ///
    /// Objects merge member by member, arrays and scalars replace the current
    /// value, and `null` drops the member.
    pub fn merge_patch(&self, patch: &Value) -> Result<NetworkConfig> {
        let mut merged = serde_json::to_value(self)?;
        merge_json(&mut merged, patch);
        Ok(serde_json::from_value(merged)?)
    }
}

fn merge_json(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(key);
                } else {
                    merge_json(target.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}
