//! Core network types and data structures

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use mac_address::MacAddress;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Permanent hardware address of a link.
///
/// Always rendered in lower-case colon notation regardless of how it was
/// written in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwAddr(pub MacAddress);

impl Hash for HwAddr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.bytes().hash(state);
    }
}

impl HwAddr {
    /// Lower-case hex digits without separators, as used in derived device
    /// and file names.
    pub fn stripped(&self) -> String {
        self.0.bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Name given to the physical link carrying this address.
    pub fn link_name(&self) -> String {
        format!("en{}", self.stripped())
    }
}

impl fmt::Display for HwAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0.bytes();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for HwAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<MacAddress>()
            .map(HwAddr)
            .map_err(|_| format!("invalid MAC address: {}", s))
    }
}

struct HwAddrVisitor;

impl<'de> serde::de::Visitor<'de> for HwAddrVisitor {
    type Value = HwAddr;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a MAC address string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse::<HwAddr>().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for HwAddr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(HwAddrVisitor)
    }
}

impl Serialize for HwAddr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One entry of a device's `addresses` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AddressToken {
    /// DHCPv4 client
    Dhcp4,
    /// DHCPv6 client
    Dhcp6,
    /// IPv6 stateless autoconfiguration from router advertisements
    Slaac,
    /// Literal address in CIDR notation, emitted verbatim
    Static(String),
}

impl From<&str> for AddressToken {
    fn from(s: &str) -> Self {
        match s {
            "dhcp4" => AddressToken::Dhcp4,
            "dhcp6" => AddressToken::Dhcp6,
            "slaac" => AddressToken::Slaac,
            other => AddressToken::Static(other.to_string()),
        }
    }
}

impl From<String> for AddressToken {
    fn from(s: String) -> Self {
        match s.as_str() {
            "dhcp4" | "dhcp6" | "slaac" => AddressToken::from(s.as_str()),
            _ => AddressToken::Static(s),
        }
    }
}

impl From<AddressToken> for String {
    fn from(token: AddressToken) -> Self {
        token.to_string()
    }
}

impl fmt::Display for AddressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressToken::Dhcp4 => f.write_str("dhcp4"),
            AddressToken::Dhcp6 => f.write_str("dhcp6"),
            AddressToken::Slaac => f.write_str("slaac"),
            AddressToken::Static(addr) => f.write_str(addr),
        }
    }
}

/// Next hop of a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gateway {
    /// Gateway learned through DHCPv4
    Dhcp4,
    /// Gateway learned from IPv6 router advertisements
    Slaac,
    /// Literal gateway address
    Address(String),
}

impl From<&str> for Gateway {
    fn from(s: &str) -> Self {
        match s {
            "dhcp4" => Gateway::Dhcp4,
            "slaac" => Gateway::Slaac,
            other => Gateway::Address(other.to_string()),
        }
    }
}

impl From<String> for Gateway {
    fn from(s: String) -> Self {
        match s.as_str() {
            "dhcp4" | "slaac" => Gateway::from(s.as_str()),
            _ => Gateway::Address(s),
        }
    }
}

impl From<Gateway> for String {
    fn from(gateway: Gateway) -> Self {
        gateway.to_string()
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gateway::Dhcp4 => f.write_str("dhcp4"),
            Gateway::Slaac => f.write_str("slaac"),
            Gateway::Address(addr) => f.write_str(addr),
        }
    }
}

/// Deserialize an optional number where `0` means "unset".
pub(crate) fn nonzero<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default + PartialEq,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.filter(|v| *v != T::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hwaddr_parsing() {
        let mac: HwAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(mac.stripped(), "aabbccddeeff");
        assert_eq!(mac.link_name(), "enaabbccddeeff");

        assert!("aa:bb:cc".parse::<HwAddr>().is_err());
        assert!("not-a-mac".parse::<HwAddr>().is_err());
    }

    #[test]
    fn test_hwaddr_serde() {
        let mac: HwAddr = serde_json::from_str("\"00:11:22:33:44:5A\"").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"00:11:22:33:44:5a\"");
        assert!(serde_json::from_str::<HwAddr>("\"00:11\"").is_err());
    }

    #[test]
    fn test_address_tokens() {
        assert_eq!(AddressToken::from("dhcp4"), AddressToken::Dhcp4);
        assert_eq!(AddressToken::from("dhcp6"), AddressToken::Dhcp6);
        assert_eq!(AddressToken::from("slaac"), AddressToken::Slaac);
        assert_eq!(
            AddressToken::from("10.0.0.1/8"),
            AddressToken::Static("10.0.0.1/8".to_string())
        );

        let tokens: Vec<AddressToken> =
            serde_json::from_str(r#"["dhcp4","2001:db8::1/64"]"#).unwrap();
        assert_eq!(tokens[0], AddressToken::Dhcp4);
        assert_eq!(
            serde_json::to_string(&tokens).unwrap(),
            r#"["dhcp4","2001:db8::1/64"]"#
        );
    }

    #[test]
    fn test_gateway_tokens() {
        assert_eq!(Gateway::from("dhcp4"), Gateway::Dhcp4);
        assert_eq!(Gateway::from("slaac"), Gateway::Slaac);
        // dhcp6 has no gateway of its own
        assert_eq!(Gateway::from("dhcp6"), Gateway::Address("dhcp6".to_string()));
    }
}
