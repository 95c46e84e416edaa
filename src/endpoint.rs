//! Capture interface descriptor

use ipnetwork::Ipv4Network;
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// Hardware (MAC) address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The interface a queue captures on: its name, own address and subnet.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    /// Address assigned to the interface
    pub ip: Ipv4Addr,
    /// Subnet the interface belongs to
    pub network: Ipv4Network,
    pub mac: Option<MacAddr>,
    /// Passive monitor mode; live capture and injection are disabled
    pub monitor: bool,
}

impl Endpoint {
    /// `network` carries the interface address together with its prefix,
    /// e.g. `192.168.1.5/24`.
    pub fn new<S: Into<String>>(name: S, network: Ipv4Network) -> Self {
        Self {
            name: name.into(),
            ip: network.ip(),
            network,
            mac: None,
            monitor: false,
        }
    }

    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.mac = Some(mac);
        self
    }

    pub fn with_monitor(mut self, monitor: bool) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn is_monitor(&self) -> bool {
        self.monitor
    }

    /// IPv4 subnet membership. IPv6 addresses never match.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(v4) => self.network.contains(v4),
            IpAddr::V6(_) => false,
        }
    }

    pub fn is_own_address(&self, addr: IpAddr) -> bool {
        addr == IpAddr::V4(self.ip)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.ip, self.network.prefix())?;
        if self.monitor {
            write!(f, " [monitor]")?;
        }
        Ok(())
    }
}
