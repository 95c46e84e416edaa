//! Decoded packets and the etherparse-backed frame decoder

use crate::endpoint::MacAddr;
use etherparse::{EtherType, LaxNetSlice, LaxSlicedPacket, LinkSlice, TransportSlice, VlanSlice};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// One decoded protocol layer, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    Ethernet { source: MacAddr, destination: MacAddr },
    Dot1Q,
    Arp,
    Ipv4 { source: Ipv4Addr, destination: Ipv4Addr },
    Ipv6 { source: Ipv6Addr, destination: Ipv6Addr },
    Tcp { source_port: u16, destination_port: u16 },
    Udp { source_port: u16, destination_port: u16 },
    Icmpv4,
    Icmpv6,
    /// Undecoded application bytes
    Payload(usize),
    /// The decoder gave up; any bytes after the previous layer are opaque
    DecodeFailure,
}

impl Layer {
    /// Name used as the protocol tally key.
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Ethernet { .. } => "Ethernet",
            Layer::Dot1Q => "Dot1Q",
            Layer::Arp => "ARP",
            Layer::Ipv4 { .. } => "IPv4",
            Layer::Ipv6 { .. } => "IPv6",
            Layer::Tcp { .. } => "TCP",
            Layer::Udp { .. } => "UDP",
            Layer::Icmpv4 => "ICMPv4",
            Layer::Icmpv6 => "ICMPv6",
            Layer::Payload(_) => "Payload",
            Layer::DecodeFailure => "DecodeFailure",
        }
    }

    /// Payload and decode failures are pseudo-layers and are never tallied.
    pub fn is_tallied(&self) -> bool {
        !matches!(self, Layer::Payload(_) | Layer::DecodeFailure)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A captured frame together with its decoded layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Vec<u8>,
    pub layers: Vec<Layer>,
}

impl Packet {
    /// Build a packet from already decoded layers.
    pub fn new(data: Vec<u8>, layers: Vec<Layer>) -> Self {
        Self { data, layers }
    }

    /// Decode an Ethernet II frame.
    pub fn decode(data: Vec<u8>) -> Self {
        let layers = decode_layers(&data);
        Self { data, layers }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Source and destination MAC of the first Ethernet layer.
    pub fn ethernet(&self) -> Option<(MacAddr, MacAddr)> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Ethernet { source, destination } => Some((*source, *destination)),
            _ => None,
        })
    }

    /// Source and destination address of the first IPv4 layer.
    pub fn ipv4(&self) -> Option<(Ipv4Addr, Ipv4Addr)> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Ipv4 { source, destination } => Some((*source, *destination)),
            _ => None,
        })
    }
}

/// Decodes as far as the captured bytes allow. Frames cut short by the
/// snapshot length keep every header that was fully captured and end with
/// `DecodeFailure`.
fn decode_layers(data: &[u8]) -> Vec<Layer> {
    let mut layers = Vec::with_capacity(4);

    let sliced = match LaxSlicedPacket::from_ethernet(data) {
        Ok(sliced) => sliced,
        Err(_) => return vec![Layer::DecodeFailure],
    };

    let outer_type = match &sliced.link {
        Some(LinkSlice::Ethernet2(eth)) => {
            layers.push(Layer::Ethernet {
                source: MacAddr(eth.source()),
                destination: MacAddr(eth.destination()),
            });
            eth.ether_type()
        }
        _ => {
            layers.push(Layer::DecodeFailure);
            return layers;
        }
    };

    // ether type of the innermost header before the network layer
    let ether_type = match &sliced.vlan {
        Some(VlanSlice::SingleVlan(vlan)) => {
            layers.push(Layer::Dot1Q);
            vlan.ether_type()
        }
        Some(VlanSlice::DoubleVlan(vlan)) => {
            layers.push(Layer::Dot1Q);
            layers.push(Layer::Dot1Q);
            vlan.inner().ether_type()
        }
        None => outer_type,
    };

    let mut truncated = sliced.stop_err.is_some();
    match &sliced.net {
        Some(LaxNetSlice::Ipv4(ipv4)) => {
            let header = ipv4.header();
            layers.push(Layer::Ipv4 {
                source: header.source_addr(),
                destination: header.destination_addr(),
            });
            truncated |= ipv4.payload().incomplete;
        }
        Some(LaxNetSlice::Ipv6(ipv6)) => {
            let header = ipv6.header();
            layers.push(Layer::Ipv6 {
                source: header.source_addr(),
                destination: header.destination_addr(),
            });
            truncated |= ipv6.payload().incomplete;
        }
        #[allow(unreachable_patterns)]
        Some(_) => truncated = true,
        None if ether_type == EtherType::ARP => layers.push(Layer::Arp),
        None => {}
    }

    let payload = match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => {
            layers.push(Layer::Tcp {
                source_port: tcp.source_port(),
                destination_port: tcp.destination_port(),
            });
            tcp.payload().len()
        }
        Some(TransportSlice::Udp(udp)) => {
            layers.push(Layer::Udp {
                source_port: udp.source_port(),
                destination_port: udp.destination_port(),
            });
            udp.payload().len()
        }
        Some(TransportSlice::Icmpv4(_)) => {
            layers.push(Layer::Icmpv4);
            0
        }
        Some(TransportSlice::Icmpv6(_)) => {
            layers.push(Layer::Icmpv6);
            0
        }
        #[allow(unreachable_patterns)]
        Some(_) => 0,
        None => 0,
    };

    if payload > 0 {
        layers.push(Layer::Payload(payload));
    }
    if truncated {
        layers.push(Layer::DecodeFailure);
    }

    layers
}
