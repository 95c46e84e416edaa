//! Per-host activity events and the channel that carries them

use crate::endpoint::MacAddr;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;
use std::net::IpAddr;

/// A classified packet seen for a host on the local subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub address: IpAddr,
    /// Source MAC of the frame that produced this event
    pub hardware_address: MacAddr,
    /// True when `address` was the packet source
    pub is_source_side: bool,
}

/// Create the activity channel.
///
/// A capacity of zero is a rendezvous channel: every publish blocks until a
/// consumer takes the event. Larger capacities add slack but still block when
/// full; events are never dropped.
pub fn channel(capacity: usize) -> (Sender<Activity>, Receiver<Activity>) {
    bounded(capacity)
}
