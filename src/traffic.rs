//! Per-host byte accounting

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;

/// Bytes attributed to one host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Traffic {
    pub sent: u64,
    pub received: u64,
}

impl Traffic {
    pub fn total(&self) -> u64 {
        self.sent + self.received
    }
}

/// Host address (string form) to [`Traffic`]. Entries are created on first
/// sight and never removed.
#[derive(Debug, Default)]
pub struct TrafficTable {
    hosts: Mutex<HashMap<String, Traffic>>,
}

impl TrafficTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `size` bytes to the host's sent counter when `is_sent`, otherwise to
    /// its received counter.
    pub fn record(&self, address: IpAddr, size: u64, is_sent: bool) {
        let mut hosts = self.hosts.lock();
        let entry = hosts.entry(address.to_string()).or_default();
        if is_sent {
            entry.sent += size;
        } else {
            entry.received += size;
        }
    }

    pub fn get(&self, address: &str) -> Option<Traffic> {
        self.hosts.lock().get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.hosts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.lock().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<String, Traffic> {
        self.hosts.lock().clone()
    }
}
