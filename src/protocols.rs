//! Per-protocol occurrence counts

use crate::packet::Packet;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ProtocolTally {
    counts: Mutex<HashMap<String, u64>>,
}

impl ProtocolTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every real layer of `packet`, one lock acquisition per layer.
    pub fn track(&self, packet: &Packet) {
        for layer in packet.layers.iter().filter(|l| l.is_tallied()) {
            *self
                .counts
                .lock()
                .entry(layer.name().to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn get(&self, protocol: &str) -> Option<u64> {
        self.counts.lock().get(protocol).copied()
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts.lock().clone()
    }
}
