//! Capture and injection counters

use parking_lot::Mutex;
use serde::Serialize;

/// Point-in-time copy of the queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Bytes successfully injected
    pub sent: u64,
    /// Bytes captured
    pub received: u64,
    /// Packets captured
    pub pkt_received: u64,
    /// Failed injections
    pub errors: u64,
}

/// The four counters behind their own lock, independent of the queue state lock.
///
/// Counters only ever grow; there is no reset.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    inner: Mutex<Stats>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a captured packet of `size` bytes
    pub fn record_received(&self, size: u64) {
        let mut stats = self.inner.lock();
        stats.pkt_received += 1;
        stats.received += size;
    }

    /// Record a successful injection of `size` bytes
    pub fn record_sent(&self, size: u64) {
        self.inner.lock().sent += size;
    }

    pub fn record_error(&self) {
        self.inner.lock().errors += 1;
    }

    pub fn snapshot(&self) -> Stats {
        *self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stats_start_at_zero() {
        assert_eq!(StatsRegistry::new().snapshot(), Stats::default());
    }

    #[test]
    fn test_record_received() {
        let registry = StatsRegistry::new();
        registry.record_received(64);
        registry.record_received(128);

        let stats = registry.snapshot();
        assert_eq!(stats.pkt_received, 2);
        assert_eq!(stats.received, 192);
        assert_eq!(stats.sent, 0);
    }

    #[test]
    fn test_sent_and_errors_are_independent() {
        let registry = StatsRegistry::new();
        registry.record_sent(42);
        registry.record_error();

        let stats = registry.snapshot();
        assert_eq!(stats.sent, 42);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.pkt_received, 0);
    }

    #[test]
    fn test_registry_thread_safety() {
        let registry = Arc::new(StatsRegistry::new());
        let clone = Arc::clone(&registry);

        let handle = thread::spawn(move || {
            for _ in 0..100 {
                clone.record_received(64);
            }
        });
        for _ in 0..100 {
            registry.record_received(64);
        }
        handle.join().unwrap();

        let stats = registry.snapshot();
        assert_eq!(stats.pkt_received, 200);
        assert_eq!(stats.received, 12800);
    }
}
