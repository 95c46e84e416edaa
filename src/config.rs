//! Capture configuration

/// Snapshot length (maximum bytes kept per captured packet)
pub const DEFAULT_SNAPLEN: i32 = 1024;

/// How often a blocked read wakes up to notice a closed handle (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 500;

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub snaplen: i32,
    pub promiscuous: bool,
    pub read_timeout_ms: i32,
    /// Activity channel capacity; 0 is a rendezvous hand-off
    pub activity_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            promiscuous: true,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            activity_capacity: 0,
        }
    }
}
