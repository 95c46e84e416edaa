//! Error types for the capture queue

use thiserror::Error;

/// Result type alias for queue operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The queue was built in monitor mode or has been stopped
    #[error("packet queue is not active")]
    Inactive,

    /// libpcap failed to open, read or write
    #[error("packet capture error: {0}")]
    Capture(#[from] pcap::Error),

    /// Failure reported by a non-pcap backend
    #[error("capture backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Error::Backend(msg.into())
    }
}
