//! Live packet capture/egress queue.
//!
//! A [`Queue`] opens a live session on one interface, counts every captured
//! packet per protocol, tracks bytes sent and received per local-subnet host,
//! hands each captured packet to an optional callback and publishes an
//! [`Activity`] for every host it classifies. The same queue injects raw frames
//! back onto the wire.
//!
//! ```no_run
//! use sniffq::{Endpoint, Queue};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let iface = Endpoint::new("eth0", "192.168.1.5/24".parse()?);
//! let queue = Queue::new(iface)?;
//!
//! let activities = queue.activities();
//! std::thread::spawn(move || {
//!     for activity in activities {
//!         println!("{} via {}", activity.address, activity.hardware_address);
//!     }
//! });
//!
//! queue.send(&[0xff; 60])?;
//! queue.stop();
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod backend;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod packet;
pub mod protocols;
pub mod queue;
pub mod stats;
pub mod traffic;

pub use activity::Activity;
pub use backend::{Backend, CaptureHandle, PacketSource, PcapBackend, Session};
pub use config::CaptureConfig;
pub use endpoint::{Endpoint, MacAddr};
pub use error::{Error, Result};
pub use models::{ActivityRecord, QueueSnapshot};
pub use packet::{Layer, Packet};
pub use protocols::ProtocolTally;
pub use queue::{PacketCallback, Queue};
pub use stats::{Stats, StatsRegistry};
pub use traffic::{Traffic, TrafficTable};
