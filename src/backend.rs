//! Capture/injection backends
//!
//! A live session is split in two: the [`PacketSource`] is moved into the
//! capture worker, the [`CaptureHandle`] stays with the queue for injection and
//! shutdown. Closing the handle ends the source.

use crate::config::CaptureConfig;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::packet::Packet;
use parking_lot::Mutex;
use pcap::{Active, Capture, Linktype};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Blocking stream of decoded packets.
pub trait PacketSource: Send {
    /// Wait for the next packet. `None` once the session is closed or the
    /// capture ended.
    fn next_packet(&mut self) -> Option<Packet>;
}

/// Write/close half of a live session.
pub trait CaptureHandle: Send + Sync {
    fn write_packet_data(&mut self, raw: &[u8]) -> Result<()>;

    /// Close the session. Calling it again has no effect.
    fn close(&mut self);
}

pub struct Session {
    pub source: Box<dyn PacketSource>,
    pub handle: Box<dyn CaptureHandle>,
}

/// Opens live sessions on an interface.
pub trait Backend {
    fn open_live(&self, iface: &Endpoint, config: &CaptureConfig) -> Result<Session>;
}

/// libpcap backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PcapBackend;

impl Backend for PcapBackend {
    fn open_live(&self, iface: &Endpoint, config: &CaptureConfig) -> Result<Session> {
        let reader = create_capture(&iface.name, config)?;
        if reader.get_datalink() != Linktype::ETHERNET {
            warn!(
                "{} is not an Ethernet link ({:?}), frames will not decode",
                iface.name,
                reader.get_datalink()
            );
        }
        let writer = create_capture(&iface.name, config)?;

        info!(
            "Opened live capture on {} (snaplen {}, promisc {})",
            iface.name, config.snaplen, config.promiscuous
        );

        let closed = Arc::new(AtomicBool::new(false));
        Ok(Session {
            source: Box::new(PcapSource {
                capture: reader,
                closed: Arc::clone(&closed),
            }),
            handle: Box::new(PcapHandle {
                writer: Mutex::new(Some(writer)),
                closed,
            }),
        })
    }
}

fn create_capture(name: &str, config: &CaptureConfig) -> Result<Capture<Active>> {
    let capture = Capture::from_device(name)?
        .promisc(config.promiscuous)
        .snaplen(config.snaplen)
        .timeout(config.read_timeout_ms)
        .immediate_mode(true)
        .open()?;
    Ok(capture)
}

struct PcapSource {
    capture: Capture<Active>,
    closed: Arc<AtomicBool>,
}

impl PacketSource for PcapSource {
    fn next_packet(&mut self) -> Option<Packet> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }

            match self.capture.next_packet() {
                Ok(packet) => return Some(Packet::decode(packet.data.to_vec())),
                // read timeouts only exist so a closed handle gets noticed
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => return None,
                Err(e) => {
                    warn!("Packet capture error: {}", e);
                    return None;
                }
            }
        }
    }
}

struct PcapHandle {
    // only reached through get_mut(); the Mutex is there because Capture is not Sync
    writer: Mutex<Option<Capture<Active>>>,
    closed: Arc<AtomicBool>,
}

impl CaptureHandle for PcapHandle {
    fn write_packet_data(&mut self, raw: &[u8]) -> Result<()> {
        match self.writer.get_mut().as_mut() {
            Some(capture) => Ok(capture.sendpacket(raw)?),
            None => Err(Error::Inactive),
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        if self.writer.get_mut().take().is_some() {
            debug!("Closed pcap injection handle");
        }
    }
}
