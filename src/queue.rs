//! The capture/egress queue and its capture worker

use crate::activity::{self, Activity};
use crate::backend::{Backend, CaptureHandle, PacketSource, PcapBackend};
use crate::config::CaptureConfig;
use crate::endpoint::{Endpoint, MacAddr};
use crate::error::{Error, Result};
use crate::models::QueueSnapshot;
use crate::packet::Packet;
use crate::protocols::ProtocolTally;
use crate::stats::{Stats, StatsRegistry};
use crate::traffic::{Traffic, TrafficTable};
use crossbeam_channel::{Receiver, SendError, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::IpAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, trace, warn};

/// Observer invoked on the capture thread for every captured packet.
///
/// A panic in the callback stops the queue and ends the capture thread.
pub type PacketCallback = Arc<dyn Fn(&Packet) + Send + Sync>;

/// Guarded by the queue lock
struct State {
    active: bool,
    handle: Option<Box<dyn CaptureHandle>>,
    callback: Option<PacketCallback>,
}

struct Shared {
    iface: Endpoint,
    stats: StatsRegistry,
    protos: ProtocolTally,
    traffic: TrafficTable,
    state: RwLock<State>,
}

/// Live capture and injection on one interface.
///
/// A queue built on a monitor-mode interface is inactive from the start: it
/// holds no capture handle, runs no worker and refuses to send. Otherwise a
/// single worker thread pulls packets, keeps the protocol tally, counters and
/// traffic table up to date, calls the registered callback and publishes an
/// [`Activity`] for every local-subnet host it sees.
///
/// Activity publishing blocks until a consumer takes the event (or until the
/// bounded channel has room), so a queue nobody drains stalls its whole intake.
pub struct Queue {
    shared: Arc<Shared>,
    activities: Receiver<Activity>,
}

impl Queue {
    /// Open a libpcap-backed queue with the default configuration.
    pub fn new(iface: Endpoint) -> Result<Self> {
        Self::with_backend(iface, CaptureConfig::default(), &PcapBackend)
    }

    pub fn with_backend(iface: Endpoint, config: CaptureConfig, backend: &dyn Backend) -> Result<Self> {
        let (tx, rx) = activity::channel(config.activity_capacity);

        let (source, handle) = if iface.is_monitor() {
            info!("{} is in monitor mode, packet queue inactive", iface.name);
            (None, None)
        } else {
            let session = backend.open_live(&iface, &config)?;
            (Some(session.source), Some(session.handle))
        };

        let shared = Arc::new(Shared {
            iface,
            stats: StatsRegistry::new(),
            protos: ProtocolTally::new(),
            traffic: TrafficTable::new(),
            state: RwLock::new(State {
                active: handle.is_some(),
                handle,
                callback: None,
            }),
        });

        if let Some(source) = source {
            let worker = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("capture-{}", shared.iface.name))
                .spawn(move || worker.run(source, tx));

            if let Err(e) = spawned {
                shared.shutdown();
                return Err(Error::Io(e));
            }
        }

        Ok(Self { shared, activities: rx })
    }

    /// Replace the packet callback. Only the last registered one is called.
    pub fn on_packet<F>(&self, callback: F)
    where
        F: Fn(&Packet) + Send + Sync + 'static,
    {
        self.shared.state.write().callback = Some(Arc::new(callback));
        debug!("Packet callback registered on {}", self.shared.iface.name);
    }

    /// Inject a raw frame.
    ///
    /// Fails with [`Error::Inactive`] without touching any counter when the
    /// queue is inactive. A backend failure counts as one error; a successful
    /// write adds its length to the sent bytes.
    pub fn send(&self, raw: &[u8]) -> Result<()> {
        let written = {
            let mut state = self.shared.state.write();
            if !state.active {
                return Err(Error::Inactive);
            }
            match state.handle.as_mut() {
                Some(handle) => handle.write_packet_data(raw),
                None => return Err(Error::Inactive),
            }
        };

        // queue lock released; never held together with the stats lock
        match written {
            Ok(()) => {
                self.shared.stats.record_sent(raw.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.shared.stats.record_error();
                warn!("Failed to send {} bytes on {}: {}", raw.len(), self.shared.iface.name, e);
                Err(e)
            }
        }
    }

    /// Close the capture handle and deactivate the queue. Idempotent.
    ///
    /// Does not wait for the worker; it exits once its source reports the
    /// closed handle.
    pub fn stop(&self) {
        self.shared.shutdown();
    }

    pub fn is_active(&self) -> bool {
        self.shared.state.read().active
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.iface
    }

    pub fn stats(&self) -> Stats {
        self.shared.stats.snapshot()
    }

    pub fn protocols(&self) -> HashMap<String, u64> {
        self.shared.protos.snapshot()
    }

    pub fn traffic(&self) -> HashMap<String, Traffic> {
        self.shared.traffic.snapshot()
    }

    /// Receiving end of the activity channel. Every clone competes for the
    /// same events.
    pub fn activities(&self) -> Receiver<Activity> {
        self.activities.clone()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            interface: self.shared.iface.name.clone(),
            active: self.is_active(),
            stats: self.stats(),
            protos: self.protocols().into_iter().collect(),
            traffic: self.traffic().into_iter().collect(),
        }
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl Shared {
    fn shutdown(&self) {
        let mut state = self.state.write();
        if state.active {
            if let Some(mut handle) = state.handle.take() {
                handle.close();
            }
            state.active = false;
            info!("Packet queue on {} stopped", self.iface.name);
        }
    }

    fn is_active(&self) -> bool {
        self.state.read().active
    }

    fn run(&self, mut source: Box<dyn PacketSource>, activities: Sender<Activity>) {
        debug!("Capture worker started on {}", self.iface.name);

        while let Some(packet) = source.next_packet() {
            if !self.is_active() {
                break;
            }

            self.protos.track(&packet);

            let size = packet.len() as u64;
            self.stats.record_received(size);

            self.on_packet_callback(&packet);

            if self.classify(&packet, size, &activities).is_err() {
                debug!("Activity channel has no receivers left");
                break;
            }
        }

        debug!("Capture worker on {} finished", self.iface.name);
    }

    fn on_packet_callback(&self, packet: &Packet) {
        // clone out so the callback runs without the queue lock held
        let callback = self.state.read().callback.clone();
        if let Some(callback) = callback {
            // a panicking callback takes the queue down with it, then keeps unwinding
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(packet))) {
                error!("Packet callback panicked on {}, stopping queue", self.iface.name);
                self.shutdown();
                panic::resume_unwind(payload);
            }
        }
    }

    /// Only IPv4 over Ethernet takes part in host accounting.
    fn classify(&self, packet: &Packet, size: u64, activities: &Sender<Activity>) -> std::result::Result<(), SendError<Activity>> {
        let (Some((src_mac, _)), Some((src, dst))) = (packet.ethernet(), packet.ipv4()) else {
            return Ok(());
        };
        let (src, dst) = (IpAddr::V4(src), IpAddr::V4(dst));

        // coming from our network
        if !self.iface.is_own_address(src) && self.iface.contains(src) {
            self.track_activity(activities, src, src_mac, size, true)?;
        }
        // going to our network
        if !self.iface.is_own_address(dst) && self.iface.contains(dst) {
            self.track_activity(activities, dst, src_mac, size, false)?;
        }

        Ok(())
    }

    fn track_activity(
        &self,
        activities: &Sender<Activity>,
        address: IpAddr,
        mac: MacAddr,
        size: u64,
        is_sent: bool,
    ) -> std::result::Result<(), SendError<Activity>> {
        activities.send(Activity {
            address,
            hardware_address: mac,
            is_source_side: is_sent,
        })?;
        trace!("{} ({}) {} {} bytes", address, mac, if is_sent { "sent" } else { "received" }, size);

        self.traffic.record(address, size, is_sent);
        Ok(())
    }
}
