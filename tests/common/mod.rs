//! In-memory capture backend for driving a queue without privileges

#![allow(dead_code)]

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use sniffq::{Backend, CaptureConfig, CaptureHandle, Endpoint, Error, Layer, MacAddr, Packet, PacketSource, Result, Session};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const OWN: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 5);

pub fn lan() -> Endpoint {
    Endpoint::new("mock0", "192.168.1.5/24".parse().unwrap())
}

pub fn mac(last: u8) -> MacAddr {
    MacAddr([0x02, 0, 0, 0, 0, last])
}

/// Ethernet + IPv4 packet of `len` bytes between two addresses
pub fn ipv4_packet(src: Ipv4Addr, dst: Ipv4Addr, len: usize) -> Packet {
    Packet::new(
        vec![0; len],
        vec![
            Layer::Ethernet { source: mac(src.octets()[3]), destination: mac(dst.octets()[3]) },
            Layer::Ipv4 { source: src, destination: dst },
            Layer::Udp { source_port: 5353, destination_port: 5353 },
        ],
    )
}

/// Packet with an Ethernet layer but no IPv4
pub fn arp_packet(len: usize) -> Packet {
    Packet::new(
        vec![0; len],
        vec![Layer::Ethernet { source: mac(10), destination: mac(0xff) }, Layer::Arp],
    )
}

/// Poll `cond` for up to two seconds
pub fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Feeds packets pushed through `inject` to the queue and records injected
/// frames.
pub struct MockBackend {
    packets: Receiver<Packet>,
    injector: Sender<Packet>,
    pub written: Arc<Mutex<Vec<Vec<u8>>>>,
    pub fail_writes: Arc<AtomicBool>,
    pub fail_open: bool,
    pub closes: Arc<AtomicUsize>,
    pub source_finished: Arc<AtomicBool>,
    /// Set once the worker drops its source, however it exited
    pub worker_exited: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn new() -> Self {
        let (injector, packets) = unbounded();
        Self {
            packets,
            injector,
            written: Arc::new(Mutex::new(Vec::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            fail_open: false,
            closes: Arc::new(AtomicUsize::new(0)),
            source_finished: Arc::new(AtomicBool::new(false)),
            worker_exited: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing_open() -> Self {
        Self { fail_open: true, ..Self::new() }
    }

    pub fn inject(&self, packet: Packet) {
        self.injector.send(packet).unwrap();
    }
}

impl Backend for MockBackend {
    fn open_live(&self, iface: &Endpoint, _config: &CaptureConfig) -> Result<Session> {
        if self.fail_open {
            return Err(Error::backend(format!("cannot open {}", iface.name)));
        }

        let (close_tx, close_rx) = unbounded::<()>();
        Ok(Session {
            source: Box::new(MockSource {
                packets: self.packets.clone(),
                closed: close_rx,
                finished: Arc::clone(&self.source_finished),
                dropped: Arc::clone(&self.worker_exited),
            }),
            handle: Box::new(MockHandle {
                close_tx: Some(close_tx),
                written: Arc::clone(&self.written),
                fail_writes: Arc::clone(&self.fail_writes),
                closes: Arc::clone(&self.closes),
            }),
        })
    }
}

struct MockSource {
    packets: Receiver<Packet>,
    closed: Receiver<()>,
    finished: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl Drop for MockSource {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

impl PacketSource for MockSource {
    fn next_packet(&mut self) -> Option<Packet> {
        let packet = select! {
            recv(self.packets) -> packet => packet.ok(),
            recv(self.closed) -> _ => None,
        };
        if packet.is_none() {
            self.finished.store(true, Ordering::SeqCst);
        }
        packet
    }
}

struct MockHandle {
    close_tx: Option<Sender<()>>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
}

impl CaptureHandle for MockHandle {
    fn write_packet_data(&mut self, raw: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::backend("link down"));
        }
        self.written.lock().push(raw.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        // dropping the sender disconnects the source's close channel
        if self.close_tx.take().is_some() {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
