use clap::Parser;
use crossbeam_channel::Receiver;
use ipnetwork::Ipv4Network;
use sniffq::config::DEFAULT_SNAPLEN;
use sniffq::{Activity, ActivityRecord, CaptureConfig, Endpoint, PcapBackend, Queue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, trace};
use tracing_subscriber::EnvFilter;

/// Capture traffic on an interface and report protocol, host and activity stats as JSON lines
#[derive(Parser, Debug)]
#[command(name = "sniff", version)]
struct Args {
    /// Interface to capture on
    #[arg(short, long, env = "SNIFF_INTERFACE")]
    interface: String,

    /// Interface address with prefix, e.g. 192.168.1.5/24
    #[arg(short, long, env = "SNIFF_ADDRESS")]
    address: Ipv4Network,

    /// The interface is in monitor mode (no live capture or injection)
    #[arg(long, env = "SNIFF_MONITOR")]
    monitor: bool,

    #[arg(long, env = "SNIFF_SNAPLEN", default_value_t = DEFAULT_SNAPLEN)]
    snaplen: i32,

    /// Activity channel capacity (0 = hand-off)
    #[arg(long, env = "SNIFF_ACTIVITY_CAPACITY", default_value_t = 0)]
    activity_capacity: usize,

    /// Seconds between snapshots
    #[arg(long, env = "SNIFF_REPORT_INTERVAL", default_value_t = 10)]
    report_interval: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let iface = Endpoint::new(args.interface, args.address).with_monitor(args.monitor);
    let config = CaptureConfig {
        snaplen: args.snaplen,
        activity_capacity: args.activity_capacity,
        ..CaptureConfig::default()
    };

    info!("Starting capture on {}", iface);
    let queue = Queue::with_backend(iface, config, &PcapBackend)?;
    queue.on_packet(|packet| {
        trace!("Captured {} bytes, {} layers", packet.len(), packet.layers.len());
    });

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || running_clone.store(false, Ordering::SeqCst))?;

    let activities = queue.activities();
    let activity_thread = thread::spawn(move || process_activities(activities));

    let ticker = crossbeam_channel::tick(Duration::from_secs(args.report_interval.max(1)));
    while running.load(Ordering::SeqCst) {
        if ticker.recv_timeout(Duration::from_millis(200)).is_ok() {
            print_snapshot(&queue);
        }
    }

    info!("Shutting down");
    queue.stop();
    print_snapshot(&queue);

    // ends once the worker notices the closed handle and drops its sender
    drop(queue);
    if activity_thread.join().is_err() {
        error!("Activity thread panicked");
    }
    Ok(())
}

fn process_activities(rx: Receiver<Activity>) {
    for activity in rx.iter() {
        match serde_json::to_string(&ActivityRecord::now(activity)) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Error encoding activity: {}", e),
        }
    }
}

fn print_snapshot(queue: &Queue) {
    match serde_json::to_string(&queue.snapshot()) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Error encoding snapshot: {}", e),
    }
}
