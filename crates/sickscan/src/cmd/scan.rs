use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use sickscan::{ReceiverConfig, ScanReceiver};
use sickscan_transport::bind_udp;
use tracing::info;

use crate::cmd::ScanArgs;
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_scan, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ScanArgs, format: OutputFormat) -> CliResult<i32> {
    let socket = bind_udp(&args.bind).map_err(|err| transport_error("bind failed", err))?;
    let receiver = ScanReceiver::spawn(socket, ReceiverConfig::default())
        .map_err(|err| transport_error("receiver setup failed", err))?;
    info!(bind = %args.bind, "receiving scan data");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let data = match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(data) => data,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        print_scan(&data, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    let stats = receiver.stop();
    info!(
        datagrams = stats.datagrams,
        scans = stats.scans,
        malformed = stats.malformed,
        overflowed = stats.overflowed,
        "scan reception stopped"
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
