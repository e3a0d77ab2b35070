//! Scan reception on tokio.

use sickscan_data::Data;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::receiver::{ReceiverConfig, ReceiverStats, ScanAssembler};

/// Receive scans from `socket` until the consumer side of `scans` is dropped
/// or the socket fails.
pub async fn run_async_receiver(
    socket: UdpSocket,
    config: ReceiverConfig,
    scans: Sender<Data>,
) -> ReceiverStats {
    let mut buf = vec![0u8; config.max_datagram_size];
    let mut assembler = ScanAssembler::new(config.merger);

    loop {
        let len = tokio::select! {
            received = socket.recv(&mut buf) => match received {
                Ok(len) => len,
                Err(err) => {
                    warn!(error = %err, "datagram receive failed, stopping");
                    break;
                }
            },
            () = scans.closed() => break,
        };

        let Some(data) = assembler.push(&buf[..len]) else {
            continue;
        };
        match scans.try_send(data) {
            Ok(()) => {}
            Err(TrySendError::Full(data)) => {
                assembler.record_overflow();
                debug!(scan_number = data.header.scan_number, "consumer behind, scan dropped");
            }
            Err(TrySendError::Closed(_)) => break,
        }
    }

    let stats = assembler.stats();
    debug!(datagrams = stats.datagrams, scans = stats.scans, "async scan receiver stopped");
    stats
}

/// Spawn [`run_async_receiver`] on the current runtime.
///
/// Dropping the returned receiver ends the task.
pub fn spawn_async_receiver(
    socket: UdpSocket,
    config: ReceiverConfig,
) -> (Receiver<Data>, JoinHandle<ReceiverStats>) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let handle = tokio::spawn(run_async_receiver(socket, config, tx));
    (rx, handle)
}
