//! Scan data receive flow.
//!
//! Runs apart from the command channel: a slow consumer or a burst of
//! datagrams never delays a command round trip. Datagrams that cannot be
//! reassembled or parsed are logged and dropped; the next one supersedes
//! them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sickscan_data::{parse_scan, Data, FragmentMerger, MergerConfig};
use sickscan_transport::{DatagramSource, Result, TransportError};
use tracing::{debug, warn};

/// Largest UDP payload.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Configuration for scan reception.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Read timeout slice; bounds how quickly `stop()` is observed.
    pub read_timeout: Duration,
    /// Receive buffer size per datagram.
    pub max_datagram_size: usize,
    /// Parsed scans buffered for the consumer before new ones are dropped.
    pub queue_capacity: usize,
    pub merger: MergerConfig,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            max_datagram_size: MAX_DATAGRAM_SIZE,
            queue_capacity: 64,
            merger: MergerConfig::default(),
        }
    }
}

/// Counters of a receive loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub datagrams: u64,
    pub scans: u64,
    /// Datagrams or telegrams that could not be decoded.
    pub malformed: u64,
    /// Parsed scans discarded because the consumer fell behind.
    pub overflowed: u64,
}

/// Datagram in, parsed scan out. Shared by the blocking and async loops.
#[derive(Debug, Default)]
pub struct ScanAssembler {
    merger: FragmentMerger,
    stats: ReceiverStats,
}

impl ScanAssembler {
    pub fn new(config: MergerConfig) -> Self {
        Self {
            merger: FragmentMerger::new(config),
            stats: ReceiverStats::default(),
        }
    }

    /// Feed one datagram; returns a scan once a telegram is complete.
    pub fn push(&mut self, datagram: &[u8]) -> Option<Data> {
        self.stats.datagrams += 1;

        let packet = match self.merger.push(datagram) {
            Ok(Some(packet)) => packet,
            Ok(None) => return None,
            Err(err) => {
                self.stats.malformed += 1;
                warn!(error = %err, len = datagram.len(), "dropping datagram");
                return None;
            }
        };

        match parse_scan(&packet) {
            Ok(data) => {
                self.stats.scans += 1;
                Some(data)
            }
            Err(err) => {
                self.stats.malformed += 1;
                warn!(error = %err, len = packet.len(), "dropping malformed scan telegram");
                None
            }
        }
    }

    pub(crate) fn record_overflow(&mut self) {
        self.stats.overflowed += 1;
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }
}

/// Receives scans on a background thread.
///
/// Dropping the receiver stops the thread.
pub struct ScanReceiver {
    scans: Receiver<Data>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<ReceiverStats>>,
}

impl ScanReceiver {
    /// Start receiving from `source`.
    pub fn spawn<S>(mut source: S, config: ReceiverConfig) -> Result<Self>
    where
        S: DatagramSource + 'static,
    {
        source.set_read_timeout(Some(config.read_timeout))?;

        let (tx, rx) = mpsc::sync_channel(config.queue_capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("sickscan-receiver".to_string())
            .spawn(move || receive_loop(source, config, tx, thread_stop))?;

        Ok(Self {
            scans: rx,
            stop,
            handle: Some(handle),
        })
    }

    /// Block until the next scan. `None` once the loop has ended.
    pub fn recv(&self) -> Option<Data> {
        self.scans.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> std::result::Result<Data, RecvTimeoutError> {
        self.scans.recv_timeout(timeout)
    }

    /// Blocking iterator over scans until the loop ends.
    pub fn iter(&self) -> impl Iterator<Item = Data> + '_ {
        self.scans.iter()
    }

    /// Stop the loop and return its counters.
    pub fn stop(mut self) -> ReceiverStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> ReceiverStats {
        self.stop.store(true, Ordering::Relaxed);
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                warn!("scan receiver thread panicked");
                ReceiverStats::default()
            }
            None => ReceiverStats::default(),
        }
    }
}

impl Drop for ScanReceiver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}

fn receive_loop<S: DatagramSource>(
    mut source: S,
    config: ReceiverConfig,
    tx: SyncSender<Data>,
    stop: Arc<AtomicBool>,
) -> ReceiverStats {
    let mut buf = vec![0u8; config.max_datagram_size];
    let mut assembler = ScanAssembler::new(config.merger);

    while !stop.load(Ordering::Relaxed) {
        let len = match source.recv_datagram(&mut buf) {
            Ok(len) => len,
            Err(err) if err.is_timeout() => continue,
            Err(TransportError::Shutdown) => {
                debug!("datagram source exhausted");
                break;
            }
            Err(err) => {
                warn!(error = %err, "datagram receive failed, stopping");
                break;
            }
        };

        let Some(data) = assembler.push(&buf[..len]) else {
            continue;
        };
        match tx.try_send(data) {
            Ok(()) => {}
            Err(TrySendError::Full(data)) => {
                assembler.record_overflow();
                debug!(scan_number = data.header.scan_number, "consumer behind, scan dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("scan consumer gone");
                break;
            }
        }
    }

    let stats = assembler.stats();
    debug!(
        datagrams = stats.datagrams,
        scans = stats.scans,
        malformed = stats.malformed,
        overflowed = stats.overflowed,
        "scan receiver stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;
    use std::time::Instant;

    use sickscan_data::testing::{fragment, ScanTelegramBuilder};
    use sickscan_transport::{bind_udp, ReplaySource};

    use super::*;

    fn scan(number: u32) -> Vec<u8> {
        ScanTelegramBuilder::new(number)
            .derived(1, -45.0, 0.5)
            .beams(&[(100, 0, 1), (200, 0, 1)])
            .build()
    }

    #[test]
    fn replayed_fragments_become_scans() {
        let mut datagrams = fragment(&scan(1), 10, 50);
        datagrams.push(b"not a scan datagram".to_vec());
        datagrams.extend(fragment(&scan(2), 11, 1500));
        // header claims a derived values block past the end
        let mut broken = scan(3);
        broken.truncate(80);
        datagrams.extend(fragment(&broken, 12, 1500));

        let receiver =
            ScanReceiver::spawn(ReplaySource::new(datagrams), ReceiverConfig::default()).unwrap();
        let numbers: Vec<u32> = receiver.iter().map(|d| d.header.scan_number).collect();
        assert_eq!(numbers, vec![1, 2]);

        let stats = receiver.stop();
        assert_eq!(stats.scans, 2);
        assert_eq!(stats.malformed, 2);
    }

    #[test]
    fn assembler_counts() {
        let mut assembler = ScanAssembler::new(MergerConfig::default());
        let datagrams = fragment(&scan(5), 1, 40);
        let last = datagrams.len() - 1;
        for (i, datagram) in datagrams.iter().enumerate() {
            let out = assembler.push(datagram);
            assert_eq!(out.is_some(), i == last);
        }
        assert!(assembler.push(&[0u8; 3]).is_none());

        let stats = assembler.stats();
        assert_eq!(stats.datagrams, datagrams.len() as u64 + 1);
        assert_eq!(stats.scans, 1);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn receives_over_udp_and_stops() {
        let socket = bind_udp("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        let config = ReceiverConfig {
            read_timeout: Duration::from_millis(20),
            ..ReceiverConfig::default()
        };
        let receiver = ScanReceiver::spawn(socket, config).unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        for datagram in fragment(&scan(77), 4, 1500) {
            sender.send_to(&datagram, addr).unwrap();
        }

        let data = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(data.header.scan_number, 77);
        assert_eq!(data.measurement_data.number_of_beams(), 2);

        let started = Instant::now();
        let stats = receiver.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(stats.scans, 1);
    }

    #[test]
    fn full_queue_drops_scans() {
        let datagrams: Vec<Vec<u8>> = (0..5).flat_map(|n| fragment(&scan(n), n, 1500)).collect();
        let config = ReceiverConfig {
            queue_capacity: 2,
            ..ReceiverConfig::default()
        };
        let receiver = ScanReceiver::spawn(ReplaySource::new(datagrams), config).unwrap();

        // let the loop run to exhaustion before consuming
        let deadline = Instant::now() + Duration::from_secs(5);
        while receiver.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }

        let numbers: Vec<u32> = receiver.iter().map(|d| d.header.scan_number).collect();
        assert_eq!(numbers, vec![0, 1]);
        assert_eq!(receiver.stop().overflowed, 3);
    }
}
