//! UDP transport of scan telegrams.
//!
//! A telegram larger than one datagram is split into fragments. Each
//! datagram starts with a 24-byte header:
//!
//! ```text
//!  0  marker "MS3 "        4 bytes
//!  4  protocol "MD"        2 bytes
//!  6  major version        u8
//!  7  minor version        u8
//!  8  total length         u32  telegram bytes over all fragments
//! 12  identification       u32  same for every fragment of a telegram
//! 16  fragment offset      u32  position of this fragment's payload
//! 20  reserved             4 bytes
//! ```

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use sickscan_wire::codec::{read_slice, read_u32_le, read_u8};
use sickscan_wire::PacketBuffer;
use tracing::{debug, warn};

use crate::error::{ParseError, Result};

pub const DATAGRAM_HEADER_SIZE: usize = 24;
pub const DATAGRAM_MARKER: [u8; 4] = *b"MS3 ";
pub const DATAGRAM_PROTOCOL: [u8; 2] = *b"MD";

/// Default bound on a reassembled telegram.
pub const DEFAULT_MAX_SCAN_SIZE: usize = 1024 * 1024;

/// Header of one scan data datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatagramHeader {
    pub major_version: u8,
    pub minor_version: u8,
    pub total_length: u32,
    pub identification: u32,
    pub fragment_offset: u32,
}

impl DatagramHeader {
    /// Parse and validate the datagram header.
    pub fn parse(datagram: &[u8]) -> Result<Self> {
        if datagram.len() < DATAGRAM_HEADER_SIZE {
            return Err(ParseError::InvalidDatagram(format!(
                "{} bytes, shorter than the {DATAGRAM_HEADER_SIZE}-byte header",
                datagram.len()
            )));
        }
        if read_slice(datagram, 0, 4)? != DATAGRAM_MARKER {
            return Err(ParseError::InvalidDatagram("missing MS3 marker".to_string()));
        }
        if read_slice(datagram, 4, 2)? != DATAGRAM_PROTOCOL {
            return Err(ParseError::InvalidDatagram(
                "unknown protocol (expected MD)".to_string(),
            ));
        }

        Ok(Self {
            major_version: read_u8(datagram, 6)?,
            minor_version: read_u8(datagram, 7)?,
            total_length: read_u32_le(datagram, 8)?,
            identification: read_u32_le(datagram, 12)?,
            fragment_offset: read_u32_le(datagram, 16)?,
        })
    }
}

/// Configuration for [`FragmentMerger`].
#[derive(Debug, Clone)]
pub struct MergerConfig {
    /// Incomplete telegrams kept at once; the oldest is dropped beyond this.
    pub max_pending: usize,
    /// Largest total length accepted.
    pub max_scan_size: usize,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            max_pending: 8,
            max_scan_size: DEFAULT_MAX_SCAN_SIZE,
        }
    }
}

#[derive(Debug)]
struct Pending {
    buf: Vec<u8>,
    /// Sorted, non-touching byte ranges written so far.
    covered: Vec<(usize, usize)>,
}

impl Pending {
    fn new(total: usize) -> Self {
        Self {
            buf: vec![0u8; total],
            covered: Vec::new(),
        }
    }

    /// Record `start..end` as written. Returns false if it added no new bytes.
    fn cover(&mut self, start: usize, end: usize) -> bool {
        if start >= end
            || self
                .covered
                .iter()
                .any(|&(lo, hi)| lo <= start && end <= hi)
        {
            return false;
        }
        let (mut lo, mut hi) = (start, end);
        self.covered.retain(|&(a, b)| {
            if b < lo || a > hi {
                return true;
            }
            lo = lo.min(a);
            hi = hi.max(b);
            false
        });
        let at = self.covered.partition_point(|&(a, _)| a < lo);
        self.covered.insert(at, (lo, hi));
        true
    }

    fn received(&self) -> usize {
        self.covered.iter().map(|(lo, hi)| hi - lo).sum()
    }

    fn is_complete(&self) -> bool {
        self.covered.as_slice() == [(0, self.buf.len())]
    }
}

/// Reassembles scan telegrams from datagrams, in any arrival order.
#[derive(Debug, Default)]
pub struct FragmentMerger {
    config: MergerConfig,
    pending: HashMap<u32, Pending>,
    order: VecDeque<u32>,
}

impl FragmentMerger {
    pub fn new(config: MergerConfig) -> Self {
        Self {
            config,
            pending: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Number of telegrams waiting for more fragments.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Feed one datagram. Returns the telegram once all its bytes arrived.
    pub fn push(&mut self, datagram: &[u8]) -> Result<Option<PacketBuffer>> {
        let header = DatagramHeader::parse(datagram)?;
        let payload = &datagram[DATAGRAM_HEADER_SIZE..];
        let total = header.total_length as usize;
        let offset = header.fragment_offset as usize;

        if total == 0 || total > self.config.max_scan_size {
            return Err(ParseError::InvalidDatagram(format!(
                "total length {total} out of range (max {})",
                self.config.max_scan_size
            )));
        }
        if offset.saturating_add(payload.len()) > total {
            return Err(ParseError::InvalidDatagram(format!(
                "fragment {offset}+{} exceeds total length {total}",
                payload.len()
            )));
        }

        if offset == 0 && payload.len() == total {
            return Ok(Some(PacketBuffer::new(payload.to_vec())));
        }

        let id = header.identification;
        if self
            .pending
            .get(&id)
            .is_some_and(|pending| pending.buf.len() != total)
        {
            warn!(identification = id, "total length changed, restarting telegram");
            self.forget(id);
        }

        if !self.pending.contains_key(&id) {
            self.evict_for_new();
            self.pending.insert(
                id,
                Pending::new(total),
            );
            self.order.push_back(id);
        }

        let Some(entry) = self.pending.get_mut(&id) else {
            return Ok(None);
        };
        let end = offset + payload.len();
        if !entry.cover(offset, end) {
            debug!(identification = id, offset, "duplicate fragment ignored");
            return Ok(None);
        }
        entry.buf[offset..end].copy_from_slice(payload);

        if !entry.is_complete() {
            return Ok(None);
        }

        let done = self.forget(id).map(|pending| PacketBuffer::new(pending.buf));
        Ok(done)
    }

    fn forget(&mut self, id: u32) -> Option<Pending> {
        self.order.retain(|pending| *pending != id);
        self.pending.remove(&id)
    }

    fn evict_for_new(&mut self) {
        while self.pending.len() >= self.config.max_pending.max(1) {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(dropped) = self.pending.remove(&oldest) {
                debug!(
                    identification = oldest,
                    received = dropped.received(),
                    total = dropped.buf.len(),
                    "dropping incomplete telegram"
                );
            }
        }
    }
}
