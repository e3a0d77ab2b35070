//! Scan telegram fixtures for tests.

use sickscan_wire::codec::{write_i32_le, write_slice, write_u16_le, write_u32_le, write_u8};
use sickscan_wire::degrees_to_angle;

use crate::datagram::{DATAGRAM_HEADER_SIZE, DATAGRAM_MARKER, DATAGRAM_PROTOCOL};
use crate::header::DATA_HEADER_SIZE;

const SYSTEM_STATE_SIZE: usize = 16;
const DERIVED_VALUES_SIZE: usize = 20;

/// Builds scan telegrams in the device's layout.
#[derive(Debug, Clone, Default)]
pub struct ScanTelegramBuilder {
    scan_number: u32,
    serial_number: u32,
    system_state: bool,
    derived: Option<(u16, f64, f64)>,
    beams: Option<Vec<(u16, u8, u8)>>,
}

impl ScanTelegramBuilder {
    pub fn new(scan_number: u32) -> Self {
        Self {
            scan_number,
            ..Self::default()
        }
    }

    pub fn serial_number(mut self, serial: u32) -> Self {
        self.serial_number = serial;
        self
    }

    /// Publish a general system state block with run mode active.
    pub fn system_state(mut self) -> Self {
        self.system_state = true;
        self
    }

    /// Publish derived values. The beam count follows [`Self::beams`].
    pub fn derived(mut self, multiplication_factor: u16, start_deg: f64, resolution_deg: f64) -> Self {
        self.derived = Some((multiplication_factor, start_deg, resolution_deg));
        self
    }

    /// Publish measurement data as `(distance, reflectivity, status)` samples.
    pub fn beams(mut self, beams: &[(u16, u8, u8)]) -> Self {
        self.beams = Some(beams.to_vec());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let beam_count = self.beams.as_ref().map_or(0, Vec::len);
        let mut buf = vec![0u8; DATA_HEADER_SIZE];

        write_u8(&mut buf, 0, b'R').unwrap();
        write_u8(&mut buf, 1, 1).unwrap();
        write_u32_le(&mut buf, 4, self.serial_number).unwrap();
        write_u32_le(&mut buf, 16, self.scan_number).unwrap();
        write_u32_le(&mut buf, 20, self.scan_number).unwrap();

        if self.system_state {
            let offset = append(&mut buf, 32, SYSTEM_STATE_SIZE);
            write_u8(&mut buf, offset, 1).unwrap();
        }

        if let Some((factor, start, resolution)) = self.derived {
            let offset = append(&mut buf, 40, DERIVED_VALUES_SIZE);
            write_u16_le(&mut buf, offset, factor).unwrap();
            write_u16_le(&mut buf, offset + 2, beam_count as u16).unwrap();
            write_u16_le(&mut buf, offset + 4, 40).unwrap();
            write_i32_le(&mut buf, offset + 8, degrees_to_angle(start)).unwrap();
            write_i32_le(&mut buf, offset + 12, degrees_to_angle(resolution)).unwrap();
            write_u32_le(&mut buf, offset + 16, 27).unwrap();
        }

        if let Some(beams) = &self.beams {
            let offset = append(&mut buf, 48, 4 + beams.len() * 4);
            write_u32_le(&mut buf, offset, beams.len() as u32).unwrap();
            for (i, (distance, reflectivity, status)) in beams.iter().enumerate() {
                let at = offset + 4 + i * 4;
                write_u16_le(&mut buf, at, *distance).unwrap();
                write_u8(&mut buf, at + 2, *reflectivity).unwrap();
                write_u8(&mut buf, at + 3, *status).unwrap();
            }
        }

        buf
    }
}

/// Append a zeroed block, record it in the header table, return its offset.
fn append(buf: &mut Vec<u8>, table_entry: usize, size: usize) -> usize {
    let offset = buf.len();
    buf.resize(offset + size, 0);
    write_u32_le(buf, table_entry, offset as u32).unwrap();
    write_u32_le(buf, table_entry + 4, size as u32).unwrap();
    offset
}

/// Split a telegram into UDP datagrams of at most `chunk` payload bytes.
pub fn fragment(telegram: &[u8], identification: u32, chunk: usize) -> Vec<Vec<u8>> {
    telegram
        .chunks(chunk.max(1))
        .enumerate()
        .map(|(i, part)| {
            let mut datagram = vec![0u8; DATAGRAM_HEADER_SIZE + part.len()];
            let next = write_slice(&mut datagram, 0, &DATAGRAM_MARKER).unwrap();
            let next = write_slice(&mut datagram, next, &DATAGRAM_PROTOCOL).unwrap();
            let next = write_u8(&mut datagram, next, 1).unwrap();
            let next = write_u8(&mut datagram, next, 0).unwrap();
            let next = write_u32_le(&mut datagram, next, telegram.len() as u32).unwrap();
            let next = write_u32_le(&mut datagram, next, identification).unwrap();
            write_u32_le(&mut datagram, next, (i * chunk.max(1)) as u32).unwrap();
            write_slice(&mut datagram, DATAGRAM_HEADER_SIZE, part).unwrap();
            datagram
        })
        .collect()
}
