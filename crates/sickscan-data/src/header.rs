use serde::Serialize;
use sickscan_wire::codec::{read_slice, read_u16_le, read_u32_le, read_u8};
use sickscan_wire::WireError;

/// Size of the fixed leading region of a scan telegram.
pub const DATA_HEADER_SIZE: usize = 72;

/// Location of an optional block inside a scan telegram.
///
/// Offset and size both zero means the device did not publish the block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockRange {
    pub offset: u32,
    pub size: u32,
}

impl BlockRange {
    pub const ABSENT: BlockRange = BlockRange { offset: 0, size: 0 };

    pub fn new(offset: u32, size: u32) -> Self {
        Self { offset, size }
    }

    pub fn is_absent(&self) -> bool {
        self.offset == 0 && self.size == 0
    }

    /// The block's bytes, or `BufferUnderrun` if it reaches past `buf`.
    pub fn slice<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8], WireError> {
        read_slice(buf, self.offset as usize, self.size as usize)
    }
}

fn read_range(buf: &[u8], offset: usize) -> Result<BlockRange, WireError> {
    Ok(BlockRange {
        offset: read_u32_le(buf, offset)?,
        size: read_u32_le(buf, offset + 4)?,
    })
}

/// Leading region of a scan telegram: identity, counters and the block table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataHeader {
    pub version_indicator: u8,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_release: u8,
    pub serial_number_device: u32,
    pub serial_number_system_plug: u32,
    pub channel_number: u8,
    pub sequence_number: u32,
    pub scan_number: u32,
    /// Days since 1972-01-01.
    pub timestamp_date: u16,
    /// Milliseconds since midnight.
    pub timestamp_time: u32,
    pub general_system_state: BlockRange,
    pub derived_values: BlockRange,
    pub measurement_data: BlockRange,
    pub intrusion_data: BlockRange,
    pub application_data: BlockRange,
    pub is_empty: bool,
}

impl DataHeader {
    /// A header that has not been parsed.
    pub fn empty() -> Self {
        Self {
            version_indicator: 0,
            version_major: 0,
            version_minor: 0,
            version_release: 0,
            serial_number_device: 0,
            serial_number_system_plug: 0,
            channel_number: 0,
            sequence_number: 0,
            scan_number: 0,
            timestamp_date: 0,
            timestamp_time: 0,
            general_system_state: BlockRange::ABSENT,
            derived_values: BlockRange::ABSENT,
            measurement_data: BlockRange::ABSENT,
            intrusion_data: BlockRange::ABSENT,
            application_data: BlockRange::ABSENT,
            is_empty: true,
        }
    }

    /// Range of `block` if the header was parsed and the block is published.
    pub fn published(&self, block: BlockRange) -> Option<BlockRange> {
        if self.is_empty || block.is_absent() {
            None
        } else {
            Some(block)
        }
    }
}

/// Decode the fixed header region. Always the first pipeline stage.
pub fn parse_header(buf: &[u8]) -> Result<DataHeader, WireError> {
    read_slice(buf, 0, DATA_HEADER_SIZE)?;

    Ok(DataHeader {
        version_indicator: read_u8(buf, 0)?,
        version_major: read_u8(buf, 1)?,
        version_minor: read_u8(buf, 2)?,
        version_release: read_u8(buf, 3)?,
        serial_number_device: read_u32_le(buf, 4)?,
        serial_number_system_plug: read_u32_le(buf, 8)?,
        channel_number: read_u8(buf, 12)?,
        sequence_number: read_u32_le(buf, 16)?,
        scan_number: read_u32_le(buf, 20)?,
        timestamp_date: read_u16_le(buf, 24)?,
        timestamp_time: read_u32_le(buf, 28)?,
        general_system_state: read_range(buf, 32)?,
        derived_values: read_range(buf, 40)?,
        measurement_data: read_range(buf, 48)?,
        intrusion_data: read_range(buf, 56)?,
        application_data: read_range(buf, 64)?,
        is_empty: false,
    })
}
