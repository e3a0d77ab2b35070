use serde::Serialize;
use sickscan_wire::codec::{read_i32_le, read_u16_le, read_u32_le};
use sickscan_wire::{angle_to_degrees, WireError};

use crate::data::Data;
use crate::header::BlockRange;

/// Scan geometry computed by the device for one scan.
///
/// When `is_empty` is set the block was not published and no other field is
/// meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedValues {
    pub multiplication_factor: u16,
    pub number_of_beams: u16,
    /// Scan cycle time in milliseconds.
    pub scan_time: u16,
    /// Raw angle units, see [`sickscan_wire::ANGLE_UNITS_PER_DEGREE`].
    pub start_angle: i32,
    pub angular_beam_resolution: i32,
    /// Microseconds between two beams.
    pub interbeam_period: u32,
    pub is_empty: bool,
}

impl DerivedValues {
    pub fn empty() -> Self {
        Self {
            is_empty: true,
            ..Self::default()
        }
    }

    pub fn start_angle_degrees(&self) -> f64 {
        angle_to_degrees(self.start_angle)
    }

    pub fn angular_beam_resolution_degrees(&self) -> f64 {
        angle_to_degrees(self.angular_beam_resolution)
    }
}

/// Precondition: header parsed and the block published.
pub fn locate_derived_values(data: &Data) -> Option<BlockRange> {
    data.header.published(data.header.derived_values)
}

/// Derived values stage. Absent blocks yield [`DerivedValues::empty`].
pub fn parse_derived_values(buf: &[u8], data: &Data) -> Result<DerivedValues, WireError> {
    let Some(range) = locate_derived_values(data) else {
        return Ok(DerivedValues::empty());
    };
    let block = range.slice(buf)?;

    Ok(DerivedValues {
        multiplication_factor: read_u16_le(block, 0)?,
        number_of_beams: read_u16_le(block, 2)?,
        scan_time: read_u16_le(block, 4)?,
        start_angle: read_i32_le(block, 8)?,
        angular_beam_resolution: read_i32_le(block, 12)?,
        interbeam_period: read_u32_le(block, 16)?,
        is_empty: false,
    })
}
