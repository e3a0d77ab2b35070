use serde::Serialize;
use sickscan_wire::codec::{read_slice, read_u8};
use sickscan_wire::WireError;

use crate::data::Data;
use crate::header::BlockRange;

const RUN_MODE_ACTIVE: u8 = 1 << 0;
const STANDBY: u8 = 1 << 1;
const CONTAMINATION_WARNING: u8 = 1 << 2;
const CONTAMINATION_ERROR: u8 = 1 << 3;
const REFERENCE_CONTOUR: u8 = 1 << 4;
const MANIPULATION: u8 = 1 << 5;

const APPLICATION_ERROR: u8 = 1 << 0;
const DEVICE_ERROR: u8 = 1 << 1;

/// Bit set over the device's 20 cut-off paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CutOffPaths(pub [u8; 3]);

impl CutOffPaths {
    pub const COUNT: usize = 20;

    /// True if path `index` is set. Out-of-range indices are never set.
    pub fn is_set(&self, index: usize) -> bool {
        index < Self::COUNT && self.0[index / 8] & (1 << (index % 8)) != 0
    }

    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::COUNT).filter(|i| self.is_set(*i))
    }
}

/// Device status published with each scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneralSystemState {
    pub run_mode_active: bool,
    pub standby_mode_active: bool,
    pub contamination_warning: bool,
    pub contamination_error: bool,
    pub reference_contour_status: bool,
    pub manipulation_status: bool,
    pub safe_cut_off_path: CutOffPaths,
    pub non_safe_cut_off_path: CutOffPaths,
    pub reset_required_cut_off_path: CutOffPaths,
    pub current_monitoring_cases: [u8; 4],
    pub application_error: bool,
    pub device_error: bool,
    pub is_empty: bool,
}

impl GeneralSystemState {
    pub fn empty() -> Self {
        Self {
            is_empty: true,
            ..Self::default()
        }
    }
}

fn read_paths(block: &[u8], offset: usize) -> Result<CutOffPaths, WireError> {
    let mut paths = [0u8; 3];
    paths.copy_from_slice(read_slice(block, offset, 3)?);
    Ok(CutOffPaths(paths))
}

/// Precondition: header parsed and the block published.
pub fn locate_general_system_state(data: &Data) -> Option<BlockRange> {
    data.header.published(data.header.general_system_state)
}

/// General system state stage. Absent blocks yield [`GeneralSystemState::empty`].
pub fn parse_general_system_state(buf: &[u8], data: &Data) -> Result<GeneralSystemState, WireError> {
    let Some(range) = locate_general_system_state(data) else {
        return Ok(GeneralSystemState::empty());
    };
    let block = range.slice(buf)?;

    let flags = read_u8(block, 0)?;
    let mut cases = [0u8; 4];
    cases.copy_from_slice(read_slice(block, 10, 4)?);
    let errors = read_u8(block, 14)?;

    Ok(GeneralSystemState {
        run_mode_active: flags & RUN_MODE_ACTIVE != 0,
        standby_mode_active: flags & STANDBY != 0,
        contamination_warning: flags & CONTAMINATION_WARNING != 0,
        contamination_error: flags & CONTAMINATION_ERROR != 0,
        reference_contour_status: flags & REFERENCE_CONTOUR != 0,
        manipulation_status: flags & MANIPULATION != 0,
        safe_cut_off_path: read_paths(block, 1)?,
        non_safe_cut_off_path: read_paths(block, 4)?,
        reset_required_cut_off_path: read_paths(block, 7)?,
        current_monitoring_cases: cases,
        application_error: errors & APPLICATION_ERROR != 0,
        device_error: errors & DEVICE_ERROR != 0,
        is_empty: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::DataHeader;

    fn data(range: BlockRange) -> Data {
        let mut data = Data::empty();
        data.header = DataHeader {
            general_system_state: range,
            is_empty: false,
            ..DataHeader::empty()
        };
        data
    }

    #[test]
    fn decodes_flags_and_paths() {
        let block = [
            RUN_MODE_ACTIVE | CONTAMINATION_WARNING,
            0b0000_0101, 0x00, 0b0000_1000, // safe paths 0, 2, 19
            0x00, 0x00, 0x00, // non-safe
            0x80, 0x00, 0x00, // reset required: path 7
            1, 2, 3, 4, // monitoring cases
            DEVICE_ERROR,
            0x00,
        ];
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&block);

        let state = parse_general_system_state(&buf, &data(BlockRange::new(4, 16))).unwrap();
        assert!(!state.is_empty);
        assert!(state.run_mode_active);
        assert!(state.contamination_warning);
        assert!(!state.standby_mode_active && !state.contamination_error);
        assert_eq!(state.safe_cut_off_path.iter_set().collect::<Vec<_>>(), vec![0, 2, 19]);
        assert_eq!(state.non_safe_cut_off_path.iter_set().count(), 0);
        assert!(state.reset_required_cut_off_path.is_set(7));
        assert_eq!(state.current_monitoring_cases, [1, 2, 3, 4]);
        assert!(state.device_error);
        assert!(!state.application_error);
    }

    #[test]
    fn absent_block_yields_empty() {
        let state = parse_general_system_state(&[], &data(BlockRange::ABSENT)).unwrap();
        assert_eq!(state, GeneralSystemState::empty());
    }

    #[test]
    fn short_block_is_underrun() {
        let buf = [0u8; 10];
        assert!(matches!(
            parse_general_system_state(&buf, &data(BlockRange::new(0, 10))),
            Err(WireError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn cut_off_path_bounds() {
        let paths = CutOffPaths([0xFF, 0xFF, 0xFF]);
        assert!(paths.is_set(19));
        assert!(!paths.is_set(20));
        assert_eq!(paths.iter_set().count(), CutOffPaths::COUNT);
    }
}
