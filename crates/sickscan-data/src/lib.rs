//! Scan data decoding for COLA2 safety laser scanners.
//!
//! UDP datagrams go through a [`FragmentMerger`]; complete telegrams go
//! through [`parse_scan`], which runs the stage pipeline described in
//! [`data`] and returns a [`Data`] record. Blocks the device does not
//! publish come back as empty records, not errors.

pub mod data;
pub mod datagram;
pub mod derived;
pub mod error;
pub mod header;
pub mod measurement;
pub mod system_state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use data::{parse_scan, Data};
pub use datagram::{DatagramHeader, FragmentMerger, MergerConfig, DATAGRAM_HEADER_SIZE};
pub use derived::DerivedValues;
pub use error::{ParseError, Result};
pub use header::{BlockRange, DataHeader, DATA_HEADER_SIZE};
pub use measurement::{Beam, MeasurementData};
pub use system_state::{CutOffPaths, GeneralSystemState};
