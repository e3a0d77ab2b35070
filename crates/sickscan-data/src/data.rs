//! The scan data pipeline.
//!
//! Stages run in a fixed order over the same telegram buffer, each one
//! reading what earlier stages left in the [`Data`] accumulator:
//!
//! 1. header (always)
//! 2. general system state
//! 3. derived values
//! 4. measurement data (needs derived values)
//!
//! A stage whose block is not published yields an empty record. Only a
//! block that does not fit in the telegram fails the parse.

use serde::Serialize;
use sickscan_wire::PacketBuffer;
use tracing::trace;

use crate::derived::{parse_derived_values, DerivedValues};
use crate::error::Result;
use crate::header::{parse_header, DataHeader};
use crate::measurement::{parse_measurement_data, MeasurementData};
use crate::system_state::{parse_general_system_state, GeneralSystemState};

/// Everything decoded from one scan telegram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data {
    pub header: DataHeader,
    pub general_system_state: GeneralSystemState,
    pub derived_values: DerivedValues,
    pub measurement_data: MeasurementData,
}

impl Data {
    /// The accumulator before any stage ran.
    pub fn empty() -> Self {
        Self {
            header: DataHeader::empty(),
            general_system_state: GeneralSystemState::empty(),
            derived_values: DerivedValues::empty(),
            measurement_data: MeasurementData::empty(),
        }
    }
}

/// Decode a complete scan telegram.
pub fn parse_scan(packet: &PacketBuffer) -> Result<Data> {
    let buf = packet.as_slice();
    let mut data = Data::empty();

    data.header = parse_header(buf)?;
    data.general_system_state = parse_general_system_state(buf, &data)?;
    data.derived_values = parse_derived_values(buf, &data)?;
    data.measurement_data = parse_measurement_data(buf, &data)?;

    trace!(
        scan_number = data.header.scan_number,
        sequence = data.header.sequence_number,
        beams = data.measurement_data.number_of_beams(),
        system_state = !data.general_system_state.is_empty,
        derived = !data.derived_values.is_empty,
        "scan parsed"
    );
    Ok(data)
}
