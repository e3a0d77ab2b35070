use serde::Serialize;
use sickscan_wire::codec::{read_u16_le, read_u32_le, read_u8};
use sickscan_wire::{WireError, ANGLE_UNITS_PER_DEGREE};
use tracing::warn;

use crate::data::Data;
use crate::header::BlockRange;

/// Size of the beam count preceding the beams.
const BEAM_COUNT_SIZE: usize = 4;
/// Bytes per beam: distance u16, reflectivity u8, status u8.
pub const BEAM_SIZE: usize = 4;

pub const STATUS_VALID: u8 = 1 << 0;
pub const STATUS_INFINITE: u8 = 1 << 1;
pub const STATUS_GLARE: u8 = 1 << 2;
pub const STATUS_REFLECTOR: u8 = 1 << 3;
pub const STATUS_CONTAMINATION: u8 = 1 << 4;
pub const STATUS_CONTAMINATION_WARNING: u8 = 1 << 5;

/// One measurement sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Beam {
    /// Raw distance; multiply by the derived multiplication factor for millimetres.
    pub distance: u16,
    pub reflectivity: u8,
    pub status: u8,
    /// Beam direction in degrees.
    pub angle: f64,
}

impl Beam {
    pub fn is_valid(&self) -> bool {
        self.status & STATUS_VALID != 0
    }

    pub fn is_infinite(&self) -> bool {
        self.status & STATUS_INFINITE != 0
    }

    pub fn has_glare(&self) -> bool {
        self.status & STATUS_GLARE != 0
    }

    pub fn is_reflector(&self) -> bool {
        self.status & STATUS_REFLECTOR != 0
    }

    pub fn is_contaminated(&self) -> bool {
        self.status & STATUS_CONTAMINATION != 0
    }

    pub fn is_contamination_warning(&self) -> bool {
        self.status & STATUS_CONTAMINATION_WARNING != 0
    }
}

/// Per-beam samples of one scan, in beam order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementData {
    pub beams: Vec<Beam>,
    pub is_empty: bool,
}

impl MeasurementData {
    pub fn empty() -> Self {
        Self {
            beams: Vec::new(),
            is_empty: true,
        }
    }

    pub fn number_of_beams(&self) -> usize {
        self.beams.len()
    }
}

/// Precondition: header parsed, block published, derived values present
/// with at least one beam.
pub fn locate_measurement_data(data: &Data) -> Option<BlockRange> {
    let range = data.header.published(data.header.measurement_data)?;
    let derived = &data.derived_values;
    if derived.is_empty || derived.number_of_beams == 0 {
        return None;
    }
    Some(range)
}

/// Measurement data stage. Beam count and angles come from the derived values.
pub fn parse_measurement_data(buf: &[u8], data: &Data) -> Result<MeasurementData, WireError> {
    let Some(range) = locate_measurement_data(data) else {
        return Ok(MeasurementData::empty());
    };
    let block = range.slice(buf)?;

    let derived = &data.derived_values;
    let count = usize::from(derived.number_of_beams);
    let declared = read_u32_le(block, 0)?;
    if declared as usize != count {
        warn!(
            declared,
            derived = count,
            "measurement beam count differs from derived values"
        );
    }

    let start = f64::from(derived.start_angle);
    let step = f64::from(derived.angular_beam_resolution);
    let mut beams = Vec::with_capacity(count);
    for i in 0..count {
        let offset = BEAM_COUNT_SIZE + i * BEAM_SIZE;
        beams.push(Beam {
            distance: read_u16_le(block, offset)?,
            reflectivity: read_u8(block, offset + 2)?,
            status: read_u8(block, offset + 3)?,
            angle: (start + i as f64 * step) / ANGLE_UNITS_PER_DEGREE,
        });
    }

    Ok(MeasurementData {
        beams,
        is_empty: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::DerivedValues;
    use crate::header::DataHeader;

    const UNITS: i32 = ANGLE_UNITS_PER_DEGREE as i32;

    fn data(beams: u16, range: BlockRange) -> Data {
        let mut data = Data::empty();
        data.header = DataHeader {
            measurement_data: range,
            is_empty: false,
            ..DataHeader::empty()
        };
        data.derived_values = DerivedValues {
            number_of_beams: beams,
            start_angle: -10 * UNITS,
            angular_beam_resolution: UNITS / 2,
            is_empty: false,
            ..DerivedValues::default()
        };
        data
    }

    fn block(samples: &[(u16, u8, u8)]) -> Vec<u8> {
        let mut buf = (samples.len() as u32).to_le_bytes().to_vec();
        for (distance, reflectivity, status) in samples {
            buf.extend_from_slice(&distance.to_le_bytes());
            buf.push(*reflectivity);
            buf.push(*status);
        }
        buf
    }

    #[test]
    fn reads_beams_with_angles() {
        let samples = [
            (1000, 10, STATUS_VALID),
            (0, 0, STATUS_INFINITE | STATUS_VALID),
            (250, 200, STATUS_VALID | STATUS_REFLECTOR | STATUS_GLARE),
        ];
        let buf = block(&samples);
        let range = BlockRange::new(0, buf.len() as u32);
        let measurement = parse_measurement_data(&buf, &data(3, range)).unwrap();

        assert!(!measurement.is_empty);
        assert_eq!(measurement.number_of_beams(), 3);
        let angles: Vec<f64> = measurement.beams.iter().map(|b| b.angle).collect();
        assert_eq!(angles, vec![-10.0, -9.5, -9.0]);

        let beam = measurement.beams[2];
        assert_eq!(beam.distance, 250);
        assert_eq!(beam.reflectivity, 200);
        assert!(beam.is_valid() && beam.is_reflector() && beam.has_glare());
        assert!(!beam.is_infinite() && !beam.is_contaminated());
        assert!(measurement.beams[1].is_infinite());
    }

    #[test]
    fn derived_beam_count_wins() {
        let buf = block(&[(1, 0, 0), (2, 0, 0), (3, 0, 0)]);
        let range = BlockRange::new(0, buf.len() as u32);
        let measurement = parse_measurement_data(&buf, &data(2, range)).unwrap();
        assert_eq!(measurement.number_of_beams(), 2);
        assert_eq!(measurement.beams[1].distance, 2);
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn beam_count_mismatch_is_a_warning() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        let buf = block(&[(1, 0, 0), (2, 0, 0), (3, 0, 0)]);
        let range = BlockRange::new(0, buf.len() as u32);
        let measurement = tracing::subscriber::with_default(subscriber, || {
            parse_measurement_data(&buf, &data(2, range)).unwrap()
        });
        assert_eq!(measurement.number_of_beams(), 2);

        let logged = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("beam count differs"), "{logged}");
    }

    #[test]
    fn zero_beams_yields_empty() {
        let buf = block(&[(1, 0, 0)]);
        let measurement = parse_measurement_data(&buf, &data(0, BlockRange::new(0, 8))).unwrap();
        assert!(measurement.is_empty);
    }

    #[test]
    fn missing_derived_values_yields_empty() {
        let buf = block(&[(1, 0, 0)]);
        let mut data = data(1, BlockRange::new(0, 8));
        data.derived_values = DerivedValues::empty();
        assert!(parse_measurement_data(&buf, &data).unwrap().is_empty);
    }

    #[test]
    fn absent_block_yields_empty() {
        let buf = block(&[(1, 0, 0)]);
        assert!(parse_measurement_data(&buf, &data(1, BlockRange::ABSENT))
            .unwrap()
            .is_empty);
    }

    #[test]
    fn more_beams_than_block_is_underrun() {
        let buf = block(&[(1, 0, 0), (2, 0, 0)]);
        assert!(matches!(
            parse_measurement_data(&buf, &data(5, BlockRange::new(0, buf.len() as u32))),
            Err(WireError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn contamination_flags() {
        let beam = Beam {
            distance: 0,
            reflectivity: 0,
            status: STATUS_CONTAMINATION | STATUS_CONTAMINATION_WARNING,
            angle: 0.0,
        };
        assert!(beam.is_contaminated());
        assert!(beam.is_contamination_warning());
        assert!(!beam.is_valid());
    }
}
