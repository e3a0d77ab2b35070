use std::fmt;
use std::net::Ipv4Addr;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sickscan_wire::{angle_to_degrees, degrees_to_angle};

/// Fieldbus interface the device publishes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum InterfaceType {
    EfiPro = 0,
    EthernetIp = 1,
    Profinet = 2,
    #[default]
    NonSafeEthernet = 3,
}

impl TryFrom<u8> for InterfaceType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(InterfaceType::EfiPro),
            1 => Ok(InterfaceType::EthernetIp),
            2 => Ok(InterfaceType::Profinet),
            3 => Ok(InterfaceType::NonSafeEthernet),
            other => Err(other),
        }
    }
}

/// Set of data blocks the device publishes in each scan telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features(u16);

impl Features {
    pub const NONE: Features = Features(0);
    pub const GENERAL_SYSTEM_STATE: Features = Features(1 << 0);
    pub const DERIVED_VALUES: Features = Features(1 << 1);
    pub const MEASUREMENT_DATA: Features = Features(1 << 2);
    pub const INTRUSION_DATA: Features = Features(1 << 3);
    pub const APPLICATION_DATA: Features = Features(1 << 4);
    pub const ALL: Features = Features(0x1F);

    const NAMES: [(&'static str, Features); 5] = [
        ("general_system_state", Features::GENERAL_SYSTEM_STATE),
        ("derived_values", Features::DERIVED_VALUES),
        ("measurement_data", Features::MEASUREMENT_DATA),
        ("intrusion_data", Features::INTRUSION_DATA),
        ("application_data", Features::APPLICATION_DATA),
    ];

    pub const fn from_bits(bits: u16) -> Self {
        Features(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Self) -> Self::Output {
        Features(self.0 | rhs.0)
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(","))
        }
    }
}

impl FromStr for Features {
    type Err = String;

    /// Parses `all`, `none`, or a comma-separated list of block names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => return Ok(Features::ALL),
            "none" | "" => return Ok(Features::NONE),
            _ => {}
        }

        s.split(',')
            .map(str::trim)
            .try_fold(Features::NONE, |acc, name| {
                Self::NAMES
                    .iter()
                    .find(|(known, _)| *known == name)
                    .map(|(_, flag)| acc | *flag)
                    .ok_or_else(|| format!("unknown feature '{name}'"))
            })
    }
}

/// Communication settings pushed to the device.
///
/// Angles are raw device units (see [`sickscan_wire::ANGLE_UNITS_PER_DEGREE`]);
/// a start and end angle of zero selects the full scan range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommSettings {
    /// Output channel index on the device.
    pub channel: u8,
    pub enabled: bool,
    pub interface_type: InterfaceType,
    /// Host address the device sends scan data to.
    pub host_ip: Ipv4Addr,
    /// Host UDP port the device sends scan data to.
    pub host_udp_port: u16,
    /// Publish every n-th scan.
    pub publishing_frequency: u16,
    pub start_angle: i32,
    pub end_angle: i32,
    pub features: Features,
}

impl Default for CommSettings {
    fn default() -> Self {
        Self {
            channel: 0,
            enabled: true,
            interface_type: InterfaceType::default(),
            host_ip: Ipv4Addr::UNSPECIFIED,
            host_udp_port: 6060,
            publishing_frequency: 1,
            start_angle: 0,
            end_angle: 0,
            features: Features::GENERAL_SYSTEM_STATE
                | Features::DERIVED_VALUES
                | Features::MEASUREMENT_DATA,
        }
    }
}

impl CommSettings {
    /// Set start and end angle from degrees.
    pub fn with_angles_degrees(mut self, start: f64, end: f64) -> Self {
        self.start_angle = degrees_to_angle(start);
        self.end_angle = degrees_to_angle(end);
        self
    }

    pub fn start_angle_degrees(&self) -> f64 {
        angle_to_degrees(self.start_angle)
    }

    pub fn end_angle_degrees(&self) -> f64 {
        angle_to_degrees(self.end_angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_type_from_u8() {
        assert_eq!(InterfaceType::try_from(2), Ok(InterfaceType::Profinet));
        assert_eq!(InterfaceType::try_from(9), Err(9));
        assert_eq!(InterfaceType::NonSafeEthernet as u8, 3);
    }

    #[test]
    fn features_parse_and_display() {
        let parsed: Features = "derived_values, measurement_data".parse().unwrap();
        assert_eq!(parsed, Features::DERIVED_VALUES | Features::MEASUREMENT_DATA);
        assert_eq!(parsed.bits(), 0b110);
        assert_eq!(parsed.to_string(), "derived_values,measurement_data");
        assert_eq!("all".parse::<Features>().unwrap(), Features::ALL);
        assert_eq!(Features::NONE.to_string(), "none");
        assert!("bogus".parse::<Features>().is_err());
    }

    #[test]
    fn features_contains() {
        assert!(Features::ALL.contains(Features::INTRUSION_DATA));
        assert!(!Features::DERIVED_VALUES.contains(Features::ALL));
    }

    #[test]
    fn angles_in_degrees() {
        let settings = CommSettings::default().with_angles_degrees(-47.5, 227.5);
        assert_eq!(settings.start_angle, -199_229_440);
        assert_eq!(settings.start_angle_degrees(), -47.5);
        assert_eq!(settings.end_angle_degrees(), 227.5);
    }

    #[test]
    fn settings_from_partial_json() {
        let settings: CommSettings = serde_json::from_str(
            r#"{
                "host_ip": "192.168.1.9",
                "host_udp_port": 6061,
                "interface_type": "profinet",
                "features": 7
            }"#,
        )
        .unwrap();

        assert_eq!(settings.host_ip, Ipv4Addr::new(192, 168, 1, 9));
        assert_eq!(settings.host_udp_port, 6061);
        assert_eq!(settings.interface_type, InterfaceType::Profinet);
        assert_eq!(settings.features.bits(), 7);
        assert!(settings.enabled);
        assert_eq!(settings.publishing_frequency, 1);
    }
}
