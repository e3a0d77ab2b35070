use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use sickscan_cola2::{Features, InterfaceType};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod configure;
pub mod decode;
pub mod info;
pub mod scan;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Push communication settings to a device.
    Configure(ConfigureArgs),
    /// Read device name and serial number.
    Info(InfoArgs),
    /// Receive and print scan data.
    Scan(ScanArgs),
    /// Decode a captured scan telegram or datagram.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Configure(args) => configure::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Scan(args) => scan::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Device command address (host:port).
    #[arg(env = "SICKSCAN_DEVICE")]
    pub addr: String,
    /// JSON file with communication settings; flags override its values.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
    /// Host address the device sends scan data to.
    #[arg(long)]
    pub host_ip: Option<Ipv4Addr>,
    /// Host UDP port the device sends scan data to.
    #[arg(long)]
    pub host_port: Option<u16>,
    /// Output channel on the device.
    #[arg(long)]
    pub channel: Option<u8>,
    #[arg(long, value_enum)]
    pub interface: Option<InterfaceArg>,
    /// Publish every n-th scan.
    #[arg(long)]
    pub frequency: Option<u16>,
    /// Start angle in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub start_angle: Option<f64>,
    /// End angle in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub end_angle: Option<f64>,
    /// Published blocks: `all`, `none`, or a comma list
    /// (general_system_state,derived_values,measurement_data,...).
    #[arg(long)]
    pub features: Option<Features>,
    /// Disable the output channel.
    #[arg(long)]
    pub disable: bool,
    /// Reply timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum InterfaceArg {
    EfiPro,
    EthernetIp,
    Profinet,
    NonSafeEthernet,
}

impl From<InterfaceArg> for InterfaceType {
    fn from(arg: InterfaceArg) -> Self {
        match arg {
            InterfaceArg::EfiPro => InterfaceType::EfiPro,
            InterfaceArg::EthernetIp => InterfaceType::EthernetIp,
            InterfaceArg::Profinet => InterfaceType::Profinet,
            InterfaceArg::NonSafeEthernet => InterfaceType::NonSafeEthernet,
        }
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Device command address (host:port).
    #[arg(env = "SICKSCAN_DEVICE")]
    pub addr: String,
    /// Reply timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Local UDP address to receive scan data on.
    #[arg(default_value = "0.0.0.0:6060")]
    pub bind: String,
    /// Exit after printing N scans.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding one scan telegram, or one unfragmented UDP datagram.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
