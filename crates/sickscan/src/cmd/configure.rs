use std::fs;

use serde::Serialize;
use sickscan_cola2::{connect, CommSettings, SessionConfig};
use tracing::warn;

use crate::cmd::{parse_timeout, ConfigureArgs};
use crate::exit::{io_error, session_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct ConfigureOutput<'a> {
    address: &'a str,
    session_id: Option<u32>,
    settings: &'a CommSettings,
}

pub fn run(args: ConfigureArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;
    let settings = build_settings(&args)?;

    let config = SessionConfig {
        timeout,
        ..SessionConfig::default()
    };
    let session = connect(&args.addr, config).map_err(|err| session_error("connect failed", err))?;
    let session_id = session.session_id();

    let applied = session.change_comm_settings(&settings);
    if let Err(err) = session.close() {
        warn!(error = %err, "closing session failed");
    }
    applied.map_err(|err| session_error("change comm settings failed", err))?;

    let out = ConfigureOutput {
        address: &args.addr,
        session_id,
        settings: &settings,
    };
    print_configured(&out, format);
    Ok(SUCCESS)
}

fn build_settings(args: &ConfigureArgs) -> CliResult<CommSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|err| io_error(&format!("read {}", path.display()), err))?;
            serde_json::from_str(&text).map_err(|err| {
                CliError::new(
                    DATA_INVALID,
                    format!("invalid settings file {}: {err}", path.display()),
                )
            })?
        }
        None => CommSettings::default(),
    };

    if let Some(channel) = args.channel {
        settings.channel = channel;
    }
    if let Some(interface) = args.interface {
        settings.interface_type = interface.into();
    }
    if let Some(ip) = args.host_ip {
        settings.host_ip = ip;
    }
    if let Some(port) = args.host_port {
        settings.host_udp_port = port;
    }
    if let Some(frequency) = args.frequency {
        settings.publishing_frequency = frequency;
    }
    if args.start_angle.is_some() || args.end_angle.is_some() {
        let start = args.start_angle.unwrap_or(settings.start_angle_degrees());
        let end = args.end_angle.unwrap_or(settings.end_angle_degrees());
        settings = settings.with_angles_degrees(start, end);
    }
    if let Some(features) = args.features {
        settings.features = features;
    }
    if args.disable {
        settings.enabled = false;
    }

    Ok(settings)
}

fn print_configured(out: &ConfigureOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            let s = out.settings;
            println!("Configured {}:", out.address);
            let status = if s.enabled { "enabled" } else { "disabled" };
            println!("  Channel:    {} ({status})", s.channel);
            println!("  Interface:  {:?}", s.interface_type);
            println!("  Target:     {}:{}", s.host_ip, s.host_udp_port);
            println!("  Frequency:  every {} scan(s)", s.publishing_frequency);
            println!(
                "  Angles:     {:.2}° .. {:.2}°",
                s.start_angle_degrees(),
                s.end_angle_degrees()
            );
            println!("  Features:   {}", s.features);
        }
        OutputFormat::Raw => println!("ok"),
    }
}
