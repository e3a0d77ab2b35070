use serde::Serialize;
use sickscan_cola2::{connect, SessionConfig};
use tracing::warn;

use crate::cmd::{parse_timeout, InfoArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    address: String,
    session_id: Option<u32>,
    device_name: String,
    serial_number: u32,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;
    let config = SessionConfig {
        timeout,
        ..SessionConfig::default()
    };
    let session = connect(&args.addr, config).map_err(|err| session_error("connect failed", err))?;
    let session_id = session.session_id();

    let identity = session
        .device_name()
        .and_then(|name| Ok((name, session.serial_number()?)));
    if let Err(err) = session.close() {
        warn!(error = %err, "closing session failed");
    }
    let (device_name, serial_number) =
        identity.map_err(|err| session_error("read device identity failed", err))?;

    let out = InfoOutput {
        address: args.addr,
        session_id,
        device_name,
        serial_number,
    };
    print_info(&out, format);
    Ok(SUCCESS)
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Device Info:");
            println!("  Address:        {}", out.address);
            println!("  Device name:    {}", out.device_name);
            println!("  Serial number:  {}", out.serial_number);
            match out.session_id {
                Some(id) => println!("  Session:        {id:#010x}"),
                None => println!("  Session:        none"),
            }
        }
        OutputFormat::Raw => {
            println!("{}", out.device_name);
        }
    }
}
