use std::fs;

use sickscan_data::datagram::DATAGRAM_MARKER;
use sickscan_data::{parse_scan, FragmentMerger};
use sickscan_wire::PacketBuffer;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, parse_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_scan, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = fs::read(&args.file)
        .map_err(|err| io_error(&format!("read {}", args.file.display()), err))?;

    let packet = if bytes.starts_with(&DATAGRAM_MARKER) {
        FragmentMerger::default()
            .push(&bytes)
            .map_err(|err| parse_error("invalid datagram", err))?
            .ok_or_else(|| {
                CliError::new(
                    DATA_INVALID,
                    "datagram is one fragment of a larger telegram",
                )
            })?
    } else {
        PacketBuffer::new(bytes)
    };

    let data = parse_scan(&packet).map_err(|err| parse_error("invalid scan telegram", err))?;
    print_scan(&data, format);
    Ok(SUCCESS)
}
