use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sickscan_data::Data;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One JSON line per value.
pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_scan(data: &Data, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "SCAN", "SEQUENCE", "CHANNEL", "BEAMS", "START", "RESOLUTION", "STATE",
                ])
                .add_row(vec![
                    data.header.scan_number.to_string(),
                    data.header.sequence_number.to_string(),
                    data.header.channel_number.to_string(),
                    data.measurement_data.number_of_beams().to_string(),
                    degrees_cell(data.derived_values.is_empty, data.derived_values.start_angle_degrees()),
                    degrees_cell(
                        data.derived_values.is_empty,
                        data.derived_values.angular_beam_resolution_degrees(),
                    ),
                    state_summary(data),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let valid = data
                .measurement_data
                .beams
                .iter()
                .filter(|beam| beam.is_valid())
                .count();
            println!(
                "scan={} seq={} channel={} beams={} valid={} state={}",
                data.header.scan_number,
                data.header.sequence_number,
                data.header.channel_number,
                data.measurement_data.number_of_beams(),
                valid,
                state_summary(data)
            );
        }
        OutputFormat::Raw => {
            let line = data
                .measurement_data
                .beams
                .iter()
                .map(|beam| beam.distance.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            print_raw(format!("{line}\n").as_bytes());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn degrees_cell(absent: bool, degrees: f64) -> String {
    if absent {
        "-".to_string()
    } else {
        format!("{degrees:.2}°")
    }
}

fn state_summary(data: &Data) -> String {
    let state = &data.general_system_state;
    if state.is_empty {
        return "-".to_string();
    }

    let mut flags = Vec::new();
    if state.run_mode_active {
        flags.push("run");
    }
    if state.standby_mode_active {
        flags.push("standby");
    }
    if state.contamination_warning {
        flags.push("contamination-warning");
    }
    if state.contamination_error {
        flags.push("contamination-error");
    }
    if state.application_error || state.device_error {
        flags.push("error");
    }
    if flags.is_empty() {
        "idle".to_string()
    } else {
        flags.join(",")
    }
}
