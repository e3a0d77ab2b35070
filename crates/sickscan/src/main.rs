mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sickscan", version, about = "COLA2 safety laser scanner CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Per-target log directives, e.g. `sickscan_cola2=trace`.
    #[arg(long, value_name = "DIRECTIVES", env = "SICKSCAN_LOG", global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level, cli.log_filter.as_deref());

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_configure_subcommand() {
        let cli = Cli::try_parse_from([
            "sickscan",
            "configure",
            "192.168.1.10:2122",
            "--host-ip",
            "192.168.1.2",
            "--start-angle",
            "-47.5",
            "--features",
            "derived_values,measurement_data",
        ])
        .expect("configure args should parse");

        let Command::Configure(args) = cli.command else {
            panic!("expected configure");
        };
        assert_eq!(args.start_angle, Some(-47.5));
        assert_eq!(args.features.map(|f| f.bits()), Some(0b110));
    }

    #[test]
    fn rejects_unknown_feature() {
        let err = Cli::try_parse_from([
            "sickscan",
            "configure",
            "192.168.1.10:2122",
            "--features",
            "everything",
        ])
        .expect_err("unknown feature should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_scan_with_default_bind() {
        let cli = Cli::try_parse_from(["sickscan", "scan", "--count", "3"])
            .expect("scan args should parse");
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.bind, "0.0.0.0:6060");
        assert_eq!(args.count, Some(3));
    }

    #[test]
    fn parses_info_subcommand() {
        let cli = Cli::try_parse_from(["sickscan", "info", "10.0.0.5:2122", "--timeout", "3s"])
            .expect("info args should parse");
        assert!(matches!(cli.command, Command::Info(_)));
    }
}
