mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mindlink", version, about = "EEG headset link CLI")]
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

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

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
    use mindlink_headset::HeadsetId;

    use super::*;

    #[test]
    fn parses_stream_subcommand() {
        let cli = Cli::try_parse_from([
            "mindlink",
            "stream",
            "/dev/ttyUSB0",
            "--headset-id",
            "0x0A1B",
            "--count",
            "5",
        ])
        .expect("stream args should parse");

        match cli.command {
            Command::Stream(args) => {
                assert_eq!(args.port, "/dev/ttyUSB0");
                assert_eq!(args.headset_id, HeadsetId::new(0x0A1B));
                assert_eq!(args.count, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn stream_defaults_to_any_headset() {
        let cli = Cli::try_parse_from(["mindlink", "stream", "/dev/ttyUSB0"])
            .expect("stream args should parse");
        match cli.command {
            Command::Stream(args) => assert!(args.headset_id.is_any()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_headset_id() {
        let err = Cli::try_parse_from([
            "mindlink",
            "stream",
            "/dev/ttyUSB0",
            "--headset-id",
            "xyz",
        ])
        .expect_err("non-hex id should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "mindlink",
            "--format",
            "json",
            "decode",
            "capture.bin",
            "--changes-only",
        ])
        .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(ref args) if args.changes_only));
    }
}
