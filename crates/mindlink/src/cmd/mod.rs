use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use mindlink_headset::HeadsetId;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod ports;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a headset and print its readings.
    Stream(StreamArgs),
    /// Decode a captured byte stream offline.
    Decode(DecodeArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Stream(args) => stream::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Serial device of the dongle (e.g. /dev/ttyUSB0).
    pub port: String,
    /// Headset id to bind to (4 hex digits). Default: any headset.
    #[arg(long, value_name = "HEX", default_value = "0000")]
    pub headset_id: HeadsetId,
    /// Per-byte read timeout (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub read_timeout: String,
    /// Give up binding after this long (e.g. 30s). Default: wait indefinitely.
    #[arg(long)]
    pub search_timeout: Option<String>,
    /// How often to print the latest reading.
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Exit after printing N readings.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding raw bytes captured from the dongle.
    pub file: PathBuf,
    /// Only print readings after packets that changed them.
    #[arg(long)]
    pub changes_only: bool,
    /// Exit after printing N readings.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(name: &str, input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, format!("{name} must not be empty")));
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
        .map_err(|_| CliError::new(USAGE, format!("invalid {name} value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, format!("{name} must be greater than zero")));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(USAGE, format!("unsupported {name} unit: {unit}"))),
    }
}
