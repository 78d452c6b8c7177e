use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mindlink_headset::reading::BAND_NAMES;
use mindlink_headset::{HeadsetId, SensorReading};
use mindlink_transport::PortInfo;
use serde::Serialize;

const BAND_HEADERS: [&str; 8] = [
    "DELTA",
    "THETA",
    "LO-ALPHA",
    "HI-ALPHA",
    "LO-BETA",
    "HI-BETA",
    "LO-GAMMA",
    "MID-GAMMA",
];

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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

#[derive(Serialize)]
struct ReadingOutput<'a> {
    schema_id: &'a str,
    sequence: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    headset_id: Option<HeadsetId>,
    timestamp: String,
    #[serde(flatten)]
    reading: &'a SensorReading,
}

pub fn print_reading(
    reading: &SensorReading,
    sequence: u64,
    headset_id: Option<HeadsetId>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = ReadingOutput {
                schema_id: "https://schemas.3leaps.dev/mindlink/cli/v1/reading.schema.json",
                sequence,
                headset_id,
                timestamp: now_unix_seconds(),
                reading,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut header = vec!["SEQ", "HEADSET", "SIGNAL", "ATTN", "MED", "BLINK", "RAW"];
            header.extend(BAND_HEADERS);

            let mut row = vec![
                sequence.to_string(),
                headset_label(headset_id),
                reading.poor_signal_quality.to_string(),
                reading.attention_esense.to_string(),
                reading.meditation_esense.to_string(),
                reading.blink_strength.to_string(),
                reading.raw_wave.to_string(),
            ];
            row.extend(reading.bands.to_array().iter().map(u32::to_string));

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(row);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let bands = BAND_NAMES
                .iter()
                .zip(reading.bands.to_array())
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!(
                "[{sequence}] headset={} signal={} attention={} meditation={} blink={} raw={} {bands}",
                headset_label(headset_id),
                reading.poor_signal_quality,
                reading.attention_esense,
                reading.meditation_esense,
                reading.blink_strength,
                reading.raw_wave,
            );
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|port| PortOutput {
                    name: &port.name,
                    kind: port.kind,
                    description: port.description.as_deref(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "DESCRIPTION"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.description.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for port in ports {
                match &port.description {
                    Some(description) => println!("{} ({}) {description}", port.name, port.kind),
                    None => println!("{} ({})", port.name, port.kind),
                }
            }
        }
    }
}

fn headset_label(id: Option<HeadsetId>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
