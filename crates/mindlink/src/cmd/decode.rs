use mindlink_frame::{FrameError, PacketReader};
use mindlink_headset::{decode, SensorReading};
use mindlink_transport::{MemoryChannel, TransportError};
use tracing::{debug, info, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_reading, OutputFormat};

/// Replays a capture through the same framer and decoder the live link uses.
pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = std::fs::read(&args.file)
        .map_err(|err| io_error(&format!("read {} failed", args.file.display()), err))?;
    let total = bytes.len();

    let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
    let mut reading = SensorReading::default();
    let mut packets = 0u64;
    let mut errors = 0u64;
    let mut printed = 0u64;

    loop {
        let packet = match reader.read_packet() {
            Ok(packet) => packet,
            Err(FrameError::Transport(TransportError::Closed)) => break,
            Err(err) if err.is_transient() => {
                errors = errors.saturating_add(1);
                warn!(error = %err, "discarding packet");
                continue;
            }
            Err(err) => return Err(frame_error("decode failed", err)),
        };
        packets = packets.saturating_add(1);

        let mut next = reading;
        if let Err(err) = decode(packet.payload(), &mut next) {
            errors = errors.saturating_add(1);
            warn!(error = %err, tag = packet.tag(), "payload rejected");
            continue;
        }

        if args.changes_only && next == reading {
            debug!(tag = packet.tag(), "packet left reading unchanged");
            continue;
        }
        reading = next;

        printed = printed.saturating_add(1);
        print_reading(&reading, printed, None, format);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    info!(bytes = total, packets, errors, printed, "capture decoded");
    Ok(SUCCESS)
}
