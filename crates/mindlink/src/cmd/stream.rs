use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mindlink_headset::{HandshakeConfig, Headset, HeadsetConfig};
use tracing::{info, warn};

use crate::cmd::{parse_duration, StreamArgs};
use crate::exit::{headset_error, CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_reading, OutputFormat};

pub fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let read_timeout = parse_duration("read-timeout", &args.read_timeout)?;
    let interval = parse_duration("interval", &args.interval)?;
    let search_timeout = args
        .search_timeout
        .as_deref()
        .map(|value| parse_duration("search-timeout", value))
        .transpose()?;

    let config = HeadsetConfig {
        headset_id: args.headset_id,
        read_timeout,
        handshake: HandshakeConfig {
            search_timeout,
            ..HandshakeConfig::default()
        },
        ..HeadsetConfig::default()
    };

    let mut headset =
        Headset::connect(&args.port, config).map_err(|err| headset_error("connect failed", err))?;
    let headset_id = headset.global_headset_id();
    info!(port = %args.port, headset_id = %headset_id, "streaming readings");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0u64;
    let mut lost = false;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(interval);

        if !headset.is_connected() {
            lost = true;
            break;
        }

        printed = printed.saturating_add(1);
        print_reading(&headset.snapshot(), printed, Some(headset_id), format);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    let packets = headset.packets();
    if let Err(err) = headset.disconnect() {
        warn!(error = %err, "disconnect failed");
    }
    info!(packets, printed, "stream finished");

    if lost {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!("link to {} lost", args.port),
        ));
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
