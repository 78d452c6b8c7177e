//! Binds to any headset and prints a thousand snapshots.
//!
//! Run with:
//!   cargo run --example stream-readings -- /dev/ttyUSB0
//!
//! Pass a second argument to bind a specific headset, e.g. `0A1B`.

use std::time::Duration;

use mindlink::headset::{connect, HeadsetId};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let headset_id = match args.next() {
        Some(raw) => raw.parse::<HeadsetId>()?,
        None => HeadsetId::ANY,
    };

    let mut headset = connect(&port, headset_id)?;
    eprintln!("Bound to headset {}", headset.global_headset_id());

    for i in 0..1000 {
        let reading = headset.snapshot();
        println!(
            "[{i}] {} : signal={} attention={} meditation={} blink={} raw={} bands={:?}",
            headset.global_headset_id(),
            reading.poor_signal_quality,
            reading.attention_esense,
            reading.meditation_esense,
            reading.blink_strength,
            reading.raw_wave,
            reading.bands.to_array(),
        );
        std::thread::sleep(Duration::from_millis(10));
    }

    headset.disconnect()?;
    Ok(())
}
