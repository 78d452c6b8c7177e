use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use mindlink_frame::{FrameError, PacketReader};
use mindlink_transport::{ByteChannel, TransportError};
use tracing::{debug, info, warn};

use crate::decoder::{decode, DecodeError};
use crate::error::{HeadsetError, Result};
use crate::reading::SharedReading;

/// Configuration for the background poll thread.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause after every packet so the poll thread never monopolizes a core.
    pub poll_interval: Duration,
    /// Name given to the poll thread.
    pub thread_name: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
            thread_name: "mindlink-poll".to_string(),
        }
    }
}

/// Spawns the thread that keeps a [`SharedReading`] current.
pub struct Poller;

impl Poller {
    /// Move `reader` onto a new poll thread that decodes every packet into
    /// `shared`.
    ///
    /// Returns once the thread is running. Framing and decoding errors are
    /// logged and polling continues; only [`PollHandle::stop`] or a closed
    /// channel ends the loop.
    pub fn spawn<C>(
        reader: PacketReader<C>,
        shared: SharedReading,
        config: PollConfig,
    ) -> Result<PollHandle<C>>
    where
        C: ByteChannel + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(Counters::default());
        let (started_tx, started_rx) = mpsc::channel();

        let thread = {
            let running = Arc::clone(&running);
            let counters = Arc::clone(&counters);
            std::thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || {
                    let _ = started_tx.send(());
                    poll_loop(reader, &shared, &running, &counters, config.poll_interval)
                })
                .map_err(HeadsetError::Spawn)?
        };

        if started_rx.recv().is_err() {
            running.store(false, Ordering::SeqCst);
            return Err(HeadsetError::PollPanicked);
        }

        Ok(PollHandle {
            running,
            counters,
            thread: Some(thread),
        })
    }
}

#[derive(Debug, Default)]
struct Counters {
    packets: AtomicU64,
    errors: AtomicU64,
}

/// Handle to a running poll thread.
///
/// Dropping the handle without calling [`stop`](Self::stop) leaves the
/// thread to finish on its own once its channel closes.
pub struct PollHandle<C> {
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    thread: Option<JoinHandle<PacketReader<C>>>,
}

impl<C> PollHandle<C> {
    /// Whether the poll loop is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self
                .thread
                .as_ref()
                .is_some_and(|thread| !thread.is_finished())
    }

    /// Packets decoded so far.
    pub fn packets(&self) -> u64 {
        self.counters.packets.load(Ordering::Relaxed)
    }

    /// Framing and decoding errors seen so far.
    pub fn errors(&self) -> u64 {
        self.counters.errors.load(Ordering::Relaxed)
    }

    /// Stop the loop and take the channel back.
    ///
    /// An in-flight read is not interrupted. A read gives up after one read
    /// timeout without data, or after [`MAX_SYNC_SCAN`] bytes without a sync
    /// marker, so the wait is bounded even on a noisy line.
    ///
    /// [`MAX_SYNC_SCAN`]: mindlink_frame::MAX_SYNC_SCAN
    pub fn stop(mut self) -> Result<C> {
        self.running.store(false, Ordering::SeqCst);
        let thread = self.thread.take().ok_or(HeadsetError::NotConnected)?;
        let reader = thread.join().map_err(|_| HeadsetError::PollPanicked)?;
        debug!(packets = self.packets(), errors = self.errors(), "poll thread stopped");
        Ok(reader.into_inner())
    }
}

impl<C> std::fmt::Debug for PollHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("running", &self.is_running())
            .field("packets", &self.packets())
            .field("errors", &self.errors())
            .finish()
    }
}

fn poll_loop<C: ByteChannel>(
    mut reader: PacketReader<C>,
    shared: &SharedReading,
    running: &AtomicBool,
    counters: &Counters,
    poll_interval: Duration,
) -> PacketReader<C> {
    info!(read_timeout = ?reader.get_ref().read_timeout(), "poll loop started");

    while running.load(Ordering::SeqCst) {
        match reader.read_packet() {
            Ok(packet) => match shared.update(|reading| decode(packet.payload(), reading)) {
                Ok(()) => {
                    counters.packets.fetch_add(1, Ordering::Relaxed);
                }
                Err(DecodeError::Disconnected) => {
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                    warn!("dongle reports headset disconnected");
                }
                Err(err) => {
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(%err, "dropping malformed payload");
                }
            },
            Err(FrameError::Transport(TransportError::Closed)) => {
                warn!("channel closed, stopping poll loop");
                running.store(false, Ordering::SeqCst);
                break;
            }
            Err(FrameError::Transport(TransportError::Timeout(timeout))) => {
                debug!(?timeout, "no data from dongle");
            }
            Err(FrameError::NoSync { scanned }) => {
                counters.errors.fetch_add(1, Ordering::Relaxed);
                debug!(scanned, "no sync marker on the line");
            }
            Err(err) => {
                counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(%err, "packet dropped");
            }
        }

        std::thread::sleep(poll_interval);
    }

    info!("poll loop finished");
    reader
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use bytes::BytesMut;
    use mindlink_frame::encode_packet;
    use mindlink_transport::MemoryChannel;

    use super::*;
    use crate::reading::SensorReading;

    fn wire(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_packet(payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn spawn(probe: &MemoryChannel, shared: &SharedReading) -> PollHandle<MemoryChannel> {
        Poller::spawn(
            PacketReader::new(probe.clone()),
            shared.clone(),
            PollConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn publishes_decoded_packets() {
        let probe = MemoryChannel::with_timeout(Duration::from_millis(10));
        let shared = SharedReading::new();
        let handle = spawn(&probe, &shared);
        assert!(handle.is_running());

        probe.feed(wire(&[0x04, 0x3A, 0x05, 0x22]));
        probe.feed(wire(&[0x80, 0x02, 0xFF, 0x38]));
        wait_for(|| handle.packets() == 2);

        let reading = shared.snapshot();
        assert_eq!(reading.attention_esense, 0x3A);
        assert_eq!(reading.meditation_esense, 0x22);
        assert_eq!(reading.raw_wave, -200);

        let channel = handle.stop().unwrap();
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn errors_are_counted_and_polling_continues() {
        let probe = MemoryChannel::with_timeout(Duration::from_millis(10));
        let shared = SharedReading::new();
        let handle = spawn(&probe, &shared);

        let mut corrupt = wire(&[0x04, 0x10]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x01;
        probe.feed(corrupt);
        probe.feed(wire(&[0xD2, 0x00]));
        probe.feed(wire(&[0x80, 0x02, 0x01]));
        probe.feed(wire(&[0x16, 0x50]));
        wait_for(|| handle.packets() == 1);

        assert_eq!(handle.errors(), 3);
        assert_eq!(shared.snapshot().blink_strength, 0x50);
        assert_eq!(shared.snapshot().attention_esense, 0);
        handle.stop().unwrap();
    }

    #[test]
    fn closed_channel_ends_loop() {
        let probe = MemoryChannel::with_timeout(Duration::from_millis(10));
        let shared = SharedReading::new();
        let handle = spawn(&probe, &shared);

        probe.feed(wire(&[0x02, 0x00]));
        probe.finish();
        wait_for(|| !handle.is_running());

        assert_eq!(handle.packets(), 1);
        handle.stop().unwrap();
    }

    #[test]
    fn stop_returns_while_line_carries_noise() {
        let probe = MemoryChannel::with_timeout(Duration::from_millis(50));
        let shared = SharedReading::new();
        let handle = spawn(&probe, &shared);

        let noisy = Arc::new(AtomicBool::new(true));
        let feeder = {
            let probe = probe.clone();
            let noisy = Arc::clone(&noisy);
            std::thread::spawn(move || {
                while noisy.load(Ordering::SeqCst) {
                    probe.feed([0x00; 16]);
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
        };
        wait_for(|| handle.errors() > 0);

        let (done_tx, done_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = done_tx.send(handle.stop().is_ok());
        });
        let stopped = done_rx.recv_timeout(Duration::from_secs(3));

        noisy.store(false, Ordering::SeqCst);
        feeder.join().unwrap();
        assert_eq!(stopped, Ok(true), "stop did not return on a noisy line");
        assert_eq!(shared.snapshot(), SensorReading::default());
    }

    #[test]
    fn stop_returns_within_a_read_timeout() {
        let probe = MemoryChannel::with_timeout(Duration::from_millis(50));
        let shared = SharedReading::new();
        let handle = spawn(&probe, &shared);

        let started = Instant::now();
        handle.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
