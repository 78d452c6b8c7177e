use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};
use crate::traits::ByteChannel;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

/// In-memory byte channel.
///
/// Clones share the same state, so one handle can be moved into the headset
/// link while another feeds device bytes and inspects what the host wrote.
/// Reads wait up to the read timeout for bytes to arrive; once
/// [`finish`](Self::finish) is called an empty queue reads as
/// [`TransportError::Closed`].
#[derive(Clone)]
pub struct MemoryChannel {
    shared: Arc<Shared>,
    timeout: Duration,
}

struct Shared {
    state: Mutex<State>,
    readable: Condvar,
}

#[derive(Default)]
struct State {
    input: VecDeque<u8>,
    written: Vec<u8>,
    finished: bool,
    closed: bool,
    flushes: usize,
}

impl MemoryChannel {
    /// Create an empty channel with the default read timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create an empty channel with an explicit read timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                readable: Condvar::new(),
            }),
            timeout,
        }
    }

    /// Create a channel that replays `bytes` and then reports end of input.
    pub fn replay(bytes: impl AsRef<[u8]>) -> Self {
        let channel = Self::new();
        channel.feed(bytes);
        channel.finish();
        channel
    }

    /// Queue bytes as if the device had sent them.
    pub fn feed(&self, bytes: impl AsRef<[u8]>) {
        let mut state = self.lock();
        state.input.extend(bytes.as_ref().iter().copied());
        self.shared.readable.notify_all();
    }

    /// Mark the end of device input.
    pub fn finish(&self) {
        self.lock().finished = true;
        self.shared.readable.notify_all();
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Number of device bytes not yet read.
    pub fn pending(&self) -> usize {
        self.lock().input.len()
    }

    /// Number of `flush_input` calls made on the channel.
    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }

    /// Whether `close` has been called on any clone.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteChannel for MemoryChannel {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut state = self.lock();
        for slot in buf.iter_mut() {
            let deadline = Instant::now() + self.timeout;
            loop {
                if state.closed {
                    return Err(TransportError::Closed);
                }
                if let Some(byte) = state.input.pop_front() {
                    *slot = byte;
                    break;
                }
                if state.finished {
                    return Err(TransportError::Closed);
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(TransportError::Timeout(self.timeout));
                }
                state = self
                    .shared
                    .readable
                    .wait_timeout(state, remaining)
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .0;
            }
        }
        Ok(())
    }

    fn flush_input(&mut self, _window: Duration) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.input.clear();
        state.flushes += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.lock().closed = true;
        self.shared.readable.notify_all();
    }

    fn read_timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for MemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryChannel")
            .field("pending", &state.input.len())
            .field("written", &state.written.len())
            .field("finished", &state.finished)
            .field("closed", &state.closed)
            .finish()
    }
}
