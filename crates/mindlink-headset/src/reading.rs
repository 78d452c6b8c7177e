use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

/// Length of the band-power record: eight 24-bit values.
pub const BAND_POWER_RECORD_LEN: usize = 24;

/// Names of the eight EEG bands, in wire order.
pub const BAND_NAMES: [&str; 8] = [
    "delta",
    "theta",
    "low_alpha",
    "high_alpha",
    "low_beta",
    "high_beta",
    "low_gamma",
    "mid_gamma",
];

/// EEG band powers (unsigned 24-bit, unitless).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandPowers {
    pub delta: u32,
    pub theta: u32,
    pub low_alpha: u32,
    pub high_alpha: u32,
    pub low_beta: u32,
    pub high_beta: u32,
    pub low_gamma: u32,
    pub mid_gamma: u32,
}

impl BandPowers {
    /// Unpack eight consecutive big-endian 24-bit values.
    pub fn from_be_bytes(data: &[u8; BAND_POWER_RECORD_LEN]) -> Self {
        let mut values = [0u32; 8];
        for (value, chunk) in values.iter_mut().zip(data.chunks_exact(3)) {
            *value = u32::from_be_bytes([0, chunk[0], chunk[1], chunk[2]]);
        }
        let [delta, theta, low_alpha, high_alpha, low_beta, high_beta, low_gamma, mid_gamma] =
            values;
        Self {
            delta,
            theta,
            low_alpha,
            high_alpha,
            low_beta,
            high_beta,
            low_gamma,
            mid_gamma,
        }
    }

    /// Values in wire order, matching [`BAND_NAMES`].
    pub fn to_array(&self) -> [u32; 8] {
        [
            self.delta,
            self.theta,
            self.low_alpha,
            self.high_alpha,
            self.low_beta,
            self.high_beta,
            self.low_gamma,
            self.mid_gamma,
        ]
    }
}

/// The latest decoded values reported by the headset.
///
/// Every field starts at zero and keeps its last reported value until the
/// headset sends a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SensorReading {
    /// 0 is good contact, 200 means the sensor is off the skin.
    pub poor_signal_quality: u8,
    /// Attention eSense, 0..=100 (0 means unreliable).
    pub attention_esense: u8,
    /// Meditation eSense, 0..=100 (0 means unreliable).
    pub meditation_esense: u8,
    pub blink_strength: u8,
    /// Raw EEG sample.
    pub raw_wave: i16,
    pub bands: BandPowers,
}

/// A [`SensorReading`] shared between the poll thread and callers.
///
/// Readers only get copies and writers replace the whole record, so nobody
/// ever sees half of an update. Outside this crate the handle is read-only;
/// the poll thread is the single writer.
///
/// ```compile_fail
/// let shared = mindlink_headset::SharedReading::new();
/// let _ = shared.update(|reading| {
///     reading.attention_esense = 99;
///     Ok::<(), ()>(())
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedReading {
    inner: Arc<Mutex<SensorReading>>,
}

impl SharedReading {
    /// Create a zeroed shared reading.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current reading.
    pub fn snapshot(&self) -> SensorReading {
        *self.lock()
    }

    /// Apply `update` to a copy of the reading and commit it only on success.
    ///
    /// The lock is held for the whole call; `update` must not block.
    pub(crate) fn update<E>(
        &self,
        update: impl FnOnce(&mut SensorReading) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut guard = self.lock();
        let mut next = *guard;
        update(&mut next)?;
        *guard = next;
        Ok(())
    }

    // A reading is plain data, so a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, SensorReading> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
