//! Payload decoding.
//!
//! A data payload is a run of records:
//!
//! ```text
//! [0x55 ...] code [vlength] data...
//! ```
//!
//! Leading `0x55` bytes raise the extended-code level of the record. Codes
//! below `0x80` carry exactly one data byte; from `0x80` up an explicit
//! length byte follows the code. Only level-0 records map to reading
//! fields today; higher levels are parsed and skipped.

use tracing::trace;

use crate::command::{RESP_DISCONNECTED, RESP_STANDBY};
use crate::reading::{BandPowers, SensorReading, BAND_POWER_RECORD_LEN};

/// Extended-code escape byte.
pub const EXCODE: u8 = 0x55;
/// Codes at or above this value carry an explicit length byte.
pub const MULTI_BYTE_CODE: u8 = 0x80;

/// Poor signal quality (1 byte).
pub const CODE_POOR_SIGNAL: u8 = 0x02;
/// Attention eSense (1 byte).
pub const CODE_ATTENTION: u8 = 0x04;
/// Meditation eSense (1 byte).
pub const CODE_MEDITATION: u8 = 0x05;
/// Blink strength (1 byte).
pub const CODE_BLINK: u8 = 0x16;
/// Raw wave sample (2 bytes, big-endian signed).
pub const CODE_RAW_WAVE: u8 = 0x80;
/// ASIC EEG band powers (8 x 3 bytes, big-endian unsigned).
pub const CODE_EEG_POWER: u8 = 0x83;

/// Errors that can occur while decoding a data payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The dongle reports the headset went away.
    #[error("headset disconnected")]
    Disconnected,

    /// A record runs past the end of the payload.
    #[error("record 0x{code:02X} truncated (needs {needed} bytes, {available} left)")]
    Truncated {
        code: u8,
        needed: usize,
        available: usize,
    },

    /// A known record is shorter than its layout.
    #[error("record 0x{code:02X} too short ({actual} bytes, expected {expected})")]
    ShortRecord {
        code: u8,
        expected: usize,
        actual: usize,
    },
}

/// One record of a data payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Number of `0x55` escape bytes before the code.
    pub excode_level: usize,
    pub code: u8,
    pub data: &'a [u8],
}

/// Iterator over the records of a data payload.
///
/// Stops after the first malformed record.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    payload: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Records<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            pos: 0,
            failed: false,
        }
    }

    fn next_record(&mut self) -> Result<Record<'a>, DecodeError> {
        let rest = &self.payload[self.pos..];
        let excode_level = rest.iter().take_while(|byte| **byte == EXCODE).count();
        let rest = &rest[excode_level..];

        let (&code, rest) = rest.split_first().ok_or(DecodeError::Truncated {
            code: EXCODE,
            needed: 1,
            available: 0,
        })?;

        let (vlength, header, rest) = if code >= MULTI_BYTE_CODE {
            let (&vlength, rest) = rest.split_first().ok_or(DecodeError::Truncated {
                code,
                needed: 1,
                available: 0,
            })?;
            (vlength as usize, 2, rest)
        } else {
            (1, 1, rest)
        };

        if rest.len() < vlength {
            return Err(DecodeError::Truncated {
                code,
                needed: vlength,
                available: rest.len(),
            });
        }

        self.pos += excode_level + header + vlength;
        Ok(Record {
            excode_level,
            code,
            data: &rest[..vlength],
        })
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.payload.len() {
            return None;
        }
        let record = self.next_record();
        self.failed = record.is_err();
        Some(record)
    }
}

/// Decode a data payload into `reading`.
///
/// Status packets are handled first: `0xD2` reports
/// [`DecodeError::Disconnected`] and `0xD4` (standby keep-alive) changes
/// nothing. Unknown codes are skipped. On error `reading` may hold part of
/// the payload; [`SharedReading::update`](crate::SharedReading::update)
/// discards such partial results.
pub fn decode(payload: &[u8], reading: &mut SensorReading) -> Result<(), DecodeError> {
    match payload.first() {
        None => return Ok(()),
        Some(&RESP_DISCONNECTED) => return Err(DecodeError::Disconnected),
        Some(&RESP_STANDBY) => return Ok(()),
        Some(_) => {}
    }

    for record in Records::new(payload) {
        apply(record?, reading)?;
    }
    Ok(())
}

fn apply(record: Record<'_>, reading: &mut SensorReading) -> Result<(), DecodeError> {
    if record.excode_level > 0 {
        trace!(
            excode_level = record.excode_level,
            code = record.code,
            data = %format_args!("{:02X?}", record.data),
            "skipping extended record"
        );
        return Ok(());
    }

    match record.code {
        CODE_POOR_SIGNAL => reading.poor_signal_quality = record.data[0],
        CODE_ATTENTION => reading.attention_esense = record.data[0],
        CODE_MEDITATION => reading.meditation_esense = record.data[0],
        CODE_BLINK => reading.blink_strength = record.data[0],
        CODE_RAW_WAVE => {
            let bytes: [u8; 2] = leading(&record)?;
            reading.raw_wave = i16::from_be_bytes(bytes);
        }
        CODE_EEG_POWER => {
            let bytes: [u8; BAND_POWER_RECORD_LEN] = leading(&record)?;
            reading.bands = BandPowers::from_be_bytes(&bytes);
        }
        code => trace!(
            code,
            data = %format_args!("{:02X?}", record.data),
            "skipping unknown record"
        ),
    }
    Ok(())
}

/// The first `N` data bytes of a record.
fn leading<const N: usize>(record: &Record<'_>) -> Result<[u8; N], DecodeError> {
    record
        .data
        .get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecodeError::ShortRecord {
            code: record.code,
            expected: N,
            actual: record.data.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(payload: &[u8]) -> SensorReading {
        let mut reading = SensorReading::default();
        decode(payload, &mut reading).unwrap();
        reading
    }

    #[test]
    fn single_byte_fields() {
        let reading = decoded(&[0x02, 0xC8, 0x04, 0x35, 0x05, 0x3C, 0x16, 0x7F]);
        assert_eq!(reading.poor_signal_quality, 200);
        assert_eq!(reading.attention_esense, 0x35);
        assert_eq!(reading.meditation_esense, 0x3C);
        assert_eq!(reading.blink_strength, 0x7F);
    }

    #[test]
    fn raw_wave_sign_conversion() {
        assert_eq!(decoded(&[0x80, 0x02, 0x80, 0x00]).raw_wave, -32768);
        assert_eq!(decoded(&[0x80, 0x02, 0x7F, 0xFF]).raw_wave, 32767);
        assert_eq!(decoded(&[0x80, 0x02, 0x00, 0x01]).raw_wave, 1);
        assert_eq!(decoded(&[0x80, 0x02, 0xFF, 0xFF]).raw_wave, -1);
    }

    #[test]
    fn band_powers_all_one() {
        let mut payload = vec![0x83, 0x18];
        for _ in 0..8 {
            payload.extend_from_slice(&[0x00, 0x00, 0x01]);
        }
        assert_eq!(decoded(&payload).bands.to_array(), [1; 8]);
    }

    #[test]
    fn full_one_second_packet() {
        let mut payload = vec![0x02, 0x00, 0x83, 0x18];
        for band in 1..=8u8 {
            payload.extend_from_slice(&[0x00, band, 0x00]);
        }
        payload.extend_from_slice(&[0x04, 0x2D, 0x05, 0x50]);

        let reading = decoded(&payload);
        assert_eq!(reading.bands.theta, 0x0200);
        assert_eq!(reading.bands.mid_gamma, 0x0800);
        assert_eq!(reading.attention_esense, 45);
        assert_eq!(reading.meditation_esense, 80);
    }

    #[test]
    fn unknown_codes_are_skipped() {
        // battery (0x01), heart rate (0x03), 8-bit raw (0x06), RR interval (0x86).
        let reading = decoded(&[
            0x01, 0x00, 0x03, 0x48, 0x06, 0x10, 0x86, 0x02, 0x03, 0xE8, 0x04, 0x21,
        ]);
        assert_eq!(reading.attention_esense, 0x21);
    }

    #[test]
    fn extended_records_are_counted_and_skipped() {
        let payload = [0x55, 0x55, 0x04, 0x63, 0x05, 0x11];
        let records: Vec<_> = Records::new(&payload).collect::<Result<_, _>>().unwrap();
        assert_eq!(records[0].excode_level, 2);
        assert_eq!(records[0].code, 0x04);
        assert_eq!(records[1].excode_level, 0);

        let reading = decoded(&payload);
        assert_eq!(reading.attention_esense, 0);
        assert_eq!(reading.meditation_esense, 0x11);
    }

    #[test]
    fn status_packets() {
        let mut reading = SensorReading {
            attention_esense: 7,
            ..SensorReading::default()
        };
        assert_eq!(
            decode(&[0xD2, 0x00], &mut reading),
            Err(DecodeError::Disconnected)
        );
        decode(&[0xD4, 0x01, 0x00], &mut reading).unwrap();
        assert_eq!(reading.attention_esense, 7);
    }

    #[test]
    fn truncated_records() {
        let mut reading = SensorReading::default();
        assert_eq!(
            decode(&[0x80, 0x02, 0x01], &mut reading),
            Err(DecodeError::Truncated {
                code: 0x80,
                needed: 2,
                available: 1
            })
        );
        assert_eq!(
            decode(&[0x04, 0x10, 0x83], &mut reading),
            Err(DecodeError::Truncated {
                code: 0x83,
                needed: 1,
                available: 0
            })
        );
        assert!(matches!(
            decode(&[0x04, 0x10, 0x55], &mut reading),
            Err(DecodeError::Truncated { code: EXCODE, .. })
        ));
    }

    #[test]
    fn short_known_record() {
        let mut reading = SensorReading::default();
        assert_eq!(
            decode(&[0x83, 0x03, 0x00, 0x00, 0x01], &mut reading),
            Err(DecodeError::ShortRecord {
                code: 0x83,
                expected: 24,
                actual: 3
            })
        );
    }

    #[test]
    fn longer_known_record_uses_leading_bytes() {
        assert_eq!(decoded(&[0x80, 0x03, 0x01, 0x00, 0xFF]).raw_wave, 256);
    }
}
