//! PCM sample conversion utilities

use byteorder::{ByteOrder, LittleEndian};

use super::format::BYTES_PER_SAMPLE;

/// Decode little-endian 16-bit PCM bytes into samples
///
/// A trailing odd byte is ignored.
#[must_use]
pub fn bytes_to_samples(input: &[u8]) -> Vec<i16> {
    let usable = input.len() - input.len() % BYTES_PER_SAMPLE;
    let mut samples = vec![0i16; usable / BYTES_PER_SAMPLE];
    LittleEndian::read_i16_into(&input[..usable], &mut samples);
    samples
}

/// Encode samples as little-endian 16-bit PCM bytes
#[must_use]
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = vec![0u8; samples.len() * BYTES_PER_SAMPLE];
    LittleEndian::write_i16_into(samples, &mut bytes);
    bytes
}

/// Peak absolute level of the samples, normalized to 0.0..=1.0
#[must_use]
pub fn peak_level(samples: &[i16]) -> f32 {
    let peak = samples
        .iter()
        .map(|s| s.unsigned_abs())
        .max()
        .unwrap_or(0);
    (f32::from(peak) / f32::from(i16::MAX)).min(1.0)
}

/// Peak level of little-endian 16-bit PCM bytes
#[must_use]
pub fn peak_level_bytes(input: &[u8]) -> f32 {
    let peak = input
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| i16::from_le_bytes([b[0], b[1]]).unsigned_abs())
        .max()
        .unwrap_or(0);
    (f32::from(peak) / f32::from(i16::MAX)).min(1.0)
}
