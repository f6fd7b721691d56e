//! PCM signal generators for tests and benchmarks

use std::f32::consts::TAU;

/// Interleaved silence: `frames` samples per channel
#[must_use]
pub fn silence(frames: usize, channels: usize) -> Vec<i16> {
    vec![0; frames * channels]
}

/// Interleaved sine tone at half scale, identical on every channel
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn sine_wave(frequency: f32, sample_rate: u32, frames: usize, channels: usize) -> Vec<i16> {
    let step = TAU * frequency / sample_rate as f32;
    let mut samples = Vec::with_capacity(frames * channels);
    for n in 0..frames {
        let value = ((step * n as f32).sin() * f32::from(i16::MAX) * 0.5) as i16;
        samples.extend(std::iter::repeat_n(value, channels));
    }
    samples
}

/// Sine tone as little-endian PCM bytes
#[must_use]
pub fn sine_wave_bytes(frequency: f32, sample_rate: u32, frames: usize, channels: usize) -> Vec<u8> {
    crate::audio::samples_to_bytes(&sine_wave(frequency, sample_rate, frames, channels))
}
