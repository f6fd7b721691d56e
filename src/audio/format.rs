//! PCM input format definitions

use std::time::Duration;

/// Bytes per interleaved 16-bit sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Channel layouts the encoder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelConfig {
    /// Mono (1 channel)
    Mono,
    /// Stereo (2 channels, interleaved L/R)
    #[default]
    Stereo,
}

impl ChannelConfig {
    /// Get number of channels
    #[must_use]
    pub fn channels(self) -> u8 {
        match self {
            ChannelConfig::Mono => 1,
            ChannelConfig::Stereo => 2,
        }
    }

    /// Create from a channel count
    #[must_use]
    pub fn from_count(count: u32) -> Option<Self> {
        match count {
            1 => Some(ChannelConfig::Mono),
            2 => Some(ChannelConfig::Stereo),
            _ => None,
        }
    }
}

/// 16-bit little-endian interleaved PCM at a given rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel configuration
    pub channels: ChannelConfig,
}

impl PcmFormat {
    /// Create a new PCM format
    #[must_use]
    pub fn new(sample_rate: u32, channels: ChannelConfig) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Get bytes per frame (all channels for one sample)
    #[must_use]
    pub fn bytes_per_frame(self) -> usize {
        BYTES_PER_SAMPLE * usize::from(self.channels.channels())
    }

    /// Get bytes per second
    #[must_use]
    pub fn bytes_per_second(self) -> usize {
        self.bytes_per_frame() * self.sample_rate as usize
    }

    /// Calculate duration for given number of frames
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn frames_to_duration(self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Calculate frames for given duration
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub fn duration_to_frames(self, duration: Duration) -> usize {
        (duration.as_secs_f64() * f64::from(self.sample_rate)) as usize
    }

    /// Calculate bytes for given duration
    #[must_use]
    pub fn duration_to_bytes(self, duration: Duration) -> usize {
        self.duration_to_frames(duration) * self.bytes_per_frame()
    }
}
