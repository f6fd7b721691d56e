//! Encoder session configuration

use serde::{Deserialize, Serialize};

use crate::audio::ChannelConfig;
use crate::error::{EncoderError, Result};

/// Audio object type every session is configured with (MPEG-4 AAC-LC)
pub const AUDIO_OBJECT_TYPE: u32 = 2;

/// Transport every session is configured with (ADTS)
pub const TRANSPORT: Transport = Transport::Adts;

/// Bitstream framing of encoder output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    /// Self-synchronizing ADTS frames, each with a 7-byte header
    Adts,
}

/// Configuration for an encoder session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Input sample rate in Hz (default: 44100)
    pub sample_rate: u32,

    /// Interleaved input channels, 1 or 2 (default: 2)
    pub channels: u32,

    /// Target bitrate in bits per second (default: `128_000`)
    pub bitrate: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            bitrate: 128_000,
        }
    }
}

impl EncoderConfig {
    /// Create a config from the three session parameters
    #[must_use]
    pub fn new(sample_rate: u32, channels: u32, bitrate: u32) -> Self {
        Self {
            sample_rate,
            channels,
            bitrate,
        }
    }

    /// Create a new config builder
    #[must_use]
    pub fn builder() -> EncoderConfigBuilder {
        EncoderConfigBuilder::default()
    }

    /// Check the config without touching the codec library
    ///
    /// # Errors
    ///
    /// Returns an error for a channel count other than 1 or 2, or a zero
    /// sample rate or bitrate.
    pub fn validate(&self) -> Result<ChannelConfig> {
        let channels = ChannelConfig::from_count(self.channels)
            .ok_or(EncoderError::InvalidChannels(self.channels))?;
        if self.sample_rate == 0 {
            return Err(EncoderError::InvalidSampleRate(self.sample_rate));
        }
        if self.bitrate == 0 {
            return Err(EncoderError::InvalidBitrate(self.bitrate));
        }
        Ok(channels)
    }

    /// Framing of the produced bitstream
    #[must_use]
    pub fn transport(&self) -> Transport {
        TRANSPORT
    }
}

/// Builder for `EncoderConfig`
#[derive(Debug, Clone, Default)]
pub struct EncoderConfigBuilder {
    config: EncoderConfig,
}

impl EncoderConfigBuilder {
    /// Set sample rate in Hz
    #[must_use]
    pub fn sample_rate(mut self, hz: u32) -> Self {
        self.config.sample_rate = hz;
        self
    }

    /// Set channel count
    #[must_use]
    pub fn channels(mut self, channels: u32) -> Self {
        self.config.channels = channels;
        self
    }

    /// Set mono input
    #[must_use]
    pub fn mono(self) -> Self {
        self.channels(1)
    }

    /// Set stereo input
    #[must_use]
    pub fn stereo(self) -> Self {
        self.channels(2)
    }

    /// Set bitrate in bits per second
    #[must_use]
    pub fn bitrate(mut self, bps: u32) -> Self {
        self.config.bitrate = bps;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> EncoderConfig {
        self.config
    }
}
