//! Encoder session

use byteorder::{ByteOrder, LittleEndian};
use fdk_aac_sys as sys;
use tracing::{debug, error, warn};

use super::config::{AUDIO_OBJECT_TYPE, EncoderConfig, Transport};
use super::fdk::{EncodeOutcome, EncoderInfo, Handle, Input};
use crate::audio::{BYTES_PER_SAMPLE, ChannelConfig};
use crate::error::Result;

/// `TT_MP4_ADTS` transport type
const TT_MP4_ADTS: u32 = 2;

/// A configured AAC-LC encoder producing ADTS frames
///
/// Each session owns one library encoder instance; any number of sessions
/// may exist at once. The instance is closed when the session is dropped.
pub struct Session {
    handle: Handle,
    config: EncoderConfig,
    channels: ChannelConfig,
    info: EncoderInfo,
    /// Decoded samples for byte input that cannot be borrowed in place
    scratch: Vec<i16>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open and configure a new encoder
    ///
    /// The configuration is validated before any library resources are
    /// acquired. If any later step fails the partially configured instance is
    /// closed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters, or the library
    /// error of the first setup step that failed.
    pub fn open(config: EncoderConfig) -> Result<Self> {
        let channels = config.validate()?;
        let session = Self::configure(config, channels).inspect_err(|e| error!("{e}"))?;
        debug!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            bitrate = config.bitrate,
            frame_length = session.info.frame_length,
            max_output_bytes = session.info.max_output_bytes,
            "encoder session opened"
        );
        Ok(session)
    }

    fn configure(config: EncoderConfig, channels: ChannelConfig) -> Result<Self> {
        let mut handle = Handle::open(config.channels)?;

        handle.set_param(sys::AACENC_PARAM_AACENC_AOT, AUDIO_OBJECT_TYPE, "the AOT")?;
        handle.set_param(
            sys::AACENC_PARAM_AACENC_SAMPLERATE,
            config.sample_rate,
            "the sample rate",
        )?;
        handle.set_param(
            sys::AACENC_PARAM_AACENC_CHANNELMODE,
            u32::from(channels.channels()),
            "the channel mode",
        )?;
        handle.set_param(
            sys::AACENC_PARAM_AACENC_BITRATE,
            config.bitrate,
            "the bitrate",
        )?;
        let transmux = match config.transport() {
            Transport::Adts => TT_MP4_ADTS,
        };
        handle.set_param(
            sys::AACENC_PARAM_AACENC_TRANSMUX,
            transmux,
            "the ADTS transmux",
        )?;
        handle.prime()?;
        let info = handle.info()?;

        Ok(Self {
            handle,
            config,
            channels,
            info,
            scratch: Vec::new(),
        })
    }

    /// Configuration the session was opened with
    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Channel layout of the expected input
    #[must_use]
    pub fn channels(&self) -> ChannelConfig {
        self.channels
    }

    /// Values reported by the library after initialization
    #[must_use]
    pub fn info(&self) -> &EncoderInfo {
        &self.info
    }

    /// Samples per channel per AAC frame
    #[must_use]
    pub fn frame_length(&self) -> usize {
        self.info.frame_length as usize
    }

    /// Bytes of PCM input that make up exactly one frame
    #[must_use]
    pub fn input_buffer_size(&self) -> usize {
        usize::from(self.channels.channels()) * BYTES_PER_SAMPLE * self.frame_length()
    }

    /// Output buffer size that fits the output of any single encode call
    #[must_use]
    pub fn max_output_buffer_size(&self) -> usize {
        self.info.max_output_bytes as usize
    }

    /// Encode interleaved samples
    ///
    /// Any number of samples is accepted; the library buffers input until it
    /// has a full frame, so a call may write 0 bytes.
    ///
    /// # Errors
    ///
    /// Returns `EncoderError::Encode` if the library reports a failure.
    pub fn encode(&mut self, pcm: &[i16], output: &mut [u8]) -> Result<EncodeOutcome> {
        self.step(Input::Samples(pcm), output)
    }

    /// Encode interleaved 16-bit little-endian PCM bytes
    ///
    /// A trailing odd byte is ignored.
    ///
    /// # Errors
    ///
    /// Returns `EncoderError::Encode` if the library reports a failure.
    pub fn encode_bytes(&mut self, pcm: &[u8], output: &mut [u8]) -> Result<EncodeOutcome> {
        if pcm.len() % BYTES_PER_SAMPLE != 0 {
            warn!(len = pcm.len(), "odd PCM byte count, dropping trailing byte");
        }
        let pcm = &pcm[..pcm.len() - pcm.len() % BYTES_PER_SAMPLE];

        if cfg!(target_endian = "little") {
            // SAFETY: every bit pattern is a valid i16; `align_to` only yields
            // the middle slice for correctly aligned memory.
            let (head, samples, tail) = unsafe { pcm.align_to::<i16>() };
            if head.is_empty() && tail.is_empty() {
                return self.step(Input::Samples(samples), output);
            }
        }

        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.resize(pcm.len() / BYTES_PER_SAMPLE, 0);
        LittleEndian::read_i16_into(pcm, &mut scratch);
        let result = self.step(Input::Samples(&scratch), output);
        self.scratch = scratch;
        result
    }

    /// Run one drain step after the last input
    ///
    /// Call repeatedly until it returns `EncodeOutcome::EndOfStream` to
    /// collect every buffered frame.
    ///
    /// # Errors
    ///
    /// Returns `EncoderError::Encode` if the library reports a failure.
    pub fn flush(&mut self, output: &mut [u8]) -> Result<EncodeOutcome> {
        self.step(Input::Flush, output)
    }

    fn step(&mut self, input: Input<'_>, output: &mut [u8]) -> Result<EncodeOutcome> {
        if output.len() < self.max_output_buffer_size() {
            warn!(
                capacity = output.len(),
                required = self.max_output_buffer_size(),
                "output buffer smaller than the maximum frame size"
            );
        }
        let outcome = self
            .handle
            .encode(input, output)
            .inspect_err(|e| error!("{e}"))?;
        debug!(?outcome, "encode step");
        Ok(outcome)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(
            sample_rate = self.config.sample_rate,
            channels = self.config.channels,
            "encoder session closed"
        );
    }
}

#[cfg(test)]
mod tests;
