//! ADTS frame headers
//!
//! Every encode call emits at most one ADTS frame. The 7-byte header (9 with
//! CRC) carries the frame length, which lets callers split a byte stream of
//! concatenated encoder output back into frames.

use thiserror::Error;

/// Sampling frequencies addressed by the 4-bit ADTS index
const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// ADTS header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// MPEG-2 (true) or MPEG-4 (false) identifier bit
    pub mpeg2: bool,
    /// CRC is absent; the header is 7 bytes instead of 9
    pub protection_absent: bool,
    /// Profile field (audio object type minus one)
    pub profile: u8,
    /// Sampling frequency index (4 bits)
    pub sampling_index: u8,
    /// Channel configuration (3 bits)
    pub channel_config: u8,
    /// Frame length in bytes, header included (13 bits)
    pub frame_length: u16,
    /// Buffer fullness (11 bits, 0x7FF for VBR)
    pub buffer_fullness: u16,
    /// Raw data blocks in the frame minus one (2 bits)
    pub raw_data_blocks: u8,
}

impl AdtsHeader {
    /// Header size without CRC
    pub const SIZE: usize = 7;
    /// Header size with CRC
    pub const SIZE_WITH_CRC: usize = 9;

    /// Parse the header at the start of `buf`
    ///
    /// # Errors
    ///
    /// Returns `AdtsError` if the buffer is too short, the syncword is missing,
    /// the layer is not 0, or the frame length is shorter than the header.
    pub fn parse(buf: &[u8]) -> Result<Self, AdtsError> {
        if buf.len() < Self::SIZE {
            return Err(AdtsError::BufferTooSmall {
                needed: Self::SIZE,
                have: buf.len(),
            });
        }

        if buf[0] != 0xFF || buf[1] & 0xF0 != 0xF0 {
            return Err(AdtsError::MissingSyncword);
        }

        let layer = (buf[1] >> 1) & 0x03;
        if layer != 0 {
            return Err(AdtsError::InvalidLayer(layer));
        }

        let header = Self {
            mpeg2: (buf[1] >> 3) & 0x01 != 0,
            protection_absent: buf[1] & 0x01 != 0,
            profile: (buf[2] >> 6) & 0x03,
            sampling_index: (buf[2] >> 2) & 0x0F,
            channel_config: ((buf[2] & 0x01) << 2) | ((buf[3] >> 6) & 0x03),
            frame_length: (u16::from(buf[3] & 0x03) << 11)
                | (u16::from(buf[4]) << 3)
                | u16::from(buf[5] >> 5),
            buffer_fullness: (u16::from(buf[5] & 0x1F) << 6) | u16::from(buf[6] >> 2),
            raw_data_blocks: buf[6] & 0x03,
        };

        if usize::from(header.frame_length) < header.header_len() {
            return Err(AdtsError::FrameTooShort(header.frame_length));
        }

        Ok(header)
    }

    /// Header length in bytes
    #[must_use]
    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            Self::SIZE
        } else {
            Self::SIZE_WITH_CRC
        }
    }

    /// Audio object type (2 = AAC-LC)
    #[must_use]
    pub fn object_type(&self) -> u8 {
        self.profile + 1
    }

    /// Sample rate in Hz, if the index is defined
    #[must_use]
    pub fn sample_rate(&self) -> Option<u32> {
        SAMPLE_RATES.get(usize::from(self.sampling_index)).copied()
    }

    /// Payload length in bytes
    #[must_use]
    pub fn payload_len(&self) -> usize {
        usize::from(self.frame_length) - self.header_len()
    }
}

/// ADTS parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdtsError {
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall { needed: usize, have: usize },

    #[error("missing ADTS syncword")]
    MissingSyncword,

    #[error("invalid ADTS layer: {0}")]
    InvalidLayer(u8),

    #[error("frame length {0} is shorter than its header")]
    FrameTooShort(u16),

    #[error("truncated frame: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },
}

/// Iterate over concatenated ADTS frames
///
/// Yields each header with the complete frame bytes (header included). Stops
/// after the first error.
#[must_use]
pub fn frames(data: &[u8]) -> AdtsFrames<'_> {
    AdtsFrames {
        data,
        failed: false,
    }
}

/// Iterator returned by [`frames`]
#[derive(Debug, Clone)]
pub struct AdtsFrames<'a> {
    data: &'a [u8],
    failed: bool,
}

impl<'a> Iterator for AdtsFrames<'a> {
    type Item = Result<(AdtsHeader, &'a [u8]), AdtsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }

        let result = AdtsHeader::parse(self.data).and_then(|header| {
            let len = usize::from(header.frame_length);
            if self.data.len() < len {
                return Err(AdtsError::Truncated {
                    needed: len,
                    have: self.data.len(),
                });
            }
            let (frame, rest) = self.data.split_at(len);
            self.data = rest;
            Ok((header, frame))
        });

        self.failed = result.is_err();
        Some(result)
    }
}
