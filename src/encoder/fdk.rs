//! Boundary to the FDK AAC encoder library
//!
//! Everything that touches `fdk_aac_sys` lives here. The library describes
//! every buffer with parallel arrays (pointer, identifier, byte size, element
//! size); those descriptors are built on the stack right before each call and
//! never escape it.

use std::ffi::{c_int, c_void};
use std::{mem, ptr};

use fdk_aac_sys as sys;

use crate::audio::BYTES_PER_SAMPLE;
use crate::error::{EncoderError, LibraryError, Result};

/// `IN_AUDIO_DATA` buffer identifier
const IN_AUDIO_DATA: c_int = 0;
/// `OUT_BITSTREAM_DATA` buffer identifier
const OUT_BITSTREAM_DATA: c_int = 3;
/// `numInSamples` value that asks the library to drain its internal buffers
const FLUSH_SAMPLES: c_int = -1;

fn check(code: sys::AACENC_ERROR) -> std::result::Result<(), LibraryError> {
    if code == sys::AACENC_ERROR_AACENC_OK {
        Ok(())
    } else {
        Err(LibraryError(code))
    }
}

fn to_int(len: usize) -> Result<c_int> {
    c_int::try_from(len).map_err(|_| EncoderError::BufferTooLarge { len })
}

/// Values derived by the library once configuration is complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInfo {
    /// Samples per channel the encoder consumes per frame
    pub frame_length: u32,
    /// Upper bound of bytes produced by one encode call
    pub max_output_bytes: u32,
    /// Number of input channels the encoder expects
    pub input_channels: u32,
    /// Codec delay in samples per channel
    pub delay: u32,
    /// AudioSpecificConfig describing the stream
    pub audio_specific_config: Vec<u8>,
}

/// Result of a single encode step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The step completed; `bytes_written` may be 0 while the library buffers input
    Encoded {
        /// Bytes written to the output buffer
        bytes_written: usize,
        /// Input samples (all channels) the library consumed
        samples_consumed: usize,
    },
    /// The library has no more data to emit
    EndOfStream,
}

impl EncodeOutcome {
    /// Bytes written by this step (0 at end of stream)
    #[must_use]
    pub fn bytes_written(self) -> usize {
        match self {
            Self::Encoded { bytes_written, .. } => bytes_written,
            Self::EndOfStream => 0,
        }
    }

    /// Whether the library reported end of stream
    #[must_use]
    pub fn is_end_of_stream(self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// Input handed to one encode step
#[derive(Debug, Clone, Copy)]
pub(crate) enum Input<'a> {
    /// Interleaved samples in native byte order
    Samples(&'a [i16]),
    /// No more input; drain buffered frames
    Flush,
}

/// Owned encoder instance; closed on drop
pub(crate) struct Handle {
    ptr: sys::HANDLE_AACENCODER,
}

// SAFETY: the handle points to heap state owned exclusively by this value.
// The library keeps no thread-local state, so moving it between threads is
// sound as long as calls are not concurrent, which `&mut self` guarantees.
unsafe impl Send for Handle {}

impl Handle {
    /// Allocate an encoder instance for up to `channels` input channels
    pub(crate) fn open(channels: u32) -> Result<Self> {
        let mut ptr: sys::HANDLE_AACENCODER = ptr::null_mut();
        // SAFETY: `ptr` is a valid out-pointer for the duration of the call.
        let code = unsafe { sys::aacEncOpen(&raw mut ptr, 0, channels) };
        // Wrap first so a handle allocated despite a failure code is still closed.
        let handle = Self { ptr };
        check(code).map_err(EncoderError::Open)?;
        Ok(handle)
    }

    /// Set one encoder parameter
    pub(crate) fn set_param(
        &mut self,
        param: sys::AACENC_PARAM,
        value: u32,
        name: &'static str,
    ) -> Result<()> {
        // SAFETY: `self.ptr` is a live handle returned by `aacEncOpen`.
        let code = unsafe { sys::aacEncoder_SetParam(self.ptr, param, value) };
        check(code).map_err(|source| EncoderError::SetParam {
            param: name,
            source,
        })
    }

    /// Apply the parameters set so far; the library requires one call without buffers
    pub(crate) fn prime(&mut self) -> Result<()> {
        // SAFETY: null descriptors are the documented way to trigger initialization.
        let code = unsafe {
            sys::aacEncEncode(
                self.ptr,
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
            )
        };
        check(code).map_err(EncoderError::Prime)
    }

    /// Query derived encoder values
    pub(crate) fn info(&self) -> Result<EncoderInfo> {
        // SAFETY: the info struct is plain old data; all-zero is a valid value.
        let mut info: sys::AACENC_InfoStruct = unsafe { mem::zeroed() };
        // SAFETY: `self.ptr` is live and `info` is a valid out-pointer.
        let code = unsafe { sys::aacEncInfo(self.ptr, &raw mut info) };
        check(code).map_err(EncoderError::Info)?;

        let conf_len = (info.confSize as usize).min(info.confBuf.len());
        Ok(EncoderInfo {
            frame_length: info.frameLength,
            max_output_bytes: info.maxOutBufBytes,
            input_channels: info.inputChannels,
            delay: info.nDelay,
            audio_specific_config: info.confBuf[..conf_len].to_vec(),
        })
    }

    /// Run one encode step
    ///
    /// End of stream is reported as an outcome, every other non-OK status as
    /// `EncoderError::Encode`.
    pub(crate) fn encode(&mut self, input: Input<'_>, output: &mut [u8]) -> Result<EncodeOutcome> {
        let (samples, num_in_samples): (&[i16], c_int) = match input {
            Input::Samples(samples) => (samples, to_int(samples.len())?),
            Input::Flush => (&[], FLUSH_SAMPLES),
        };

        let mut in_ptr = samples.as_ptr().cast_mut().cast::<c_void>();
        let mut in_identifier = IN_AUDIO_DATA;
        let mut in_size = to_int(samples.len() * BYTES_PER_SAMPLE)?;
        let mut in_elem_size = BYTES_PER_SAMPLE as c_int;
        let in_desc = sys::AACENC_BufDesc {
            numBufs: 1,
            bufs: &raw mut in_ptr,
            bufferIdentifiers: &raw mut in_identifier,
            bufSizes: &raw mut in_size,
            bufElSizes: &raw mut in_elem_size,
        };

        let mut out_ptr = output.as_mut_ptr().cast::<c_void>();
        let mut out_identifier = OUT_BITSTREAM_DATA;
        let mut out_size = to_int(output.len())?;
        let mut out_elem_size: c_int = 1;
        let out_desc = sys::AACENC_BufDesc {
            numBufs: 1,
            bufs: &raw mut out_ptr,
            bufferIdentifiers: &raw mut out_identifier,
            bufSizes: &raw mut out_size,
            bufElSizes: &raw mut out_elem_size,
        };

        let in_args = sys::AACENC_InArgs {
            numInSamples: num_in_samples,
            numAncBytes: 0,
        };
        // SAFETY: plain old data; all-zero is a valid value.
        let mut out_args: sys::AACENC_OutArgs = unsafe { mem::zeroed() };

        // SAFETY: both descriptors point at locals that outlive the call, the
        // input buffer is only read and the output buffer is `out_size` bytes.
        let code = unsafe {
            sys::aacEncEncode(
                self.ptr,
                &raw const in_desc,
                &raw const out_desc,
                &raw const in_args,
                &raw mut out_args,
            )
        };

        match check(code) {
            Ok(()) => Ok(EncodeOutcome::Encoded {
                bytes_written: usize::try_from(out_args.numOutBytes).unwrap_or(0),
                samples_consumed: usize::try_from(out_args.numInSamples).unwrap_or(0),
            }),
            Err(e) if e.is_end_of_stream() => Ok(EncodeOutcome::EndOfStream),
            Err(e) => Err(EncoderError::Encode(e)),
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: `self.ptr` came from `aacEncOpen` and is closed exactly once;
            // the library resets it to null.
            unsafe {
                sys::aacEncClose(&raw mut self.ptr);
            }
        }
    }
}
