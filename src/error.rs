use std::io;

use fdk_aac_sys as sys;
use thiserror::Error;

/// Raw status code returned by the FDK AAC encoder library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryError(pub(crate) sys::AACENC_ERROR);

impl LibraryError {
    /// Raw library status code
    #[must_use]
    pub fn code(self) -> sys::AACENC_ERROR {
        self.0
    }

    /// Whether the library signalled the end of the encoded stream
    #[must_use]
    pub fn is_end_of_stream(self) -> bool {
        self.0 == sys::AACENC_ERROR_AACENC_ENCODE_EOF
    }

    /// Human readable description of the code
    #[must_use]
    pub fn message(self) -> &'static str {
        match self.0 {
            sys::AACENC_ERROR_AACENC_OK => "no error",
            sys::AACENC_ERROR_AACENC_INVALID_HANDLE => "invalid encoder handle",
            sys::AACENC_ERROR_AACENC_MEMORY_ERROR => "memory allocation failed",
            sys::AACENC_ERROR_AACENC_UNSUPPORTED_PARAMETER => "parameter not available",
            sys::AACENC_ERROR_AACENC_INVALID_CONFIG => "configuration not provided",
            sys::AACENC_ERROR_AACENC_INIT_ERROR => "general initialization error",
            sys::AACENC_ERROR_AACENC_INIT_AAC_ERROR => "AAC library initialization error",
            sys::AACENC_ERROR_AACENC_INIT_SBR_ERROR => "SBR library initialization error",
            sys::AACENC_ERROR_AACENC_INIT_TP_ERROR => "transport library initialization error",
            sys::AACENC_ERROR_AACENC_INIT_META_ERROR => "metadata library initialization error",
            sys::AACENC_ERROR_AACENC_ENCODE_ERROR => "encoding interrupted by an unexpected error",
            sys::AACENC_ERROR_AACENC_ENCODE_EOF => "end of stream",
            _ => "unknown error",
        }
    }
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {:#x})", self.message(), self.0)
    }
}

impl std::error::Error for LibraryError {}

/// Errors produced by encoder sessions
#[derive(Debug, Error)]
pub enum EncoderError {
    // ===== Configuration Errors =====
    /// Only mono and stereo input is supported
    #[error("unsupported channel count: {0} (expected 1 or 2)")]
    InvalidChannels(u32),

    /// Sample rate must be positive
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Bitrate must be positive
    #[error("invalid bitrate: {0} bit/s")]
    InvalidBitrate(u32),

    // ===== Initialization Errors =====
    /// The library refused to allocate an encoder instance
    #[error("unable to open encoder: {0}")]
    Open(#[source] LibraryError),

    /// A configuration parameter was rejected
    #[error("unable to set {param}: {source}")]
    SetParam {
        /// Name of the rejected parameter
        param: &'static str,
        /// Library status
        #[source]
        source: LibraryError,
    },

    /// The initializing encode call failed
    #[error("unable to initialize the encoder: {0}")]
    Prime(#[source] LibraryError),

    /// Encoder info could not be queried
    #[error("unable to get the encoder info: {0}")]
    Info(#[source] LibraryError),

    // ===== Encoding Errors =====
    /// The encode step failed
    #[error("encoding failed: {0}")]
    Encode(#[source] LibraryError),

    /// Buffer does not fit the library's signed 32-bit size fields
    #[error("buffer of {len} elements exceeds the encoder's size limit")]
    BufferTooLarge {
        /// Length of the offending buffer
        len: usize,
    },

    // ===== I/O Errors =====
    /// Output sink failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl EncoderError {
    /// Check if the error was raised before any library resources were acquired
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidChannels(_) | Self::InvalidSampleRate(_) | Self::InvalidBitrate(_)
        )
    }

    /// Library status code behind the error, if any
    #[must_use]
    pub fn library_error(&self) -> Option<LibraryError> {
        match self {
            Self::Open(e) | Self::Prime(e) | Self::Info(e) | Self::Encode(e) => Some(*e),
            Self::SetParam { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Result type alias for encoder operations
pub type Result<T> = std::result::Result<T, EncoderError>;
