//! # aac-enc
//!
//! A small C ABI around the Fraunhofer FDK AAC encoder, built as a `cdylib`.
//!
//! Every session encodes 16-bit interleaved PCM (mono or stereo) to AAC-LC in
//! ADTS framing. The codec itself lives in libfdk-aac; this crate handles
//! parameter setup, session lifetime and the library's buffer descriptors.
//!
//! ## Example
//!
//! ```rust,no_run
//! use aac_enc::{EncoderConfig, Session};
//!
//! # fn example() -> Result<(), aac_enc::EncoderError> {
//! let mut session = Session::open(EncoderConfig::new(44100, 2, 128_000))?;
//! let pcm = vec![0i16; session.frame_length() * 2];
//! let mut out = vec![0u8; session.max_output_buffer_size()];
//!
//! let written = session.encode(&pcm, &mut out)?.bytes_written();
//! println!("{written} bytes of ADTS");
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **C ABI**: [`ffi`] - flat process-wide session plus handle-based sessions
//! - **Rust API**: [`Session`] and [`StreamEncoder`]
//! - **Boundary**: `encoder::fdk` - the only code calling into libfdk-aac

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;

/// Testing utilities
pub mod testing;

pub mod adts;
pub mod audio;
pub mod encoder;
pub mod ffi;
pub mod logging;
pub mod stream;

// Re-exports
pub use adts::{AdtsError, AdtsHeader};
pub use audio::{ChannelConfig, PcmFormat};
pub use encoder::{EncodeOutcome, EncoderConfig, EncoderInfo, Session, Transport};
pub use error::{EncoderError, LibraryError};
pub use stream::{StreamEncoder, StreamStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        EncodeOutcome, EncoderConfig, EncoderError, Session, StreamEncoder, StreamStats,
    };
}
