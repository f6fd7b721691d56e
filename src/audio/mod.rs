//! PCM input handling

pub mod convert;
pub mod format;


pub use convert::{bytes_to_samples, peak_level, peak_level_bytes, samples_to_bytes};
pub use format::{BYTES_PER_SAMPLE, ChannelConfig, PcmFormat};
