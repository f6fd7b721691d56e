//! AAC-LC encoder sessions backed by libfdk-aac

pub mod config;
mod fdk;
pub mod session;

pub use config::{AUDIO_OBJECT_TYPE, EncoderConfig, EncoderConfigBuilder, TRANSPORT, Transport};
pub use fdk::{EncodeOutcome, EncoderInfo};
pub use session::Session;
