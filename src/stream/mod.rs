//! Streaming encoder
//!
//! Feeds arbitrarily sized PCM writes to a session in frame-sized chunks and
//! writes the resulting ADTS frames to an `io::Write` sink.

use std::io::{self, Write};

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::adts;
use crate::audio::peak_level_bytes;
use crate::encoder::{EncodeOutcome, Session};
use crate::error::{EncoderError, Result};

/// Upper bound on drain steps in [`StreamEncoder::finish`]
const MAX_DRAIN_STEPS: usize = 64;

/// Counters for a finished or running stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Encode calls made with PCM input
    pub chunks: usize,
    /// PCM bytes handed to the encoder
    pub pcm_bytes: usize,
    /// ADTS bytes written to the sink
    pub adts_bytes: usize,
    /// ADTS frames produced by the encoder
    pub adts_frames: usize,
}

/// Encodes a PCM byte stream into an ADTS byte stream
pub struct StreamEncoder<W: Write> {
    session: Session,
    sink: W,
    pending: BytesMut,
    output: Vec<u8>,
    unsent: BytesMut,
    chunk_size: usize,
    stats: StreamStats,
    on_peak: Option<Box<dyn FnMut(f32) + Send>>,
}

impl<W: Write> StreamEncoder<W> {
    /// Create a stream encoder writing to `sink`
    #[must_use]
    pub fn new(session: Session, sink: W) -> Self {
        let chunk_size = session.input_buffer_size();
        let output = vec![0u8; session.max_output_buffer_size()];
        Self {
            session,
            sink,
            pending: BytesMut::with_capacity(chunk_size * 2),
            output,
            unsent: BytesMut::new(),
            chunk_size,
            stats: StreamStats::default(),
            on_peak: None,
        }
    }

    /// Report the peak level (0.0 to 1.0) of every encoded chunk
    #[must_use]
    pub fn on_peak(mut self, callback: impl FnMut(f32) + Send + 'static) -> Self {
        self.on_peak = Some(Box::new(callback));
        self
    }

    /// Underlying session
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Reference to the sink
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// PCM bytes waiting for a full chunk
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Encoded ADTS bytes the sink has not accepted yet
    #[must_use]
    pub fn unsent(&self) -> usize {
        self.unsent.len()
    }

    /// Accept little-endian 16-bit interleaved PCM
    ///
    /// Every complete input chunk is encoded immediately; the remainder is
    /// kept until more data arrives or the stream is finished. Encoded ADTS
    /// data the sink did not accept is kept and offered again on the next
    /// write, flush or finish.
    ///
    /// # Errors
    ///
    /// If ADTS data from an earlier call still cannot be written, the error
    /// is returned before `data` is accepted. Otherwise `data` is accepted
    /// even when an error is returned: a chunk that failed to encode stays
    /// pending, and ADTS data the sink rejected stays queued.
    pub fn write_pcm(&mut self, data: &[u8]) -> Result<()> {
        self.write_unsent()?;
        self.pending.extend_from_slice(data);
        self.encode_pending()?;
        self.write_unsent()?;
        Ok(())
    }

    /// Encode the remaining input, drain the encoder and flush the sink
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the sink rejects a write.
    pub fn finish(mut self) -> Result<(W, StreamStats)> {
        self.encode_pending()?;
        if !self.pending.is_empty() {
            let rest = self.pending.split();
            self.encode_chunk(&rest)?;
        }

        let mut drained = false;
        for _ in 0..MAX_DRAIN_STEPS {
            match self.session.flush(&mut self.output)? {
                EncodeOutcome::Encoded { bytes_written, .. } => self.emit(bytes_written),
                EncodeOutcome::EndOfStream => {
                    drained = true;
                    break;
                }
            }
        }
        if !drained {
            warn!(steps = MAX_DRAIN_STEPS, "encoder did not reach end of stream");
        }

        self.write_unsent()?;
        self.sink.flush()?;
        debug!(stats = ?self.stats, "stream finished");
        Ok((self.sink, self.stats))
    }

    /// Encode every complete chunk; a chunk that fails stays at the front
    fn encode_pending(&mut self) -> Result<()> {
        while self.pending.len() >= self.chunk_size {
            let mut chunk = self.pending.split_to(self.chunk_size);
            if let Err(e) = self.encode_chunk(&chunk) {
                chunk.unsplit(self.pending.split());
                self.pending = chunk;
                return Err(e);
            }
        }
        Ok(())
    }

    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if let Some(callback) = self.on_peak.as_mut() {
            callback(peak_level_bytes(chunk));
        }

        let written = self
            .session
            .encode_bytes(chunk, &mut self.output)?
            .bytes_written();
        self.stats.chunks += 1;
        self.stats.pcm_bytes += chunk.len();
        self.emit(written);
        Ok(())
    }

    fn emit(&mut self, len: usize) {
        if len == 0 {
            return;
        }

        let encoded = &self.output[..len];
        self.stats.adts_frames += adts::frames(encoded)
            .take_while(std::result::Result::is_ok)
            .count();
        self.unsent.extend_from_slice(encoded);
    }

    /// Hand queued ADTS data to the sink; whatever it does not take stays queued
    fn write_unsent(&mut self) -> io::Result<()> {
        while !self.unsent.is_empty() {
            match self.sink.write(&self.unsent) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.unsent.advance(n);
                    self.stats.adts_bytes += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn to_io_error(e: EncoderError) -> io::Error {
    match e {
        EncoderError::Io(e) => e,
        other => io::Error::other(other),
    }
}

/// `write` reports an error only when none of `buf` was taken. Sink failures
/// after `buf` was accepted surface on the next `write` or `flush`.
impl<W: Write> Write for StreamEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_unsent()?;

        let queued = self.pending.len();
        self.pending.extend_from_slice(buf);
        if let Err(e) = self.encode_pending() {
            let encoded = queued + buf.len() - self.pending.len();
            if encoded <= queued {
                self.pending.truncate(self.pending.len() - buf.len());
                return Err(to_io_error(e));
            }
            debug!("{e}");
        }

        if let Err(e) = self.write_unsent() {
            debug!(unsent = self.unsent.len(), "sink write deferred: {e}");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.write_unsent()?;
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests;
