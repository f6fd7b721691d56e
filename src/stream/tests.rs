use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::adts;
use crate::encoder::{EncoderConfig, Session};
use crate::error::EncoderError;
use crate::stream::StreamEncoder;
use crate::testing::sine_wave_bytes;

/// Sink that rejects its first `failures` writes
#[derive(Default)]
struct FailingSink {
    failures: usize,
    data: Vec<u8>,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink unavailable"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn encode_all(pcm: &[u8]) -> Vec<u8> {
    let mut stream = StreamEncoder::new(open(16000, 1), Vec::new());
    stream.write_pcm(pcm).unwrap();
    stream.finish().unwrap().0
}

fn open(sample_rate: u32, channels: u32) -> Session {
    Session::open(EncoderConfig::new(sample_rate, channels, 64000)).expect("Open failed")
}

#[test]
fn test_stream_chunks_and_drains() {
    let session = open(16000, 1);
    let chunk_size = session.input_buffer_size();
    let frame_length = session.frame_length();
    let pcm = sine_wave_bytes(440.0, 16000, frame_length * 10, 1);

    let mut stream = StreamEncoder::new(session, Vec::new());
    // Uneven writes exercise the accumulator
    for piece in pcm.chunks(1000) {
        stream.write_pcm(piece).expect("Write failed");
    }
    assert_eq!(stream.stats().chunks, 10);
    assert_eq!(stream.pending(), 0);

    let (encoded, stats) = stream.finish().expect("Finish failed");

    assert_eq!(stats.pcm_bytes, pcm.len());
    assert_eq!(stats.pcm_bytes, chunk_size * 10);
    assert_eq!(stats.adts_bytes, encoded.len());

    let frames: Vec<_> = adts::frames(&encoded)
        .collect::<Result<_, _>>()
        .expect("Output is not a clean ADTS stream");
    assert_eq!(frames.len(), stats.adts_frames);
    // Draining emits every frame that was fed in
    assert!(frames.len() >= 10);
    for (header, _) in &frames {
        assert_eq!(header.sample_rate(), Some(16000));
        assert_eq!(header.channel_config, 1);
    }
}

#[test]
fn test_stream_partial_chunk_encoded_on_finish() {
    let session = open(44100, 2);
    let chunk_size = session.input_buffer_size();

    let mut stream = StreamEncoder::new(session, Vec::new());
    stream.write_pcm(&vec![0u8; chunk_size + 100]).unwrap();
    assert_eq!(stream.stats().chunks, 1);
    assert_eq!(stream.pending(), 100);

    let (_, stats) = stream.finish().unwrap();
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.pcm_bytes, chunk_size + 100);
}

#[test]
fn test_stream_peak_callback() {
    let peaks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&peaks);

    let session = open(16000, 1);
    let chunk_size = session.input_buffer_size();
    let mut pcm = vec![0u8; chunk_size];
    pcm.extend(sine_wave_bytes(1000.0, 16000, chunk_size / 2, 1));

    let mut stream =
        StreamEncoder::new(session, Vec::new()).on_peak(move |p| sink.lock().unwrap().push(p));
    stream.write_pcm(&pcm).unwrap();
    drop(stream);

    let peaks = peaks.lock().unwrap();
    assert_eq!(peaks.len(), 2);
    assert!(peaks[0].abs() < f32::EPSILON);
    assert!(peaks[1] > 0.4);
}

#[test]
fn test_stream_io_write() {
    let session = open(16000, 1);
    let pcm = sine_wave_bytes(440.0, 16000, 4096, 1);

    let mut stream = StreamEncoder::new(session, Vec::new());
    stream.write_all(&pcm).unwrap();
    stream.flush().unwrap();

    let (encoded, stats) = stream.finish().unwrap();
    assert_eq!(stats.pcm_bytes, pcm.len());
    assert!(!encoded.is_empty());
}

#[test]
fn test_stream_empty() {
    let session = open(16000, 1);
    let (encoded, stats) = StreamEncoder::new(session, Vec::new()).finish().unwrap();

    assert_eq!(stats.chunks, 0);
    assert_eq!(stats.pcm_bytes, 0);
    assert_eq!(stats.adts_bytes, encoded.len());
}

#[test]
fn test_stream_sink_failure_keeps_output() {
    let session = open(16000, 1);
    let frame_length = session.frame_length();
    let pcm = sine_wave_bytes(440.0, 16000, frame_length * 10, 1);

    let sink = FailingSink {
        failures: 1,
        ..FailingSink::default()
    };
    let mut stream = StreamEncoder::new(session, sink);

    let err = stream.write_pcm(&pcm).unwrap_err();
    assert!(matches!(err, EncoderError::Io(_)));
    // The PCM was taken and the encoded data is queued for the next attempt
    assert_eq!(stream.stats().pcm_bytes, pcm.len());
    assert!(stream.unsent() > 0);

    stream.flush().unwrap();
    assert_eq!(stream.unsent(), 0);

    let (sink, stats) = stream.finish().unwrap();
    assert_eq!(stats.adts_bytes, sink.data.len());
    assert_eq!(sink.data, encode_all(&pcm));
}

#[test]
fn test_stream_io_write_rejects_while_sink_fails() {
    let session = open(16000, 1);
    let frame_length = session.frame_length();
    let pcm = sine_wave_bytes(440.0, 16000, frame_length * 10, 1);

    let sink = FailingSink {
        failures: 2,
        ..FailingSink::default()
    };
    let mut stream = StreamEncoder::new(session, sink);

    // Accepted; the sink failure is deferred
    assert_eq!(stream.write(&pcm).unwrap(), pcm.len());
    assert!(stream.unsent() > 0);

    // The queued data still cannot be written, so nothing more is taken
    let pending = stream.pending();
    let chunks = stream.stats().chunks;
    assert!(stream.write(&pcm[..100]).is_err());
    assert_eq!(stream.pending(), pending);
    assert_eq!(stream.stats().chunks, chunks);

    let (sink, stats) = stream.finish().unwrap();
    assert_eq!(stats.pcm_bytes, pcm.len());
    assert_eq!(sink.data, encode_all(&pcm));
}
