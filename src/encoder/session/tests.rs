use crate::adts::AdtsHeader;
use crate::encoder::{EncodeOutcome, EncoderConfig, Session};
use crate::testing::{silence, sine_wave};

const MAX_DRAIN_STEPS: usize = 32;

fn drain(session: &mut Session, output: &mut [u8]) -> Vec<u8> {
    let mut encoded = Vec::new();
    for _ in 0..MAX_DRAIN_STEPS {
        match session.flush(output).expect("Flush failed") {
            EncodeOutcome::Encoded { bytes_written, .. } => {
                encoded.extend_from_slice(&output[..bytes_written]);
            }
            EncodeOutcome::EndOfStream => return encoded,
        }
    }
    panic!("Encoder did not reach end of stream after {MAX_DRAIN_STEPS} drain steps");
}

#[test]
fn test_session_sizes_stereo() {
    let session = Session::open(EncoderConfig::new(48000, 2, 128_000)).expect("Open failed");

    assert_eq!(session.frame_length(), 1024);
    assert_eq!(session.input_buffer_size(), 2 * 2 * session.frame_length());
    assert!(session.max_output_buffer_size() > 0);
    assert_eq!(session.info().input_channels, 2);
    assert!(!session.info().audio_specific_config.is_empty());
}

#[test]
fn test_session_sizes_mono() {
    let session = Session::open(EncoderConfig::new(44100, 1, 64000)).expect("Open failed");

    assert_eq!(session.input_buffer_size(), 2 * session.frame_length());
    assert_eq!(session.config().bitrate, 64000);
}

#[test]
fn test_session_rejects_invalid_channels() {
    for channels in [0, 3, 5] {
        let err = Session::open(EncoderConfig::new(44100, channels, 64000)).unwrap_err();
        assert!(err.is_configuration());
    }
}

#[test]
fn test_session_rejects_unsupported_sample_rate() {
    let err = Session::open(EncoderConfig::new(12345, 2, 128_000)).unwrap_err();

    assert!(!err.is_configuration());
    assert!(err.library_error().is_some());
}

#[test]
fn test_encode_silence_frames() {
    let mut session = Session::open(EncoderConfig::new(44100, 1, 64000)).expect("Open failed");
    let mut output = vec![0u8; session.max_output_buffer_size()];
    let frame = silence(session.frame_length(), 1);

    let mut total = 0;
    for _ in 0..10 {
        let outcome = session.encode(&frame, &mut output).expect("Encoding failed");
        let written = outcome.bytes_written();
        assert!(written <= session.max_output_buffer_size());
        total += written;
    }

    // The library delays output by at least one frame, but not by ten
    assert!(total > 0, "Encoder produced no output after 10 frames");
}

#[test]
fn test_encode_produces_adts() {
    let mut session = Session::open(EncoderConfig::new(44100, 2, 128_000)).expect("Open failed");
    let mut output = vec![0u8; session.max_output_buffer_size()];
    let frame = sine_wave(440.0, 44100, session.frame_length(), 2);

    let mut first = None;
    for _ in 0..8 {
        let written = session.encode(&frame, &mut output).unwrap().bytes_written();
        if written > 0 {
            first = Some(output[..written].to_vec());
            break;
        }
    }

    let frame_bytes = first.expect("No ADTS frame produced");
    let header = AdtsHeader::parse(&frame_bytes).expect("Output is not ADTS");
    assert_eq!(header.object_type(), 2);
    assert_eq!(header.sample_rate(), Some(44100));
    assert_eq!(header.channel_config, 2);
    assert_eq!(usize::from(header.frame_length), frame_bytes.len());
}

#[test]
fn test_encode_bytes_matches_samples() {
    let config = EncoderConfig::new(48000, 2, 128_000);
    let mut by_samples = Session::open(config).expect("Open failed");
    let mut by_bytes = Session::open(config).expect("Open failed");
    let samples = sine_wave(1000.0, 48000, by_samples.frame_length(), 2);
    let bytes = crate::audio::samples_to_bytes(&samples);

    // Offset by one byte so the slice cannot be borrowed as i16 in place
    let mut unaligned = vec![0u8; bytes.len() + 1];
    unaligned[1..].copy_from_slice(&bytes);

    let mut out_a = vec![0u8; by_samples.max_output_buffer_size()];
    let mut out_b = vec![0u8; by_bytes.max_output_buffer_size()];
    for _ in 0..4 {
        let a = by_samples.encode(&samples, &mut out_a).unwrap().bytes_written();
        let b = by_bytes
            .encode_bytes(&unaligned[1..], &mut out_b)
            .unwrap()
            .bytes_written();
        assert_eq!(a, b);
        assert_eq!(out_a[..a], out_b[..b]);
    }
}

#[test]
fn test_encode_odd_byte_count() {
    let mut session = Session::open(EncoderConfig::new(44100, 1, 64000)).expect("Open failed");
    let mut output = vec![0u8; session.max_output_buffer_size()];

    let outcome = session.encode_bytes(&[0u8; 3], &mut output).unwrap();
    assert!(matches!(outcome, EncodeOutcome::Encoded { .. }));
}

#[test]
fn test_encode_empty_input() {
    let mut session = Session::open(EncoderConfig::new(44100, 1, 64000)).expect("Open failed");
    let mut output = vec![0u8; session.max_output_buffer_size()];

    let outcome = session.encode(&[], &mut output).unwrap();
    assert_eq!(outcome.bytes_written(), 0);
}

#[test]
fn test_flush_reaches_end_of_stream() {
    let mut session = Session::open(EncoderConfig::new(44100, 1, 64000)).expect("Open failed");
    let mut output = vec![0u8; session.max_output_buffer_size()];
    let frame = silence(session.frame_length(), 1);

    for _ in 0..3 {
        session.encode(&frame, &mut output).unwrap();
    }
    let tail = drain(&mut session, &mut output);
    assert!(!tail.is_empty(), "Buffered frames were not drained");

    // Once drained, the library keeps reporting end of stream
    assert!(session.flush(&mut output).unwrap().is_end_of_stream());
}

#[test]
fn test_sessions_are_independent() {
    let mut mono = Session::open(EncoderConfig::new(16000, 1, 32000)).expect("Open failed");
    let mut stereo = Session::open(EncoderConfig::new(48000, 2, 128_000)).expect("Open failed");

    let mut out_mono = vec![0u8; mono.max_output_buffer_size()];
    let mut out_stereo = vec![0u8; stereo.max_output_buffer_size()];

    drain(&mut mono, &mut out_mono);
    // Draining one session leaves the other usable
    let outcome = stereo
        .encode(&silence(stereo.frame_length(), 2), &mut out_stereo)
        .unwrap();
    assert!(!outcome.is_end_of_stream());
}

#[test]
fn test_session_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Session>();
}
