//! C ABI
//!
//! Two surfaces are exported. The flat one (`encoder_init`, `encode_buffer`,
//! ...) drives a single process-wide session; initializing again replaces it.
//! The `aac_enc_session_*` functions hand out independent session pointers.
//!
//! Failures are reported through return values only: `false`, `-1` or a null
//! pointer. Panics are caught before they reach the caller.

use std::ffi::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::slice;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use crate::encoder::{EncodeOutcome, EncoderConfig, Session};
use crate::error::Result;
use crate::logging;

/// Process-wide session behind the flat surface
static SESSION: Mutex<Option<Session>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Session>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

fn guarded<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("panic caught at the C boundary");
        fallback
    })
}

/// Negative values map to 0, which validation rejects
fn to_u32(value: c_int) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_c_size(value: usize) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}

fn config_from_c(sample_rate: c_int, channels: c_int, bitrate: c_int) -> Option<EncoderConfig> {
    let config = EncoderConfig::new(to_u32(sample_rate), to_u32(channels), to_u32(bitrate));
    match config.validate() {
        Ok(_) => Some(config),
        Err(e) => {
            error!(sample_rate, channels, bitrate, "{e}");
            None
        }
    }
}

/// Borrow the caller's input and output buffers for one call
///
/// # Safety
///
/// Non-null pointers must be valid for `len` bytes of reads and `outsize`
/// bytes of writes respectively, and must not overlap.
unsafe fn io_slices<'a>(
    inbuf: *const c_void,
    len: c_int,
    outbuf: *mut c_void,
    outsize: c_int,
) -> Option<(&'a [u8], &'a mut [u8])> {
    let input = match usize::try_from(len).ok()? {
        0 => &[][..],
        _ if inbuf.is_null() => return None,
        // SAFETY: non-null and valid for `len` bytes per the caller contract.
        len => unsafe { slice::from_raw_parts(inbuf.cast::<u8>(), len) },
    };
    // SAFETY: see above.
    let output = unsafe { out_slice(outbuf, outsize) }?;
    Some((input, output))
}

/// # Safety
///
/// A non-null `outbuf` must be valid for `outsize` bytes of writes.
unsafe fn out_slice<'a>(outbuf: *mut c_void, outsize: c_int) -> Option<&'a mut [u8]> {
    let outsize = usize::try_from(outsize).ok()?;
    if outbuf.is_null() {
        return None;
    }
    // SAFETY: non-null and valid for `outsize` bytes per the caller contract.
    Some(unsafe { slice::from_raw_parts_mut(outbuf.cast::<u8>(), outsize) })
}

/// Bytes written, 0 at end of stream, -1 on error (already logged)
fn outcome_to_c(result: Result<EncodeOutcome>) -> c_int {
    match result {
        Ok(outcome) => to_c_size(outcome.bytes_written()),
        Err(_) => -1,
    }
}

// ===== Process-wide session =====

/// Create the process-wide session, replacing any existing one
///
/// Invalid parameters (channels other than 1 or 2, a sample rate or bitrate
/// of 0 or less) are rejected before the existing session is touched, so it
/// stays active. Parameters that pass this check but that the library
/// refuses close the existing session first and leave no session active.
#[unsafe(no_mangle)]
pub extern "C" fn encoder_init(sample_rate: c_int, channels: c_int, bitrate: c_int) -> bool {
    logging::init();
    guarded(false, || {
        let Some(config) = config_from_c(sample_rate, channels, bitrate) else {
            return false;
        };

        let mut slot = slot();
        // Close the old handle before opening the new one
        if slot.take().is_some() {
            debug!("replacing active encoder session");
        }
        match Session::open(config) {
            Ok(session) => {
                *slot = Some(session);
                true
            }
            Err(_) => false,
        }
    })
}

/// Close the process-wide session; no-op without one
#[unsafe(no_mangle)]
pub extern "C" fn encoder_release() {
    guarded((), || {
        slot().take();
    });
}

/// PCM bytes per encode call for one full frame, or -1 without a session
#[unsafe(no_mangle)]
pub extern "C" fn get_input_buffer_size() -> c_int {
    guarded(-1, || {
        slot()
            .as_ref()
            .map_or(-1, |s| to_c_size(s.input_buffer_size()))
    })
}

/// Output buffer size needed for any encode call, or -1 without a session
#[unsafe(no_mangle)]
pub extern "C" fn get_max_output_buffer_size() -> c_int {
    guarded(-1, || {
        slot()
            .as_ref()
            .map_or(-1, |s| to_c_size(s.max_output_buffer_size()))
    })
}

/// Encode `len` bytes of 16-bit little-endian interleaved PCM
///
/// Returns the number of ADTS bytes written to `outbuf` (0 if the encoder
/// buffered the input or reached end of stream) or -1 on error or without a
/// session.
///
/// # Safety
///
/// `inbuf` must be readable for `len` bytes and `outbuf` writable for
/// `outsize` bytes; the buffers must not overlap.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn encode_buffer(
    inbuf: *const c_void,
    len: c_int,
    outbuf: *mut c_void,
    outsize: c_int,
) -> c_int {
    guarded(-1, || {
        let mut slot = slot();
        let Some(session) = slot.as_mut() else {
            debug!("encode_buffer called without an active session");
            return -1;
        };
        // SAFETY: forwarded caller contract.
        let Some((input, output)) = (unsafe { io_slices(inbuf, len, outbuf, outsize) }) else {
            warn!(len, outsize, "encode_buffer called with invalid buffers");
            return -1;
        };
        outcome_to_c(session.encode_bytes(input, output))
    })
}

/// Run one drain step on the process-wide session
///
/// Returns bytes written, 0 once the encoder reports end of stream, or -1.
///
/// # Safety
///
/// `outbuf` must be writable for `outsize` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn encode_flush(outbuf: *mut c_void, outsize: c_int) -> c_int {
    guarded(-1, || {
        let mut slot = slot();
        let Some(session) = slot.as_mut() else {
            return -1;
        };
        // SAFETY: forwarded caller contract.
        let Some(output) = (unsafe { out_slice(outbuf, outsize) }) else {
            warn!(outsize, "encode_flush called with an invalid buffer");
            return -1;
        };
        outcome_to_c(session.flush(output))
    })
}

// ===== Independent sessions =====

/// Open an independent session; null on failure
#[unsafe(no_mangle)]
pub extern "C" fn aac_enc_session_open(
    sample_rate: c_int,
    channels: c_int,
    bitrate: c_int,
) -> *mut Session {
    logging::init();
    guarded(std::ptr::null_mut(), || {
        config_from_c(sample_rate, channels, bitrate)
            .and_then(|config| Session::open(config).ok())
            .map_or(std::ptr::null_mut(), |s| Box::into_raw(Box::new(s)))
    })
}

/// Close a session from [`aac_enc_session_open`]; null is ignored
///
/// # Safety
///
/// `session` must be null or a pointer returned by `aac_enc_session_open`
/// that has not been closed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aac_enc_session_close(session: *mut Session) {
    if session.is_null() {
        return;
    }
    guarded((), || {
        // SAFETY: ownership returns from the caller per the contract.
        drop(unsafe { Box::from_raw(session) });
    });
}

/// See [`get_input_buffer_size`]
///
/// # Safety
///
/// `session` must be null or a live pointer from `aac_enc_session_open`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aac_enc_session_input_buffer_size(session: *const Session) -> c_int {
    // SAFETY: live or null per the contract.
    match unsafe { session.as_ref() } {
        Some(s) => guarded(-1, || to_c_size(s.input_buffer_size())),
        None => -1,
    }
}

/// See [`get_max_output_buffer_size`]
///
/// # Safety
///
/// `session` must be null or a live pointer from `aac_enc_session_open`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aac_enc_session_max_output_buffer_size(session: *const Session) -> c_int {
    // SAFETY: live or null per the contract.
    match unsafe { session.as_ref() } {
        Some(s) => guarded(-1, || to_c_size(s.max_output_buffer_size())),
        None => -1,
    }
}

/// See [`encode_buffer`]
///
/// # Safety
///
/// `session` must be null or a live pointer from `aac_enc_session_open` not
/// used concurrently; buffers as for [`encode_buffer`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aac_enc_session_encode(
    session: *mut Session,
    inbuf: *const c_void,
    len: c_int,
    outbuf: *mut c_void,
    outsize: c_int,
) -> c_int {
    // SAFETY: live or null per the contract.
    let Some(session) = (unsafe { session.as_mut() }) else {
        return -1;
    };
    guarded(-1, || {
        // SAFETY: forwarded caller contract.
        let Some((input, output)) = (unsafe { io_slices(inbuf, len, outbuf, outsize) }) else {
            warn!(len, outsize, "aac_enc_session_encode called with invalid buffers");
            return -1;
        };
        outcome_to_c(session.encode_bytes(input, output))
    })
}

/// See [`encode_flush`]
///
/// # Safety
///
/// `session` must be null or a live pointer from `aac_enc_session_open` not
/// used concurrently; `outbuf` writable for `outsize` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aac_enc_session_flush(
    session: *mut Session,
    outbuf: *mut c_void,
    outsize: c_int,
) -> c_int {
    // SAFETY: live or null per the contract.
    let Some(session) = (unsafe { session.as_mut() }) else {
        return -1;
    };
    guarded(-1, || {
        // SAFETY: forwarded caller contract.
        let Some(output) = (unsafe { out_slice(outbuf, outsize) }) else {
            return -1;
        };
        outcome_to_c(session.flush(output))
    })
}

/// Crate version as a NUL-terminated string with static lifetime
#[unsafe(no_mangle)]
pub extern "C" fn aac_enc_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}
