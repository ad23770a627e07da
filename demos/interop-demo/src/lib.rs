//! interop-demo - Example hostbridge boundary library
//!
//! The entry points a host calls to smoke-test an embedded runtime: plain
//! arithmetic, a version string copied into a host buffer, a struct filled
//! by reference, a hash string returned with a paired deallocation, and a
//! log handler the host registers.

use hostbridge::prelude::*;
use hostbridge::{catch_panic, transfer};
use sha2::{Digest, Sha256};
use std::ffi::c_char;
use std::panic::AssertUnwindSafe;
use std::ptr;

/// Version string reported by [`get_runtime_version`]
pub const RUNTIME_VERSION: &str = concat!("hostbridge interop-demo ", env!("CARGO_PKG_VERSION"));

/// Encoding of strings the host passes in
const HOST_ENCODING: Encoding = Encoding::Ansi;

/// Flatten a guarded call into a status value
fn into_status(result: MarshalResult<MarshalResult<i32>>) -> i32 {
    match result.and_then(|inner| inner) {
        Ok(value) => value,
        Err(e) => e.status(),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn sum_test(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

/// `x` raised to the power `y`
#[unsafe(no_mangle)]
pub extern "C" fn pow_test(x: f32, y: f32) -> f32 {
    x.powf(y)
}

// ============================================================================
// Strings
// ============================================================================

/// Copy [`RUNTIME_VERSION`] into a host buffer
///
/// # Returns
/// Bytes written before the terminator, or a negative status
///
/// # Safety
/// - `buffer` must be valid for writes of `buffer_len` bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_runtime_version(buffer: *mut u8, buffer_len: i32) -> i32 {
    into_status(catch_panic(
        0,
        AssertUnwindSafe(|| -> MarshalResult<i32> {
            let outcome = unsafe {
                hostbridge::encode_raw(RUNTIME_VERSION, buffer, buffer_len, HOST_ENCODING)
            }?;
            if outcome.truncated {
                tracing::debug!(capacity = outcome.capacity, "Version string truncated");
            }
            Ok(i32::try_from(outcome.bytes_written).unwrap_or(i32::MAX))
        }),
    ))
}

/// Greet the host by name through its log handler
///
/// # Returns
/// 1 if the greeting was delivered, 0 without a handler, or a negative status
///
/// # Safety
/// - `name` must be a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn say_name(name: *const c_char) -> i32 {
    into_status(catch_panic(
        0,
        AssertUnwindSafe(|| -> MarshalResult<i32> {
            let name = unsafe { hostbridge::decode(name, None, HOST_ENCODING) }?;
            Ok(i32::from(log_message(LogLevel::Info, &format!("Hello there {}", name))))
        }),
    ))
}

/// Lowercase hex SHA-256 of the UTF-8 form of `input`
pub fn hash_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a host string, returning the digest as a new string
///
/// # Returns
/// String the host must pass to [`deallocate_string`] exactly once, or null
///
/// # Safety
/// - `input` must be a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn calculate_hash(input: *const c_char) -> *mut c_char {
    let result = catch_panic(
        0,
        AssertUnwindSafe(|| -> MarshalResult<*mut c_char> {
            let text = unsafe { hostbridge::decode(input, None, HOST_ENCODING) }?;
            let digest = hostbridge::allocate_for_return(&hash_hex(&text), HOST_ENCODING)?;
            Ok(digest.into_raw())
        }),
    );
    match result.and_then(|inner| inner) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("calculate_hash failed: {}", e);
            ptr::null_mut()
        }
    }
}

/// Release a string returned by [`calculate_hash`]
///
/// # Returns
/// 0 on success, `-DoubleRelease` for a pointer already released or not
/// returned by this library
///
/// # Safety
/// - `value` must not be used after a successful call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn deallocate_string(value: *mut c_char) -> i32 {
    into_status(catch_panic(
        0,
        AssertUnwindSafe(|| -> MarshalResult<i32> {
            unsafe { OwnershipLedger::global().release_raw(value) }?;
            Ok(0)
        }),
    ))
}

// ============================================================================
// Structs
// ============================================================================

/// Fill a host-owned struct with `{ a: 42, b: 43 }`
///
/// # Safety
/// - `value` must be valid for reads and writes of a [`FixedStruct`]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_struct(value: *mut FixedStruct) -> i32 {
    into_status(catch_panic(
        0,
        AssertUnwindSafe(|| -> MarshalResult<i32> {
            unsafe {
                transfer::update(value, |s| {
                    s.a = 42;
                    s.b = 43;
                })
            }?;
            Ok(0)
        }),
    ))
}

// ============================================================================
// Logging
// ============================================================================

/// Register the host's log handler (null clears it)
#[unsafe(no_mangle)]
pub extern "C" fn set_log_handler(handler: Option<LogHandler>) {
    let result = catch_panic(0, || match handler {
        Some(h) => LogSink::global().register(h),
        None => {
            LogSink::global().unregister();
        }
    });
    if let Err(e) = result {
        tracing::error!("set_log_handler failed: {}", e);
    }
}

/// Send a message to the host's log handler
///
/// Returns `false` when no handler is registered.
pub fn log_message(level: LogLevel, message: &str) -> bool {
    LogSink::global().invoke(level, message)
}

// Re-export the C ABI so hosts can also use the nb_* functions
pub use hostbridge::ffi_exports::*;
