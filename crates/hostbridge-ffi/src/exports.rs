//! C ABI exported functions
//!
//! These functions are the entry points called by the host. Every one of
//! them runs inside [`catch_panic`], takes a context id (`0` is the default
//! context) where it touches context state, and reports failures as a
//! negative status (`-error_code`).

use crate::context::{BoundaryContext, ContextManager};
use crate::panic_guard::{catch_panic, install_panic_hook};
use hostbridge_core::transfer;
use hostbridge_core::{BoundaryConfig, FixedStruct, LogLevel, MarshalError, MarshalResult};
use hostbridge_logging::LogHandler;
use std::ffi::c_char;
use std::panic::AssertUnwindSafe;
use std::ptr;
use std::sync::Arc;

/// Status returned on success
pub const NB_OK: i32 = 0;

/// Flatten a guarded call into a status value
fn into_status(result: MarshalResult<MarshalResult<i32>>) -> i32 {
    match result.and_then(|inner| inner) {
        Ok(value) => value,
        Err(e) => e.status(),
    }
}

fn resolve(ctx: u64) -> MarshalResult<Arc<BoundaryContext>> {
    ContextManager::global().resolve(ctx)
}

/// Optional host length: negative means "not given"
fn length_hint(hint: i32) -> Option<usize> {
    usize::try_from(hint).ok()
}

fn clamp_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Create a boundary context
///
/// # Parameters
/// - `config_json`: JSON [`BoundaryConfig`] bytes (can be null for defaults)
/// - `config_len`: Length of `config_json`
///
/// # Returns
/// Context id (never 0), or 0 on failure
///
/// # Safety
/// - `config_json` must be valid for `config_len` bytes if not null
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_context_create(config_json: *const u8, config_len: usize) -> u64 {
    catch_panic(
        0,
        AssertUnwindSafe(|| unsafe { nb_context_create_impl(config_json, config_len) }),
    )
    .and_then(|inner| inner)
    .unwrap_or_else(|e| {
        tracing::error!("Failed to create context: {}", e);
        0
    })
}

unsafe fn nb_context_create_impl(config_json: *const u8, config_len: usize) -> MarshalResult<u64> {
    let config = if config_json.is_null() || config_len == 0 {
        BoundaryConfig::default()
    } else {
        // SAFETY: caller guarantees config_json is valid for config_len bytes
        let config_slice = unsafe { std::slice::from_raw_parts(config_json, config_len) };
        BoundaryConfig::from_json(config_slice)?
    };

    hostbridge_logging::init_logging();
    if config.install_panic_hook {
        install_panic_hook();
    }

    let encoding = config.encoding;
    let id = ContextManager::global().register(BoundaryContext::new(config));
    tracing::debug!(context = id, %encoding, "Boundary context created");
    Ok(id)
}

/// Destroy a boundary context
///
/// Strings still transferred out of the context stay readable but can no
/// longer be released through `nb_string_free`; their memory is leaked.
///
/// # Returns
/// 0 on success, `-InvalidHandle` for unknown ids and for the default context
#[unsafe(no_mangle)]
pub extern "C" fn nb_context_destroy(ctx: u64) -> i32 {
    into_status(catch_panic(ctx, || -> MarshalResult<i32> {
        let context = ContextManager::global()
            .remove(ctx)
            .ok_or(MarshalError::InvalidHandle(ctx))?;
        let live = context.live_strings();
        if live > 0 {
            tracing::warn!(context = ctx, live, "Context destroyed with outstanding strings");
        }
        Ok(NB_OK)
    }))
}

/// Copy a host string into a caller buffer
///
/// # Parameters
/// - `ctx`: Context id
/// - `source`: Null-terminated string in the context's encoding
/// - `destination`: Buffer receiving the null-terminated copy
/// - `capacity`: Size of `destination` in bytes, terminator included
/// - `out_truncated`: Receives whether the copy was cut (can be null)
///
/// # Returns
/// Bytes written before the terminator, or a negative status
/// (`-BufferTooSmall` when `source` is longer than the context's
/// `max_string_len`)
///
/// # Safety
/// - `source` must be a valid null-terminated string
/// - `destination` must be valid for writes of `capacity` bytes
/// - `out_truncated` must be null or valid for a write
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_encode(
    ctx: u64,
    source: *const c_char,
    destination: *mut u8,
    capacity: i32,
    out_truncated: *mut bool,
) -> i32 {
    into_status(catch_panic(
        ctx,
        AssertUnwindSafe(|| unsafe {
            nb_encode_impl(ctx, source, destination, capacity, out_truncated)
        }),
    ))
}

unsafe fn nb_encode_impl(
    ctx: u64,
    source: *const c_char,
    destination: *mut u8,
    capacity: i32,
    out_truncated: *mut bool,
) -> MarshalResult<i32> {
    let context = resolve(ctx)?;
    let text = unsafe { context.decode(source, None) }?;
    let outcome =
        unsafe { hostbridge_core::encode_raw(&text, destination, capacity, context.encoding()) }?;

    if !out_truncated.is_null() {
        // SAFETY: caller guarantees out_truncated is valid when not null
        unsafe { *out_truncated = outcome.truncated };
    }
    if outcome.truncated {
        tracing::debug!(
            context = ctx,
            required = outcome.required,
            capacity = outcome.capacity,
            "String truncated to fit destination"
        );
    }
    Ok(clamp_i32(outcome.bytes_written))
}

/// Validate a host string and count its characters
///
/// # Parameters
/// - `ctx`: Context id
/// - `source`: String in the context's encoding
/// - `length_hint`: Maximum bytes to read, or negative to scan to the
///   terminator (at most `max_string_len` bytes)
///
/// # Returns
/// Number of decoded characters, or a negative status (`-InvalidEncoding`
/// for malformed input)
///
/// # Safety
/// - `source` must be readable up to its terminator or `length_hint` bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_decode_len(ctx: u64, source: *const c_char, length_hint: i32) -> i32 {
    into_status(catch_panic(
        ctx,
        AssertUnwindSafe(|| unsafe { nb_decode_len_impl(ctx, source, length_hint) }),
    ))
}

unsafe fn nb_decode_len_impl(ctx: u64, source: *const c_char, hint: i32) -> MarshalResult<i32> {
    let context = resolve(ctx)?;
    let text = unsafe { context.decode(source, length_hint(hint)) }?;
    Ok(clamp_i32(text.chars().count()))
}

/// Allocate a copy of a host string owned by the context
///
/// # Returns
/// Null-terminated string the caller must pass to `nb_string_free` exactly
/// once, or null on failure (including a source longer than `max_string_len`)
///
/// # Safety
/// - `source` must be a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_string_alloc(ctx: u64, source: *const c_char) -> *mut c_char {
    catch_panic(
        ctx,
        AssertUnwindSafe(|| unsafe { nb_string_alloc_impl(ctx, source) }),
    )
    .and_then(|inner| inner)
    .unwrap_or_else(|e| {
        tracing::warn!(context = ctx, "String allocation failed: {}", e);
        ptr::null_mut()
    })
}

unsafe fn nb_string_alloc_impl(ctx: u64, source: *const c_char) -> MarshalResult<*mut c_char> {
    let context = resolve(ctx)?;
    let text = unsafe { context.decode(source, None) }?;
    Ok(context.allocate(&text)?.into_raw())
}

/// Release a string returned by this context
///
/// A null pointer is ignored.
///
/// # Returns
/// 0 on success, `-DoubleRelease` if the pointer was already released or
/// did not come from this context
///
/// # Safety
/// - `ptr` must not be used after a successful call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_string_free(ctx: u64, ptr: *mut c_char) -> i32 {
    if ptr.is_null() {
        return NB_OK;
    }
    into_status(catch_panic(
        ctx,
        AssertUnwindSafe(|| unsafe { nb_string_free_impl(ctx, ptr) }),
    ))
}

unsafe fn nb_string_free_impl(ctx: u64, ptr: *mut c_char) -> MarshalResult<i32> {
    let context = resolve(ctx)?;
    unsafe { context.release(ptr) }?;
    Ok(NB_OK)
}

/// Copy a [`FixedStruct`] out of host memory
///
/// # Safety
/// - `source` must be readable for 8 bytes, `out` writable for 8 bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_struct_read(
    source: *const FixedStruct,
    out: *mut FixedStruct,
) -> i32 {
    into_status(catch_panic(
        0,
        AssertUnwindSafe(|| unsafe { nb_struct_read_impl(source, out) }),
    ))
}

unsafe fn nb_struct_read_impl(
    source: *const FixedStruct,
    out: *mut FixedStruct,
) -> MarshalResult<i32> {
    let value = unsafe { transfer::read(source) }?;
    unsafe { transfer::write(out, value) }?;
    Ok(NB_OK)
}

/// Copy a [`FixedStruct`] into host memory
///
/// # Safety
/// - `destination` must be writable for 8 bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_struct_write(
    destination: *mut FixedStruct,
    value: FixedStruct,
) -> i32 {
    into_status(catch_panic(
        0,
        AssertUnwindSafe(|| unsafe { transfer::write(destination, value).map(|()| NB_OK) }),
    ))
}

/// Register the context's log handler, replacing any previous one
///
/// Passing null clears the registration. On the default context this is the
/// process-wide handler that also receives the library's own log events.
///
/// # Safety
/// - `handler` must remain callable for as long as it is registered
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_set_log_handler(ctx: u64, handler: Option<LogHandler>) -> i32 {
    into_status(catch_panic(ctx, || -> MarshalResult<i32> {
        let context = resolve(ctx)?;
        match handler {
            Some(h) => context.sink().register(h),
            None => {
                context.sink().unregister();
            }
        }
        Ok(NB_OK)
    }))
}

/// Deliver a message to the context's log handler
///
/// The level filter does not apply; `level` values above `Critical` are
/// not delivered.
///
/// # Returns
/// 1 if the handler was called, 0 if none is registered, or a negative status
/// (`-BufferTooSmall` for a message longer than `max_string_len`)
///
/// # Safety
/// - `message` must be a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nb_log(ctx: u64, level: u32, message: *const c_char) -> i32 {
    into_status(catch_panic(
        ctx,
        AssertUnwindSafe(|| unsafe { nb_log_impl(ctx, level, message) }),
    ))
}

unsafe fn nb_log_impl(ctx: u64, level: u32, message: *const c_char) -> MarshalResult<i32> {
    let context = resolve(ctx)?;
    let level = LogLevel::from_u32(level);
    if level == LogLevel::Off {
        return Ok(0);
    }
    let text = unsafe { context.decode(message, None) }?;
    Ok(i32::from(context.sink().invoke(level, &text)))
}

/// Set the context's log level filter
///
/// # Parameters
/// - `level`: 0=Debug, 1=Info, 2=Warn, 3=Error, 4=Critical, 5 or above=Off
#[unsafe(no_mangle)]
pub extern "C" fn nb_set_log_level(ctx: u64, level: u32) -> i32 {
    into_status(catch_panic(ctx, || -> MarshalResult<i32> {
        resolve(ctx)?.sink().set_level(LogLevel::from_u32(level));
        Ok(NB_OK)
    }))
}

/// Number of strings allocated by the context and not yet released
///
/// # Returns
/// Outstanding allocations, or 0 for an unknown context
#[unsafe(no_mangle)]
pub extern "C" fn nb_live_strings(ctx: u64) -> u64 {
    catch_panic(ctx, || resolve(ctx).map(|c| c.live_strings() as u64))
        .and_then(|inner| inner)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "exports/exports_tests.rs"]
mod exports_tests;
