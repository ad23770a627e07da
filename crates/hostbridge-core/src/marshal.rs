//! Marshal buffer: string encode/decode at the boundary
//!
//! # Memory Ownership
//!
//! - [`encode`] / [`encode_raw`]: caller owns the destination, nothing is allocated
//! - [`decode`] / [`NativeStr`]: caller owns the source, the view is borrowed
//! - [`allocate_for_return`]: the returned [`NativeString`] owns its memory and
//!   is released by dropping it (or by [`release`])
//!
//! Embedded NUL bytes in `encode` input are copied as-is; a C reader of the
//! destination sees the text up to the first NUL. `allocate_for_return`
//! rejects them with [`MarshalError::InteriorNul`].

use crate::encoding::Encoding;
use crate::error::{MarshalError, MarshalResult};
use crate::ownership::{NativeString, OwnershipLedger};
use std::ffi::{CStr, c_char};

/// Result of copying text into a caller-provided buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOutcome {
    /// Bytes written before the terminator
    pub bytes_written: usize,
    /// Whether the text was cut to fit
    pub truncated: bool,
    /// Capacity needed for the whole text plus terminator
    pub required: usize,
    /// Capacity of the destination
    pub capacity: usize,
}

impl EncodeOutcome {
    /// Turn a truncated outcome into [`MarshalError::BufferTooSmall`]
    pub fn into_strict(self) -> MarshalResult<usize> {
        if self.truncated {
            Err(MarshalError::BufferTooSmall {
                required: self.required,
                capacity: self.capacity,
            })
        } else {
            Ok(self.bytes_written)
        }
    }
}

/// Copy `text` into `destination` as a null-terminated string
///
/// Writes at most `destination.len()` bytes. The terminator is always
/// written at `bytes_written` unless the destination is empty, in which case
/// nothing is written and the outcome reports truncation.
pub fn encode(text: &str, destination: &mut [u8], encoding: Encoding) -> EncodeOutcome {
    let capacity = destination.len();
    let required = encoding.encoded_len(text) + 1;

    if capacity == 0 {
        return EncodeOutcome {
            bytes_written: 0,
            truncated: true,
            required,
            capacity,
        };
    }

    let prefix = encoding.fitting_prefix(text, capacity - 1);
    let bytes_written = prefix.len();
    destination[..bytes_written].copy_from_slice(&prefix);
    destination[bytes_written] = 0;

    EncodeOutcome {
        bytes_written,
        truncated: required > capacity,
        required,
        capacity,
    }
}

/// Copy `text` into a raw destination of `capacity` bytes (terminator included)
///
/// # Safety
///
/// `destination` must be valid for writes of `capacity` bytes.
pub unsafe fn encode_raw(
    text: &str,
    destination: *mut u8,
    capacity: i32,
    encoding: Encoding,
) -> MarshalResult<EncodeOutcome> {
    if destination.is_null() {
        return Err(MarshalError::NullPointer);
    }
    if capacity <= 0 {
        return Err(MarshalError::InvalidCapacity(capacity));
    }

    // SAFETY: caller guarantees destination is valid for capacity bytes
    let buffer = unsafe { std::slice::from_raw_parts_mut(destination, capacity as usize) };
    Ok(encode(text, buffer, encoding))
}

/// Decode a borrowed null-terminated (or length-bounded) byte run
///
/// With `Some(hint)` at most `hint` bytes are read, stopping early at a NUL.
///
/// # Safety
///
/// `ptr` must be null, or readable up to its terminator (or `hint` bytes).
pub unsafe fn decode(
    ptr: *const c_char,
    length_hint: Option<usize>,
    encoding: Encoding,
) -> MarshalResult<String> {
    let view = match length_hint {
        Some(max_len) => unsafe { NativeStr::from_ptr_bounded(ptr, max_len) }?,
        None => unsafe { NativeStr::from_ptr(ptr) }?,
    };
    view.decode(encoding)
}

/// Allocate a null-terminated copy of `text` for return across the boundary
///
/// Ownership moves to the caller; see [`NativeString::into_raw`].
pub fn allocate_for_return(
    text: &str,
    encoding: Encoding,
) -> MarshalResult<NativeString<'static>> {
    OwnershipLedger::global().allocate(text, encoding)
}

/// Release a string obtained from [`allocate_for_return`]
pub fn release(string: NativeString<'_>) {
    drop(string);
}

/// Borrowed view of a native string
///
/// A view never owns memory and has no release operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeStr<'a> {
    bytes: &'a [u8],
}

impl<'a> NativeStr<'a> {
    /// View of `bytes` up to the first NUL (or all of them)
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Self {
            bytes: &bytes[..end],
        }
    }

    /// View of a null-terminated string
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a null-terminated string that outlives `'a`.
    pub unsafe fn from_ptr(ptr: *const c_char) -> MarshalResult<Self> {
        if ptr.is_null() {
            return Err(MarshalError::NullPointer);
        }
        let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
        Ok(Self { bytes })
    }

    /// View of at most `max_len` bytes, stopping at the first NUL
    ///
    /// # Safety
    ///
    /// `ptr` must be null or readable for `max_len` bytes or up to its
    /// terminator, whichever comes first, for the lifetime `'a`.
    pub unsafe fn from_ptr_bounded(ptr: *const c_char, max_len: usize) -> MarshalResult<Self> {
        if ptr.is_null() {
            return Err(MarshalError::NullPointer);
        }
        let base = ptr as *const u8;
        let mut len = 0;
        // SAFETY: reads stay within max_len and stop at the terminator
        while len < max_len && unsafe { *base.add(len) } != 0 {
            len += 1;
        }
        let bytes = unsafe { std::slice::from_raw_parts(base, len) };
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode into an owned `String`
    pub fn decode(&self, encoding: Encoding) -> MarshalResult<String> {
        encoding.decode(self.bytes)
    }
}

#[cfg(test)]
#[path = "marshal/marshal_tests.rs"]
mod marshal_tests;
