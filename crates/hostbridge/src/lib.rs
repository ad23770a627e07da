//! # hostbridge
//!
//! Memory-safe marshaling between a native host and an embedded runtime.
//!
//! hostbridge covers the three things that cross a native/managed call edge:
//! - Strings, copied into caller buffers or returned with a paired release
//! - Fixed-layout structs, copied by value through borrowed pointers
//! - A log callback the host registers to receive messages
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [lib]
//! crate-type = ["cdylib"]
//!
//! [dependencies]
//! hostbridge = "0.3"
//! ```
//!
//! ## Writing an Entry Point
//!
//! ```ignore
//! use hostbridge::prelude::*;
//! use std::ffi::c_char;
//!
//! /// Writes the runtime name into a host buffer
//! #[unsafe(no_mangle)]
//! pub unsafe extern "C" fn runtime_name(buffer: *mut u8, capacity: i32) -> i32 {
//!     match unsafe { hostbridge::encode_raw("demo 1.0", buffer, capacity, Encoding::Utf8) } {
//!         Ok(outcome) => outcome.bytes_written as i32,
//!         Err(e) => e.status(),
//!     }
//! }
//!
//! /// Returns a string the host releases with `nb_string_free(0, ptr)`
//! #[unsafe(no_mangle)]
//! pub extern "C" fn greeting() -> *mut c_char {
//!     hostbridge::allocate_for_return("hello", Encoding::Utf8)
//!         .map(NativeString::into_raw)
//!         .unwrap_or(std::ptr::null_mut())
//! }
//!
//! // Re-export the C ABI for the shared library
//! pub use hostbridge::ffi_exports::*;
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`hostbridge_core`] - Encodings, marshaling, ownership ledger, struct transfer
//! - [`hostbridge_logging`] - Log handler slot and tracing bridge
//! - [`hostbridge_ffi`] - Boundary contexts and the `nb_*` C ABI

// Re-export core types
pub use hostbridge_core::{
    AllocationState, BoundaryConfig, EncodeOutcome, Encoding, FixedLayout, FixedStruct,
    LedgerStats, LogLevel, MarshalError, MarshalResult, NativeStr, NativeString,
    OwnershipLedger, allocate_for_return, decode, encode, encode_raw, release, transfer,
};

// Re-export logging types
pub use hostbridge_logging::{HostLoggingLayer, LogHandler, LogSink, init_logging};

// Re-export context types
pub use hostbridge_ffi::{
    BoundaryContext, ContextManager, DEFAULT_CONTEXT, catch_panic, install_panic_hook,
};

// Re-export common dependencies that boundary authors need
pub use serde;
pub use serde_json;
pub use tracing;

/// C ABI exports.
///
/// Add `pub use hostbridge::ffi_exports::*;` to a `cdylib` to expose the
/// `nb_*` functions from the shared library.
pub mod ffi_exports {
    pub use hostbridge_ffi::{
        NB_OK, nb_context_create, nb_context_destroy, nb_decode_len, nb_encode, nb_live_strings,
        nb_log, nb_set_log_handler, nb_set_log_level, nb_string_alloc, nb_string_free,
        nb_struct_read, nb_struct_write,
    };
}

/// Prelude module for convenient imports.
///
/// Use `use hostbridge::prelude::*;` to import commonly used types.
///
/// This includes:
/// - Strings: `Encoding`, `NativeString`, `NativeStr`, `EncodeOutcome`
/// - Structs: `FixedStruct`, `FixedLayout`
/// - Errors: `MarshalError`, `MarshalResult`
/// - Logging: `LogLevel`, `LogSink`, `LogHandler`
/// - Contexts: `BoundaryConfig`, `BoundaryContext`
pub mod prelude {
    pub use crate::{
        BoundaryConfig, BoundaryContext, EncodeOutcome, Encoding, FixedLayout, FixedStruct,
        LogHandler, LogLevel, LogSink, MarshalError, MarshalResult, NativeStr, NativeString,
        OwnershipLedger,
    };

    // Serde derives (commonly needed for configuration types)
    pub use serde::{Deserialize, Serialize};
}
