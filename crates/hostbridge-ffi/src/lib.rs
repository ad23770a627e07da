//! hostbridge-ffi - C ABI exports and boundary contexts
//!
//! This crate provides the FFI boundary layer:
//! - [`BoundaryContext`] bundling configuration, ownership ledger and log sink
//! - [`ContextManager`] addressing contexts by id (`0` is the default context)
//! - [`catch_panic`] keeping panics from unwinding into the host
//! - C ABI exported functions (`nb_*`)
//!
//! # FFI Functions
//!
//! The following functions are exported with C linkage:
//!
//! - `nb_context_create` / `nb_context_destroy` - Context lifecycle
//! - `nb_encode` - Copy a string into a caller buffer
//! - `nb_decode_len` - Validate a host string and count its characters
//! - `nb_string_alloc` / `nb_string_free` - Strings returned to the host
//! - `nb_struct_read` / `nb_struct_write` - Fixed-layout struct transfer
//! - `nb_set_log_handler` / `nb_log` / `nb_set_log_level` - Log callback
//! - `nb_live_strings` - Outstanding allocations of a context

mod context;
mod exports;
mod panic_guard;

pub use context::{BoundaryContext, ContextManager, DEFAULT_CONTEXT};
pub use panic_guard::{catch_panic, install_panic_hook};

// Re-export FFI functions for use by host shims and tests
pub use exports::{
    NB_OK, nb_context_create, nb_context_destroy, nb_decode_len, nb_encode, nb_live_strings,
    nb_log, nb_set_log_handler, nb_set_log_level, nb_string_alloc, nb_string_free,
    nb_struct_read, nb_struct_write,
};

// Re-export types that appear in the exported signatures
pub use hostbridge_core::{BoundaryConfig, FixedStruct, LogLevel, MarshalError};
pub use hostbridge_logging::LogHandler;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BoundaryContext, ContextManager, DEFAULT_CONTEXT};
    pub use hostbridge_core::prelude::*;
    pub use hostbridge_logging::prelude::*;
}
