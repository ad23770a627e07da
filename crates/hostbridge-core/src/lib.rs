//! hostbridge-core - Marshaling primitives for the native/managed boundary
//!
//! This crate provides the building blocks every boundary crossing uses:
//! - [`encode`] / [`decode`] for null-terminated strings ([`Encoding`])
//! - [`NativeString`] and [`OwnershipLedger`] for strings returned across the boundary
//! - [`FixedStruct`] and the [`FixedLayout`] read/write helpers
//! - [`MarshalError`] for error handling
//! - [`BoundaryConfig`] for boundary configuration

mod config;
mod encoding;
mod error;
mod layout;
mod marshal;
mod ownership;

pub use config::BoundaryConfig;
pub use encoding::Encoding;
pub use error::{MarshalError, MarshalResult};
pub use layout::{FixedLayout, FixedStruct};
pub use marshal::{
    EncodeOutcome, NativeStr, allocate_for_return, decode, encode, encode_raw, release,
};
pub use ownership::{AllocationState, LedgerStats, NativeString, OwnershipLedger};

/// Struct transfer operations on borrowed pointers
pub mod transfer {
    pub use crate::layout::{read, update, write};
}

/// Log levels passed to the host log handler
///
/// The discriminant is the `u32` the handler receives.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Critical = 4,
    Off = 5,
}

impl LogLevel {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            4 => LogLevel::Critical,
            _ => LogLevel::Off,
        }
    }

    /// Parse a level name as used in configuration files
    ///
    /// `trace` is accepted as an alias of `debug`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "critical" | "fatal" => Some(LogLevel::Critical),
            "off" | "none" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Critical => write!(f, "CRITICAL"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BoundaryConfig, EncodeOutcome, Encoding, FixedLayout, FixedStruct, LogLevel,
        MarshalError, MarshalResult, NativeStr, NativeString, OwnershipLedger,
    };
}
