//! Host log handler registration

use hostbridge_core::{Encoding, LogLevel, OwnershipLedger};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::ffi::c_char;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Host function type receiving log messages
///
/// Uses the platform's standard calling convention (`stdcall` on 32-bit
/// Windows, the C convention everywhere else).
///
/// # Parameters
/// - `level`: [`LogLevel`] discriminant (0=Debug, 1=Info, 2=Warn, 3=Error, 4=Critical)
/// - `message`: null-terminated string, borrowed for the duration of the call
///
/// # Safety
/// The handler must not retain or free `message`. It must remain callable
/// for as long as it is registered.
pub type LogHandler = extern "system" fn(level: u32, message: *const c_char);

/// Global log sink
static GLOBAL_SINK: OnceCell<Arc<LogSink>> = OnceCell::new();

/// Slot holding at most one host log handler
///
/// Registration is last-writer-wins. The slot is guarded by a lock, and the
/// handler is copied out before it is called, so a handler may register a
/// replacement from inside the call.
pub struct LogSink {
    handler: RwLock<Option<LogHandler>>,
    level: AtomicU32,
    encoding: Encoding,
    ledger: Arc<OwnershipLedger>,
}

impl LogSink {
    /// Create a sink allocating messages from `ledger`
    pub fn new(ledger: Arc<OwnershipLedger>, encoding: Encoding) -> Self {
        Self {
            handler: RwLock::new(None),
            level: AtomicU32::new(LogLevel::Info as u32),
            encoding,
            ledger,
        }
    }

    /// Get the global sink, backed by the global ledger
    pub fn global() -> &'static LogSink {
        Self::global_arc()
    }

    /// Get a shared handle to the global sink
    pub fn shared() -> Arc<LogSink> {
        Self::global_arc().clone()
    }

    fn global_arc() -> &'static Arc<LogSink> {
        GLOBAL_SINK.get_or_init(|| {
            Arc::new(LogSink::new(OwnershipLedger::shared(), Encoding::default()))
        })
    }

    /// Register the handler, replacing any previous one
    pub fn register(&self, handler: LogHandler) {
        *self.handler.write() = Some(handler);
    }

    /// Clear the slot, returning the previous handler
    pub fn unregister(&self) -> Option<LogHandler> {
        self.handler.write().take()
    }

    /// Get the current handler
    pub fn handler(&self) -> Option<LogHandler> {
        *self.handler.read()
    }

    pub fn is_registered(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Set the minimum level forwarded by the tracing layer
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u32, Ordering::SeqCst);
    }

    /// Get the current level
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u32(self.level.load(Ordering::SeqCst))
    }

    /// Check if a log level is enabled
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// Encoding of messages passed to the handler
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Ledger that allocates message buffers
    pub fn ledger(&self) -> &OwnershipLedger {
        &self.ledger
    }

    /// Deliver a message to the registered handler
    ///
    /// Returns `false` without allocating when no handler is registered.
    /// Otherwise the message is copied into a null-terminated buffer, the
    /// handler is called synchronously, and the buffer is released after it
    /// returns. A message with an interior NUL is cut at the NUL.
    ///
    /// A handler that never returns blocks this call forever.
    pub fn invoke(&self, level: LogLevel, message: &str) -> bool {
        let handler = match self.handler() {
            Some(h) => h,
            None => return false,
        };

        let message = match message.find('\0') {
            Some(end) => &message[..end],
            None => message,
        };

        let native = match self.ledger.allocate(message, self.encoding) {
            Ok(s) => s,
            Err(_) => return false,
        };

        handler(level as u32, native.as_ptr());
        drop(native);
        true
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(Arc::new(OwnershipLedger::new()), Encoding::default())
    }
}
