//! Boundary context management

use dashmap::DashMap;
use hostbridge_core::{
    BoundaryConfig, EncodeOutcome, Encoding, MarshalError, MarshalResult, NativeStr,
    NativeString, OwnershipLedger,
};
use hostbridge_logging::LogSink;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::ffi::c_char;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Id addressing the process-wide default context
pub const DEFAULT_CONTEXT: u64 = 0;

/// Global context manager
static CONTEXT_MANAGER: OnceCell<ContextManager> = OnceCell::new();

/// Manages boundary contexts
///
/// Id `0` always resolves to the default context, which shares the global
/// ledger and the global log sink. Other ids are handed out by
/// [`register`](Self::register) starting at 1.
pub struct ContextManager {
    contexts: DashMap<u64, Arc<BoundaryContext>>,
    next_id: AtomicU64,
    default: Arc<BoundaryContext>,
}

impl ContextManager {
    /// Create a new context manager
    pub fn new() -> Self {
        Self {
            contexts: DashMap::new(),
            next_id: AtomicU64::new(1),
            default: Arc::new(BoundaryContext::process_default()),
        }
    }

    /// Get the global context manager
    pub fn global() -> &'static ContextManager {
        CONTEXT_MANAGER.get_or_init(ContextManager::new)
    }

    /// Register a new context
    pub fn register(&self, context: BoundaryContext) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        context.set_id(id);
        self.contexts.insert(id, Arc::new(context));
        id
    }

    /// Get a context by id
    pub fn get(&self, id: u64) -> Option<Arc<BoundaryContext>> {
        if id == DEFAULT_CONTEXT {
            return Some(self.default.clone());
        }
        self.contexts.get(&id).map(|r| r.clone())
    }

    /// Get a context by id, or [`MarshalError::InvalidHandle`]
    pub fn resolve(&self, id: u64) -> MarshalResult<Arc<BoundaryContext>> {
        self.get(id).ok_or(MarshalError::InvalidHandle(id))
    }

    /// Remove a context
    ///
    /// The default context cannot be removed.
    pub fn remove(&self, id: u64) -> Option<Arc<BoundaryContext>> {
        self.contexts.remove(&id).map(|(_, v)| v)
    }

    /// Number of registered contexts, excluding the default one
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// The default context
    pub fn default_context(&self) -> Arc<BoundaryContext> {
        self.default.clone()
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration, allocator and log sink used by one host
pub struct BoundaryContext {
    config: BoundaryConfig,
    ledger: Arc<OwnershipLedger>,
    sink: Arc<LogSink>,
    id: RwLock<Option<u64>>,
}

impl BoundaryContext {
    /// Create a context with its own ledger and log sink
    pub fn new(config: BoundaryConfig) -> Self {
        let ledger = Arc::new(OwnershipLedger::new());
        let sink = Arc::new(LogSink::new(ledger.clone(), config.encoding));
        sink.set_level(config.log_level());
        Self::with_parts(config, ledger, sink)
    }

    /// Create a context from existing parts
    pub fn with_parts(
        config: BoundaryConfig,
        ledger: Arc<OwnershipLedger>,
        sink: Arc<LogSink>,
    ) -> Self {
        Self {
            config,
            ledger,
            sink,
            id: RwLock::new(None),
        }
    }

    /// Context backed by the global ledger and the global log sink
    pub fn process_default() -> Self {
        let context = Self::with_parts(
            BoundaryConfig::default(),
            OwnershipLedger::shared(),
            LogSink::shared(),
        );
        context.set_id(DEFAULT_CONTEXT);
        context
    }

    /// Get the context id
    pub fn id(&self) -> Option<u64> {
        *self.id.read()
    }

    /// Set the context id (called on registration)
    pub(crate) fn set_id(&self, id: u64) {
        *self.id.write() = Some(id);
    }

    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    pub fn encoding(&self) -> Encoding {
        self.config.encoding
    }

    pub fn ledger(&self) -> &OwnershipLedger {
        &self.ledger
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Copy `text` into a caller buffer in this context's encoding
    pub fn encode(&self, text: &str, destination: &mut [u8]) -> EncodeOutcome {
        hostbridge_core::encode(text, destination, self.config.encoding)
    }

    /// Decode a host string in this context's encoding
    ///
    /// With a hint, at most `length_hint` bytes are read. Without one, a
    /// string longer than `max_string_len` is rejected with
    /// [`MarshalError::BufferTooSmall`] instead of being cut.
    ///
    /// # Safety
    ///
    /// `ptr` must be null, or readable up to its terminator or the hint.
    pub unsafe fn decode(
        &self,
        ptr: *const c_char,
        length_hint: Option<usize>,
    ) -> MarshalResult<String> {
        let view = match length_hint {
            Some(hint) => unsafe { NativeStr::from_ptr_bounded(ptr, hint) }?,
            None => {
                let bound = self.config.max_string_len;
                // One byte past the bound tells a terminator from an overlong string
                let view = unsafe { NativeStr::from_ptr_bounded(ptr, bound.saturating_add(1)) }?;
                if view.len() > bound {
                    return Err(MarshalError::BufferTooSmall {
                        required: bound.saturating_add(1),
                        capacity: bound,
                    });
                }
                view
            }
        };
        view.decode(self.config.encoding)
    }

    /// Allocate a string owned by this context's ledger
    pub fn allocate(&self, text: &str) -> MarshalResult<NativeString<'_>> {
        self.ledger.allocate(text, self.config.encoding)
    }

    /// Release a pointer previously transferred out of this context
    ///
    /// # Safety
    ///
    /// See [`OwnershipLedger::release_raw`].
    pub unsafe fn release(&self, ptr: *mut c_char) -> MarshalResult<()> {
        unsafe { self.ledger.release_raw(ptr) }
    }

    /// Outstanding allocations
    pub fn live_strings(&self) -> usize {
        self.ledger.live()
    }
}
