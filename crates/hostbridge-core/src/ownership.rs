//! Ownership tracking for strings returned across the boundary
//!
//! Every string handed to the other side is allocated by an
//! [`OwnershipLedger`] and tracked through these states:
//!
//! ```text
//! Unallocated → OwnedByAllocator → TransferredToCaller → Released
//!                      │   ↑                │
//!                      │   └────────────────┘ (reclaimed via from_raw)
//!                      └──────────────────────→ Released (dropped before transfer)
//! ```
//!
//! On the typed path a [`NativeString`] is move-only and releases itself on
//! drop, so a second release cannot be written. On the raw path
//! ([`OwnershipLedger::release_raw`]) the ledger rejects pointers it is not
//! currently tracking as transferred.

use crate::encoding::Encoding;
use crate::error::{MarshalError, MarshalResult};
use crate::marshal::NativeStr;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::ffi::c_char;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global ledger used by the process-wide boundary
static GLOBAL_LEDGER: OnceCell<Arc<OwnershipLedger>> = OnceCell::new();

/// Ownership state of a single allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationState {
    /// No memory is associated with the pointer
    #[default]
    Unallocated,
    /// The allocating side holds the memory
    OwnedByAllocator,
    /// Ownership was handed to the receiving side, which must release it
    TransferredToCaller,
    /// Memory was freed
    Released,
}

impl AllocationState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: AllocationState) -> bool {
        use AllocationState::*;
        matches!(
            (self, target),
            (Unallocated, OwnedByAllocator)
                | (OwnedByAllocator, TransferredToCaller)
                | (TransferredToCaller, OwnedByAllocator)
                | (OwnedByAllocator, Released)
                | (TransferredToCaller, Released)
        )
    }

    /// Check if memory in this state may be released
    pub fn is_releasable(&self) -> bool {
        matches!(
            self,
            AllocationState::OwnedByAllocator | AllocationState::TransferredToCaller
        )
    }

    /// Check if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, AllocationState::Released)
    }
}

impl std::fmt::Display for AllocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationState::Unallocated => write!(f, "Unallocated"),
            AllocationState::OwnedByAllocator => write!(f, "OwnedByAllocator"),
            AllocationState::TransferredToCaller => write!(f, "TransferredToCaller"),
            AllocationState::Released => write!(f, "Released"),
        }
    }
}

/// Allocation counters of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LedgerStats {
    /// Strings allocated since the ledger was created
    pub allocations: u64,
    /// Strings released since the ledger was created
    pub releases: u64,
    /// Strings currently allocated
    pub live: usize,
}

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    state: AllocationState,
    len: usize,
}

/// Allocator and bookkeeper for strings crossing the boundary
///
/// The ledger never emits log events: the logging bridge allocates through
/// it, and a log call from inside the ledger would recurse.
pub struct OwnershipLedger {
    entries: DashMap<usize, LedgerEntry>,
    allocations: AtomicU64,
    releases: AtomicU64,
}

impl OwnershipLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            allocations: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    /// Get the global ledger
    pub fn global() -> &'static OwnershipLedger {
        Self::global_arc()
    }

    /// Get a shared handle to the global ledger
    pub fn shared() -> Arc<OwnershipLedger> {
        Self::global_arc().clone()
    }

    fn global_arc() -> &'static Arc<OwnershipLedger> {
        GLOBAL_LEDGER.get_or_init(|| Arc::new(OwnershipLedger::new()))
    }

    /// Allocate a null-terminated copy of `text` in `encoding`
    pub fn allocate(&self, text: &str, encoding: Encoding) -> MarshalResult<NativeString<'_>> {
        self.allocate_bytes(encoding.encode(text).into_owned())
    }

    /// Allocate a null-terminated copy of already-encoded bytes
    pub fn allocate_bytes(&self, mut bytes: Vec<u8>) -> MarshalResult<NativeString<'_>> {
        if let Some(position) = bytes.iter().position(|&b| b == 0) {
            return Err(MarshalError::InteriorNul { position });
        }

        let len = bytes.len();
        bytes.push(0);
        let raw = Box::into_raw(bytes.into_boxed_slice()) as *mut c_char;
        let ptr = NonNull::new(raw)
            .ok_or_else(|| MarshalError::Internal("allocation returned null".to_string()))?;

        self.entries.insert(
            raw as usize,
            LedgerEntry {
                state: AllocationState::OwnedByAllocator,
                len,
            },
        );
        self.allocations.fetch_add(1, Ordering::SeqCst);

        Ok(NativeString {
            ptr,
            len,
            ledger: self,
        })
    }

    /// Release a pointer previously transferred with [`NativeString::into_raw`]
    ///
    /// Returns [`MarshalError::DoubleRelease`] when the pointer is not
    /// currently transferred out of this ledger, which covers second releases
    /// and foreign pointers alike.
    ///
    /// # Safety
    ///
    /// If the pointer is tracked, it must not be used after this call.
    pub unsafe fn release_raw(&self, ptr: *mut c_char) -> MarshalResult<()> {
        let reclaimed = unsafe { NativeString::from_raw(ptr, self) }?;
        drop(reclaimed);
        Ok(())
    }

    /// Current state of the allocation at `ptr`
    ///
    /// Released allocations are forgotten, so their address reports
    /// `Unallocated` (the allocator may hand it out again).
    pub fn state_of(&self, ptr: *const c_char) -> AllocationState {
        self.entries
            .get(&(ptr as usize))
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Number of strings currently allocated
    pub fn live(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of the allocation counters
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            allocations: self.allocations.load(Ordering::SeqCst),
            releases: self.releases.load(Ordering::SeqCst),
            live: self.live(),
        }
    }

    /// Move a tracked allocation to `to`, returning its length
    fn transition(&self, addr: usize, to: AllocationState) -> MarshalResult<usize> {
        let mut entry = self
            .entries
            .get_mut(&addr)
            .ok_or(MarshalError::DoubleRelease)?;
        if !entry.state.can_transition_to(to) {
            return Err(MarshalError::DoubleRelease);
        }
        entry.state = to;
        Ok(entry.len)
    }

    /// Free the allocation and forget it
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_bytes` on this ledger with length `len`,
    /// and must not be freed twice.
    unsafe fn free(&self, ptr: NonNull<c_char>, len: usize) {
        self.entries.remove(&(ptr.as_ptr() as usize));
        self.releases.fetch_add(1, Ordering::SeqCst);
        let slice = std::ptr::slice_from_raw_parts_mut(ptr.as_ptr() as *mut u8, len + 1);
        drop(unsafe { Box::from_raw(slice) });
    }
}

impl Default for OwnershipLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned, null-terminated string allocated by an [`OwnershipLedger`]
///
/// This handle is move-only. Dropping it releases the memory;
/// [`into_raw`](Self::into_raw) hands the memory to the other side, which
/// must give it back through [`OwnershipLedger::release_raw`] exactly once.
pub struct NativeString<'l> {
    ptr: NonNull<c_char>,
    len: usize,
    ledger: &'l OwnershipLedger,
}

impl<'l> NativeString<'l> {
    /// Pointer to the null-terminated data, valid while `self` lives
    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr()
    }

    /// Length in bytes, excluding the terminator
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Encoded bytes, excluding the terminator
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: ptr was allocated with len + 1 initialized bytes and is
        // owned by self
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr() as *const u8, self.len) }
    }

    /// Encoded bytes including the terminator
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        // SAFETY: as above, the terminator is part of the allocation
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr() as *const u8, self.len + 1) }
    }

    /// Borrowed view of this string
    pub fn as_native_str(&self) -> NativeStr<'_> {
        NativeStr::from_bytes(self.as_bytes())
    }

    /// Decode the contents
    pub fn decode(&self, encoding: Encoding) -> MarshalResult<String> {
        encoding.decode(self.as_bytes())
    }

    /// Current ownership state as recorded by the ledger
    pub fn state(&self) -> AllocationState {
        self.ledger.state_of(self.as_ptr())
    }

    /// Transfer ownership to the caller
    ///
    /// The returned pointer must be released exactly once through
    /// [`OwnershipLedger::release_raw`] or reclaimed with
    /// [`from_raw`](Self::from_raw).
    pub fn into_raw(self) -> *mut c_char {
        let raw = self.ptr.as_ptr();
        // A live NativeString is always OwnedByAllocator, so this cannot fail
        let _ = self
            .ledger
            .transition(raw as usize, AllocationState::TransferredToCaller);
        std::mem::forget(self);
        raw
    }

    /// Reclaim a pointer previously returned by [`into_raw`](Self::into_raw)
    ///
    /// # Safety
    ///
    /// After a successful call the caller must not use `ptr` except through
    /// the returned handle.
    pub unsafe fn from_raw(ptr: *mut c_char, ledger: &'l OwnershipLedger) -> MarshalResult<Self> {
        let ptr = NonNull::new(ptr).ok_or(MarshalError::NullPointer)?;
        let len = ledger.transition(ptr.as_ptr() as usize, AllocationState::OwnedByAllocator)?;
        Ok(Self { ptr, len, ledger })
    }
}

impl Drop for NativeString<'_> {
    fn drop(&mut self) {
        let _ = self
            .ledger
            .transition(self.ptr.as_ptr() as usize, AllocationState::Released);
        // SAFETY: self owns the allocation and drop runs once
        unsafe { self.ledger.free(self.ptr, self.len) };
    }
}

impl std::fmt::Debug for NativeString<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeString")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("bytes", &String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}
