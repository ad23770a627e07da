//! Struct transfer for fixed-layout values
//!
//! Structs are copied by value through a pointer the caller owns. Nothing is
//! allocated and no ownership moves: the pointer is borrowed for the duration
//! of the call only.

use crate::error::{MarshalError, MarshalResult};
use serde::{Deserialize, Serialize};

/// Marker for types that can be copied across the boundary by value
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` (or a primitive), contain no pointers or
/// references, have no padding whose content matters, and be valid for every
/// bit pattern the other side may write.
pub unsafe trait FixedLayout: Copy + 'static {}

unsafe impl FixedLayout for i32 {}
unsafe impl FixedLayout for u32 {}
unsafe impl FixedLayout for i64 {}
unsafe impl FixedLayout for u64 {}
unsafe impl FixedLayout for f32 {}
unsafe impl FixedLayout for f64 {}

/// Two 32-bit integers with sequential layout
///
/// # Memory Layout
///
/// ```text
/// +--------+--------+
/// |   a    |   b    |
/// | (i32)  | (i32)  |
/// +--------+--------+
/// ```
///
/// 8 bytes, no padding, matching `[StructLayout(LayoutKind.Sequential)]` on
/// the managed side.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedStruct {
    pub a: i32,
    pub b: i32,
}

const _: () = assert!(std::mem::size_of::<FixedStruct>() == 8);
const _: () = assert!(std::mem::align_of::<FixedStruct>() == 4);

unsafe impl FixedLayout for FixedStruct {}

impl FixedStruct {
    pub const fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }
}

/// Copy a value out of a borrowed location
///
/// # Safety
///
/// `ptr` must be null or valid for reads of `size_of::<T>()` bytes.
/// Alignment is not required.
pub unsafe fn read<T: FixedLayout>(ptr: *const T) -> MarshalResult<T> {
    if ptr.is_null() {
        return Err(MarshalError::NullPointer);
    }
    Ok(unsafe { std::ptr::read_unaligned(ptr) })
}

/// Copy a value into a borrowed location
///
/// # Safety
///
/// `ptr` must be null or valid for writes of `size_of::<T>()` bytes.
/// Alignment is not required.
pub unsafe fn write<T: FixedLayout>(ptr: *mut T, value: T) -> MarshalResult<()> {
    if ptr.is_null() {
        return Err(MarshalError::NullPointer);
    }
    unsafe { std::ptr::write_unaligned(ptr, value) };
    Ok(())
}

/// Populate a borrowed location in place
///
/// Reads the current value, lets `f` modify it, and writes it back.
///
/// # Safety
///
/// Same requirements as [`read`] and [`write`].
pub unsafe fn update<T, F>(ptr: *mut T, f: F) -> MarshalResult<T>
where
    T: FixedLayout,
    F: FnOnce(&mut T),
{
    let mut value = unsafe { read(ptr as *const T) }?;
    f(&mut value);
    unsafe { write(ptr, value) }?;
    Ok(value)
}
