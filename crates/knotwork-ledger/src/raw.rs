//! Low-level zeroed allocation primitives.
//!
//! The only module in the workspace with `unsafe`. Each block carries a
//! `// SAFETY:` comment. Accounting lives one level up in
//! [`TrackedBuffer`](crate::TrackedBuffer); this module only pairs
//! `alloc_zeroed` with `dealloc` for a fixed `Layout`.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::slice;

use knotwork_core::AllocError;

/// Element types for which the all-zero bit pattern is a valid value.
///
/// Buffers are handed out zero-initialised straight from the allocator,
/// so only types that are valid when zeroed may be stored in them.
///
/// # Safety
///
/// Implementors must be `Copy`, have no drop glue, and accept an all-zero
/// byte pattern as a valid value.
pub unsafe trait Zeroable: Copy + 'static {}

macro_rules! impl_zeroable {
    ($($t:ty),*) => {
        $(
            // SAFETY: plain numeric types; zero bits are the value zero.
            unsafe impl Zeroable for $t {}
        )*
    };
}

impl_zeroable!(f32, f64, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// An exclusively owned, zero-initialised heap array of `T`.
///
/// Released with the same layout it was allocated with when dropped.
pub(crate) struct RawBuffer<T: Zeroable> {
    ptr: NonNull<T>,
    len: usize,
}

impl<T: Zeroable> RawBuffer<T> {
    /// Layout for `len` elements of `T`, or `SizeOverflow`.
    pub(crate) fn layout(len: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(len).map_err(|_| AllocError::SizeOverflow {
            count: len,
            element_size: std::mem::size_of::<T>(),
        })
    }

    /// Allocate `len` zeroed elements.
    ///
    /// A zero-byte layout never reaches the allocator and yields a dangling,
    /// well-aligned pointer. If the allocator reports failure the process
    /// is terminated through [`alloc::handle_alloc_error`]; a null buffer is
    /// never returned.
    pub(crate) fn zeroed(layout: Layout, len: usize) -> Self {
        if layout.size() == 0 {
            return Self {
                ptr: NonNull::dangling(),
                len,
            };
        }
        // SAFETY: layout has non-zero size (checked above).
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        match NonNull::new(ptr.cast::<T>()) {
            Some(ptr) => Self { ptr, len },
            None => alloc::handle_alloc_error(layout),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid and aligned for len initialised (zeroed or
        // since written) elements of T, and we hold the only reference.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in as_slice; &mut self guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        // Layout was valid when the buffer was created, so it is still valid.
        let Ok(layout) = Self::layout(self.len) else {
            return;
        };
        if layout.size() == 0 {
            return;
        }
        // SAFETY: ptr came from alloc_zeroed with exactly this layout and is
        // released only here, once.
        unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) }
    }
}
