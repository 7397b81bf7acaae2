//! # Raw Component Column
//!
//! One contiguous, manually managed allocation holding `capacity` elements of
//! a single component type. All raw memory in the crate lives here.

// SAFETY: This module requires unsafe for manual allocation.
// Every unsafe block is documented and the owning type releases exactly once.
#![allow(unsafe_code)]

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, realloc, Layout};
use std::ptr::NonNull;

/// A growable, zero-initialised byte column for one component type.
///
/// Invariants:
/// - `ptr` is a live allocation of `capacity * element.size()` bytes aligned
///   to `element.align()` whenever `capacity > 0`.
/// - Bytes `[0, capacity * size)` are always initialised (zero on growth).
pub(crate) struct Column {
    /// Start of the allocation (dangling while `capacity == 0`).
    ptr: NonNull<u8>,
    /// Layout of a single element.
    element: Layout,
    /// Number of elements backed by the allocation.
    capacity: usize,
}

impl Column {
    /// Creates an empty column for elements of `element` layout.
    ///
    /// # Panics
    ///
    /// Panics if the element is zero-sized.
    pub(crate) fn new(element: Layout) -> Self {
        assert!(element.size() > 0, "zero-sized components are not stored");
        Self {
            ptr: NonNull::dangling(),
            element,
            capacity: 0,
        }
    }

    /// Number of elements currently backed.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn array_layout(&self, capacity: usize) -> Layout {
        let size = self
            .element
            .size()
            .checked_mul(capacity)
            .unwrap_or_else(|| panic!("column size overflow at {capacity} elements"));
        Layout::from_size_align(size, self.element.align())
            .unwrap_or_else(|_| panic!("invalid column layout for {capacity} elements"))
    }

    /// Grows the column to `new_capacity` elements.
    ///
    /// Bytes below the old capacity are preserved, the added range is zeroed.
    /// Shrinking is not supported; a smaller `new_capacity` is a no-op.
    pub(crate) fn grow_to(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity {
            return;
        }

        let new_layout = self.array_layout(new_capacity);

        let new_ptr = if self.capacity == 0 {
            // SAFETY: new_layout has non-zero size (element size > 0, capacity > 0).
            unsafe { alloc_zeroed(new_layout) }
        } else {
            let old_layout = self.array_layout(self.capacity);
            let old_bytes = old_layout.size();
            // SAFETY: ptr was allocated with old_layout by this column, the
            // alignment is unchanged and the new size is non-zero.
            unsafe {
                let ptr = realloc(self.ptr.as_ptr(), old_layout, new_layout.size());
                if !ptr.is_null() {
                    // Zero the newly added tail; realloc leaves it uninitialised.
                    std::ptr::write_bytes(ptr.add(old_bytes), 0, new_layout.size() - old_bytes);
                }
                ptr
            }
        };

        let Some(new_ptr) = NonNull::new(new_ptr) else {
            handle_alloc_error(new_layout);
        };

        self.ptr = new_ptr;
        self.capacity = new_capacity;
    }

    /// All backed bytes.
    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        if self.capacity == 0 {
            return &[];
        }
        // SAFETY: capacity > 0, so ptr is a live allocation of this many
        // initialised bytes, borrowed immutably for the lifetime of &self.
        unsafe {
            std::slice::from_raw_parts(self.ptr.as_ptr(), self.capacity * self.element.size())
        }
    }

    /// All backed bytes, mutably.
    #[inline]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        if self.capacity == 0 {
            return &mut [];
        }
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe {
            std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.capacity * self.element.size())
        }
    }

    /// Bytes of a single row.
    #[inline]
    pub(crate) fn row_bytes(&self, row: usize) -> &[u8] {
        let size = self.element.size();
        debug_assert!(row < self.capacity, "row {row} outside column capacity {}", self.capacity);
        &self.as_bytes()[row * size..(row + 1) * size]
    }

    /// Bytes of a single row, mutably.
    #[inline]
    pub(crate) fn row_bytes_mut(&mut self, row: usize) -> &mut [u8] {
        let size = self.element.size();
        debug_assert!(row < self.capacity, "row {row} outside column capacity {}", self.capacity);
        &mut self.as_bytes_mut()[row * size..(row + 1) * size]
    }

    /// Releases the allocation. Returns `true` if memory was freed.
    ///
    /// Safe to call any number of times.
    pub(crate) fn release(&mut self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let layout = self.array_layout(self.capacity);
        // SAFETY: capacity > 0, so ptr was allocated with exactly this layout.
        unsafe {
            dealloc(self.ptr.as_ptr(), layout);
        }
        self.ptr = NonNull::dangling();
        self.capacity = 0;
        true
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        self.release();
    }
}

// SAFETY: Column exclusively owns its allocation and only stores Pod bytes.
unsafe impl Send for Column {}
// SAFETY: Shared access only hands out immutable byte slices.
unsafe impl Sync for Column {}
