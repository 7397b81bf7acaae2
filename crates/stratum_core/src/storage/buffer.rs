//! # Component Buffer
//!
//! Stores every entity of one archetype as parallel columns, one per
//! declared component.
//!
//! ```text
//! ComponentBuffer "Cube" (capacity 4, rows 0 and 2 occupied):
//!   allocator:  [1][0][1][0]
//!   column 0:   [T0][..][T2][..]   Transform
//!   column 1:   [C0][..][C2][..]   Tint
//! ```
//!
//! Rows are handed out by a [`SlotAllocator`] (lowest free row first) and
//! never move. Capacity only grows; freed rows are recycled, not released.

use std::any::TypeId;
use std::mem;

use tracing::{debug, trace};

use super::allocator::SlotAllocator;
use super::column::Column;
use crate::ecs::{Archetype, ArchetypeDescriptor, Component};

/// Maximum number of rows a single buffer can back.
pub const MAX_ROWS: u16 = u16::MAX;

/// Column storage for one archetype.
///
/// Invariants:
/// - Every column backs exactly `capacity` rows.
/// - A row may be read or written only while its allocator bit is set.
/// - Rows recycled below the current capacity keep their previous bytes;
///   rows added by growth start zeroed.
pub struct ComponentBuffer {
    /// Type identity of the archetype this buffer stores.
    archetype: TypeId,
    /// Archetype name for logs.
    name: &'static str,
    /// Column layout.
    descriptor: ArchetypeDescriptor,
    /// One column per declared component, in declaration order.
    columns: Vec<Column>,
    /// Row occupancy.
    allocator: SlotAllocator,
    /// Rows currently backed by every column.
    capacity: u16,
    /// Set once column memory has been released.
    disposed: bool,
}

impl ComponentBuffer {
    /// Creates an empty buffer for archetype `A`. No memory is allocated
    /// until the first row is requested.
    #[must_use]
    pub fn for_archetype<A: Archetype>() -> Self {
        let descriptor = A::descriptor();
        let columns = descriptor
            .components()
            .iter()
            .map(|info| Column::new(info.layout()))
            .collect();

        Self {
            archetype: TypeId::of::<A>(),
            name: A::name(),
            descriptor,
            columns,
            allocator: SlotAllocator::new(),
            capacity: 0,
            disposed: false,
        }
    }

    /// Type identity of the stored archetype.
    #[inline]
    #[must_use]
    pub fn archetype_id(&self) -> TypeId {
        self.archetype
    }

    /// Name of the stored archetype.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column layout of the stored archetype.
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &ArchetypeDescriptor {
        &self.descriptor
    }

    /// Rows currently backed by memory.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    /// Number of occupied rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.allocator.count() as usize
    }

    /// Returns `true` if no row is occupied.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocator.count() == 0
    }

    /// Returns `true` if the next [`allocate`](Self::allocate) would fail.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.disposed
            || self
                .allocator
                .find_free_index()
                .map_or(true, |row| row >= MAX_ROWS)
    }

    /// Returns `true` once column memory has been released.
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Returns `true` if the archetype declares component `C`.
    #[inline]
    #[must_use]
    pub fn has_component<C: Component>(&self) -> bool {
        self.descriptor.contains::<C>()
    }

    /// Returns `true` if `row` is currently allocated.
    #[inline]
    #[must_use]
    pub fn is_occupied(&self, row: u16) -> bool {
        self.allocator.get(row)
    }

    /// Reserves the lowest free row, growing every column if needed.
    ///
    /// Returns `None` when the buffer is full or disposed. A recycled row
    /// keeps whatever bytes its previous occupant left behind.
    pub fn allocate(&mut self) -> Option<u16> {
        if self.disposed {
            return None;
        }

        let row = self.allocator.find_free_index()?;
        if row >= MAX_ROWS {
            return None;
        }

        self.allocator.set(row, true);

        if row >= self.capacity {
            debug_assert_eq!(row, self.capacity, "lowest free row skipped past capacity");
            self.grow(row - self.capacity + 1);
        }

        trace!(archetype = self.name, row, "row allocated");
        Some(row)
    }

    /// Releases `row` for reuse. Memory is neither zeroed nor compacted.
    ///
    /// Returns `false` if the row was not allocated.
    pub fn free(&mut self, row: u16) -> bool {
        if !self.allocator.get(row) {
            return false;
        }
        self.allocator.set(row, false);
        trace!(archetype = self.name, row, "row freed");
        true
    }

    /// Ensures at least `rows` rows are backed by memory.
    pub fn reserve(&mut self, rows: u16) {
        if self.disposed || rows <= self.capacity {
            return;
        }
        self.grow(rows - self.capacity);
    }

    /// Grows every column by at least `extra` rows.
    ///
    /// Doubles when `extra` is smaller than the current capacity, capped at
    /// [`MAX_ROWS`]. Existing bytes are preserved, new bytes are zeroed.
    fn grow(&mut self, extra: u16) {
        let old_capacity = usize::from(self.capacity);
        let extra = usize::from(extra);

        let target = if extra < old_capacity {
            old_capacity * 2
        } else {
            old_capacity + extra
        };
        let new_capacity = target.min(usize::from(MAX_ROWS));

        for column in &mut self.columns {
            column.grow_to(new_capacity);
        }
        debug_assert!(self.columns.iter().all(|c| c.capacity() == new_capacity));

        self.capacity = u16::try_from(new_capacity).unwrap_or(MAX_ROWS);

        debug!(
            archetype = self.name,
            old_capacity,
            new_capacity,
            "component buffer grown"
        );
    }

    /// Iterates occupied rows, lowest first.
    pub fn occupied_rows(&self) -> impl Iterator<Item = u16> + '_ {
        self.allocator.iter_occupied()
    }

    /// Raw bytes of column `index` across the full capacity.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared column.
    #[must_use]
    pub fn column_bytes(&self, index: usize) -> &[u8] {
        self.columns[index].as_bytes()
    }

    /// Raw bytes of column `index`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared column.
    pub fn column_bytes_mut(&mut self, index: usize) -> &mut [u8] {
        self.columns[index].as_bytes_mut()
    }

    /// Raw bytes of one cell.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared column or `row` is outside capacity.
    #[must_use]
    pub fn cell_bytes(&self, index: usize, row: u16) -> &[u8] {
        self.columns[index].row_bytes(usize::from(row))
    }

    /// Raw bytes of one cell, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared column or `row` is outside capacity.
    pub fn cell_bytes_mut(&mut self, index: usize, row: u16) -> &mut [u8] {
        self.columns[index].row_bytes_mut(usize::from(row))
    }

    /// Typed view of `C`'s column across the full capacity, including
    /// unoccupied rows.
    #[must_use]
    pub fn column<C: Component>(&self) -> Option<&[C]> {
        let index = self.descriptor.column_of::<C>()?;
        Some(cells(self.columns[index].as_bytes()))
    }

    /// Mutable typed view of `C`'s column across the full capacity.
    pub fn column_mut<C: Component>(&mut self) -> Option<&mut [C]> {
        let index = self.descriptor.column_of::<C>()?;
        Some(cells_mut(self.columns[index].as_bytes_mut()))
    }

    /// Walks occupied rows, lowest first, yielding `C` of each mutably.
    ///
    /// Returns `None` if the archetype lacks `C`.
    pub fn iter_mut<C: Component>(
        &mut self,
    ) -> Option<impl Iterator<Item = (u16, &mut C)> + '_> {
        let index = self.descriptor.column_of::<C>()?;
        let writes = cells_mut::<C>(self.columns[index].as_bytes_mut());
        let mut rows = self.allocator.iter_occupied();
        let mut rest = writes;
        let mut offset = 0usize;

        Some(std::iter::from_fn(move || {
            let row = rows.next()?;
            let (cell, tail) = mem::take(&mut rest)
                .get_mut(usize::from(row) - offset..)?
                .split_first_mut()?;
            rest = tail;
            offset = usize::from(row) + 1;
            Some((row, cell))
        }))
    }

    /// Walks occupied rows, lowest first, yielding `C` mutably alongside `R`.
    ///
    /// Returns `None` if the archetype lacks either component or if `C` and
    /// `R` are the same type.
    pub fn iter_mut_with<C: Component, R: Component>(
        &mut self,
    ) -> Option<impl Iterator<Item = (u16, &mut C, &R)> + '_> {
        let write = self.descriptor.column_of::<C>()?;
        let read = self.descriptor.column_of::<R>()?;
        if write == read {
            return None;
        }

        let (write_column, read_column): (&mut Column, &Column) = if write < read {
            let (low, high) = self.columns.split_at_mut(read);
            (&mut low[write], &high[0])
        } else {
            let (low, high) = self.columns.split_at_mut(write);
            (&mut high[0], &low[read])
        };
        let reads = cells::<R>(read_column.as_bytes());
        let mut rest = cells_mut::<C>(write_column.as_bytes_mut());
        let mut rows = self.allocator.iter_occupied();
        let mut offset = 0usize;

        Some(std::iter::from_fn(move || {
            let row = rows.next()?;
            let (cell, tail) = mem::take(&mut rest)
                .get_mut(usize::from(row) - offset..)?
                .split_first_mut()?;
            rest = tail;
            offset = usize::from(row) + 1;
            Some((row, cell, reads.get(usize::from(row))?))
        }))
    }

    /// Component `C` of an occupied row.
    #[must_use]
    pub fn get<C: Component>(&self, row: u16) -> Option<&C> {
        if !self.allocator.get(row) {
            return None;
        }
        self.column::<C>()?.get(usize::from(row))
    }

    /// Component `C` of an occupied row, mutably.
    pub fn get_mut<C: Component>(&mut self, row: u16) -> Option<&mut C> {
        if !self.allocator.get(row) {
            return None;
        }
        self.column_mut::<C>()?.get_mut(usize::from(row))
    }

    /// Writes component `C` into an occupied row.
    ///
    /// Returns `false` if the row is free or the archetype lacks `C`.
    pub fn write<C: Component>(&mut self, row: u16, value: C) -> bool {
        match self.get_mut::<C>(row) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Releases all column memory and frees every row.
    ///
    /// Idempotent: returns `true` only on the call that released memory.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;

        let released = self
            .columns
            .iter_mut()
            .map(Column::release)
            .filter(|&released| released)
            .count();
        self.allocator.clear();
        self.capacity = 0;

        debug!(archetype = self.name, released, "component buffer disposed");
        true
    }
}

/// Typed view over column bytes. An empty (unallocated) column has a
/// dangling pointer that would fail the alignment check.
fn cells<C: Component>(bytes: &[u8]) -> &[C] {
    if bytes.is_empty() {
        return &[];
    }
    bytemuck::cast_slice(bytes)
}

fn cells_mut<C: Component>(bytes: &mut [u8]) -> &mut [C] {
    if bytes.is_empty() {
        return &mut [];
    }
    bytemuck::cast_slice_mut(bytes)
}

impl std::fmt::Debug for ComponentBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBuffer")
            .field("archetype", &self.name)
            .field("columns", &self.columns.len())
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}
