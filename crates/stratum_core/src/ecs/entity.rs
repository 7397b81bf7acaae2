//! # Entity Management
//!
//! Entities are lightweight handles consisting of:
//! - A dense entity index with a generation counter for safe reuse
//! - The buffer id and row where the entity's components live

use std::cmp::Ordering;
use std::fmt;

use crate::storage::{SlotAllocator, SLOT_COUNT};

/// Buffer id carried by [`EntityHandle::NULL`].
pub const INVALID_BUFFER: u8 = u8::MAX;

/// Generation value that no live entity ever carries.
const NULL_GENERATION: u16 = 0;

/// Handle to an entity: `(index, generation, buffer, row)`.
///
/// Copyable value. A handle stays valid until its entity is destroyed; after
/// that every copy reports `false` from `World::exists`, even once the index
/// and row are reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    index: u16,
    generation: u16,
    buffer: u8,
    row: u16,
}

impl EntityHandle {
    /// Null/invalid handle, returned when the world is full.
    pub const NULL: Self = Self {
        index: 0,
        generation: NULL_GENERATION,
        buffer: INVALID_BUFFER,
        row: 0,
    };

    /// Dense entity index (key into the entity table).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.index
    }

    /// Generation of this entity.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u16 {
        self.generation
    }

    /// Id of the buffer storing this entity's components.
    #[inline]
    #[must_use]
    pub const fn buffer(self) -> u8 {
        self.buffer
    }

    /// Row inside the buffer.
    #[inline]
    #[must_use]
    pub const fn row(self) -> u16 {
        self.row
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.generation == NULL_GENERATION
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl PartialOrd for EntityHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by index, then generation.
impl Ord for EntityHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.generation, self.buffer, self.row).cmp(&(
            other.index,
            other.generation,
            other.buffer,
            other.row,
        ))
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("EntityHandle(NULL)");
        }
        write!(
            f,
            "EntityHandle({}v{} @ {}:{})",
            self.index, self.generation, self.buffer, self.row
        )
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity {} (rev {})", self.index, self.generation)
    }
}

/// Current state of one entity index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityEntry {
    /// Generation a live handle must carry.
    pub generation: u16,
    /// Buffer holding the entity.
    pub buffer: u8,
    /// Row inside that buffer.
    pub row: u16,
}

impl EntityEntry {
    const VACANT: Self = Self {
        generation: 1,
        buffer: INVALID_BUFFER,
        row: 0,
    };
}

/// Advances a generation, skipping the null generation on wrap.
#[inline]
const fn next_generation(generation: u16) -> u16 {
    match generation.wrapping_add(1) {
        NULL_GENERATION => 1,
        next => next,
    }
}

/// Maps dense entity indices to their current generation and location.
///
/// Capacity is fixed at 65536 entities. Generations advance each time an
/// index is released, so a reused index never matches an older handle
/// (until the 16-bit counter wraps).
pub struct EntityTable {
    /// Which indices are live.
    indices: SlotAllocator,
    /// One entry per index.
    entries: Box<[EntityEntry]>,
}

impl EntityTable {
    /// Creates an empty table with all entries pre-allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            indices: SlotAllocator::new(),
            entries: vec![EntityEntry::VACANT; SLOT_COUNT].into_boxed_slice(),
        }
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.count() as usize
    }

    /// Returns `true` if no entity is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.count() == 0
    }

    /// Returns `true` if every index is taken.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.indices.is_full()
    }

    /// Records a new entity at `(buffer, row)`.
    ///
    /// Returns `None` when all 65536 indices are live.
    pub fn insert(&mut self, buffer: u8, row: u16) -> Option<EntityHandle> {
        let index = self.indices.allocate()?;
        let entry = &mut self.entries[usize::from(index)];
        entry.buffer = buffer;
        entry.row = row;

        Some(EntityHandle {
            index,
            generation: entry.generation,
            buffer,
            row,
        })
    }

    /// Checks if `handle` refers to a live entity.
    #[inline]
    #[must_use]
    pub fn exists(&self, handle: EntityHandle) -> bool {
        !handle.is_null()
            && self.indices.get(handle.index)
            && self.entries[usize::from(handle.index)].generation == handle.generation
    }

    /// Current `(buffer, row)` of a live handle.
    #[inline]
    #[must_use]
    pub fn location(&self, handle: EntityHandle) -> Option<(u8, u16)> {
        if !self.exists(handle) {
            return None;
        }
        let entry = &self.entries[usize::from(handle.index)];
        Some((entry.buffer, entry.row))
    }

    /// Current entry for `index`, live or not.
    #[inline]
    #[must_use]
    pub fn entry(&self, index: u16) -> EntityEntry {
        self.entries[usize::from(index)]
    }

    /// Removes a live entity and returns where it was stored.
    ///
    /// Stale or null handles return `None` and change nothing.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<(u8, u16)> {
        let location = self.location(handle)?;

        let entry = &mut self.entries[usize::from(handle.index)];
        entry.generation = next_generation(entry.generation);
        entry.buffer = INVALID_BUFFER;
        self.indices.set(handle.index, false);

        Some(location)
    }

    /// Removes every live entity, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        for index in self.indices.iter_occupied() {
            let entry = &mut self.entries[usize::from(index)];
            entry.generation = next_generation(entry.generation);
            entry.buffer = INVALID_BUFFER;
        }
        self.indices.clear();
    }
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTable")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
