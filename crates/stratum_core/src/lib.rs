//! # STRATUM Core
//!
//! Archetype-based Entity Component System with bit-level storage
//! bookkeeping:
//! - 256-bit archetype masks for buffer selection
//! - 65536-slot bitset allocators with a cached search cursor
//! - Growable column buffers of plain-old-data components
//! - Generation-checked entity handles
//!
//! ## Architecture Rules
//!
//! 1. **Rows never move** - a handle's row is stable until it is destroyed
//! 2. **Columns own their memory** - released exactly once, on dispose or drop
//! 3. **Capacity exhaustion is not an error** - it yields `None`, `false`
//!    or [`EntityHandle::NULL`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use stratum_core::{World, TickState};
//!
//! let mut world = World::builder().with_archetype::<Cube>().build()?;
//! let cube = world.create_entity::<Cube>()?;
//! world.set(cube, Transform::IDENTITY);
//! world.process(&TickState::new(1.0 / 60.0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod storage;

pub use config::WorldConfig;
pub use ecs::{
    Archetype, ArchetypeDescriptor, ArchetypeFilter, Component, ComponentInfo, EntityHandle,
    System, SystemResult, TickReport, TickState, World, WorldBuilder,
};
pub use error::{StorageError, StorageResult};
pub use storage::{BitMask256, ComponentBuffer, SlotAllocator};
