//! # Entity Component System
//!
//! Archetype-oriented ECS: every entity belongs to exactly one archetype and
//! lives in one row of that archetype's buffer.
//!
//! ## Design Philosophy
//!
//! - Components are plain-old-data stored in parallel columns
//! - Entity handles carry a generation counter for safe reuse
//! - Systems select buffers through 256-bit archetype filters
//! - Systems run sequentially, in registration order

mod archetype;
mod component;
mod entity;
mod filter;
mod system;
mod world;

pub use archetype::{Archetype, ArchetypeDescriptor};
pub use component::{Component, ComponentInfo};
pub use entity::{EntityEntry, EntityHandle, EntityTable, INVALID_BUFFER};
pub use filter::ArchetypeFilter;
pub use system::{System, SystemResult, TickReport, TickState};
pub use world::{World, WorldBuilder, MAX_ARCHETYPES};
