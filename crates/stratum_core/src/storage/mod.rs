//! # Storage Layer
//!
//! Bit-level bookkeeping and raw column memory behind the ECS.
//!
//! ## Design Philosophy
//!
//! - Occupancy is a bitset, never a free list
//! - Rows never move once allocated
//! - Column memory has exactly one owner and is released exactly once

mod allocator;
mod bitmask;
mod buffer;
mod column;

pub use allocator::{SlotAllocator, SLOT_COUNT};
pub use bitmask::BitMask256;
pub use buffer::{ComponentBuffer, MAX_ROWS};
