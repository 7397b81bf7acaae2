//! # Storage Error Types
//!
//! Errors that indicate a misconfigured world. Capacity exhaustion is not an
//! error: it is reported as `None`, `false` or [`EntityHandle::NULL`].
//!
//! [`EntityHandle::NULL`]: crate::EntityHandle::NULL

use thiserror::Error;

/// Errors that can occur while building or addressing a world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The archetype was never registered with the world.
    #[error("archetype {name} is not part of the world")]
    UnknownArchetype {
        /// Archetype type name.
        name: &'static str,
    },

    /// The archetype was registered more than once.
    #[error("archetype {name} registered twice")]
    DuplicateArchetype {
        /// Archetype type name.
        name: &'static str,
    },

    /// More archetypes than buffer ids.
    #[error("too many archetypes: {count} registered, at most {max} supported")]
    TooManyArchetypes {
        /// Number registered.
        count: usize,
        /// Maximum supported.
        max: usize,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
