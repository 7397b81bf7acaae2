//! # Archetype Descriptors
//!
//! An archetype is a fixed, ordered set of component types. Each declared
//! component owns one column in the archetype's
//! [`ComponentBuffer`](crate::ComponentBuffer); the declaration order is the
//! column index.
//!
//! ```text
//! Archetype "Cube" (Transform + Tint):
//!   column 0: Transform[]  [T0, T1, T2, ...]
//!   column 1: Tint[]       [C0, C1, C2, ...]
//! ```

use std::alloc::Layout;
use std::any::TypeId;

use super::component::{Component, ComponentInfo};

/// Column layout of one archetype, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchetypeDescriptor {
    components: Vec<ComponentInfo>,
}

impl ArchetypeDescriptor {
    /// Creates a descriptor with no components.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends component `C` as the next column.
    ///
    /// # Panics
    ///
    /// Panics if `C` is already declared or is zero-sized.
    #[must_use]
    pub fn with<C: Component>(mut self) -> Self {
        assert!(
            !self.contains::<C>(),
            "component {} declared twice",
            std::any::type_name::<C>()
        );
        self.components.push(ComponentInfo::of::<C>());
        self
    }

    /// Number of declared component columns.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Element size of column `index` in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared column.
    #[inline]
    #[must_use]
    pub fn component_size(&self, index: usize) -> usize {
        self.components[index].size()
    }

    /// Memory layout of one element of column `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared column.
    #[inline]
    #[must_use]
    pub fn component_layout(&self, index: usize) -> Layout {
        self.components[index].layout()
    }

    /// Metadata for every column.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[ComponentInfo] {
        &self.components
    }

    /// Column index owning `C`, or `None` if the archetype does not declare it.
    #[inline]
    #[must_use]
    pub fn column_of<C: Component>(&self) -> Option<usize> {
        self.column_of_type(TypeId::of::<C>())
    }

    /// Column index owning the component with `type_id`.
    #[inline]
    #[must_use]
    pub fn column_of_type(&self, type_id: TypeId) -> Option<usize> {
        self.components.iter().position(|info| info.type_id() == type_id)
    }

    /// Returns `true` if the archetype declares `C`.
    #[inline]
    #[must_use]
    pub fn contains<C: Component>(&self) -> bool {
        self.column_of::<C>().is_some()
    }

    /// Total bytes of one row across all columns.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.components.iter().map(ComponentInfo::size).sum()
    }
}

/// A type that names an archetype and describes its columns.
///
/// # Example
///
/// ```rust,ignore
/// struct Cube;
///
/// impl Archetype for Cube {
///     fn descriptor() -> ArchetypeDescriptor {
///         ArchetypeDescriptor::new().with::<Transform>()
///     }
/// }
/// ```
pub trait Archetype: 'static {
    /// Column layout of this archetype.
    fn descriptor() -> ArchetypeDescriptor;

    /// Human-readable name used in logs and errors.
    #[must_use]
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
