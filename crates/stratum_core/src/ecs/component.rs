//! # Component System
//!
//! Components are pure data containers with no behavior.
//! They must be plain old data so that zero-filled and recycled rows are
//! always valid values.

use std::alloc::Layout;
use std::any::TypeId;

use bytemuck::Pod;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Pod`: Plain old data, any byte pattern is a valid value
/// - `Send + Sync`: Buffers may be moved between threads as a whole
///
/// Rows freed and re-allocated without growth keep their old bytes, so a
/// component must be written (or tolerate the previous value) after
/// `World::create_entity`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {}
/// ```
pub trait Component: Pod + Send + Sync + 'static {}

/// Layout metadata for one component column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    type_id: TypeId,
    name: &'static str,
    layout: Layout,
}

impl ComponentInfo {
    /// Describes component type `C`.
    ///
    /// # Panics
    ///
    /// Panics if `C` is zero-sized.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        let layout = Layout::new::<C>();
        assert!(
            layout.size() > 0,
            "component {} is zero-sized",
            std::any::type_name::<C>()
        );
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            layout,
        }
    }

    /// Type identity of the component.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the component.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Memory layout of one element.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Size of one element in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Returns `true` if this describes component `C`.
    #[inline]
    #[must_use]
    pub fn is<C: Component>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }
}
