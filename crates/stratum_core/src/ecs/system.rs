//! # Systems
//!
//! Systems are registered with the [`World`] and run once per tick, strictly
//! in registration order. A failing system is reported and logged; it never
//! stops the systems after it.

use super::world::World;

/// Per-tick input handed to every system.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickState {
    /// Seconds elapsed since the previous tick.
    pub delta_time: f32,
}

impl TickState {
    /// Creates a tick state.
    #[inline]
    #[must_use]
    pub const fn new(delta_time: f32) -> Self {
        Self { delta_time }
    }
}

/// Outcome of one system's tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum SystemResult {
    /// The system completed its work.
    Success,
    /// The system could not complete its work.
    Failed,
}

impl SystemResult {
    /// Returns `true` for [`SystemResult::Success`].
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Summary of one [`World::process`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Systems that returned [`SystemResult::Success`].
    pub succeeded: usize,
    /// Systems that returned [`SystemResult::Failed`].
    pub failed: usize,
}

impl TickReport {
    /// Returns `true` if every system succeeded.
    #[inline]
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// A unit of per-tick logic.
///
/// # Example
///
/// ```rust,ignore
/// struct Gravity {
///     filter: ArchetypeFilter,
/// }
///
/// impl System for Gravity {
///     fn initialize(&mut self, world: &World) {
///         self.filter = world.filter::<Velocity>();
///     }
///
///     fn process(&mut self, world: &mut World, state: &TickState) -> SystemResult {
///         // scan world.buffers_matching(self.filter) ...
///         SystemResult::Success
///     }
/// }
/// ```
pub trait System {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs once when the system is registered with a built world.
    /// Typically caches an [`ArchetypeFilter`](super::ArchetypeFilter).
    fn initialize(&mut self, _world: &World) {}

    /// Runs on [`World::reset`].
    fn reset(&mut self, _world: &World) {}

    /// Runs once per tick.
    fn process(&mut self, world: &mut World, state: &TickState) -> SystemResult;
}
