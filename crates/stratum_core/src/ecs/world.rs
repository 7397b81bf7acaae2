//! # ECS World
//!
//! The central container for all entities, component buffers and systems.
//!
//! A world is assembled once through [`WorldBuilder`]: the set of archetypes
//! is fixed after [`WorldBuilder::build`], which is what lets buffer ids stay
//! stable for the lifetime of every [`ArchetypeFilter`] and [`EntityHandle`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut world = World::builder()
//!     .with_archetype::<Cube>()
//!     .with_system(RotateTransform::default())
//!     .build()?;
//!
//! let cube = world.create_entity::<Cube>()?;
//! world.process(&TickState::new(1.0 / 60.0));
//! ```

use std::any::TypeId;
use std::mem;

use tracing::{debug, error, trace, warn};

use super::archetype::Archetype;
use super::component::Component;
use super::entity::{EntityHandle, EntityTable};
use super::filter::ArchetypeFilter;
use super::system::{System, SystemResult, TickReport, TickState};
use crate::config::WorldConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::ComponentBuffer;

/// Maximum number of archetypes per world. Buffer id 255 is reserved for
/// [`EntityHandle::NULL`].
pub const MAX_ARCHETYPES: usize = 255;

/// Collects archetypes and systems before a [`World`] is created.
#[derive(Default)]
pub struct WorldBuilder {
    config: WorldConfig,
    buffers: Vec<ComponentBuffer>,
    systems: Vec<Box<dyn System>>,
}

impl WorldBuilder {
    /// Creates a builder with the default [`WorldConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the world configuration.
    #[must_use]
    pub fn with_config(mut self, config: WorldConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers archetype `A`. Its buffer id is its registration index.
    #[must_use]
    pub fn with_archetype<A: Archetype>(mut self) -> Self {
        self.buffers.push(ComponentBuffer::for_archetype::<A>());
        self
    }

    /// Registers a system. Systems run in registration order.
    #[must_use]
    pub fn with_system<S: System + 'static>(mut self, system: S) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Creates the world and initializes every registered system.
    ///
    /// # Errors
    ///
    /// Returns an error if an archetype is registered twice or more than
    /// [`MAX_ARCHETYPES`] archetypes are registered.
    pub fn build(self) -> StorageResult<World> {
        let Self {
            config,
            mut buffers,
            systems,
        } = self;

        if buffers.len() > MAX_ARCHETYPES {
            return Err(StorageError::TooManyArchetypes {
                count: buffers.len(),
                max: MAX_ARCHETYPES,
            });
        }

        for (index, buffer) in buffers.iter().enumerate() {
            if buffers[..index]
                .iter()
                .any(|other| other.archetype_id() == buffer.archetype_id())
            {
                return Err(StorageError::DuplicateArchetype {
                    name: buffer.name(),
                });
            }
        }

        if config.initial_rows > 0 {
            for buffer in &mut buffers {
                buffer.reserve(config.initial_rows);
            }
        }

        debug!(
            archetypes = buffers.len(),
            systems = systems.len(),
            initial_rows = config.initial_rows,
            "world built"
        );

        let mut world = World {
            buffers,
            entities: EntityTable::new(),
            systems: Vec::with_capacity(systems.len()),
            config,
            tick: 0,
        };
        for system in systems {
            world.register_system(system);
        }
        Ok(world)
    }
}

/// Entities, their component buffers and the systems that update them.
///
/// Buffer ids are registration indices and never change. Dropping the world
/// releases all column memory.
pub struct World {
    /// One buffer per archetype, indexed by buffer id.
    buffers: Vec<ComponentBuffer>,
    /// Entity index -> generation and location.
    entities: EntityTable,
    /// Systems in execution order.
    systems: Vec<Box<dyn System>>,
    /// Runtime options.
    config: WorldConfig,
    /// Ticks processed so far.
    tick: u64,
}

impl World {
    /// Starts building a world.
    #[must_use]
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of ticks processed.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    // =========================================================================
    // Buffers
    // =========================================================================

    /// All buffers, indexed by buffer id.
    #[inline]
    #[must_use]
    pub fn buffers(&self) -> &[ComponentBuffer] {
        &self.buffers
    }

    /// Buffer id of archetype `A`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownArchetype`] if `A` was not registered.
    pub fn buffer_index<A: Archetype>(&self) -> StorageResult<u8> {
        let id = TypeId::of::<A>();
        self.buffers
            .iter()
            .position(|buffer| buffer.archetype_id() == id)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or(StorageError::UnknownArchetype { name: A::name() })
    }

    /// Buffer of archetype `A`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownArchetype`] if `A` was not registered.
    pub fn buffer<A: Archetype>(&self) -> StorageResult<&ComponentBuffer> {
        let index = self.buffer_index::<A>()?;
        Ok(&self.buffers[usize::from(index)])
    }

    /// Mutable buffer of archetype `A`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownArchetype`] if `A` was not registered.
    pub fn buffer_mut<A: Archetype>(&mut self) -> StorageResult<&mut ComponentBuffer> {
        let index = self.buffer_index::<A>()?;
        Ok(&mut self.buffers[usize::from(index)])
    }

    /// Buffer with id `id`, if any.
    #[inline]
    #[must_use]
    pub fn buffer_by_id(&self, id: u8) -> Option<&ComponentBuffer> {
        self.buffers.get(usize::from(id))
    }

    /// Mutable buffer with id `id`, if any.
    #[inline]
    pub fn buffer_by_id_mut(&mut self, id: u8) -> Option<&mut ComponentBuffer> {
        self.buffers.get_mut(usize::from(id))
    }

    /// Filter matching every buffer whose archetype declares `C`.
    #[must_use]
    pub fn filter<C: Component>(&self) -> ArchetypeFilter {
        ArchetypeFilter::for_component::<C>(&self.buffers)
    }

    /// Buffers selected by `filter`, with their ids, in id order.
    pub fn buffers_matching(
        &self,
        filter: ArchetypeFilter,
    ) -> impl Iterator<Item = (u8, &ComponentBuffer)> + '_ {
        filter
            .iter()
            .filter_map(move |id| self.buffers.get(usize::from(id)).map(|buffer| (id, buffer)))
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity of archetype `A` in the lowest free row of its buffer.
    ///
    /// Returns [`EntityHandle::NULL`] if the buffer or the entity table is
    /// full. A recycled row keeps its previous occupant's bytes; callers
    /// write every component before reading it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownArchetype`] if `A` was not registered.
    pub fn create_entity<A: Archetype>(&mut self) -> StorageResult<EntityHandle> {
        let buffer_id = self.buffer_index::<A>()?;
        let buffer = &mut self.buffers[usize::from(buffer_id)];

        let Some(row) = buffer.allocate() else {
            warn!(archetype = A::name(), "component buffer full, entity not created");
            return Ok(EntityHandle::NULL);
        };

        match self.entities.insert(buffer_id, row) {
            Some(handle) => {
                trace!(archetype = A::name(), %handle, row, "entity created");
                Ok(handle)
            }
            None => {
                buffer.free(row);
                warn!(archetype = A::name(), "entity table full, entity not created");
                Ok(EntityHandle::NULL)
            }
        }
    }

    /// Destroys a live entity and frees its row.
    ///
    /// Returns `false` for null or stale handles; nothing changes in that
    /// case.
    pub fn destroy_entity(&mut self, handle: EntityHandle) -> bool {
        let Some((buffer_id, row)) = self.entities.remove(handle) else {
            return false;
        };
        let freed = self
            .buffers
            .get_mut(usize::from(buffer_id))
            .is_some_and(|buffer| buffer.free(row));
        debug_assert!(freed, "live entity pointed at a free row");
        trace!(%handle, "entity destroyed");
        true
    }

    /// Returns `true` if `handle` refers to a live entity.
    #[inline]
    #[must_use]
    pub fn exists(&self, handle: EntityHandle) -> bool {
        self.entities.exists(handle)
    }

    /// `(buffer id, row)` of a live entity.
    #[inline]
    #[must_use]
    pub fn location(&self, handle: EntityHandle) -> Option<(u8, u16)> {
        self.entities.location(handle)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Component `C` of a live entity.
    #[must_use]
    pub fn get<C: Component>(&self, handle: EntityHandle) -> Option<&C> {
        let (buffer_id, row) = self.entities.location(handle)?;
        self.buffers.get(usize::from(buffer_id))?.get::<C>(row)
    }

    /// Mutable component `C` of a live entity.
    pub fn get_mut<C: Component>(&mut self, handle: EntityHandle) -> Option<&mut C> {
        let (buffer_id, row) = self.entities.location(handle)?;
        self.buffers.get_mut(usize::from(buffer_id))?.get_mut::<C>(row)
    }

    /// Writes component `C` of a live entity. Returns `false` if the handle
    /// is stale or the archetype lacks `C`.
    pub fn set<C: Component>(&mut self, handle: EntityHandle, value: C) -> bool {
        match self.get_mut::<C>(handle) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system after the world was built and initializes it.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.register_system(Box::new(system));
    }

    fn register_system(&mut self, mut system: Box<dyn System>) {
        system.initialize(self);
        debug!(system = system.name(), "system registered");
        self.systems.push(system);
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs `initialize` again on every system, in order.
    pub fn initialize_systems(&mut self) {
        let mut systems = mem::take(&mut self.systems);
        for system in &mut systems {
            system.initialize(self);
        }
        self.restore_systems(systems);
    }

    /// Runs `reset` on every system, in order.
    pub fn reset(&mut self) {
        let mut systems = mem::take(&mut self.systems);
        for system in &mut systems {
            system.reset(self);
        }
        self.restore_systems(systems);
        debug!(systems = self.systems.len(), "systems reset");
    }

    /// Runs every system once, in registration order.
    ///
    /// A failed system is counted (and logged when
    /// [`WorldConfig::log_failed_systems`] is set); the systems after it
    /// still run.
    pub fn process(&mut self, state: &TickState) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        let mut systems = mem::take(&mut self.systems);
        for (index, system) in systems.iter_mut().enumerate() {
            match system.process(self, state) {
                SystemResult::Success => report.succeeded += 1,
                result @ SystemResult::Failed => {
                    report.failed += 1;
                    if self.config.log_failed_systems {
                        error!(
                            tick = self.tick,
                            index,
                            system = system.name(),
                            ?result,
                            "ECS system failed"
                        );
                    }
                }
            }
        }
        self.restore_systems(systems);

        trace!(
            tick = report.tick,
            succeeded = report.succeeded,
            failed = report.failed,
            "tick processed"
        );
        report
    }

    /// Puts taken systems back ahead of any registered while they ran.
    fn restore_systems(&mut self, mut systems: Vec<Box<dyn System>>) {
        systems.append(&mut self.systems);
        self.systems = systems;
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Releases all column memory and invalidates every handle.
    ///
    /// Idempotent: returns `true` only on the call that released memory.
    /// Every later `create_entity` returns [`EntityHandle::NULL`].
    pub fn dispose(&mut self) -> bool {
        let released = self
            .buffers
            .iter_mut()
            .map(ComponentBuffer::dispose)
            .filter(|&released| released)
            .count();
        if released == 0 {
            return false;
        }
        self.entities.clear();
        debug!(buffers = released, "world disposed");
        true
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("buffers", &self.buffers)
            .field("entities", &self.entities)
            .field("systems", &self.systems.len())
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ArchetypeDescriptor;
    use bytemuck::{Pod, Zeroable};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Spin(f32);
    impl Component for Spin {}

    struct Marker;
    impl Archetype for Marker {
        fn descriptor() -> ArchetypeDescriptor {
            ArchetypeDescriptor::new().with::<Position>()
        }
    }

    struct Spinner;
    impl Archetype for Spinner {
        fn descriptor() -> ArchetypeDescriptor {
            ArchetypeDescriptor::new().with::<Position>().with::<Spin>()
        }
    }

    struct Unregistered;
    impl Archetype for Unregistered {
        fn descriptor() -> ArchetypeDescriptor {
            ArchetypeDescriptor::new().with::<Spin>()
        }
    }

    fn world() -> World {
        World::builder()
            .with_archetype::<Marker>()
            .with_archetype::<Spinner>()
            .build()
            .unwrap()
    }

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct Recorder {
        label: &'static str,
        result: SystemResult,
        log: Log,
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn initialize(&mut self, _world: &World) {
            self.log.borrow_mut().push("init");
        }

        fn reset(&mut self, _world: &World) {
            self.log.borrow_mut().push("reset");
        }

        fn process(&mut self, _world: &mut World, _state: &TickState) -> SystemResult {
            self.log.borrow_mut().push(self.label);
            self.result
        }
    }

    #[test]
    fn test_buffer_ids_follow_registration() {
        let world = world();
        assert_eq!(world.buffer_index::<Marker>(), Ok(0));
        assert_eq!(world.buffer_index::<Spinner>(), Ok(1));
        assert_eq!(world.buffers().len(), 2);
        assert!(world.buffer_by_id(2).is_none());
    }

    #[test]
    fn test_unknown_archetype_is_error() {
        let mut world = world();
        assert!(matches!(
            world.create_entity::<Unregistered>(),
            Err(StorageError::UnknownArchetype { .. })
        ));
        assert!(world.buffer::<Unregistered>().is_err());
    }

    #[test]
    fn test_duplicate_archetype_rejected() {
        let result = World::builder()
            .with_archetype::<Marker>()
            .with_archetype::<Marker>()
            .build();
        assert!(matches!(
            result,
            Err(StorageError::DuplicateArchetype { .. })
        ));
    }

    #[test]
    fn test_create_destroy_exists() {
        let mut world = world();
        let a = world.create_entity::<Marker>().unwrap();
        let b = world.create_entity::<Spinner>().unwrap();

        assert!(world.exists(a));
        assert!(world.exists(b));
        assert_eq!(world.location(a), Some((0, 0)));
        assert_eq!(world.location(b), Some((1, 0)));
        assert_eq!(world.entity_count(), 2);

        assert!(world.destroy_entity(a));
        assert!(!world.exists(a));
        assert!(!world.destroy_entity(a));
        assert!(!world.destroy_entity(EntityHandle::NULL));
        assert!(world.exists(b));
        assert_eq!(world.entity_count(), 1);
        assert!(!world.buffer::<Marker>().unwrap().is_occupied(0));
    }

    #[test]
    fn test_reused_row_gets_new_generation() {
        let mut world = world();
        let first = world.create_entity::<Marker>().unwrap();
        world.destroy_entity(first);
        let second = world.create_entity::<Marker>().unwrap();

        assert_eq!(second.row(), first.row());
        assert_ne!(second.generation(), first.generation());
        assert!(world.exists(second));
        assert!(!world.exists(first));
    }

    #[test]
    fn test_component_access_by_handle() {
        let mut world = world();
        let spinner = world.create_entity::<Spinner>().unwrap();
        let marker = world.create_entity::<Marker>().unwrap();

        assert!(world.set(spinner, Spin(0.5)));
        assert!(world.set(spinner, Position { x: 1.0, y: 2.0 }));
        assert!(!world.set(marker, Spin(1.0)));

        assert_eq!(world.get::<Spin>(spinner), Some(&Spin(0.5)));
        world.get_mut::<Position>(spinner).unwrap().x = 9.0;
        assert_eq!(world.get::<Position>(spinner).unwrap().x, 9.0);

        world.destroy_entity(spinner);
        assert!(world.get::<Spin>(spinner).is_none());
    }

    #[test]
    fn test_filter_and_matching_buffers() {
        let world = world();
        let positions = world.filter::<Position>();
        let spins = world.filter::<Spin>();

        let ids: Vec<u8> = world.buffers_matching(positions).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1]);

        let names: Vec<&str> = world
            .buffers_matching(positions & spins)
            .map(|(_, buffer)| buffer.name())
            .collect();
        assert_eq!(names, vec![Spinner::name()]);
    }

    #[test]
    fn test_initial_rows_reserved() {
        let world = World::builder()
            .with_config(WorldConfig {
                initial_rows: 64,
                ..WorldConfig::default()
            })
            .with_archetype::<Marker>()
            .build()
            .unwrap();
        assert_eq!(world.buffer::<Marker>().unwrap().capacity(), 64);
    }

    #[test]
    fn test_failed_system_does_not_stop_others() {
        let log = Log::default();
        let mut world = World::builder()
            .with_archetype::<Marker>()
            .with_system(Recorder {
                label: "a",
                result: SystemResult::Failed,
                log: Rc::clone(&log),
            })
            .with_system(Recorder {
                label: "b",
                result: SystemResult::Success,
                log: Rc::clone(&log),
            })
            .build()
            .unwrap();

        assert_eq!(*log.borrow(), vec!["init", "init"]);
        log.borrow_mut().clear();

        let first = world.process(&TickState::new(0.016));
        let second = world.process(&TickState::new(0.016));

        assert_eq!(*log.borrow(), vec!["a", "b", "a", "b"]);
        assert_eq!(first.tick, 1);
        assert_eq!(second.tick, 2);
        assert_eq!(second.succeeded, 1);
        assert_eq!(second.failed, 1);
        assert!(!second.all_succeeded());
        assert_eq!(world.system_count(), 2);
    }

    #[test]
    fn test_add_system_initializes_and_reset_runs_in_order() {
        let log = Log::default();
        let mut world = world();
        world.add_system(Recorder {
            label: "late",
            result: SystemResult::Success,
            log: Rc::clone(&log),
        });
        world.reset();

        assert_eq!(*log.borrow(), vec!["init", "reset"]);
        assert!(world.process(&TickState::default()).all_succeeded());
    }

    /// Caches the spin filter; counts rows it would scan.
    #[derive(Default)]
    struct SpinScan {
        filter: ArchetypeFilter,
    }

    impl System for SpinScan {
        fn initialize(&mut self, world: &World) {
            self.filter = world.filter::<Spin>();
        }

        fn process(&mut self, world: &mut World, _state: &TickState) -> SystemResult {
            if self.filter.is_empty() {
                return SystemResult::Failed;
            }
            let rows: usize = world
                .buffers_matching(self.filter)
                .map(|(_, buffer)| buffer.len())
                .sum();
            if rows == world.entity_count() {
                SystemResult::Success
            } else {
                SystemResult::Failed
            }
        }
    }

    #[test]
    fn test_initialize_systems_recomputes_filters() {
        let mut world = world();
        world.add_system(SpinScan::default());
        world.create_entity::<Spinner>().unwrap();
        assert!(world.process(&TickState::default()).all_succeeded());

        // A system whose cached filter was cleared fails until re-initialized.
        let mut stale = World::builder()
            .with_archetype::<Spinner>()
            .with_system(SpinScan::default())
            .build()
            .unwrap();
        stale.systems[0] = Box::new(SpinScan::default());
        assert_eq!(stale.process(&TickState::default()).failed, 1);

        stale.initialize_systems();
        assert!(stale.process(&TickState::default()).all_succeeded());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut world = world();
        let handle = world.create_entity::<Marker>().unwrap();

        assert!(world.dispose());
        assert!(!world.exists(handle));
        assert!(!world.dispose());
        assert!(world.create_entity::<Marker>().unwrap().is_null());
        assert_eq!(world.entity_count(), 0);
    }
}
