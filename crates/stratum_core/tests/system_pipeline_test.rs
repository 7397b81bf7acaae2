//! # System Pipeline Tests
//!
//! Systems run in registration order once per tick, see only the buffers
//! their filters select, and keep running after a sibling fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use stratum_core::{
    Archetype, ArchetypeDescriptor, ArchetypeFilter, Component, System, SystemResult, TickState,
    World, WorldConfig,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Angle(f32);
impl Component for Angle {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Speed(f32);
impl Component for Speed {}

struct Wheel;
impl Archetype for Wheel {
    fn descriptor() -> ArchetypeDescriptor {
        ArchetypeDescriptor::new().with::<Angle>().with::<Speed>()
    }
}

struct Dial;
impl Archetype for Dial {
    fn descriptor() -> ArchetypeDescriptor {
        ArchetypeDescriptor::new().with::<Angle>()
    }
}

/// Integrates `Angle += Speed * dt` on every buffer holding both.
#[derive(Default)]
struct Spin {
    filter: ArchetypeFilter,
}

impl System for Spin {
    fn initialize(&mut self, world: &World) {
        self.filter = world.filter::<Angle>() & world.filter::<Speed>();
    }

    fn process(&mut self, world: &mut World, state: &TickState) -> SystemResult {
        for id in self.filter.iter() {
            let Some(buffer) = world.buffer_by_id_mut(id) else {
                return SystemResult::Failed;
            };
            let Some(rows) = buffer.iter_mut_with::<Angle, Speed>() else {
                return SystemResult::Failed;
            };
            for (_, angle, speed) in rows {
                angle.0 += speed.0 * state.delta_time;
            }
        }
        SystemResult::Success
    }
}

struct Counter {
    result: SystemResult,
    runs: Arc<AtomicUsize>,
}

impl System for Counter {
    fn process(&mut self, _world: &mut World, _state: &TickState) -> SystemResult {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.result
    }
}

#[test]
fn verify_filtered_system_touches_only_matching_buffers() {
    let mut world = World::builder()
        .with_archetype::<Dial>()
        .with_archetype::<Wheel>()
        .with_system(Spin::default())
        .build()
        .unwrap();

    let dial = world.create_entity::<Dial>().unwrap();
    let wheel = world.create_entity::<Wheel>().unwrap();
    world.set(dial, Angle(1.0));
    world.set(wheel, Angle(1.0));
    world.set(wheel, Speed(2.0));

    for _ in 0..4 {
        assert!(world.process(&TickState::new(0.5)).all_succeeded());
    }

    assert_eq!(world.get::<Angle>(dial), Some(&Angle(1.0)));
    assert_eq!(world.get::<Angle>(wheel), Some(&Angle(5.0)));
    assert_eq!(world.tick(), 4);
}

#[test]
fn verify_failing_system_does_not_block_successor() {
    let failing = Arc::new(AtomicUsize::new(0));
    let passing = Arc::new(AtomicUsize::new(0));

    let mut world = World::builder()
        .with_config(WorldConfig {
            log_failed_systems: false,
            ..WorldConfig::default()
        })
        .with_archetype::<Dial>()
        .with_system(Counter {
            result: SystemResult::Failed,
            runs: Arc::clone(&failing),
        })
        .with_system(Counter {
            result: SystemResult::Success,
            runs: Arc::clone(&passing),
        })
        .build()
        .unwrap();

    let first = world.process(&TickState::default());
    let second = world.process(&TickState::default());

    assert_eq!(failing.load(Ordering::Relaxed), 2);
    assert_eq!(passing.load(Ordering::Relaxed), 2);
    assert_eq!((first.succeeded, first.failed), (1, 1));
    assert_eq!(second.tick, 2);
}

#[test]
fn verify_system_added_later_sees_existing_buffers() {
    let mut world = World::builder()
        .with_archetype::<Wheel>()
        .build()
        .unwrap();
    let wheel = world.create_entity::<Wheel>().unwrap();
    world.set(wheel, Speed(1.0));

    world.add_system(Spin::default());
    assert_eq!(world.system_count(), 1);

    world.process(&TickState::new(3.0));
    assert_eq!(world.get::<Angle>(wheel), Some(&Angle(3.0)));
}
