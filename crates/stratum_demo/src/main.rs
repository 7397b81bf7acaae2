//! # STRATUM Demo
//!
//! Spins a handful of cubes through the core ECS:
//! 1. Build a world with the `Cube` archetype and `RotateTransform`
//! 2. Create cubes in a row along X
//! 3. Run a fixed number of ticks
//! 4. Recycle one cube to show handle generations, then dispose
//!
//! ```bash
//! cargo run -p stratum_demo -- crates/stratum_demo/demo.toml
//! NO_COLOR=1 RUST_LOG=stratum_core=trace cargo run -p stratum_demo
//! ```

mod config;
mod cube;

use std::mem;
use std::process::ExitCode;

use stratum_core::{EntityHandle, StorageResult, TickReport, TickState, World};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::DemoConfig;
use crate::cube::{Cube, RotateTransform, Transform};

/// Installs the fmt subscriber. `RUST_LOG` overrides the `debug` default;
/// `NO_COLOR` (see <https://no-color.org/>) turns off ANSI escapes.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::env::var_os("NO_COLOR").is_none())
        .with_target(false)
        .init();
}

fn load_config() -> StorageResult<DemoConfig> {
    match std::env::args_os().nth(1) {
        Some(path) => {
            info!(path = %path.to_string_lossy(), "loading config");
            DemoConfig::load(path)
        }
        None => Ok(DemoConfig::default()),
    }
}

fn run(config: &DemoConfig) -> StorageResult<()> {
    info!(
        size = mem::size_of::<EntityHandle>(),
        "size of EntityHandle"
    );

    let mut world = World::builder()
        .with_config(config.world.clone())
        .with_archetype::<Cube>()
        .with_system(RotateTransform::new(config.radians_per_second))
        .build()?;

    let mut cubes = Vec::with_capacity(usize::from(config.entities));
    for i in 0..config.entities {
        let cube = world.create_entity::<Cube>()?;
        if cube.is_null() {
            warn!(created = i, "world full, stopping early");
            break;
        }
        let placed = world.set(cube, Transform::from_translation(f32::from(i) * 2.0, 0.0, 0.0));
        debug_assert!(placed, "cube lacks a transform");
        cubes.push(cube);
    }
    info!(cubes = cubes.len(), "cubes created");

    let state = TickState::new(config.delta_time);
    let mut totals = TickReport::default();
    for _ in 0..config.ticks {
        let report = world.process(&state);
        totals.tick = report.tick;
        totals.succeeded += report.succeeded;
        totals.failed += report.failed;
    }
    info!(
        ticks = totals.tick,
        succeeded = totals.succeeded,
        failed = totals.failed,
        "simulation finished"
    );

    if let Some(&first) = cubes.first() {
        if let Some(transform) = world.get::<Transform>(first) {
            info!(
                entity = %first,
                translation = ?transform.translation(),
                rows = ?transform.rows,
                "first cube"
            );
        }

        let destroyed = world.destroy_entity(first);
        debug_assert!(destroyed, "first cube was already gone");
        let replacement = world.create_entity::<Cube>()?;
        info!(
            old = %first,
            new = %replacement,
            old_exists = world.exists(first),
            "row recycled"
        );
    }

    if world.dispose() {
        info!("world disposed");
    } else {
        warn!("world had nothing to dispose");
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    let result = load_config().and_then(|config| run(&config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}
