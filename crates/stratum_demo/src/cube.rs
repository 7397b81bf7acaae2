//! The `Cube` archetype and the system that spins it.

use bytemuck::{Pod, Zeroable};
use stratum_core::{
    Archetype, ArchetypeDescriptor, ArchetypeFilter, Component, System, SystemResult, TickState,
    World,
};

/// Row-major 4x4 transform matrix.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// `rows[r][c]`.
    pub rows: [[f32; 4]; 4],
}

impl Component for Transform {}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Identity rotation placed at `(x, y, z)`.
    #[must_use]
    pub const fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut transform = Self::IDENTITY;
        transform.rows[0][3] = x;
        transform.rows[1][3] = y;
        transform.rows[2][3] = z;
        transform
    }

    /// Rotation of `angle` radians about the Y axis.
    #[must_use]
    pub fn rotation_y(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            rows: [
                [cos, 0.0, sin, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [-sin, 0.0, cos, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// `self * rhs`.
    #[must_use]
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut rows = [[0.0f32; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[r][k] * rhs.rows[k][c]).sum();
            }
        }
        Self { rows }
    }

    /// Translation column.
    #[must_use]
    pub const fn translation(&self) -> [f32; 3] {
        [self.rows[0][3], self.rows[1][3], self.rows[2][3]]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A cube: nothing but a transform.
pub struct Cube;

impl Archetype for Cube {
    fn descriptor() -> ArchetypeDescriptor {
        ArchetypeDescriptor::new().with::<Transform>()
    }

    fn name() -> &'static str {
        "Cube"
    }
}

/// Rotates every [`Transform`] about its own Y axis.
pub struct RotateTransform {
    radians_per_second: f32,
    filter: ArchetypeFilter,
}

impl RotateTransform {
    /// Creates the system with the given angular speed.
    #[must_use]
    pub fn new(radians_per_second: f32) -> Self {
        Self {
            radians_per_second,
            filter: ArchetypeFilter::default(),
        }
    }
}

impl System for RotateTransform {
    fn name(&self) -> &str {
        "RotateTransform"
    }

    fn initialize(&mut self, world: &World) {
        self.filter = world.filter::<Transform>();
    }

    fn process(&mut self, world: &mut World, state: &TickState) -> SystemResult {
        if !state.delta_time.is_finite() {
            return SystemResult::Failed;
        }
        let rotation = Transform::rotation_y(self.radians_per_second * state.delta_time);

        for id in self.filter.iter() {
            let Some(buffer) = world.buffer_by_id_mut(id) else {
                return SystemResult::Failed;
            };
            let Some(transforms) = buffer.iter_mut::<Transform>() else {
                return SystemResult::Failed;
            };
            for (_, transform) in transforms {
                *transform = transform.mul(&rotation);
            }
        }
        SystemResult::Success
    }
}
