//! softblob – pressurised soft-body blobs in a 2D obstacle field.
//!
//! Each blob is a ring of inner/outer mass points around a hub, held together
//! by springs and an area constraint. Obstacles push blobs through a signed
//! distance field, drag them by friction, split them on entry and get
//! absorbed by the resulting child blobs. Rendering and input are left to the
//! host; the crate only advances state and hands back a [`WorldSnapshot`].

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use collision::{
    contact::ObstacleContact,
    sdf::{ObstacleProbe, SignedDistanceField},
};
pub use config::{AttachOrbitConfig, HubDragConfig, SimulationConfig, WorldBounds};
pub use crate::core::{
    blob::{Blob, BlobGeometry, BlobId},
    obstacle::{Attachment, Obstacle, ObstacleId, ObstacleShape, ShapeKind},
    point::Point,
    spring::Spring,
};
pub use dynamics::{
    drag::{DragNode, DragTarget, PointerState},
    forces::{BlobForce, ForceContext, ForceRegistry},
    integrator::Integrator,
};
pub use error::GeometryError;
pub use utils::allocator::{Arena, Handle};
pub use world::{
    snapshot::{BlobSnapshot, ObstacleSnapshot, WorldSnapshot},
    topology::{SplitEvent, TopologyReport},
    SoftBodyWorld,
};

/// High-level convenience wrapper that owns a [`SoftBodyWorld`], its
/// configuration and the pointer state.
pub struct BlobEngine {
    world: SoftBodyWorld,
    config: SimulationConfig,
    pointer: PointerState,
}

impl BlobEngine {
    /// Creates an empty engine ticking at the default 60 Hz.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            world: SoftBodyWorld::default(),
            config,
            pointer: PointerState::default(),
        }
    }

    pub fn world(&self) -> &SoftBodyWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SoftBodyWorld {
        &mut self.world
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replaces the tunables used from the next tick on.
    pub fn set_config(&mut self, config: SimulationConfig) {
        self.config = config;
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Spawns a blob at rest.
    pub fn spawn_blob(&mut self, center: Vec2, geometry: BlobGeometry) -> Result<BlobId, GeometryError> {
        self.world.spawn_blob(center, geometry, &self.config)
    }

    /// Adds an obstacle and returns its [`ObstacleId`].
    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> ObstacleId {
        self.world.add_obstacle(obstacle)
    }

    /// Presses the pointer, grabbing the nearest blob node (or its hub) if any
    /// is in reach.
    pub fn press(&mut self, position: Vec2, hub_drag: bool) -> Option<DragTarget> {
        let target = self.world.pick_drag_target(position, hub_drag);
        self.pointer = PointerState::pressed(position, target);
        target
    }

    pub fn move_pointer(&mut self, position: Vec2) {
        self.pointer = self.pointer.moved_to(position);
    }

    pub fn release(&mut self) {
        self.pointer = self.pointer.released();
    }

    /// Rebuilds every blob with a new vertex count.
    pub fn set_vertex_count(&mut self, vertex_count: usize) -> Result<(), GeometryError> {
        self.world.rebuild_vertex_count(vertex_count, &self.config)
    }

    /// Rebuilds every blob with a new rim thickness.
    pub fn set_thickness(&mut self, thickness: f32) -> Result<(), GeometryError> {
        self.world.rebuild_thickness(thickness, &self.config)
    }

    /// Advances the simulation by the provided delta time.
    pub fn step(&mut self, dt: f32) -> u32 {
        self.world.update(&self.config, &self.pointer, dt)
    }

    /// Enables or disables the parallel per-blob force pass.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.world.set_parallel_enabled(enabled);
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot()
    }
}

impl Default for BlobEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}
