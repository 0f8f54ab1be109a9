pub mod snapshot;
pub mod topology;

use std::time::Instant;

use crate::{
    collision::sdf::SignedDistanceField,
    config::{SimulationConfig, DEFAULT_TIME_STEP, MIN_INNER_RADIUS},
    core::{
        blob::{Blob, BlobGeometry, BlobId},
        obstacle::{Obstacle, ObstacleId},
    },
    dynamics::{
        drag::{apply_drag, pick_drag_target, DragTarget, PointerState},
        forces::{ForceContext, ForceRegistry},
        integrator::Integrator,
        obstacles::{step_obstacles, update_obstacle_bookkeeping},
    },
    error::GeometryError,
    utils::{
        allocator::Arena,
        logging::{warn_if_tick_budget_exceeded, ScopedTimer as TraceTimer},
        profiling::{ScopedTimer, TickProfile},
    },
};
use glam::Vec2;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use self::{
    snapshot::{BlobSnapshot, ObstacleSnapshot, WorldSnapshot},
    topology::{detach_from, TopologyManager, TopologyReport},
};

/// Upper bound on fixed ticks run by one [`SoftBodyWorld::update`] call.
pub const MAX_TICKS_PER_UPDATE: u32 = 8;

/// Blobs, obstacles and the fixed-step pipeline that advances them.
pub struct SoftBodyWorld {
    pub blobs: Arena<Blob>,
    pub obstacles: Arena<Obstacle>,
    pub integrator: Integrator,
    pub force_registry: ForceRegistry,
    pub time_accumulated: f32,
    pub time_step: f32,
    topology: TopologyManager,
    tick_count: u64,
    parallel_enabled: bool,
    profile: TickProfile,
    last_topology: TopologyReport,
}

impl Default for SoftBodyWorld {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

impl SoftBodyWorld {
    pub fn new(time_step: f32) -> Self {
        let integrator = Integrator::new(time_step);
        Self {
            blobs: Arena::new(),
            obstacles: Arena::new(),
            time_step: integrator.dt,
            integrator,
            force_registry: ForceRegistry::standard(),
            time_accumulated: 0.0,
            topology: TopologyManager::new(),
            tick_count: 0,
            parallel_enabled: false,
            profile: TickProfile::default(),
            last_topology: TopologyReport::default(),
        }
    }

    /// Runs the per-blob force pass on the rayon pool. Ignored without the
    /// `parallel` feature.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled && cfg!(feature = "parallel");
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Stage timings of the most recent tick.
    pub fn profile(&self) -> &TickProfile {
        &self.profile
    }

    /// Split and attachment outcome of the most recent tick.
    pub fn last_topology(&self) -> TopologyReport {
        self.last_topology
    }

    pub fn topology(&self) -> &TopologyManager {
        &self.topology
    }

    pub fn blob(&self, id: BlobId) -> Option<&Blob> {
        self.blobs.get(id)
    }

    pub fn blob_mut(&mut self, id: BlobId) -> Option<&mut Blob> {
        self.blobs.get_mut(id)
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(id)
    }

    pub fn obstacle_mut(&mut self, id: ObstacleId) -> Option<&mut Obstacle> {
        self.obstacles.get_mut(id)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Builds a resting blob centred at `center`.
    pub fn spawn_blob(
        &mut self,
        center: Vec2,
        geometry: BlobGeometry,
        config: &SimulationConfig,
    ) -> Result<BlobId, GeometryError> {
        if !center.is_finite() {
            return Err(GeometryError::NonFiniteCenter);
        }
        let blob = Blob::new(center, geometry, config);
        Ok(self.insert_blob(blob))
    }

    /// Inserts a prebuilt blob, assigning its id.
    pub fn insert_blob(&mut self, blob: Blob) -> BlobId {
        self.blobs.insert_with(|id| {
            let mut blob = blob;
            blob.id = id;
            blob
        })
    }

    pub fn remove_blob(&mut self, id: BlobId) -> Option<Blob> {
        let removed = self.blobs.remove(id)?;
        detach_from(&mut self.obstacles, id);
        Some(removed)
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> ObstacleId {
        self.obstacles.insert_with(|id| Obstacle { id, ..obstacle })
    }

    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Option<Obstacle> {
        self.obstacles.remove(id)
    }

    /// Teleports an obstacle held by an external grab and stops it.
    pub fn move_obstacle(&mut self, id: ObstacleId, position: Vec2) -> bool {
        if !position.is_finite() {
            log::warn!("rejected non-finite position for obstacle {:?}", id);
            return false;
        }
        let Some(obstacle) = self.obstacles.get_mut(id) else {
            log::warn!("move of unknown obstacle {:?}", id);
            return false;
        };
        obstacle.position = position;
        obstacle.velocity = Vec2::ZERO;
        true
    }

    /// Rebuilds every blob with `vertex_count` vertices and arms the freeze window.
    pub fn rebuild_vertex_count(
        &mut self,
        vertex_count: usize,
        config: &SimulationConfig,
    ) -> Result<(), GeometryError> {
        let geometries = self
            .blobs
            .iter()
            .map(|blob| blob.geometry().with_vertex_count(vertex_count))
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_rebuild(geometries, config);
        Ok(())
    }

    /// Sets every blob's inner radius to `max(10, outer - thickness)` and arms
    /// the freeze window.
    pub fn rebuild_thickness(
        &mut self,
        thickness: f32,
        config: &SimulationConfig,
    ) -> Result<(), GeometryError> {
        let geometries = self
            .blobs
            .iter()
            .map(|blob| {
                let inner = (blob.outer_radius() - thickness).max(MIN_INNER_RADIUS);
                blob.geometry().with_inner_radius(inner)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_rebuild(geometries, config);
        Ok(())
    }

    fn apply_rebuild(&mut self, geometries: Vec<BlobGeometry>, config: &SimulationConfig) {
        for (blob, geometry) in self.blobs.iter_mut().zip(geometries) {
            blob.rebuild(geometry, config);
        }
        self.integrator.freeze(config.rebuild_freeze_ticks);
        log::debug!(
            "rebuilt {} blobs, freezing for {} ticks",
            self.blobs.len(),
            config.rebuild_freeze_ticks
        );
    }

    /// Removes obstacles that left `recycle_bounds` or went non-finite.
    pub fn recycle_obstacles(&mut self, config: &SimulationConfig) -> usize {
        let doomed: Vec<ObstacleId> = self
            .obstacles
            .entries()
            .filter(|(_, o)| {
                !o.position.is_finite()
                    || !o.velocity.is_finite()
                    || config
                        .recycle_bounds
                        .map_or(false, |bounds| bounds.excludes_circle(o.position, o.size()))
            })
            .map(|(id, _)| id)
            .collect();

        for id in &doomed {
            self.obstacles.remove(*id);
        }
        if !doomed.is_empty() {
            log::debug!("recycled {} obstacles", doomed.len());
        }
        doomed.len()
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    pub fn clear_attachments(&mut self) {
        for obstacle in self.obstacles.iter_mut() {
            obstacle.attachment = None;
        }
    }

    /// Blob or hub under `position`, for starting a drag.
    pub fn pick_drag_target(&self, position: Vec2, hub_drag: bool) -> Option<DragTarget> {
        pick_drag_target(&self.blobs, position, hub_drag)
    }

    /// Signed distance from `point` to the obstacle field.
    pub fn sdf(&self, point: Vec2) -> f32 {
        SignedDistanceField::from_obstacles(&self.obstacles).distance(point)
    }

    /// Advances the simulation using a fixed timestep accumulator. Returns the
    /// number of ticks run.
    pub fn update(&mut self, config: &SimulationConfig, pointer: &PointerState, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.time_accumulated += dt;

        let mut ticks = 0;
        while self.time_accumulated >= self.time_step {
            if ticks == MAX_TICKS_PER_UPDATE {
                log::debug!("dropping {:.4}s of backlog", self.time_accumulated);
                self.time_accumulated = 0.0;
                break;
            }
            self.time_accumulated -= self.time_step;
            self.tick(config, pointer);
            ticks += 1;
        }
        ticks
    }

    /// Runs exactly one fixed tick.
    pub fn tick(&mut self, config: &SimulationConfig, pointer: &PointerState) {
        let _trace = TraceTimer::new("tick");
        let started = Instant::now();
        let mut profile = TickProfile::default();
        self.tick_count += 1;
        self.last_topology = TopologyReport::default();

        if self.integrator.consume_freeze() {
            log::debug!(
                "tick {}: frozen after rebuild ({} left)",
                self.tick_count,
                self.integrator.frozen_ticks()
            );
            self.topology.tick_cooldown(self.time_step);
            profile.frozen = true;
        } else {
            self.run_stages(config, pointer, &mut profile);
        }

        profile.blob_count = self.blobs.len();
        profile.point_count = self.blobs.iter().map(|b| b.points.len()).sum();
        profile.obstacle_count = self.obstacles.len();
        profile.total_tick_time = started.elapsed();
        profile.report();
        warn_if_tick_budget_exceeded(profile.total_tick_time, config.tick_budget_ms);
        self.profile = profile;
    }

    fn run_stages(&mut self, config: &SimulationConfig, pointer: &PointerState, profile: &mut TickProfile) {
        let dt = self.time_step;
        let field = SignedDistanceField::from_obstacles(&self.obstacles);

        {
            let _trace = TraceTimer::new("forces");
            let _timer = ScopedTimer::new(&mut profile.force_time);
            for blob in self.blobs.iter_mut() {
                blob.clear_accelerations();
                Integrator::sanitize(blob);
            }
            let ctx = ForceContext {
                config,
                field: &field,
                dt,
            };
            self.apply_blob_forces(&ctx);
        }

        {
            let _trace = TraceTimer::new("obstacles");
            let _timer = ScopedTimer::new(&mut profile.obstacle_time);
            step_obstacles(&self.blobs, &mut self.obstacles, &field, config, dt);
        }

        {
            let _timer = ScopedTimer::new(&mut profile.drag_time);
            self.apply_pointer(config, pointer, dt);
        }

        {
            let _trace = TraceTimer::new("integrator");
            let _timer = ScopedTimer::new(&mut profile.integrator_time);
            for blob in self.blobs.iter_mut() {
                self.integrator.integrate_blob(blob, config);
            }
            if !self.obstacles.is_empty() {
                let settled = SignedDistanceField::from_obstacles(&self.obstacles);
                for blob in self.blobs.iter_mut() {
                    Integrator::project_rim(blob, &settled, config);
                }
            }
        }

        {
            let _trace = TraceTimer::new("topology");
            let _timer = ScopedTimer::new(&mut profile.topology_time);
            self.last_topology = self
                .topology
                .update(&mut self.blobs, &mut self.obstacles, config, dt);
            update_obstacle_bookkeeping(&mut self.obstacles, config, dt);
            self.recycle_obstacles(config);
        }
    }

    fn apply_blob_forces(&mut self, ctx: &ForceContext<'_>) {
        #[cfg(feature = "parallel")]
        {
            if self.parallel_enabled {
                let registry = &self.force_registry;
                let mut jobs: Vec<&mut Blob> = self.blobs.iter_mut().collect();
                jobs.par_iter_mut()
                    .for_each(|blob| registry.apply_all(blob, ctx));
                return;
            }
        }

        for blob in self.blobs.iter_mut() {
            self.force_registry.apply_all(blob, ctx);
        }
    }

    fn apply_pointer(&mut self, config: &SimulationConfig, pointer: &PointerState, dt: f32) {
        let Some(target) = pointer.active_target() else {
            return;
        };
        if !pointer.position.is_finite() {
            log::warn!("ignoring non-finite pointer position");
            return;
        }
        match self.blobs.get_mut(target.blob) {
            Some(blob) => {
                apply_drag(blob, target.node, pointer.position, config, dt);
            }
            None => log::warn!("drag target {:?} no longer exists", target.blob),
        }
    }

    /// Copies what a renderer needs out of the world.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick_count,
            blobs: self.blobs.iter().map(BlobSnapshot::from).collect(),
            obstacles: self.obstacles.iter().map(ObstacleSnapshot::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldBounds;

    fn geometry() -> BlobGeometry {
        BlobGeometry::new(60.0, 80.0, 24).expect("valid geometry")
    }

    #[test]
    fn update_runs_fixed_ticks() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::new(0.01);
        world.spawn_blob(Vec2::new(100.0, 100.0), geometry(), &config).expect("spawn");

        assert_eq!(world.update(&config, &PointerState::default(), 0.035), 3);
        assert_eq!(world.tick_count(), 3);
        assert!((world.time_accumulated - 0.005).abs() < 1e-5);
    }

    #[test]
    fn update_drops_backlog() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::new(0.01);
        assert_eq!(world.update(&config, &PointerState::default(), 10.0), MAX_TICKS_PER_UPDATE);
        assert_eq!(world.time_accumulated, 0.0);
    }

    #[test]
    fn spawn_rejects_non_finite_center() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::default();
        assert_eq!(
            world.spawn_blob(Vec2::new(f32::NAN, 0.0), geometry(), &config),
            Err(GeometryError::NonFiniteCenter)
        );
        assert_eq!(world.blob_count(), 0);
    }

    #[test]
    fn rebuild_freezes_the_next_tick() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::default();
        let id = world.spawn_blob(Vec2::new(100.0, 100.0), geometry(), &config).expect("spawn");

        world.rebuild_vertex_count(12, &config).expect("rebuild");
        let before = world.blob(id).expect("blob").points.clone();
        world.tick(&config, &PointerState::default());

        assert!(world.profile().frozen);
        assert_eq!(world.blob(id).expect("blob").points, before);
        assert_eq!(before.len(), 2 * 12 + 1);

        world.tick(&config, &PointerState::default());
        assert!(!world.profile().frozen);
    }

    #[test]
    fn split_cooldown_runs_down_while_frozen() {
        let config = SimulationConfig::new().with_gravity_scale(0.0).with_rebuild_freeze_ticks(10);
        let mut world = SoftBodyWorld::default();
        world
            .spawn_blob(Vec2::new(300.0, 300.0), BlobGeometry::new(90.0, 114.0, 40).expect("valid"), &config)
            .expect("spawn");
        world.add_obstacle(Obstacle::circle(Vec2::new(300.0, 300.0), 15.0, &config));

        world.tick(&config, &PointerState::default());
        assert!(world.last_topology().split.is_some());
        let armed = world.topology().cooldown_remaining();

        world.rebuild_vertex_count(16, &config).expect("rebuild");
        for _ in 0..10 {
            world.tick(&config, &PointerState::default());
            assert!(world.profile().frozen);
        }
        let expected = armed - 10.0 * world.time_step;
        assert!((world.topology().cooldown_remaining() - expected).abs() < 1e-4);
    }

    #[test]
    fn rebuild_thickness_floors_inner_radius() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::default();
        let id = world.spawn_blob(Vec2::ZERO, geometry(), &config).expect("spawn");

        world.rebuild_thickness(500.0, &config).expect("rebuild");
        assert_eq!(world.blob(id).expect("blob").inner_radius(), MIN_INNER_RADIUS);
        assert!(world.rebuild_vertex_count(2, &config).is_err());
        assert_eq!(world.blob(id).expect("blob").vertex_count(), 24);
    }

    #[test]
    fn recycling_removes_escaped_obstacles() {
        let config = SimulationConfig::new()
            .with_recycle_bounds(Some(WorldBounds::new(Vec2::ZERO, Vec2::new(800.0, 600.0))));
        let mut world = SoftBodyWorld::default();
        let inside = world.add_obstacle(Obstacle::circle(Vec2::new(400.0, 300.0), 20.0, &config));
        let outside = world.add_obstacle(Obstacle::circle(Vec2::new(400.0, 700.0), 20.0, &config));

        assert_eq!(world.recycle_obstacles(&config), 1);
        assert!(world.obstacle(inside).is_some());
        assert!(world.obstacle(outside).is_none());
    }

    #[test]
    fn stale_drag_target_is_ignored() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::default();
        let id = world.spawn_blob(Vec2::new(100.0, 100.0), geometry(), &config).expect("spawn");
        let target = world.pick_drag_target(Vec2::new(180.0, 100.0), false).expect("target");
        world.remove_blob(id);

        let pointer = PointerState::pressed(Vec2::new(300.0, 100.0), Some(target));
        world.tick(&config, &pointer);
        assert_eq!(world.blob_count(), 0);
    }

    #[test]
    fn move_obstacle_stops_it() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::default();
        let id = world.add_obstacle(
            Obstacle::circle(Vec2::ZERO, 10.0, &config).with_velocity(Vec2::new(30.0, 0.0)),
        );
        assert!(world.move_obstacle(id, Vec2::new(50.0, 60.0)));
        let obstacle = world.obstacle(id).expect("obstacle");
        assert_eq!(obstacle.position, Vec2::new(50.0, 60.0));
        assert_eq!(obstacle.velocity, Vec2::ZERO);
        assert!(!world.move_obstacle(id, Vec2::splat(f32::INFINITY)));
    }

    #[test]
    fn snapshot_reports_outline_and_obstacles() {
        let config = SimulationConfig::new();
        let mut world = SoftBodyWorld::default();
        let blob = world.spawn_blob(Vec2::new(100.0, 100.0), geometry(), &config).expect("spawn");
        let obstacle = world.add_obstacle(Obstacle::triangle(Vec2::new(400.0, 100.0), 15.0, &config));

        let snapshot = world.snapshot();
        assert_eq!(snapshot.blob(blob).expect("blob").outline.len(), 24);
        assert_eq!(snapshot.obstacle(obstacle).expect("obstacle").size, 15.0);
        assert_eq!(snapshot.obstacle(obstacle).expect("obstacle").attached_to, None);
    }
}
