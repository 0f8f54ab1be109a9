//! Default tunables and the immutable per-tick [`SimulationConfig`].
//!
//! Lengths are pixels, time is seconds, and the y axis points down the screen.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Fixed integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Downward gravity before `gravity_scale` and `density_scale` are applied.
pub const DEFAULT_BASE_GRAVITY: [f32; 2] = [0.0, 50.0];

/// Stiffness of rim, cross and radial springs.
pub const DEFAULT_RIM_STIFFNESS: f32 = 20_000.0;
/// Stiffness of the outer next-adjacent bend springs.
pub const DEFAULT_BEND_SPRING_STIFFNESS: f32 = 800.0;
/// Stiffness of the hub spokes.
pub const DEFAULT_SPOKE_STIFFNESS: f32 = 400.0;

/// Smallest ring a blob may be built with.
pub const MIN_VERTEX_COUNT: usize = 4;
/// Inner radius floor used by thickness rebuilds.
pub const MIN_INNER_RADIUS: f32 = 10.0;
/// Self-repulsion radius as a multiple of rim thickness when not overridden.
pub const SELF_REPEL_THICKNESS_FACTOR: f32 = 1.6;

/// Returned by the signed distance field when there is nothing to collide with.
pub const SDF_EMPTY_SENTINEL: f32 = 1e9;

/// Density multiplied into every obstacle's area before the config multiplier.
pub const OBSTACLE_BASE_DENSITY: f32 = 0.005;
/// Lightest mass an obstacle can have.
pub const MIN_OBSTACLE_MASS: f32 = 1.0;
/// Lightest mass a blob can report.
pub const MIN_BLOB_MASS: f32 = 1.0;

/// Rim friction on points is capped at this fraction of `max_extra_force`.
pub const POINT_FRICTION_CAP_FRACTION: f32 = 0.4;
/// Drag picking accepts nodes within this multiple of the blob's outer radius.
pub const DRAG_PICK_RADIUS_SCALE: f32 = 1.5;

/// Tuning for the hub (center) tug.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubDragConfig {
    /// Fraction of the pointer force kept at the hub; the rest is spread over the rim.
    pub center_share: f32,
    /// Hub may stray this fraction of the inner radius from the rim centroid.
    pub max_offset_scale: f32,
    pub restore_stiffness: f32,
    pub restore_damping: f32,
    pub boundary_stiffness: f32,
    pub boundary_damping: f32,
    pub force_cap: f32,
    /// Translate the whole mesh instead of pulling it elastically.
    pub rigid: bool,
    pub rigid_follow_gain: f32,
    pub rigid_damping: f32,
}

impl Default for HubDragConfig {
    fn default() -> Self {
        Self {
            center_share: 0.55,
            max_offset_scale: 0.1,
            restore_stiffness: 20_000.0,
            restore_damping: 900.0,
            boundary_stiffness: 28_000.0,
            boundary_damping: 1_200.0,
            force_cap: 14_000.0,
            rigid: false,
            rigid_follow_gain: 0.1,
            rigid_damping: 2.0,
        }
    }
}

/// How attached obstacles circle and shrink inside their blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachOrbitConfig {
    pub stiffness: f32,
    pub damping: f32,
    /// Radians per second.
    pub speed: f32,
    pub base_radius: f32,
    /// Extra orbit radius per earlier satellite of the same blob.
    pub spacing: f32,
    /// Attached obstacles shrink towards this fraction of their original size.
    pub size_scale: f32,
    /// Size change per second while shrinking.
    pub resize_rate: f32,
}

impl Default for AttachOrbitConfig {
    fn default() -> Self {
        Self {
            stiffness: 40.0,
            damping: 6.0,
            speed: 2.6,
            base_radius: 50.0,
            spacing: 22.0,
            size_scale: 0.37,
            resize_rate: 20.0,
        }
    }
}

/// Axis-aligned rectangle obstacles are recycled outside of.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// True when a circle of `radius` around `center` lies fully outside.
    pub fn excludes_circle(&self, center: Vec2, radius: f32) -> bool {
        center.x + radius < self.min.x
            || center.x - radius > self.max.x
            || center.y + radius < self.min.y
            || center.y - radius > self.max.y
    }
}

/// Immutable tunables snapshot passed into every tick.
///
/// UI changes produce a new value (usually through the `with_*` builders)
/// rather than mutating shared state.
///
/// ```
/// use softblob::config::SimulationConfig;
///
/// let config = SimulationConfig::new()
///     .with_gravity_scale(0.0)
///     .with_split_enabled(false)
///     .with_friction(2.5);
/// assert_eq!(config.gravity_scale, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub base_gravity: Vec2,
    pub gravity_scale: f32,
    /// Divides gravity and multiplies pressure and blob mass.
    pub density_scale: f32,
    pub friction_coefficient: f32,

    pub rim_stiffness: f32,
    pub bend_spring_stiffness: f32,
    pub spoke_stiffness: f32,

    pub pressure_gain: f32,
    pub pressure_compress_factor: f32,
    pub pressure_expand_factor: f32,
    pub max_pressure_force: f32,

    pub self_repel_strength: f32,
    /// `None` derives the radius from each blob's rim thickness.
    pub self_repel_radius: Option<f32>,
    pub bending_stiffness: f32,
    pub viscosity_coefficient: f32,

    pub mouse_spring_stiffness: f32,
    pub mouse_spring_damping: f32,
    pub mouse_max_force: f32,
    pub drag_neighbor_range: usize,
    pub drag_neighbor_decay: f32,
    pub drag_pair_weight: f32,
    pub drag_damping_multiplier: f32,
    pub hub_drag: HubDragConfig,

    /// Multiplier on [`OBSTACLE_BASE_DENSITY`].
    pub obstacle_density: f32,
    pub obstacle_density_size_ref: f32,
    pub obstacle_density_size_exp: f32,
    pub obstacle_density_scale_min: f32,
    pub obstacle_density_scale_max: f32,
    pub obstacle_damping: f32,
    pub obstacle_contact_stiffness: f32,
    pub obstacle_contact_damping: f32,
    pub obstacle_contact_band: f32,
    pub obstacle_max_pair_force: f32,
    pub obstacle_separation_epsilon: f32,
    pub obstacle_correction_fraction: f32,
    pub max_obstacle_speed: f32,

    pub contact_band: f32,
    pub contact_force_factor: f32,
    pub blob_mass_per_area: f32,

    pub sdf_stiffness: f32,
    pub sdf_force_cap: f32,
    pub sdf_gradient_epsilon: f32,
    /// Outer rim nodes left inside an obstacle slower than this are moved
    /// back onto its surface after integration. Faster obstacles can still
    /// punch into a blob. Zero disables the projection.
    pub rim_projection_speed: f32,

    pub max_extra_force: f32,
    pub max_point_speed: f32,
    pub max_point_acceleration: f32,
    pub point_damping: f32,

    pub split_enabled: bool,
    pub split_cooldown_seconds: f32,
    pub split_scale_factor: f32,
    pub rebuild_freeze_ticks: u32,
    pub attach_orbit: AttachOrbitConfig,

    pub obstacle_trail_enabled: bool,
    pub trail_max_points: usize,
    pub trail_min_distance: f32,
    pub recycle_bounds: Option<WorldBounds>,

    /// Wall-clock budget per tick before a warning is logged; zero disables.
    pub tick_budget_ms: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_gravity: Vec2::from_array(DEFAULT_BASE_GRAVITY),
            gravity_scale: 1.25,
            density_scale: 1.0,
            friction_coefficient: 6.0,

            rim_stiffness: DEFAULT_RIM_STIFFNESS,
            bend_spring_stiffness: DEFAULT_BEND_SPRING_STIFFNESS,
            spoke_stiffness: DEFAULT_SPOKE_STIFFNESS,

            pressure_gain: 0.005,
            pressure_compress_factor: 1.25,
            pressure_expand_factor: 0.6,
            max_pressure_force: 2_500.0,

            self_repel_strength: 15_000.0,
            self_repel_radius: None,
            bending_stiffness: 150.0,
            viscosity_coefficient: 0.35,

            mouse_spring_stiffness: 14_000.0,
            mouse_spring_damping: 140.0,
            mouse_max_force: 40_000.0,
            drag_neighbor_range: 2,
            drag_neighbor_decay: 0.6,
            drag_pair_weight: 0.5,
            drag_damping_multiplier: 2.0,
            hub_drag: HubDragConfig::default(),

            obstacle_density: 0.75,
            obstacle_density_size_ref: 80.0,
            obstacle_density_size_exp: 1.5,
            obstacle_density_scale_min: 0.3,
            obstacle_density_scale_max: 2.5,
            obstacle_damping: 3.5,
            obstacle_contact_stiffness: 800.0,
            obstacle_contact_damping: 25.0,
            obstacle_contact_band: 12.0,
            obstacle_max_pair_force: 4_000.0,
            obstacle_separation_epsilon: 0.5,
            obstacle_correction_fraction: 0.8,
            max_obstacle_speed: 1_200.0,

            contact_band: 8.0,
            contact_force_factor: 0.25,
            blob_mass_per_area: 0.002,

            sdf_stiffness: 30.0,
            sdf_force_cap: 1_000.0,
            sdf_gradient_epsilon: 0.01,
            rim_projection_speed: 150.0,

            max_extra_force: 6_000.0,
            max_point_speed: 800.0,
            max_point_acceleration: 100_000.0,
            point_damping: 1.0,

            split_enabled: true,
            split_cooldown_seconds: 0.8,
            split_scale_factor: 0.5,
            rebuild_freeze_ticks: 1,
            attach_orbit: AttachOrbitConfig::default(),

            obstacle_trail_enabled: true,
            trail_max_points: 300,
            trail_min_distance: 3.0,
            recycle_bounds: None,

            tick_budget_ms: 4.0,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gravity acceleration applied to every blob point.
    pub fn gravity(&self) -> Vec2 {
        self.base_gravity * self.gravity_scale / self.density_scale.max(f32::EPSILON)
    }

    /// Radius inside which two outer rim nodes repel each other.
    pub fn self_repel_radius_for(&self, rim_thickness: f32) -> f32 {
        self.self_repel_radius
            .unwrap_or(rim_thickness * SELF_REPEL_THICKNESS_FACTOR)
            .max(0.0)
    }

    /// Density multiplier for an obstacle of the given size.
    ///
    /// Small obstacles are denser than large ones, within the configured range.
    pub fn obstacle_size_density_scale(&self, size: f32) -> f32 {
        if !(size > 1e-6) {
            return 1.0;
        }
        let lo = self.obstacle_density_scale_min.min(self.obstacle_density_scale_max);
        let hi = self.obstacle_density_scale_max.max(self.obstacle_density_scale_min);
        (self.obstacle_density_size_ref / size)
            .powf(self.obstacle_density_size_exp)
            .clamp(lo, hi)
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale.max(0.0);
        self
    }

    pub fn with_base_gravity(mut self, gravity: Vec2) -> Self {
        self.base_gravity = gravity;
        self
    }

    pub fn with_density_scale(mut self, scale: f32) -> Self {
        self.density_scale = scale.max(1e-3);
        self
    }

    pub fn with_friction(mut self, coefficient: f32) -> Self {
        self.friction_coefficient = coefficient.max(0.0);
        self
    }

    pub fn with_spring_stiffness(mut self, rim: f32, bend: f32, spoke: f32) -> Self {
        self.rim_stiffness = rim.max(0.0);
        self.bend_spring_stiffness = bend.max(0.0);
        self.spoke_stiffness = spoke.max(0.0);
        self
    }

    pub fn with_pressure_gain(mut self, gain: f32) -> Self {
        self.pressure_gain = gain.max(0.0);
        self
    }

    pub fn with_self_repulsion(mut self, strength: f32, radius: Option<f32>) -> Self {
        self.self_repel_strength = strength.max(0.0);
        self.self_repel_radius = radius.map(|r| r.max(0.0));
        self
    }

    pub fn with_bending_stiffness(mut self, stiffness: f32) -> Self {
        self.bending_stiffness = stiffness.max(0.0);
        self
    }

    pub fn with_viscosity(mut self, coefficient: f32) -> Self {
        self.viscosity_coefficient = coefficient.max(0.0);
        self
    }

    pub fn with_mouse_spring(mut self, stiffness: f32, damping: f32, max_force: f32) -> Self {
        self.mouse_spring_stiffness = stiffness.max(0.0);
        self.mouse_spring_damping = damping.max(0.0);
        self.mouse_max_force = max_force.max(0.0);
        self
    }

    pub fn with_hub_drag(mut self, hub_drag: HubDragConfig) -> Self {
        self.hub_drag = hub_drag;
        self
    }

    pub fn with_obstacle_density(mut self, multiplier: f32) -> Self {
        self.obstacle_density = multiplier.max(0.0);
        self
    }

    pub fn with_obstacle_contact(mut self, stiffness: f32, damping: f32) -> Self {
        self.obstacle_contact_stiffness = stiffness.max(0.0);
        self.obstacle_contact_damping = damping.max(0.0);
        self
    }

    /// Scales obstacle repulsion as a single "repel" control: stiffness
    /// linearly, the pair force cap with a floor of 0.2×.
    pub fn with_obstacle_repel_scale(mut self, scale: f32) -> Self {
        let defaults = Self::default();
        let scale = scale.max(0.0);
        self.obstacle_contact_stiffness = defaults.obstacle_contact_stiffness * scale;
        self.obstacle_max_pair_force = defaults.obstacle_max_pair_force * scale.max(0.2);
        self
    }

    pub fn with_max_extra_force(mut self, cap: f32) -> Self {
        self.max_extra_force = cap.max(0.0);
        self
    }

    pub fn with_max_point_speed(mut self, speed: f32) -> Self {
        self.max_point_speed = speed.max(0.0);
        self
    }

    pub fn with_max_obstacle_speed(mut self, speed: f32) -> Self {
        self.max_obstacle_speed = speed.max(0.0);
        self
    }

    pub fn with_rim_projection_speed(mut self, speed: f32) -> Self {
        self.rim_projection_speed = speed.max(0.0);
        self
    }

    pub fn with_split_enabled(mut self, enabled: bool) -> Self {
        self.split_enabled = enabled;
        self
    }

    pub fn with_split_cooldown(mut self, seconds: f32) -> Self {
        self.split_cooldown_seconds = seconds.max(0.0);
        self
    }

    pub fn with_split_scale(mut self, factor: f32) -> Self {
        self.split_scale_factor = factor.clamp(0.05, 1.0);
        self
    }

    pub fn with_rebuild_freeze_ticks(mut self, ticks: u32) -> Self {
        self.rebuild_freeze_ticks = ticks;
        self
    }

    pub fn with_attach_orbit(mut self, orbit: AttachOrbitConfig) -> Self {
        self.attach_orbit = orbit;
        self
    }

    pub fn with_trails(mut self, enabled: bool) -> Self {
        self.obstacle_trail_enabled = enabled;
        self
    }

    pub fn with_recycle_bounds(mut self, bounds: Option<WorldBounds>) -> Self {
        self.recycle_bounds = bounds;
        self
    }

    pub fn with_tick_budget_ms(mut self, budget_ms: f32) -> Self {
        self.tick_budget_ms = budget_ms.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gravity_divides_by_density() {
        let config = SimulationConfig::new()
            .with_gravity_scale(2.0)
            .with_density_scale(0.5);
        assert_relative_eq!(config.gravity().y, 50.0 * 2.0 / 0.5);
        assert_relative_eq!(config.gravity().x, 0.0);
    }

    #[test]
    fn builders_sanitise_negative_inputs() {
        let config = SimulationConfig::new()
            .with_friction(-3.0)
            .with_density_scale(-1.0)
            .with_split_scale(7.0);
        assert_eq!(config.friction_coefficient, 0.0);
        assert!(config.density_scale > 0.0);
        assert_eq!(config.split_scale_factor, 1.0);
    }

    #[test]
    fn self_repel_radius_defaults_to_thickness_multiple() {
        let config = SimulationConfig::new();
        assert_relative_eq!(config.self_repel_radius_for(24.0), 24.0 * 1.6);
        let fixed = config.with_self_repulsion(1.0, Some(10.0));
        assert_relative_eq!(fixed.self_repel_radius_for(24.0), 10.0);
    }

    #[test]
    fn size_density_scale_is_clamped() {
        let config = SimulationConfig::new();
        assert_relative_eq!(config.obstacle_size_density_scale(80.0), 1.0);
        assert_relative_eq!(config.obstacle_size_density_scale(1.0), 2.5);
        assert_relative_eq!(config.obstacle_size_density_scale(10_000.0), 0.3);
        assert_relative_eq!(config.obstacle_size_density_scale(0.0), 1.0);
    }

    #[test]
    fn recycle_bounds_exclude_only_fully_outside_circles() {
        let bounds = WorldBounds::new(Vec2::ZERO, Vec2::splat(100.0));
        assert!(!bounds.excludes_circle(Vec2::new(-5.0, 50.0), 10.0));
        assert!(bounds.excludes_circle(Vec2::new(50.0, -11.0), 10.0));
    }
}
