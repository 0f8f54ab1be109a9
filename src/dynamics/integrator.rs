use glam::Vec2;

use crate::{
    collision::sdf::SignedDistanceField,
    config::{SimulationConfig, DEFAULT_TIME_STEP},
    core::blob::Blob,
    utils::math::{centroid, clamp_force},
};

/// One semi-implicit Euler step: `v += a dt`, clamp `|v|`, exponential
/// damping, then `x += v dt`.
pub fn integrate_state(
    position: &mut Vec2,
    velocity: &mut Vec2,
    acceleration: Vec2,
    dt: f32,
    max_speed: f32,
    damping: f32,
) {
    *velocity += acceleration * dt;
    *velocity = velocity.clamp_length_max(max_speed.max(0.0));
    *velocity *= (-damping.max(0.0) * dt).exp();
    *position += *velocity * dt;
}

/// Fixed-step integrator for blob points, owning the post-rebuild freeze window.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub dt: f32,
    freeze_ticks: u32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

impl Integrator {
    pub fn new(dt: f32) -> Self {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            DEFAULT_TIME_STEP
        };
        Self { dt, freeze_ticks: 0 }
    }

    /// Suspends forces and integration for the next `ticks` ticks.
    pub fn freeze(&mut self, ticks: u32) {
        self.freeze_ticks = self.freeze_ticks.max(ticks);
    }

    pub fn frozen_ticks(&self) -> u32 {
        self.freeze_ticks
    }

    /// Consumes one frozen tick, returning whether the caller must skip this tick.
    pub fn consume_freeze(&mut self) -> bool {
        if self.freeze_ticks == 0 {
            return false;
        }
        self.freeze_ticks -= 1;
        true
    }

    /// Resets non-finite points to the hub at rest. Returns how many were recovered.
    pub fn sanitize(blob: &mut Blob) -> usize {
        let hub_index = blob.hub_index();
        let mut recovered = 0;

        if !blob.points[hub_index].is_finite() {
            let fallback = centroid(
                blob.points[..hub_index]
                    .iter()
                    .filter(|p| p.position.is_finite())
                    .map(|p| p.position),
            )
            .unwrap_or(Vec2::ZERO);
            blob.points[hub_index].reset_to(fallback);
            recovered += 1;
        }

        let hub = blob.points[hub_index].position;
        for point in &mut blob.points[..hub_index] {
            if !point.is_finite() {
                point.reset_to(hub);
                recovered += 1;
            }
        }

        if recovered > 0 {
            log::debug!("blob {:?}: reset {} non-finite points to hub", blob.id, recovered);
        }
        recovered
    }

    /// Puts outer rim nodes that ended inside a slow obstacle back on its
    /// surface and removes their velocity into it. Returns how many moved.
    pub fn project_rim(blob: &mut Blob, field: &SignedDistanceField, config: &SimulationConfig) -> usize {
        if field.is_empty() || config.rim_projection_speed <= 0.0 {
            return 0;
        }
        let mut projected = 0;
        for vertex in 0..blob.vertex_count() {
            let point = &mut blob.points[Blob::outer_index(vertex)];
            let Some(projection) = field.project_out(point.position, config.sdf_gradient_epsilon) else {
                continue;
            };
            if projection.obstacle_velocity.length() >= config.rim_projection_speed {
                continue;
            }
            point.position = projection.position;
            let into_surface = (point.velocity - projection.obstacle_velocity).dot(projection.normal);
            if into_surface < 0.0 {
                point.velocity -= projection.normal * into_surface;
            }
            projected += 1;
        }
        projected
    }

    /// Advances every point of `blob` by one step and clears its accumulators.
    pub fn integrate_blob(&self, blob: &mut Blob, config: &SimulationConfig) {
        for point in &mut blob.points {
            let acceleration = clamp_force(point.acceleration, config.max_point_acceleration);
            integrate_state(
                &mut point.position,
                &mut point.velocity,
                acceleration,
                self.dt,
                config.max_point_speed,
                config.point_damping,
            );
            point.acceleration = Vec2::ZERO;
        }
    }
}
