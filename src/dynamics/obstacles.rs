use glam::Vec2;

use super::{friction::apply_obstacle_friction, integrator::integrate_state};
use crate::{
    collision::{
        contact::{apply_contact_forces, find_contacts, resolve_overlaps},
        sdf::SignedDistanceField,
    },
    config::SimulationConfig,
    core::{
        blob::Blob,
        obstacle::{Attachment, Obstacle},
    },
    utils::allocator::Arena,
};

/// Satellites never orbit wider than this fraction of the blob's inner radius.
const MAX_ORBIT_FRACTION: f32 = 0.8;

/// Counters from one obstacle dynamics pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ObstacleStepReport {
    pub contacts: usize,
    pub corrected_pairs: usize,
}

/// Point an attached obstacle is pulled towards.
pub fn orbit_target(blob: &Blob, attachment: &Attachment, config: &SimulationConfig) -> Vec2 {
    let orbit = &config.attach_orbit;
    let radius = (orbit.base_radius + orbit.spacing * attachment.slot as f32)
        .min(blob.inner_radius() * MAX_ORBIT_FRACTION)
        .max(0.0);
    blob.hub().position + Vec2::from_angle(attachment.phase) * radius
}

/// Damped spring from each attached obstacle towards its orbit target.
fn apply_attachment_forces(
    blobs: &Arena<Blob>,
    obstacles: &mut Arena<Obstacle>,
    config: &SimulationConfig,
) {
    let orbit = &config.attach_orbit;
    for obstacle in obstacles.iter_mut() {
        let Some(attachment) = obstacle.attachment else {
            continue;
        };
        let Some(blob) = blobs.get(attachment.blob) else {
            continue;
        };
        let target = orbit_target(blob, &attachment, config);
        let relative_velocity = obstacle.velocity - blob.hub().velocity;
        obstacle.acceleration +=
            (target - obstacle.position) * orbit.stiffness - relative_velocity * orbit.damping;
    }
}

/// Accumulates obstacle forces, integrates obstacles and separates overlaps.
///
/// Forces: rim friction reaction, pairwise spring-damper contact and the
/// attachment spring. The positional pass runs after integration.
pub fn step_obstacles(
    blobs: &Arena<Blob>,
    obstacles: &mut Arena<Obstacle>,
    field: &SignedDistanceField,
    config: &SimulationConfig,
    dt: f32,
) -> ObstacleStepReport {
    if obstacles.is_empty() {
        return ObstacleStepReport::default();
    }

    for obstacle in obstacles.iter_mut() {
        obstacle.acceleration = Vec2::ZERO;
        obstacle.recompute_mass(config);
        if !obstacle.velocity.is_finite() {
            obstacle.velocity = Vec2::ZERO;
        }
    }

    apply_obstacle_friction(blobs, obstacles, field, config);

    let contacts = find_contacts(obstacles, config.obstacle_contact_band);
    apply_contact_forces(obstacles, &contacts, config);

    apply_attachment_forces(blobs, obstacles, config);

    for obstacle in obstacles.iter_mut() {
        let acceleration = if obstacle.acceleration.is_finite() {
            obstacle.acceleration
        } else {
            Vec2::ZERO
        };
        integrate_state(
            &mut obstacle.position,
            &mut obstacle.velocity,
            acceleration,
            dt,
            config.max_obstacle_speed,
            config.obstacle_damping,
        );
    }

    let corrected_pairs = resolve_overlaps(obstacles, config);

    ObstacleStepReport {
        contacts: contacts.len(),
        corrected_pairs,
    }
}

/// Post-step bookkeeping: orbit phases, absorbed obstacle shrinking and trails.
pub fn update_obstacle_bookkeeping(obstacles: &mut Arena<Obstacle>, config: &SimulationConfig, dt: f32) {
    let orbit = &config.attach_orbit;
    for obstacle in obstacles.iter_mut() {
        if let Some(attachment) = obstacle.attachment.as_mut() {
            attachment.phase = (attachment.phase + orbit.speed * dt).rem_euclid(std::f32::consts::TAU);

            let target = obstacle.original_size * orbit.size_scale;
            let size = obstacle.size();
            let max_step = orbit.resize_rate.max(0.0) * dt;
            let next = size + (target - size).clamp(-max_step, max_step);
            obstacle.shape = obstacle.shape.with_size(next);
        }

        if config.obstacle_trail_enabled {
            obstacle.record_trail(config.trail_max_points, config.trail_min_distance);
        }
    }
}
