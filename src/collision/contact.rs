use glam::Vec2;

use crate::{
    config::SimulationConfig,
    core::obstacle::{Obstacle, ObstacleId},
    utils::allocator::Arena,
};

/// Minimum center distance used to build a contact normal.
const MIN_CONTACT_DISTANCE: f32 = 1e-6;

/// Pair of obstacles whose bounding circles are within the contact band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleContact {
    pub a: ObstacleId,
    pub b: ObstacleId,
    /// Unit vector from `a` towards `b`.
    pub normal: Vec2,
    pub distance: f32,
    pub radius_sum: f32,
}

impl ObstacleContact {
    /// Positive when the bounding circles intersect.
    pub fn penetration(&self) -> f32 {
        self.radius_sum - self.distance
    }
}

/// Contact normal for two centers, falling back to +X for coincident ones.
fn contact_normal(from: Vec2, to: Vec2) -> (Vec2, f32) {
    let delta = to - from;
    let distance = delta.length();
    if distance > MIN_CONTACT_DISTANCE && distance.is_finite() {
        (delta / distance, distance)
    } else {
        (Vec2::X, 0.0)
    }
}

/// Collects every obstacle pair closer than `sum_of_radii + band`.
pub fn find_contacts(obstacles: &Arena<Obstacle>, band: f32) -> Vec<ObstacleContact> {
    let entries: Vec<(ObstacleId, Vec2, f32)> = obstacles
        .entries()
        .map(|(id, obstacle)| (id, obstacle.position, obstacle.size()))
        .collect();

    let mut contacts = Vec::new();
    for (i, &(id_a, pos_a, size_a)) in entries.iter().enumerate() {
        for &(id_b, pos_b, size_b) in &entries[i + 1..] {
            let radius_sum = size_a + size_b;
            let (normal, distance) = contact_normal(pos_a, pos_b);
            if distance < radius_sum + band {
                contacts.push(ObstacleContact {
                    a: id_a,
                    b: id_b,
                    normal,
                    distance,
                    radius_sum,
                });
            }
        }
    }
    contacts
}

/// Velocity-level spring-damper repulsion between touching obstacles.
///
/// Magnitude is `k * overlap - c * v_n` clamped to `[0, max_pair_force]`,
/// where overlap is measured against `sum_of_radii + band`.
pub fn apply_contact_forces(
    obstacles: &mut Arena<Obstacle>,
    contacts: &[ObstacleContact],
    config: &SimulationConfig,
) {
    for contact in contacts {
        let Some((a, b)) = obstacles.get2_mut(contact.a, contact.b) else {
            continue;
        };
        let overlap = (contact.radius_sum + config.obstacle_contact_band - contact.distance).max(0.0);
        let normal_velocity = (b.velocity - a.velocity).dot(contact.normal);
        let magnitude = (config.obstacle_contact_stiffness * overlap
            - config.obstacle_contact_damping * normal_velocity)
            .clamp(0.0, config.obstacle_max_pair_force);
        if !(magnitude > 0.0) {
            continue;
        }
        let force = contact.normal * magnitude;
        a.apply_force(-force);
        b.apply_force(force);
    }
}

/// Positional correction pushing overlapping obstacles apart along their
/// center line, split by inverse mass.
///
/// Each pass closes `correction_fraction` of the gap to
/// `sum_of_radii + separation_epsilon`. Returns the number of pairs moved.
pub fn resolve_overlaps(obstacles: &mut Arena<Obstacle>, config: &SimulationConfig) -> usize {
    let ids: Vec<ObstacleId> = obstacles.handles().collect();
    let target_gap = config.obstacle_separation_epsilon.max(0.0);
    let fraction = config.obstacle_correction_fraction.clamp(0.0, 1.0);
    let mut corrected = 0;

    for (i, &id_a) in ids.iter().enumerate() {
        for &id_b in &ids[i + 1..] {
            let Some((a, b)) = obstacles.get2_mut(id_a, id_b) else {
                continue;
            };
            let (normal, distance) = contact_normal(a.position, b.position);
            let target = a.size() + b.size() + target_gap;
            let error = target - distance;
            if error <= 0.0 {
                continue;
            }

            let inv_a = a.inverse_mass();
            let inv_b = b.inverse_mass();
            let inv_sum = inv_a + inv_b;
            if inv_sum <= f32::EPSILON {
                continue;
            }
            let correction = normal * (error * fraction / inv_sum);
            a.position -= correction * inv_a;
            b.position += correction * inv_b;
            corrected += 1;
        }
    }
    corrected
}
