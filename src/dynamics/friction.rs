use glam::Vec2;

use super::forces::{BlobForce, ForceContext};
use crate::{
    collision::sdf::{ObstacleProbe, SignedDistanceField},
    config::{SimulationConfig, POINT_FRICTION_CAP_FRACTION},
    core::{
        blob::Blob,
        obstacle::Obstacle,
        point::Point,
    },
    utils::allocator::Arena,
};

/// Rim node close enough to an obstacle to rub against it.
#[derive(Debug, Clone, Copy)]
pub struct RimContact<'a> {
    pub probe: &'a ObstacleProbe,
    pub tangent: Vec2,
    /// Tangential velocity of the node relative to the obstacle.
    pub tangential_speed: f32,
    /// 1 when touching or inside, falling to 0 at the edge of the band.
    pub proximity: f32,
}

/// Finds the nearest obstacle to `point` and, if it lies within `band`,
/// the sliding frame between them.
pub fn rim_contact<'a>(
    point: &Point,
    field: &'a SignedDistanceField,
    band: f32,
) -> Option<RimContact<'a>> {
    if band <= 0.0 {
        return None;
    }
    let (probe, distance) = field.nearest(point.position)?;
    if !(distance < band) {
        return None;
    }
    let normal = (point.position - probe.position).normalize_or_zero();
    let tangent = normal.perp();
    let tangential_speed = (point.velocity - probe.velocity).dot(tangent);
    let proximity = 1.0 - distance.max(0.0) / band;
    Some(RimContact {
        probe,
        tangent,
        tangential_speed,
        proximity,
    })
}

/// Tangential drag slowing outer rim nodes that slide along an obstacle.
pub struct RimFrictionForce;

impl BlobForce for RimFrictionForce {
    fn name(&self) -> &'static str {
        "rim_friction"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        let mu = ctx.config.friction_coefficient;
        if mu <= 0.0 || ctx.field.is_empty() {
            return;
        }
        let cap = ctx.config.max_extra_force * POINT_FRICTION_CAP_FRACTION;
        for i in 0..blob.vertex_count() {
            let point = &mut blob.points[Blob::outer_index(i)];
            let Some(contact) = rim_contact(point, ctx.field, ctx.config.contact_band) else {
                continue;
            };
            let magnitude = (-mu * contact.tangential_speed * contact.proximity).clamp(-cap, cap);
            point.accelerate(contact.tangent * magnitude);
        }
    }
}

/// Reaction of rim friction on the obstacles: a sliding blob drags obstacles
/// along, scaled by the blob's mass.
pub fn apply_obstacle_friction(
    blobs: &Arena<Blob>,
    obstacles: &mut Arena<Obstacle>,
    field: &SignedDistanceField,
    config: &SimulationConfig,
) {
    let mu = config.friction_coefficient;
    if mu <= 0.0 || field.is_empty() {
        return;
    }
    for blob in blobs.iter() {
        let blob_mass = blob.mass(config);
        for i in 0..blob.vertex_count() {
            let point = &blob.points[Blob::outer_index(i)];
            let Some(contact) = rim_contact(point, field, config.contact_band) else {
                continue;
            };
            let magnitude = config.contact_force_factor
                * blob_mass
                * mu
                * contact.tangential_speed
                * contact.proximity;
            let force = (contact.tangent * magnitude).clamp_length_max(config.max_extra_force);
            if let Some(obstacle) = obstacles.get_mut(contact.probe.id) {
                obstacle.apply_force(force);
            }
        }
    }
}
