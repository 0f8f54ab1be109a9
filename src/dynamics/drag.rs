//! Pointer interaction: tugging a rim node, or the hub, towards the cursor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::{SimulationConfig, DRAG_PICK_RADIUS_SCALE},
    core::blob::{Blob, BlobId},
    utils::{allocator::Arena, math::LENGTH_EPSILON},
};

/// Node of a blob the pointer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragNode {
    /// Index into the blob's point list. Must be a rim node (`< 2n`).
    Ring(usize),
    Hub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTarget {
    pub blob: BlobId,
    pub node: DragNode,
}

/// Pointer input, sampled once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerState {
    pub position: Vec2,
    pub is_down: bool,
    pub target: Option<DragTarget>,
}

impl PointerState {
    pub fn idle(position: Vec2) -> Self {
        Self {
            position,
            is_down: false,
            target: None,
        }
    }

    pub fn pressed(position: Vec2, target: Option<DragTarget>) -> Self {
        Self {
            position,
            is_down: true,
            target,
        }
    }

    pub fn moved_to(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn released(self) -> Self {
        Self::idle(self.position)
    }

    /// The held target, if the button is down.
    pub fn active_target(&self) -> Option<DragTarget> {
        if self.is_down {
            self.target
        } else {
            None
        }
    }
}

/// Finds the rim node nearest to `position` across all blobs. A press is
/// accepted within `1.5 ×` that blob's outer radius; with `hub_drag` the
/// returned node is the hub instead.
pub fn pick_drag_target(blobs: &Arena<Blob>, position: Vec2, hub_drag: bool) -> Option<DragTarget> {
    let mut best: Option<(&Blob, usize, f32)> = None;
    for blob in blobs.iter() {
        for (index, point) in blob.points[..blob.ring_len()].iter().enumerate() {
            let distance = point.position.distance(position);
            if best.map_or(true, |(_, _, d)| distance < d) {
                best = Some((blob, index, distance));
            }
        }
    }

    let (blob, index, distance) = best?;
    if distance > blob.outer_radius() * DRAG_PICK_RADIUS_SCALE {
        return None;
    }
    let node = if hub_drag {
        DragNode::Hub
    } else {
        DragNode::Ring(index)
    };
    Some(DragTarget { blob: blob.id, node })
}

/// Pulls rim node `index` and its neighbours towards `pointer`.
///
/// Vertices `±drag_neighbor_range` away share the force with weight
/// `decay^|k|`, and each vertex's inner/outer partner takes
/// `drag_pair_weight` of its share. Shares are normalised so the total stays
/// within `mouse_max_force`. Returns `false` (and does nothing) for an index
/// outside the rim.
pub fn apply_ring_tug(blob: &mut Blob, index: usize, pointer: Vec2, config: &SimulationConfig) -> bool {
    let ring = blob.ring_len();
    if index >= ring {
        log::warn!("blob {:?}: drag index {} outside rim of {} nodes", blob.id, index, ring);
        return false;
    }

    let n = blob.vertex_count() as isize;
    let is_outer = index % 2 == 1;
    let vertex = (index / 2) as isize;
    let range = (config.drag_neighbor_range as isize).min(n / 2);
    let pair_weight = config.drag_pair_weight.max(0.0);

    let mut shares: Vec<(usize, f32)> = Vec::with_capacity(2 * (2 * range as usize + 1));
    for k in -range..=range {
        let weight = config.drag_neighbor_decay.powi(k.abs() as i32);
        let j = (vertex + k).rem_euclid(n) as usize;
        let (primary, partner) = if is_outer {
            (Blob::outer_index(j), Blob::inner_index(j))
        } else {
            (Blob::inner_index(j), Blob::outer_index(j))
        };
        shares.push((primary, weight));
        if pair_weight > 0.0 {
            shares.push((partner, weight * pair_weight));
        }
    }

    let total: f32 = shares.iter().map(|(_, w)| w).sum();
    if total <= LENGTH_EPSILON {
        return false;
    }

    let stiffness = config.mouse_spring_stiffness;
    let damping = config.mouse_spring_damping * config.drag_damping_multiplier;
    for (node, weight) in shares {
        let share = weight / total;
        let point = &mut blob.points[node];
        let force = (pointer - point.position) * (stiffness * share) - point.velocity * (damping * share);
        point.accelerate(force.clamp_length_max(config.mouse_max_force * share));
    }
    true
}

/// Spring-damper on the hub; part of the force is spread over the rim so the
/// whole body follows instead of the hub tearing through the ring.
pub fn apply_hub_tug(blob: &mut Blob, pointer: Vec2, config: &SimulationConfig) {
    let settings = &config.hub_drag;
    let hub_index = blob.hub_index();
    let hub = blob.points[hub_index];

    let force = ((pointer - hub.position) * config.mouse_spring_stiffness
        - hub.velocity * config.mouse_spring_damping)
        .clamp_length_max(config.mouse_max_force);
    let center_share = settings.center_share.clamp(0.0, 1.0);
    blob.points[hub_index].accelerate(force * center_share);

    let ring = blob.ring_len();
    let per_node = force * (1.0 - center_share) / ring as f32;
    for point in &mut blob.points[..ring] {
        point.accelerate(per_node);
    }

    stabilize_hub(blob, config);
}

/// Keeps a dragged hub near the rim centroid and inside the outer polygon.
fn stabilize_hub(blob: &mut Blob, config: &SimulationConfig) {
    let settings = &config.hub_drag;
    let hub_index = blob.hub_index();
    let hub = blob.points[hub_index];
    let centroid = blob.rim_centroid();

    let offset = hub.position - centroid;
    let distance = offset.length();
    let limit = settings.max_offset_scale * blob.inner_radius();
    if distance > limit && distance > LENGTH_EPSILON {
        let direction = offset / distance;
        let excess = distance - limit;
        let radial_speed = hub.velocity.dot(direction);
        let restore = -direction * (settings.restore_stiffness * excess + settings.restore_damping * radial_speed);
        blob.points[hub_index].accelerate(restore.clamp_length_max(settings.force_cap));
    }

    if !blob.contains(hub.position) {
        let correction = (centroid - hub.position) * settings.boundary_stiffness
            - hub.velocity * settings.boundary_damping;
        log::trace!("blob {:?}: hub left the rim, pulling back", blob.id);
        blob.points[hub_index].accelerate(correction.clamp_length_max(settings.force_cap));
    }
}

/// Moves the whole mesh a fraction of the way to the pointer and damps it.
pub fn apply_rigid_hub_drag(blob: &mut Blob, pointer: Vec2, config: &SimulationConfig, dt: f32) {
    let settings = &config.hub_drag;
    let shift = (pointer - blob.hub().position) * settings.rigid_follow_gain.clamp(0.0, 1.0);
    if !shift.is_finite() {
        return;
    }
    blob.translate(shift);
    let damping = (-settings.rigid_damping.max(0.0) * dt).exp();
    for point in &mut blob.points {
        point.velocity *= damping;
    }
}

/// Applies whatever tug `node` calls for. Returns `false` when the node is invalid.
pub fn apply_drag(
    blob: &mut Blob,
    node: DragNode,
    pointer: Vec2,
    config: &SimulationConfig,
    dt: f32,
) -> bool {
    match node {
        DragNode::Ring(index) => apply_ring_tug(blob, index, pointer, config),
        DragNode::Hub if config.hub_drag.rigid => {
            apply_rigid_hub_drag(blob, pointer, config, dt);
            true
        }
        DragNode::Hub => {
            apply_hub_tug(blob, pointer, config);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::HubDragConfig, core::blob::BlobGeometry};
    use approx::assert_relative_eq;

    fn blob() -> Blob {
        let geometry = BlobGeometry::new(40.0, 52.0, 16).expect("valid geometry");
        Blob::new(Vec2::ZERO, geometry, &SimulationConfig::new())
    }

    fn net_force(blob: &Blob) -> Vec2 {
        blob.points.iter().map(|p| p.acceleration).sum()
    }

    #[test]
    fn ring_tug_pulls_towards_pointer() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        let grabbed = Blob::outer_index(0);
        assert!(apply_ring_tug(&mut blob, grabbed, Vec2::new(200.0, 0.0), &config));

        assert!(blob.points[grabbed].acceleration.x > 0.0);
        assert!(net_force(&blob).x > 0.0);
        let neighbour = Blob::outer_index(1);
        assert!(blob.points[grabbed].acceleration.length() > blob.points[neighbour].acceleration.length());
    }

    #[test]
    fn ring_tug_total_force_is_bounded() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        apply_ring_tug(&mut blob, 3, Vec2::new(1e7, 1e7), &config);
        assert!(net_force(&blob).length() <= config.mouse_max_force * 1.001);
    }

    #[test]
    fn invalid_ring_index_is_ignored() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        let hub = blob.hub_index();
        assert!(!apply_ring_tug(&mut blob, hub, Vec2::new(10.0, 0.0), &config));
        assert_eq!(net_force(&blob), Vec2::ZERO);
    }

    #[test]
    fn hub_tug_spreads_force_over_rim() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        apply_hub_tug(&mut blob, Vec2::new(0.0, 30.0), &config);

        let hub = blob.hub().acceleration;
        let rim = blob.points[0].acceleration;
        assert!(hub.y > 0.0);
        assert!(rim.y > 0.0);
        assert!(hub.y > rim.y);
    }

    #[test]
    fn rigid_drag_translates_mesh() {
        let config = SimulationConfig::new().with_hub_drag(HubDragConfig {
            rigid: true,
            ..Default::default()
        });
        let mut blob = blob();
        let before = blob.points[0].position;
        assert!(apply_drag(&mut blob, DragNode::Hub, Vec2::new(100.0, 0.0), &config, 1.0 / 60.0));
        assert_relative_eq!(blob.points[0].position.x - before.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(blob.hub().position.x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn pick_respects_radius() {
        let config = SimulationConfig::new();
        let mut blobs = Arena::new();
        let id = blobs.insert_with(|id| {
            let mut blob = Blob::new(Vec2::ZERO, BlobGeometry::new(40.0, 52.0, 16).expect("valid"), &config);
            blob.id = id;
            blob
        });

        let target = pick_drag_target(&blobs, Vec2::new(60.0, 0.0), false).expect("near rim");
        assert_eq!(target.blob, id);
        assert_eq!(target.node, DragNode::Ring(Blob::outer_index(0)));
        assert_eq!(
            pick_drag_target(&blobs, Vec2::new(60.0, 0.0), true).map(|t| t.node),
            Some(DragNode::Hub)
        );
        assert!(pick_drag_target(&blobs, Vec2::new(200.0, 0.0), false).is_none());
    }

    #[test]
    fn released_pointer_has_no_target() {
        let target = DragTarget {
            blob: BlobId::default(),
            node: DragNode::Hub,
        };
        let pointer = PointerState::pressed(Vec2::ZERO, Some(target));
        assert_eq!(pointer.active_target(), Some(target));
        assert_eq!(pointer.released().active_target(), None);
    }
}
