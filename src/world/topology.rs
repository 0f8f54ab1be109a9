//! Changes to the set of blobs: splitting on obstacle entry and absorbing
//! obstacles into child blobs.

use glam::Vec2;

use crate::{
    config::SimulationConfig,
    core::{
        blob::{Blob, BlobId},
        obstacle::{Attachment, Obstacle, ObstacleId},
    },
    error::GeometryError,
    utils::{allocator::Arena, math::LENGTH_EPSILON},
};

/// A parent blob replaced by two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitEvent {
    pub parent: BlobId,
    pub children: [BlobId; 2],
    pub obstacle: ObstacleId,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TopologyReport {
    pub split: Option<SplitEvent>,
    pub attached: usize,
}

/// Direction along which a blob is cut in two by `obstacle`.
///
/// Perpendicular to the obstacle's motion, else perpendicular to the
/// hub-to-obstacle offset, else the x axis.
pub fn split_axis(blob: &Blob, obstacle: &Obstacle) -> Vec2 {
    if obstacle.velocity.length_squared() > LENGTH_EPSILON {
        return obstacle.velocity.normalize().perp();
    }
    let offset = obstacle.position - blob.hub().position;
    if offset.length_squared() > LENGTH_EPSILON {
        return offset.normalize().perp();
    }
    Vec2::X
}

/// Builds the two children that replace `parent` without touching any arena.
pub fn split_children(
    parent: &Blob,
    obstacle: &Obstacle,
    config: &SimulationConfig,
) -> Result<[Blob; 2], GeometryError> {
    if !parent.hub().position.is_finite() {
        return Err(GeometryError::NonFiniteCenter);
    }
    let scale = config.split_scale_factor;
    let geometry = parent.geometry().scaled(scale)?;
    let axis = split_axis(parent, obstacle);
    let hub = parent.hub().position;
    let offset = axis * (parent.outer_radius() * scale + 0.5 * obstacle.size());
    let velocity = parent.mean_velocity();

    let make = |center: Vec2| {
        let mut child = Blob::with_velocity(center, velocity, geometry, config);
        child.is_child = true;
        child
    };
    Ok([make(hub + offset), make(hub - offset)])
}

/// Tracks the split cooldown and applies topology changes once per tick.
#[derive(Debug, Default, Clone)]
pub struct TopologyManager {
    cooldown_remaining: f32,
}

impl TopologyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    /// Counts the split cooldown down by `dt`, also on frozen ticks.
    pub fn tick_cooldown(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }

    /// Splits at most one blob, then binds free obstacles to the child blobs
    /// that contain them.
    pub fn update(
        &mut self,
        blobs: &mut Arena<Blob>,
        obstacles: &mut Arena<Obstacle>,
        config: &SimulationConfig,
        dt: f32,
    ) -> TopologyReport {
        self.tick_cooldown(dt);

        let mut report = TopologyReport::default();
        if config.split_enabled && self.cooldown_remaining <= 0.0 {
            report.split = find_split_candidate(blobs, obstacles).and_then(|(blob_id, obstacle_id)| {
                split_blob(blobs, obstacles, blob_id, obstacle_id, config)
            });
            if report.split.is_some() {
                self.cooldown_remaining = config.split_cooldown_seconds.max(0.0);
            }
        }

        report.attached = attach_obstacles(blobs, obstacles);
        report
    }
}

/// First splittable blob (by arena order) with an obstacle centre inside its
/// outer ring. Child blobs never split.
pub fn find_split_candidate(
    blobs: &Arena<Blob>,
    obstacles: &Arena<Obstacle>,
) -> Option<(BlobId, ObstacleId)> {
    blobs.iter().filter(|blob| !blob.is_child).find_map(|blob| {
        obstacles
            .iter()
            .filter(|obstacle| !obstacle.is_attached())
            .find(|obstacle| blob.contains(obstacle.position))
            .map(|obstacle| (blob.id, obstacle.id))
    })
}

/// Replaces `blob_id` with two child blobs either side of the obstacle.
///
/// Returns `None` and leaves the world untouched when either handle is stale
/// or the children cannot be meshed.
pub fn split_blob(
    blobs: &mut Arena<Blob>,
    obstacles: &mut Arena<Obstacle>,
    blob_id: BlobId,
    obstacle_id: ObstacleId,
    config: &SimulationConfig,
) -> Option<SplitEvent> {
    let parent = blobs.get(blob_id)?;
    let obstacle = obstacles.get(obstacle_id)?;
    let [first, second] = match split_children(parent, obstacle, config) {
        Ok(children) => children,
        Err(err) => {
            log::warn!("split of blob {:?} skipped: {}", blob_id, err);
            return None;
        }
    };
    blobs.remove(blob_id);
    detach_from(obstacles, blob_id);

    let mut insert = |child: Blob| {
        blobs.insert_with(|id| {
            let mut child = child;
            child.id = id;
            child
        })
    };
    let children = [insert(first), insert(second)];

    log::info!(
        "blob {:?} split by obstacle {:?} into {:?} and {:?}",
        blob_id,
        obstacle_id,
        children[0],
        children[1]
    );
    Some(SplitEvent {
        parent: blob_id,
        children,
        obstacle: obstacle_id,
    })
}

/// Binds each free obstacle whose centre lies inside a child blob to the first
/// such blob. Returns the number of new attachments.
pub fn attach_obstacles(blobs: &Arena<Blob>, obstacles: &mut Arena<Obstacle>) -> usize {
    let mut attached = 0;
    let free: Vec<ObstacleId> = obstacles
        .entries()
        .filter(|(_, obstacle)| !obstacle.is_attached())
        .map(|(id, _)| id)
        .collect();

    for obstacle_id in free {
        let Some(position) = obstacles.get(obstacle_id).map(|o| o.position) else {
            continue;
        };
        let Some(blob) = blobs
            .iter()
            .filter(|blob| blob.is_child)
            .find(|blob| blob.contains(position))
        else {
            continue;
        };

        let slot = obstacles
            .iter()
            .filter(|o| o.attachment.map_or(false, |a| a.blob == blob.id))
            .count();
        let offset = position - blob.hub().position;
        let phase = if offset.length_squared() > LENGTH_EPSILON {
            offset.y.atan2(offset.x)
        } else {
            0.0
        };

        if let Some(obstacle) = obstacles.get_mut(obstacle_id) {
            obstacle.attachment = Some(Attachment {
                blob: blob.id,
                slot,
                phase,
            });
            attached += 1;
            log::debug!("obstacle {:?} absorbed by blob {:?} in slot {}", obstacle_id, blob.id, slot);
        }
    }
    attached
}

/// Releases every obstacle attached to `blob_id`.
pub fn detach_from(obstacles: &mut Arena<Obstacle>, blob_id: BlobId) -> usize {
    let mut released = 0;
    for obstacle in obstacles.iter_mut() {
        if obstacle.attachment.map_or(false, |a| a.blob == blob_id) {
            obstacle.attachment = None;
            released += 1;
        }
    }
    released
}
