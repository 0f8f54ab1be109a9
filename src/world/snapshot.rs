//! Render-facing copy of the world state produced after each frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::{
    blob::{Blob, BlobId},
    obstacle::{Obstacle, ObstacleId, ShapeKind},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobSnapshot {
    pub id: BlobId,
    /// Outer ring in vertex order.
    pub outline: Vec<Vec2>,
    pub hub: Vec2,
    pub is_child: bool,
}

impl From<&Blob> for BlobSnapshot {
    fn from(blob: &Blob) -> Self {
        Self {
            id: blob.id,
            outline: blob.outer_polygon(),
            hub: blob.hub().position,
            is_child: blob.is_child,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub id: ObstacleId,
    pub kind: ShapeKind,
    pub position: Vec2,
    /// Radius for circles, circumradius for polygons.
    pub size: f32,
    pub attached_to: Option<BlobId>,
    pub trail: Vec<Vec2>,
}

impl From<&Obstacle> for ObstacleSnapshot {
    fn from(obstacle: &Obstacle) -> Self {
        Self {
            id: obstacle.id,
            kind: obstacle.kind(),
            position: obstacle.position,
            size: obstacle.size(),
            attached_to: obstacle.attachment.map(|a| a.blob),
            trail: obstacle.trail.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub blobs: Vec<BlobSnapshot>,
    pub obstacles: Vec<ObstacleSnapshot>,
}

impl WorldSnapshot {
    pub fn blob(&self, id: BlobId) -> Option<&BlobSnapshot> {
        self.blobs.iter().find(|b| b.id == id)
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&ObstacleSnapshot> {
        self.obstacles.iter().find(|o| o.id == id)
    }
}
