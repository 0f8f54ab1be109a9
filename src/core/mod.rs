//! Data model: points, springs, blobs and obstacles.

pub mod blob;
pub mod obstacle;
pub mod point;
pub mod spring;

pub use blob::{Blob, BlobGeometry, BlobId};
pub use obstacle::{Attachment, Obstacle, ObstacleId, ObstacleShape, ShapeKind};
pub use point::Point;
pub use spring::Spring;
