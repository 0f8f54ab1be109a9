use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f32::consts::{FRAC_1_SQRT_2, PI};

use super::blob::BlobId;
use crate::{
    config::{SimulationConfig, MIN_OBSTACLE_MASS, OBSTACLE_BASE_DENSITY},
    utils::{
        allocator::Handle,
        math::{distance_to_segment, point_in_triangle},
    },
};

/// Stable handle of an obstacle inside the world.
pub type ObstacleId = Handle<Obstacle>;

const SQRT_3: f32 = 1.732_050_8;

/// Closed set of rigid obstacle geometries, all centred on the obstacle position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    Circle { radius: f32 },
    /// Axis-aligned square described by its circumradius (half diagonal).
    Square { circumradius: f32 },
    /// Upward-pointing equilateral triangle described by its circumradius.
    Triangle { circumradius: f32 },
}

/// Shape discriminant exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
}

impl ObstacleShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ObstacleShape::Circle { .. } => ShapeKind::Circle,
            ObstacleShape::Square { .. } => ShapeKind::Square,
            ObstacleShape::Triangle { .. } => ShapeKind::Triangle,
        }
    }

    /// Radius for circles, circumradius otherwise.
    pub fn size(&self) -> f32 {
        match *self {
            ObstacleShape::Circle { radius } => radius,
            ObstacleShape::Square { circumradius } | ObstacleShape::Triangle { circumradius } => {
                circumradius
            }
        }
    }

    pub fn with_size(self, size: f32) -> Self {
        match self {
            ObstacleShape::Circle { .. } => ObstacleShape::Circle { radius: size },
            ObstacleShape::Square { .. } => ObstacleShape::Square { circumradius: size },
            ObstacleShape::Triangle { .. } => ObstacleShape::Triangle { circumradius: size },
        }
    }

    pub fn area(&self) -> f32 {
        match *self {
            ObstacleShape::Circle { radius } => PI * radius * radius,
            ObstacleShape::Square { circumradius } => 2.0 * circumradius * circumradius,
            ObstacleShape::Triangle { circumradius } => {
                0.75 * SQRT_3 * circumradius * circumradius
            }
        }
    }

    /// Triangle corners relative to the center (apex up on a y-down screen).
    pub fn triangle_vertices(circumradius: f32) -> [Vec2; 3] {
        [
            Vec2::new(0.0, -circumradius),
            Vec2::new(circumradius * SQRT_3 * 0.5, circumradius * 0.5),
            Vec2::new(-circumradius * SQRT_3 * 0.5, circumradius * 0.5),
        ]
    }

    /// Signed distance from a point given relative to the shape center.
    pub fn distance(&self, local: Vec2) -> f32 {
        match *self {
            ObstacleShape::Circle { radius } => local.length() - radius,
            ObstacleShape::Square { circumradius } => {
                let half_side = circumradius * FRAC_1_SQRT_2;
                let q = local.abs() - Vec2::splat(half_side);
                q.max(Vec2::ZERO).length() + q.max_element().min(0.0)
            }
            ObstacleShape::Triangle { circumradius } => {
                let [a, b, c] = Self::triangle_vertices(circumradius);
                let edge_distance = distance_to_segment(local, a, b)
                    .min(distance_to_segment(local, b, c))
                    .min(distance_to_segment(local, c, a));
                if point_in_triangle(local, a, b, c) {
                    -edge_distance
                } else {
                    edge_distance
                }
            }
        }
    }

    pub fn contains(&self, local: Vec2) -> bool {
        match *self {
            ObstacleShape::Circle { radius } => local.length() <= radius,
            ObstacleShape::Square { circumradius } => {
                let half_side = circumradius * FRAC_1_SQRT_2;
                local.x.abs() <= half_side && local.y.abs() <= half_side
            }
            ObstacleShape::Triangle { circumradius } => {
                let [a, b, c] = Self::triangle_vertices(circumradius);
                point_in_triangle(local, a, b, c)
            }
        }
    }
}

/// Exclusive binding of an obstacle to a child blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub blob: BlobId,
    /// Satellite index among obstacles attached to the same blob.
    pub slot: usize,
    /// Current orbit angle in radians.
    pub phase: f32,
}

/// Rigid obstacle the blobs collide with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub shape: ObstacleShape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f32,
    /// Size at spawn, used as the reference when absorbed obstacles shrink.
    pub original_size: f32,
    pub attachment: Option<Attachment>,
    pub trail: VecDeque<Vec2>,
}

impl Obstacle {
    pub fn new(shape: ObstacleShape, position: Vec2, config: &SimulationConfig) -> Self {
        let mut obstacle = Self {
            id: ObstacleId::default(),
            shape,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass: MIN_OBSTACLE_MASS,
            original_size: shape.size(),
            attachment: None,
            trail: VecDeque::new(),
        };
        obstacle.recompute_mass(config);
        obstacle
    }

    pub fn circle(position: Vec2, radius: f32, config: &SimulationConfig) -> Self {
        Self::new(ObstacleShape::Circle { radius }, position, config)
    }

    pub fn square(position: Vec2, circumradius: f32, config: &SimulationConfig) -> Self {
        Self::new(ObstacleShape::Square { circumradius }, position, config)
    }

    pub fn triangle(position: Vec2, circumradius: f32, config: &SimulationConfig) -> Self {
        Self::new(ObstacleShape::Triangle { circumradius }, position, config)
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn size(&self) -> f32 {
        self.shape.size()
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Signed distance from a world-space point to the obstacle surface.
    pub fn distance(&self, point: Vec2) -> f32 {
        self.shape.distance(point - self.position)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.shape.contains(point - self.position)
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force * self.inverse_mass();
    }

    /// Area times density, with small obstacles made denser.
    pub fn recompute_mass(&mut self, config: &SimulationConfig) {
        let density = OBSTACLE_BASE_DENSITY
            * config.obstacle_density
            * config.obstacle_size_density_scale(self.original_size);
        self.mass = (self.shape.area() * density).max(MIN_OBSTACLE_MASS);
    }

    /// Appends the current position once it moved far enough from the last sample.
    pub fn record_trail(&mut self, max_points: usize, min_distance: f32) {
        let moved_enough = self
            .trail
            .back()
            .map(|last| last.distance_squared(self.position) >= min_distance * min_distance)
            .unwrap_or(true);
        if moved_enough {
            self.trail.push_back(self.position);
        }
        while self.trail.len() > max_points {
            self.trail.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn circle_distance_is_exact() {
        let config = SimulationConfig::new();
        let obstacle = Obstacle::circle(Vec2::new(10.0, 20.0), 5.0, &config);
        let p = Vec2::new(13.0, 24.0);
        assert_eq!(obstacle.distance(p), (p - obstacle.position).length() - 5.0);
        assert_relative_eq!(obstacle.distance(Vec2::new(10.0, 20.0)), -5.0);
    }

    #[test]
    fn square_distance_inside_and_outside() {
        let half_side = 10.0;
        let shape = ObstacleShape::Square {
            circumradius: half_side * std::f32::consts::SQRT_2,
        };
        assert_relative_eq!(shape.distance(Vec2::new(15.0, 0.0)), 5.0, epsilon = 1e-4);
        assert_relative_eq!(shape.distance(Vec2::new(0.0, 4.0)), -6.0, epsilon = 1e-4);
        assert_relative_eq!(shape.distance(Vec2::new(13.0, 14.0)), 5.0, epsilon = 1e-4);
        assert!(shape.contains(Vec2::new(9.9, -9.9)));
        assert!(!shape.contains(Vec2::new(10.1, 0.0)));
    }

    #[test]
    fn triangle_distance_sign_follows_containment() {
        let shape = ObstacleShape::Triangle { circumradius: 30.0 };
        let inside = shape.distance(Vec2::ZERO);
        // The incircle radius of an equilateral triangle is half the circumradius.
        assert_relative_eq!(inside, -15.0, epsilon = 1e-3);
        assert!(shape.contains(Vec2::ZERO));
        assert!(shape.distance(Vec2::new(0.0, -40.0)) > 0.0);
        assert!(!shape.contains(Vec2::new(0.0, -40.0)));
    }

    #[test]
    fn mass_follows_area_and_size_scaling() {
        let config = SimulationConfig::new();
        let obstacle = Obstacle::circle(Vec2::ZERO, 80.0, &config);
        let expected = PI * 80.0 * 80.0 * OBSTACLE_BASE_DENSITY * config.obstacle_density;
        assert_relative_eq!(obstacle.mass, expected, max_relative = 1e-5);

        let tiny = Obstacle::circle(Vec2::ZERO, 0.5, &config);
        assert_eq!(tiny.mass, MIN_OBSTACLE_MASS);
    }

    #[test]
    fn trail_is_bounded_and_spaced() {
        let config = SimulationConfig::new();
        let mut obstacle = Obstacle::circle(Vec2::ZERO, 5.0, &config);
        obstacle.record_trail(3, 3.0);
        obstacle.position.x = 1.0;
        obstacle.record_trail(3, 3.0);
        assert_eq!(obstacle.trail.len(), 1);

        for step in 1..10 {
            obstacle.position.x = step as f32 * 5.0;
            obstacle.record_trail(3, 3.0);
        }
        assert_eq!(obstacle.trail.len(), 3);
        assert_eq!(obstacle.trail.back(), Some(&Vec2::new(45.0, 0.0)));
    }
}
