use glam::Vec2;

use crate::{
    config::{SimulationConfig, SDF_EMPTY_SENTINEL},
    core::obstacle::{Obstacle, ObstacleId, ObstacleShape},
    utils::allocator::Arena,
};

/// Read-only copy of the obstacle state blob forces need.
///
/// Probes are collected once per tick before any blob is touched so the
/// per-blob force pass never borrows the obstacle arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleProbe {
    pub id: ObstacleId,
    pub shape: ObstacleShape,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl ObstacleProbe {
    pub fn from_obstacle(obstacle: &Obstacle) -> Self {
        Self {
            id: obstacle.id,
            shape: obstacle.shape,
            position: obstacle.position,
            velocity: obstacle.velocity,
        }
    }

    pub fn distance(&self, point: Vec2) -> f32 {
        self.shape.distance(point - self.position)
    }
}

/// A point inside the field moved onto its zero level set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProjection {
    pub position: Vec2,
    /// Outward field normal at the original point.
    pub normal: Vec2,
    /// Velocity of the obstacle the point was deepest in.
    pub obstacle_velocity: Vec2,
}

/// Folds two obstacle distances: the tighter bound when inside both, the
/// union otherwise.
pub fn combine(d1: f32, d2: f32) -> f32 {
    if d1 < 0.0 && d2 < 0.0 {
        d1.max(d2)
    } else {
        d1.min(d2)
    }
}

/// Scalar field composed from every obstacle's distance function.
#[derive(Debug, Clone, Default)]
pub struct SignedDistanceField {
    probes: Vec<ObstacleProbe>,
}

impl SignedDistanceField {
    pub fn new(probes: Vec<ObstacleProbe>) -> Self {
        Self { probes }
    }

    pub fn from_obstacles(obstacles: &Arena<Obstacle>) -> Self {
        Self::new(obstacles.iter().map(ObstacleProbe::from_obstacle).collect())
    }

    pub fn probes(&self) -> &[ObstacleProbe] {
        &self.probes
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Field value at `point`; [`SDF_EMPTY_SENTINEL`] when there are no obstacles.
    pub fn distance(&self, point: Vec2) -> f32 {
        let mut distances = self.probes.iter().map(|probe| probe.distance(point));
        match distances.next() {
            Some(first) => distances.fold(first, combine),
            None => SDF_EMPTY_SENTINEL,
        }
    }

    /// Central-difference gradient with step `epsilon`.
    pub fn gradient(&self, point: Vec2, epsilon: f32) -> Vec2 {
        let dx = Vec2::new(epsilon, 0.0);
        let dy = Vec2::new(0.0, epsilon);
        Vec2::new(
            self.distance(point + dx) - self.distance(point - dx),
            self.distance(point + dy) - self.distance(point - dy),
        ) / (2.0 * epsilon)
    }

    /// Unit outward normal of the field, zero where it is flat or undefined.
    pub fn normal(&self, point: Vec2, epsilon: f32) -> Vec2 {
        let gradient = self.gradient(point, epsilon);
        if gradient.is_finite() {
            gradient.normalize_or_zero()
        } else {
            Vec2::ZERO
        }
    }

    /// Repulsion acceleration: along the field normal with magnitude
    /// `min(exp(-K * sdf), cap)`, growing as the point sinks into an obstacle.
    pub fn push_force(&self, point: Vec2, config: &SimulationConfig) -> Vec2 {
        if self.probes.is_empty() {
            return Vec2::ZERO;
        }
        let normal = self.normal(point, config.sdf_gradient_epsilon);
        let depth = self.distance(point);
        let magnitude = (-config.sdf_stiffness * depth).exp().min(config.sdf_force_cap);
        if !magnitude.is_finite() {
            return Vec2::ZERO;
        }
        normal * magnitude
    }

    /// Moves `point` out along the field normal when it lies inside an
    /// obstacle. `None` outside the field or where the normal is undefined.
    pub fn project_out(&self, point: Vec2, epsilon: f32) -> Option<SurfaceProjection> {
        let (deepest, _) = self.nearest(point)?;
        let depth = self.distance(point);
        if !(depth < 0.0) {
            return None;
        }
        let normal = self.normal(point, epsilon);
        if normal == Vec2::ZERO {
            return None;
        }
        Some(SurfaceProjection {
            position: point - normal * depth,
            normal,
            obstacle_velocity: deepest.velocity,
        })
    }

    /// Closest obstacle by signed distance, with that distance.
    pub fn nearest(&self, point: Vec2) -> Option<(&ObstacleProbe, f32)> {
        self.probes
            .iter()
            .map(|probe| (probe, probe.distance(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn circle_probe(position: Vec2, radius: f32) -> ObstacleProbe {
        ObstacleProbe {
            id: ObstacleId::default(),
            shape: ObstacleShape::Circle { radius },
            position,
            velocity: Vec2::ZERO,
        }
    }

    #[test]
    fn empty_field_returns_sentinel_and_no_force() {
        let field = SignedDistanceField::default();
        assert_eq!(field.distance(Vec2::new(3.0, -7.0)), SDF_EMPTY_SENTINEL);
        assert_eq!(field.push_force(Vec2::ZERO, &SimulationConfig::new()), Vec2::ZERO);
    }

    #[test]
    fn combine_rule() {
        assert_eq!(combine(-2.0, -5.0), -2.0);
        assert_eq!(combine(-2.0, 5.0), -2.0);
        assert_eq!(combine(3.0, 5.0), 3.0);
    }

    #[test]
    fn lone_circle_field_equals_circle_distance() {
        let field = SignedDistanceField::new(vec![circle_probe(Vec2::new(5.0, 5.0), 2.0)]);
        let p = Vec2::new(9.0, 8.0);
        assert_eq!(field.distance(p), p.distance(Vec2::new(5.0, 5.0)) - 2.0);
    }

    #[test]
    fn gradient_points_away_from_circle() {
        let field = SignedDistanceField::new(vec![circle_probe(Vec2::ZERO, 10.0)]);
        let normal = field.normal(Vec2::new(20.0, 0.0), 0.01);
        assert_relative_eq!(normal.x, 1.0, epsilon = 1e-3);
        assert_relative_eq!(normal.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn inside_points_project_onto_the_circle() {
        let mut probe = circle_probe(Vec2::new(400.0, 500.0), 40.0);
        probe.velocity = Vec2::new(3.0, 0.0);
        let field = SignedDistanceField::new(vec![probe]);

        let projection = field.project_out(Vec2::new(410.0, 470.0), 0.01).expect("inside");
        assert_relative_eq!(field.distance(projection.position), 0.0, epsilon = 1e-2);
        assert_relative_eq!(projection.normal.length(), 1.0, epsilon = 1e-4);
        assert!(projection.normal.y < 0.0);
        assert_eq!(projection.obstacle_velocity, Vec2::new(3.0, 0.0));

        assert!(field.project_out(Vec2::new(400.0, 400.0), 0.01).is_none());
        assert!(SignedDistanceField::default().project_out(Vec2::ZERO, 0.01).is_none());
    }

    #[test]
    fn push_force_grows_with_depth_and_saturates() {
        let config = SimulationConfig::new();
        let field = SignedDistanceField::new(vec![circle_probe(Vec2::ZERO, 10.0)]);
        let far = field.push_force(Vec2::new(20.0, 0.0), &config).length();
        let surface = field.push_force(Vec2::new(10.0, 0.0), &config).length();
        let deep = field.push_force(Vec2::new(5.0, 0.0), &config).length();
        assert!(far < 1e-6);
        assert_relative_eq!(surface, 1.0, epsilon = 1e-3);
        assert_relative_eq!(deep, config.sdf_force_cap, epsilon = 1e-2);
    }
}
