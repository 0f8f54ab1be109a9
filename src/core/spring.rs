use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::point::Point;
use crate::utils::math::{clamp_force, LENGTH_EPSILON};

/// Elastic link between two points of the same blob, stored by index.
///
/// The rest length is captured once at construction; mesh rebuilds replace
/// springs instead of editing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    a: usize,
    b: usize,
    rest_length: f32,
    pub stiffness: f32,
}

impl Spring {
    /// Links `a` and `b`, taking their current separation as the rest length.
    pub fn between(points: &[Point], a: usize, b: usize, stiffness: f32) -> Self {
        let rest_length = points[a].position.distance(points[b].position);
        Self {
            a,
            b,
            rest_length,
            stiffness,
        }
    }

    pub fn endpoints(&self) -> (usize, usize) {
        (self.a, self.b)
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Hookean acceleration acting on endpoint `a` (endpoint `b` receives the negation).
    ///
    /// Degenerate springs (non-finite or near-zero lengths) contribute nothing.
    pub fn force(&self, points: &[Point], max_force: f32) -> Vec2 {
        let (Some(pa), Some(pb)) = (points.get(self.a), points.get(self.b)) else {
            return Vec2::ZERO;
        };
        let delta = pa.position - pb.position;
        let length = delta.length();
        if !length.is_finite()
            || !self.rest_length.is_finite()
            || length < LENGTH_EPSILON
            || self.rest_length < LENGTH_EPSILON
        {
            return Vec2::ZERO;
        }

        let magnitude = -self.stiffness * (length - self.rest_length) / self.rest_length;
        clamp_force(delta / length * magnitude, max_force)
    }

    /// Adds equal and opposite accelerations to both endpoints.
    pub fn apply(&self, points: &mut [Point], max_force: f32) {
        let force = self.force(points, max_force);
        if force == Vec2::ZERO {
            return;
        }
        points[self.a].accelerate(force);
        points[self.b].accelerate(-force);
    }
}
