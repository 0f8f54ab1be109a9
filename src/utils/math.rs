//! Planar geometry helpers layered on top of `glam`.

use glam::Vec2;

/// Lengths below this are treated as degenerate.
pub const LENGTH_EPSILON: f32 = 1e-9;

/// Signed polygon area via the shoelace formula.
///
/// Positive for counter-clockwise winding in a y-up frame (clockwise on a
/// y-down screen). Fewer than three vertices yield zero.
pub fn polygon_signed_area(vertices: &[Vec2]) -> f32 {
    let count = vertices.len();
    if count < 3 {
        return 0.0;
    }
    let twice_area: f32 = (0..count)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            a.perp_dot(b)
        })
        .sum();
    0.5 * twice_area
}

/// Even-odd ray casting containment test.
pub fn point_in_polygon(point: Vec2, vertices: &[Vec2]) -> bool {
    let count = vertices.len();
    if count < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = count - 1;
    for i in 0..count {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > point.y) != (b.y > point.y) {
            let t = (point.y - a.y) / (b.y - a.y);
            let crossing_x = a.x + t * (b.x - a.x);
            if point.x < crossing_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Euclidean distance from `point` to the closed segment `a..b`.
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let edge = b - a;
    let length_sq = edge.length_squared();
    let t = if length_sq > 0.0 {
        ((point - a).dot(edge) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    point.distance(a + edge * t)
}

/// Same-side test; points on an edge count as inside.
pub fn point_in_triangle(point: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let side = |p: Vec2, q: Vec2, r: Vec2| (p - r).perp_dot(q - r);
    let d1 = side(point, a, b);
    let d2 = side(point, b, c);
    let d3 = side(point, c, a);
    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}

/// Arithmetic mean of a point set, `None` when empty.
pub fn centroid(points: impl IntoIterator<Item = Vec2>) -> Option<Vec2> {
    let (sum, count) = points
        .into_iter()
        .fold((Vec2::ZERO, 0usize), |(sum, count), p| (sum + p, count + 1));
    (count > 0).then(|| sum / count as f32)
}

/// Discrete Laplacian `prev + next - 2 * curr` of a closed ring at `i`.
pub fn ring_laplacian(ring: &[Vec2], i: usize) -> Vec2 {
    let n = ring.len();
    let prev = ring[(i + n - 1) % n];
    let next = ring[(i + 1) % n];
    prev + next - 2.0 * ring[i]
}

/// Unit normal at `i` pointing into a closed ring whose signed area has the
/// sign of `orientation`. Zero when the neighbours coincide.
pub fn ring_inward_normal(ring: &[Vec2], i: usize, orientation: f32) -> Vec2 {
    let n = ring.len();
    let tangent = ring[(i + 1) % n] - ring[(i + n - 1) % n];
    tangent.perp().normalize_or_zero() * orientation.signum()
}

/// Clamps a vector's length, treating non-finite input as zero.
pub fn clamp_force(force: Vec2, max_magnitude: f32) -> Vec2 {
    if !force.is_finite() {
        return Vec2::ZERO;
    }
    force.clamp_length_max(max_magnitude.max(0.0))
}
