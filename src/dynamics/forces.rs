use glam::Vec2;

use crate::{
    collision::sdf::SignedDistanceField,
    config::SimulationConfig,
    core::blob::Blob,
    utils::math::{polygon_signed_area, ring_inward_normal, ring_laplacian, LENGTH_EPSILON},
};

/// Everything a force term may read while it writes into one blob.
pub struct ForceContext<'a> {
    pub config: &'a SimulationConfig,
    pub field: &'a SignedDistanceField,
    pub dt: f32,
}

/// Trait describing a force term accumulated into a blob's points.
///
/// Terms only touch the blob they are given, so blobs can be processed
/// independently (and in parallel) once obstacles are staged in the field.
pub trait BlobForce: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>);
}

/// Constant gravity on every point, hub included.
pub struct GravityForce;

impl BlobForce for GravityForce {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        let gravity = ctx.config.gravity();
        for point in &mut blob.points {
            point.accelerate(gravity);
        }
    }
}

/// Exponential push out of the obstacle field.
pub struct CollisionForce;

impl BlobForce for CollisionForce {
    fn name(&self) -> &'static str {
        "sdf_collision"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        if ctx.field.is_empty() {
            return;
        }
        for point in &mut blob.points {
            let push = ctx.field.push_force(point.position, ctx.config);
            point.accelerate(push);
        }
    }
}

/// Hookean springs of the mesh.
pub struct SpringNetworkForce;

impl BlobForce for SpringNetworkForce {
    fn name(&self) -> &'static str {
        "springs"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        let Blob {
            points, springs, ..
        } = blob;
        for spring in springs.iter() {
            spring.apply(points, ctx.config.max_extra_force);
        }
    }
}

/// Drives the outer ring area back towards its rest area.
///
/// Compression is resisted harder than expansion.
pub struct PressureForce;

impl PressureForce {
    /// Pressure scalar for the current area; zero when the rest area is degenerate.
    pub fn pressure(area: f32, rest_area: f32, config: &SimulationConfig) -> f32 {
        if !area.is_finite() || !rest_area.is_finite() || rest_area.abs() < 1e-6 {
            return 0.0;
        }
        let relative = (rest_area - area) / rest_area;
        let gain = if relative > 0.0 {
            config.pressure_gain * config.pressure_compress_factor
        } else {
            config.pressure_gain * config.pressure_expand_factor
        };
        gain * config.density_scale * relative
    }
}

impl BlobForce for PressureForce {
    fn name(&self) -> &'static str {
        "pressure"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        let area = blob.outer_area();
        let pressure = Self::pressure(area, blob.rest_outer_area(), ctx.config);
        if pressure == 0.0 {
            return;
        }

        let outward_sign = if area > 0.0 { 1.0 } else { -1.0 };
        let n = blob.vertex_count();
        for i in 0..n {
            let ia = Blob::outer_index(i);
            let ib = Blob::outer_index((i + 1) % n);
            let edge = blob.points[ib].position - blob.points[ia].position;
            let length = edge.length() + 1e-6;
            let normal = Vec2::new(edge.y, -edge.x) / length * outward_sign;
            let magnitude = pressure * length;
            let clamped = magnitude.abs().min(ctx.config.max_pressure_force) * magnitude.signum();
            let half = normal * clamped * 0.5;
            blob.points[ia].accelerate(half);
            blob.points[ib].accelerate(half);
        }
    }
}

/// Short-range repulsion between non-adjacent outer nodes.
pub struct SelfRepulsionForce;

impl SelfRepulsionForce {
    /// Push on `b` away from `a` (apply the negation to `a`).
    ///
    /// Zero at or beyond `radius`, otherwise `strength * (1 - d / radius)` capped.
    /// Coincident nodes are separated along +X.
    pub fn pair_force(a: Vec2, b: Vec2, radius: f32, strength: f32, cap: f32) -> Vec2 {
        let delta = b - a;
        let distance_sq = delta.length_squared();
        if !(distance_sq < radius * radius) {
            return Vec2::ZERO;
        }
        let distance = distance_sq.sqrt();
        let direction = if distance > LENGTH_EPSILON {
            delta / distance
        } else {
            Vec2::X
        };
        let overlap = 1.0 - distance / radius;
        let magnitude = (strength * overlap).min(cap);
        if magnitude <= 0.0 {
            return Vec2::ZERO;
        }
        direction * magnitude
    }
}

impl BlobForce for SelfRepulsionForce {
    fn name(&self) -> &'static str {
        "self_repulsion"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        let radius = ctx.config.self_repel_radius_for(blob.thickness());
        if radius <= 0.0 || ctx.config.self_repel_strength <= 0.0 {
            return;
        }
        let n = blob.vertex_count();
        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                // Neighbours packed closer than the radius at rest only
                // repel once squeezed past their rest spacing.
                let pair_radius = blob.rest_chord(j - i).map_or(radius, |rest| radius.min(rest));
                let ia = Blob::outer_index(i);
                let ib = Blob::outer_index(j);
                let push = Self::pair_force(
                    blob.points[ia].position,
                    blob.points[ib].position,
                    pair_radius,
                    ctx.config.self_repel_strength,
                    ctx.config.max_extra_force,
                );
                if push != Vec2::ZERO {
                    blob.points[ia].accelerate(-push);
                    blob.points[ib].accelerate(push);
                }
            }
        }
    }
}

/// Pulls each outer vertex's curvature back to its rest curvature.
///
/// The rest curvature is measured along the current inward normal, so a
/// rotated or translated blob at rest feels nothing.
pub struct BendingForce;

impl BlobForce for BendingForce {
    fn name(&self) -> &'static str {
        "bending"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        if ctx.config.bending_stiffness == 0.0 {
            return;
        }
        let ring = blob.outer_polygon();
        let orientation = polygon_signed_area(&ring);
        for i in 0..ring.len() {
            let rest = ring_inward_normal(&ring, i, orientation) * blob.rest_curvature(i);
            let bend = ((ring_laplacian(&ring, i) - rest) * ctx.config.bending_stiffness)
                .clamp_length_max(ctx.config.max_extra_force);
            blob.points[Blob::outer_index(i)].accelerate(bend);
        }
    }
}

/// Laplacian smoothing of outer ring velocities.
///
/// Writes velocity directly: it damps high-frequency ripples without
/// changing the rest shape.
pub struct ViscosityForce;

impl BlobForce for ViscosityForce {
    fn name(&self) -> &'static str {
        "viscosity"
    }

    fn apply(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        let gain = ctx.config.viscosity_coefficient * ctx.dt;
        if gain == 0.0 {
            return;
        }
        let n = blob.vertex_count();
        let velocities: Vec<Vec2> = (0..n)
            .map(|i| blob.points[Blob::outer_index(i)].velocity)
            .collect();
        for i in 0..n {
            blob.points[Blob::outer_index(i)].velocity += ring_laplacian(&velocities, i) * gain;
        }
    }
}

/// Ordered collection of blob force terms applied each tick.
pub struct ForceRegistry {
    forces: Vec<Box<dyn BlobForce>>,
}

impl Default for ForceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self { forces: Vec::new() }
    }

    /// Gravity and collision, springs, pressure, self-repulsion, bending,
    /// viscosity and rim friction, in that order.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add_force(GravityForce);
        registry.add_force(CollisionForce);
        registry.add_force(SpringNetworkForce);
        registry.add_force(PressureForce);
        registry.add_force(SelfRepulsionForce);
        registry.add_force(BendingForce);
        registry.add_force(ViscosityForce);
        registry.add_force(super::friction::RimFrictionForce);
        registry
    }

    pub fn add_force<F: BlobForce + 'static>(&mut self, force: F) {
        self.forces.push(Box::new(force));
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.forces.iter().map(|force| force.name())
    }

    pub fn apply_all(&self, blob: &mut Blob, ctx: &ForceContext<'_>) {
        for force in &self.forces {
            force.apply(blob, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blob::BlobGeometry;
    use approx::assert_relative_eq;

    fn blob() -> Blob {
        let geometry = BlobGeometry::new(160.0, 184.0, 80).expect("valid geometry");
        Blob::new(Vec2::new(400.0, 300.0), geometry, &SimulationConfig::new())
    }

    fn apply(force: &dyn BlobForce, blob: &mut Blob, config: &SimulationConfig) {
        let field = SignedDistanceField::default();
        let ctx = ForceContext {
            config,
            field: &field,
            dt: 1.0 / 60.0,
        };
        force.apply(blob, &ctx);
    }

    #[test]
    fn self_repulsion_is_zero_at_and_beyond_radius() {
        let a = Vec2::ZERO;
        assert_eq!(
            SelfRepulsionForce::pair_force(a, Vec2::new(10.0, 0.0), 10.0, 15_000.0, 6_000.0),
            Vec2::ZERO
        );
        assert_eq!(
            SelfRepulsionForce::pair_force(a, Vec2::new(0.0, 25.0), 10.0, 15_000.0, 6_000.0),
            Vec2::ZERO
        );
    }

    #[test]
    fn coincident_nodes_still_repel() {
        let at = Vec2::new(12.0, -4.0);
        let push = SelfRepulsionForce::pair_force(at, at, 10.0, 15_000.0, 6_000.0);
        assert!(push.length() > 0.0);
        assert_relative_eq!(push.length(), 6_000.0);
    }

    #[test]
    fn squeezed_neighbours_repel_below_rest_spacing() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        let rest = blob.rest_chord(2).expect("chord");
        assert!(rest < config.self_repel_radius_for(blob.thickness()));

        let a = Blob::outer_index(0);
        let b = Blob::outer_index(2);
        let midpoint = (blob.points[a].position + blob.points[b].position) * 0.5;
        blob.points[a].position = midpoint.lerp(blob.points[a].position, 0.5);
        blob.points[b].position = midpoint.lerp(blob.points[b].position, 0.5);

        apply(&SelfRepulsionForce, &mut blob, &config);
        let apart = blob.points[b].position - blob.points[a].position;
        assert!(blob.points[b].acceleration.dot(apart) > 0.0);
        assert!(blob.points[a].acceleration.dot(apart) < 0.0);
    }

    #[test]
    fn self_repulsion_pushes_apart_and_is_capped() {
        let push = SelfRepulsionForce::pair_force(
            Vec2::ZERO,
            Vec2::new(5.0, 0.0),
            10.0,
            15_000.0,
            6_000.0,
        );
        assert!(push.x > 0.0);
        assert!(push.length() <= 6_000.0);

        let gentle = SelfRepulsionForce::pair_force(Vec2::ZERO, Vec2::new(9.0, 0.0), 10.0, 100.0, 6_000.0);
        assert!(gentle.x > 0.0 && gentle.x < 100.0);
    }

    #[test]
    fn pressure_is_asymmetric() {
        let config = SimulationConfig::new();
        let compressed = PressureForce::pressure(90.0, 100.0, &config);
        let stretched = PressureForce::pressure(110.0, 100.0, &config);
        assert!(compressed > 0.0);
        assert!(stretched < 0.0);
        assert!(compressed.abs() > stretched.abs());
        assert_eq!(PressureForce::pressure(90.0, 0.0, &config), 0.0);
    }

    #[test]
    fn compressed_ring_is_pushed_outward() {
        let config = SimulationConfig::new().with_pressure_gain(1.0);
        let mut blob = blob();
        let hub = blob.hub().position;
        for point in &mut blob.points {
            point.position = hub + (point.position - hub) * 0.8;
        }
        apply(&PressureForce, &mut blob, &config);

        let outer = blob.points[Blob::outer_index(0)];
        assert!((outer.position - hub).dot(outer.acceleration) > 0.0);
    }

    #[test]
    fn rest_mesh_feels_no_shape_forces() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        for force in [
            &SpringNetworkForce as &dyn BlobForce,
            &PressureForce,
            &SelfRepulsionForce,
            &BendingForce,
        ] {
            apply(force, &mut blob, &config);
        }
        for point in &blob.points {
            assert_relative_eq!(point.acceleration.length(), 0.0, epsilon = 0.5);
        }
    }

    #[test]
    fn bending_ignores_rotation_and_resists_dents() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        let hub = blob.hub().position;
        let rotation = Vec2::from_angle(0.7);
        for point in &mut blob.points {
            point.position = hub + rotation.rotate(point.position - hub);
        }
        apply(&BendingForce, &mut blob, &config);
        for point in &blob.points {
            assert_relative_eq!(point.acceleration.length(), 0.0, epsilon = 0.5);
        }

        blob.clear_accelerations();
        let dented = Blob::outer_index(5);
        let inward = (hub - blob.points[dented].position).normalize();
        blob.points[dented].position += inward * 6.0;
        apply(&BendingForce, &mut blob, &config);
        assert!(blob.points[dented].acceleration.dot(inward) < 0.0);
    }

    #[test]
    fn viscosity_leaves_uniform_motion_alone() {
        let config = SimulationConfig::new();
        let mut blob = blob();
        for point in &mut blob.points {
            point.velocity = Vec2::new(3.0, -2.0);
        }
        apply(&ViscosityForce, &mut blob, &config);
        for point in &blob.points {
            assert_relative_eq!(point.velocity.x, 3.0, epsilon = 1e-5);
            assert_relative_eq!(point.velocity.y, -2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn standard_registry_order() {
        let names: Vec<_> = ForceRegistry::standard().names().collect();
        assert_eq!(
            names,
            [
                "gravity",
                "sdf_collision",
                "springs",
                "pressure",
                "self_repulsion",
                "bending",
                "viscosity",
                "rim_friction"
            ]
        );
    }
}
