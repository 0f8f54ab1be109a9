use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::{point::Point, spring::Spring};
use crate::{
    config::{SimulationConfig, MIN_BLOB_MASS, MIN_VERTEX_COUNT},
    error::GeometryError,
    utils::{
        allocator::Handle,
        math::{centroid, point_in_polygon, polygon_signed_area, ring_inward_normal, ring_laplacian},
    },
};

/// Stable handle of a blob inside the world.
pub type BlobId = Handle<Blob>;

/// Validated ring dimensions of a blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlobGeometry {
    inner_radius: f32,
    outer_radius: f32,
    vertex_count: usize,
}

impl BlobGeometry {
    pub fn new(
        inner_radius: f32,
        outer_radius: f32,
        vertex_count: usize,
    ) -> Result<Self, GeometryError> {
        let valid = |r: f32| r.is_finite() && r > 0.0;
        if !valid(inner_radius) || !valid(outer_radius) {
            return Err(GeometryError::InvalidRadius {
                inner: inner_radius,
                outer: outer_radius,
            });
        }
        if inner_radius >= outer_radius {
            return Err(GeometryError::InvertedRim {
                inner: inner_radius,
                outer: outer_radius,
            });
        }
        if vertex_count < MIN_VERTEX_COUNT {
            return Err(GeometryError::InsufficientVertices {
                count: vertex_count,
            });
        }
        Ok(Self {
            inner_radius,
            outer_radius,
            vertex_count,
        })
    }

    pub fn inner_radius(&self) -> f32 {
        self.inner_radius
    }

    pub fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn thickness(&self) -> f32 {
        self.outer_radius - self.inner_radius
    }

    pub fn with_vertex_count(self, vertex_count: usize) -> Result<Self, GeometryError> {
        Self::new(self.inner_radius, self.outer_radius, vertex_count)
    }

    pub fn with_inner_radius(self, inner_radius: f32) -> Result<Self, GeometryError> {
        Self::new(inner_radius, self.outer_radius, self.vertex_count)
    }

    /// Every dimension multiplied by `factor`, vertex count rounded and floored
    /// at [`MIN_VERTEX_COUNT`].
    pub fn scaled(self, factor: f32) -> Result<Self, GeometryError> {
        let vertex_count = ((self.vertex_count as f32 * factor).round() as usize).max(MIN_VERTEX_COUNT);
        Self::new(
            self.inner_radius * factor,
            self.outer_radius * factor,
            vertex_count,
        )
    }
}

/// Pressurised ring mesh: inner/outer node pairs plus one hub.
///
/// Layout of `points`: `2i` is the inner node of vertex `i`, `2i + 1` its
/// outer node and the last entry is the hub, so there are always
/// `2 * vertex_count + 1` points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
    pub id: BlobId,
    pub points: Vec<Point>,
    pub springs: Vec<Spring>,
    geometry: BlobGeometry,
    rest_outer_area: f32,
    /// Rest curvature of each outer vertex along its inward normal.
    rest_curvature: Vec<f32>,
    /// Rest distance between outer nodes, indexed by ring gap.
    rest_chords: Vec<f32>,
    /// Set on blobs produced by a split; they never split again.
    pub is_child: bool,
}

impl Blob {
    pub fn new(center: Vec2, geometry: BlobGeometry, config: &SimulationConfig) -> Self {
        let mut blob = Self {
            id: BlobId::default(),
            points: Vec::new(),
            springs: Vec::new(),
            geometry,
            rest_outer_area: 0.0,
            rest_curvature: Vec::new(),
            rest_chords: Vec::new(),
            is_child: false,
        };
        blob.build(center, config);
        blob
    }

    /// Same as [`Blob::new`] with every point moving at `velocity`.
    pub fn with_velocity(
        center: Vec2,
        velocity: Vec2,
        geometry: BlobGeometry,
        config: &SimulationConfig,
    ) -> Self {
        let mut blob = Self::new(center, geometry, config);
        for point in &mut blob.points {
            point.velocity = velocity;
        }
        blob
    }

    /// Regenerates points and springs around `center` and refreshes the rest shape.
    pub fn build(&mut self, center: Vec2, config: &SimulationConfig) {
        let n = self.geometry.vertex_count;
        let inner = self.geometry.inner_radius;
        let outer = self.geometry.outer_radius;

        self.points.clear();
        self.points.reserve(2 * n + 1);
        for i in 0..n {
            let angle = TAU * i as f32 / n as f32;
            let direction = Vec2::from_angle(angle);
            self.points.push(Point::new(center + direction * inner));
            self.points.push(Point::new(center + direction * outer));
        }
        self.points.push(Point::new(center));

        let ring = 2 * n;
        let hub = ring;
        let rim_k = config.rim_stiffness;
        self.springs.clear();
        self.springs.reserve(8 * n);
        for i in 0..n {
            let inner_i = 2 * i;
            let outer_i = 2 * i + 1;
            let inner_next = (2 * i + 2) % ring;
            let outer_next = (2 * i + 3) % ring;
            let outer_skip = 2 * ((i + 2) % n) + 1;

            let links = [
                (inner_i, outer_i, rim_k),
                (outer_i, inner_next, rim_k),
                (inner_i, outer_next, rim_k),
                (inner_i, inner_next, rim_k),
                (outer_i, outer_next, rim_k),
                (outer_i, outer_skip, config.bend_spring_stiffness),
                (inner_i, hub, config.spoke_stiffness),
                (outer_i, hub, config.spoke_stiffness),
            ];
            self.springs.extend(
                links
                    .iter()
                    .map(|&(a, b, k)| Spring::between(&self.points, a, b, k)),
            );
        }

        let outer_ring = self.outer_polygon();
        self.rest_outer_area = polygon_signed_area(&outer_ring);
        self.rest_curvature = (0..n)
            .map(|i| {
                let inward = ring_inward_normal(&outer_ring, i, self.rest_outer_area);
                ring_laplacian(&outer_ring, i).dot(inward)
            })
            .collect();
        self.rest_chords = (0..=n / 2)
            .map(|gap| outer_ring[0].distance(outer_ring[gap % n]))
            .collect();
    }

    /// Replaces the ring dimensions and rebuilds around the current hub.
    pub fn rebuild(&mut self, geometry: BlobGeometry, config: &SimulationConfig) {
        let center = self.hub().position;
        self.geometry = geometry;
        self.build(center, config);
    }

    pub fn geometry(&self) -> BlobGeometry {
        self.geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count
    }

    pub fn inner_radius(&self) -> f32 {
        self.geometry.inner_radius
    }

    pub fn outer_radius(&self) -> f32 {
        self.geometry.outer_radius
    }

    pub fn thickness(&self) -> f32 {
        self.geometry.thickness()
    }

    pub fn rest_outer_area(&self) -> f32 {
        self.rest_outer_area
    }

    /// Curvature outer vertex `vertex` had when the mesh was built.
    pub fn rest_curvature(&self, vertex: usize) -> f32 {
        self.rest_curvature.get(vertex).copied().unwrap_or(0.0)
    }

    /// Rest distance between two outer nodes `gap` steps apart along the ring.
    pub fn rest_chord(&self, gap: usize) -> Option<f32> {
        let n = self.geometry.vertex_count;
        if n == 0 {
            return None;
        }
        let gap = gap % n;
        self.rest_chords.get(gap.min(n - gap)).copied()
    }

    pub fn hub_index(&self) -> usize {
        self.points.len() - 1
    }

    pub fn hub(&self) -> &Point {
        &self.points[self.hub_index()]
    }

    pub fn hub_mut(&mut self) -> &mut Point {
        let index = self.hub_index();
        &mut self.points[index]
    }

    /// Number of rim nodes (inner and outer).
    pub fn ring_len(&self) -> usize {
        2 * self.geometry.vertex_count
    }

    pub fn outer_index(vertex: usize) -> usize {
        2 * vertex + 1
    }

    pub fn inner_index(vertex: usize) -> usize {
        2 * vertex
    }

    pub fn outer_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        (0..self.geometry.vertex_count).map(|i| self.points[Self::outer_index(i)].position)
    }

    pub fn outer_polygon(&self) -> Vec<Vec2> {
        self.outer_positions().collect()
    }

    /// Signed shoelace area of the outer ring.
    pub fn outer_area(&self) -> f32 {
        polygon_signed_area(&self.outer_polygon())
    }

    /// Mean position of every rim node (hub excluded).
    pub fn rim_centroid(&self) -> Vec2 {
        let ring = self.ring_len();
        centroid(self.points[..ring].iter().map(|p| p.position))
            .unwrap_or_else(|| self.hub().position)
    }

    pub fn mean_velocity(&self) -> Vec2 {
        centroid(self.points.iter().map(|p| p.velocity)).unwrap_or(Vec2::ZERO)
    }

    /// Whether `point` lies inside the outer ring polygon.
    pub fn contains(&self, point: Vec2) -> bool {
        point_in_polygon(point, &self.outer_polygon())
    }

    /// Effective mass used when the blob drags obstacles by friction.
    pub fn mass(&self, config: &SimulationConfig) -> f32 {
        (self.outer_area().abs() * config.blob_mass_per_area * config.density_scale)
            .max(MIN_BLOB_MASS)
    }

    pub fn clear_accelerations(&mut self) {
        for point in &mut self.points {
            point.acceleration = Vec2::ZERO;
        }
    }

    /// Translates every point; velocities are untouched.
    pub fn translate(&mut self, offset: Vec2) {
        for point in &mut self.points {
            point.position += offset;
        }
    }
}
