//! Axis-aligned bounding box primitive
//!
//! Shared by render bounds, octree nodes, and the physics broad phase.

use crate::foundation::math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
///
/// Invariant: `min <= max` componentwise. A degenerate box (`min == max`)
/// is a valid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner of the box
    pub min: Vec3,
    /// Maximum corner of the box
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a new box from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box centered at a point with given half extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// A degenerate box at a single point
    pub fn point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half extents of the box
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check the `min <= max` invariant
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Check whether the box has zero volume
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this box fully contains another box
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this box intersects another box
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Closest point to `p` on or inside the box
    pub fn clamp_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Center of the overlap region with another box
    ///
    /// Only meaningful when the boxes intersect.
    pub fn intersection_center(&self, other: &BoundingBox) -> Vec3 {
        let lo = Vec3::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        );
        let hi = Vec3::new(
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        );
        (lo + hi) * 0.5
    }

    /// Smallest box enclosing both boxes
    pub fn merged(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Vec3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Vec3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Transform this box by a matrix and re-wrap the result
    ///
    /// Transforms all eight corners and takes the axis-aligned hull, so the
    /// result is conservative under rotation.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        let corners = self.corners();
        let first = crate::foundation::math::transform_point(matrix, corners[0]);
        let mut out = BoundingBox::point(first);
        for corner in &corners[1..] {
            let p = crate::foundation::math::transform_point(matrix, *corner);
            out = out.merged(&BoundingBox::point(p));
        }
        out
    }

    /// Test ray intersection with this box using the slab method
    ///
    /// Returns the distance to the entry point if the ray intersects, None
    /// otherwise. A ray starting inside the box reports distance 0.
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x != 0.0 { 1.0 / ray_dir.x } else { f32::INFINITY },
            if ray_dir.y != 0.0 { 1.0 / ray_dir.y } else { f32::INFINITY },
            if ray_dir.z != 0.0 { 1.0 / ray_dir.z } else { f32::INFINITY },
        );

        let t1 = (self.min.x - ray_origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray_origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray_origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray_origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray_origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray_origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Outward surface normal at a point assumed to lie on the box surface
    ///
    /// Picks the face the point is closest to; used to report raycast hit
    /// normals.
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        let center = self.center();
        let half = self.half_extents();
        let local = point - center;

        // Relative distance to each face pair; largest wins
        let dx = if half.x > 0.0 { (local.x / half.x).abs() } else { 0.0 };
        let dy = if half.y > 0.0 { (local.y / half.y).abs() } else { 0.0 };
        let dz = if half.z > 0.0 { (local.z / half.z).abs() } else { 0.0 };

        if dx >= dy && dx >= dz {
            Vec3::new(local.x.signum(), 0.0, 0.0)
        } else if dy >= dz {
            Vec3::new(0.0, local.y.signum(), 0.0)
        } else {
            Vec3::new(0.0, 0.0, local.z.signum())
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::from_center_half_extents(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn contains_and_intersects() {
        let a = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let b = BoundingBox::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let c = BoundingBox::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(a.contains_point(Vec3::new(1.0, 1.0, 1.0)));
        assert!(!a.contains_point(Vec3::new(2.5, 0.0, 0.0)));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn degenerate_point_box_is_valid() {
        let p = BoundingBox::point(Vec3::new(1.0, 2.0, 3.0));
        assert!(p.is_valid());
        assert!(p.is_degenerate());
        assert!(p.contains_point(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn slab_ray_hit_and_miss() {
        let unit = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        let hit = unit.intersect_ray(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(hit.is_some());
        assert_relative_eq!(hit.unwrap(), 9.0, epsilon = 1e-4);

        let miss = unit.intersect_ray(Vec3::new(5.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(miss.is_none());
    }

    #[test]
    fn ray_from_inside_reports_zero() {
        let unit = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let hit = unit.intersect_ray(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(hit, Some(0.0));
    }

    #[test]
    fn transformed_box_is_conservative_hull() {
        let unit = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let moved = unit.transformed(&Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(moved.center(), Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(moved.half_extents(), Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn face_normal_lookup() {
        let unit = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(
            unit.normal_at(Vec3::new(0.0, 0.0, -1.0)),
            Vec3::new(0.0, 0.0, -1.0),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            unit.normal_at(Vec3::new(1.0, 0.2, 0.2)),
            Vec3::new(1.0, 0.0, 0.0),
            epsilon = 1e-6
        );
    }
}
