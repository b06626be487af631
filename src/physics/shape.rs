//! Collision shape primitives
//!
//! Shapes are stored in model space; the physics pipeline transforms them
//! to world space on demand using the owning entity's transform.

use crate::foundation::math::Vec3;
use crate::scene::BoundingBox;

/// Collision shape attached to a physics body (model space)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    /// Spherical shape; position comes from the entity transform
    Sphere {
        /// Sphere radius before scaling
        radius: f32,
    },
    /// Axis-aligned box shape; position comes from the entity transform
    Box {
        /// Half extents along each axis before scaling
        half_extents: Vec3,
    },
}

impl CollisionShape {
    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half extents
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    /// Sphere radius scaled by the largest scale component
    ///
    /// Non-uniform scale cannot be represented by a sphere, so the largest
    /// component wins (conservative).
    pub fn scaled_radius(radius: f32, scale: Vec3) -> f32 {
        radius * scale.x.max(scale.y).max(scale.z)
    }

    /// World-space bounding box for this shape at a position with scale
    pub fn world_bounds(&self, position: Vec3, scale: Vec3) -> BoundingBox {
        match self {
            Self::Sphere { radius } => {
                let r = Self::scaled_radius(*radius, scale);
                BoundingBox::from_center_half_extents(position, Vec3::new(r, r, r))
            }
            Self::Box { half_extents } => {
                BoundingBox::from_center_half_extents(position, half_extents.component_mul(&scale))
            }
        }
    }
}

/// Exact ray/sphere intersection
///
/// Returns (distance, hit point, outward normal) for the closest positive
/// intersection, None if the ray misses or points away.
pub fn ray_sphere(
    ray_origin: Vec3,
    ray_dir: Vec3,
    center: Vec3,
    radius: f32,
) -> Option<(f32, Vec3, Vec3)> {
    let oc = ray_origin - center;

    // Solve |origin + t*dir - center|^2 = radius^2
    let a = ray_dir.dot(&ray_dir);
    let b = 2.0 * oc.dot(&ray_dir);
    let c = oc.dot(&oc) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = (-b - sqrt_d) / (2.0 * a);
    let t2 = (-b + sqrt_d) / (2.0 * a);

    let t = if t1 > 0.0 {
        t1
    } else if t2 > 0.0 {
        t2
    } else {
        return None;
    };

    let hit = ray_origin + ray_dir * t;
    let normal = (hit - center).normalize();
    Some((t, hit, normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sphere_world_bounds_use_max_scale() {
        let shape = CollisionShape::sphere(2.0);
        let bounds = shape.world_bounds(Vec3::zeros(), Vec3::new(1.0, 3.0, 1.0));
        assert_relative_eq!(bounds.half_extents(), Vec3::new(6.0, 6.0, 6.0), epsilon = 1e-6);
    }

    #[test]
    fn box_world_bounds_scale_per_axis() {
        let shape = CollisionShape::cuboid(Vec3::new(1.0, 2.0, 3.0));
        let bounds = shape.world_bounds(Vec3::new(5.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert_relative_eq!(bounds.center(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(bounds.half_extents(), Vec3::new(2.0, 2.0, 3.0), epsilon = 1e-6);
    }

    #[test]
    fn ray_sphere_head_on() {
        let hit = ray_sphere(
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::zeros(),
            1.0,
        );
        let (t, point, normal) = hit.unwrap();
        assert_relative_eq!(t, 9.0, epsilon = 1e-5);
        assert_relative_eq!(point, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
        assert_relative_eq!(normal, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn ray_sphere_pointing_away_misses() {
        let hit = ray_sphere(
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::zeros(),
            1.0,
        );
        assert!(hit.is_none());
    }
}
