//! Narrow-phase contact generation
//!
//! Exact shape-vs-shape tests for the pairs that survive the broad phase.
//! Boxes are treated as axis-aligned in world space; rotation affects
//! only the body's bounding volume, not its contact geometry.

use crate::foundation::math::Vec3;
use crate::physics::shape::CollisionShape;
use crate::scene::{BoundingBox, EntityId};

/// Single contact between two bodies
///
/// The normal points from `a` toward `b`; resolving along it separates
/// the pair.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// First body
    pub a: EntityId,
    /// Second body
    pub b: EntityId,
    /// Unit separation direction from `a` toward `b`
    pub normal: Vec3,
    /// Overlap depth along the normal
    pub penetration: f32,
    /// Approximate world-space contact point
    pub point: Vec3,
}

/// Sphere vs sphere: overlap when center distance < radius sum
pub fn sphere_sphere(
    center_a: Vec3,
    radius_a: f32,
    center_b: Vec3,
    radius_b: f32,
) -> Option<(Vec3, f32, Vec3)> {
    let delta = center_b - center_a;
    let distance_sq = delta.norm_squared();
    let radius_sum = radius_a + radius_b;
    if distance_sq >= radius_sum * radius_sum {
        return None;
    }

    let distance = distance_sq.sqrt();
    // Coincident centers have no meaningful direction; fall back to +Y
    let normal = if distance > 1e-6 {
        delta / distance
    } else {
        Vec3::y()
    };
    let penetration = radius_sum - distance;
    let point = center_a + normal * radius_a;
    Some((normal, penetration, point))
}

/// Sphere vs axis-aligned box: clamp the center to the box, then test
/// the clamped point as a distance problem
pub fn sphere_box(
    center: Vec3,
    radius: f32,
    bounds: &BoundingBox,
) -> Option<(Vec3, f32, Vec3)> {
    let closest = bounds.clamp_point(center);
    let delta = closest - center;
    let distance_sq = delta.norm_squared();
    if distance_sq >= radius * radius {
        return None;
    }

    if distance_sq > 1e-12 {
        let distance = distance_sq.sqrt();
        let normal = delta / distance;
        Some((normal, radius - distance, closest))
    } else {
        // Center is inside the box: push out along the closest face
        let normal = bounds.normal_at(center);
        let face_distance = (bounds.half_extents() - (center - bounds.center()).abs()).min();
        Some((normal, radius + face_distance, center))
    }
}

/// Box vs box: axis-aligned overlap, resolved along the axis of
/// minimum penetration
pub fn box_box(bounds_a: &BoundingBox, bounds_b: &BoundingBox) -> Option<(Vec3, f32, Vec3)> {
    let center_a = bounds_a.center();
    let center_b = bounds_b.center();
    let delta = center_b - center_a;
    let overlap = bounds_a.half_extents() + bounds_b.half_extents()
        - Vec3::new(delta.x.abs(), delta.y.abs(), delta.z.abs());

    if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
        return None;
    }

    let (axis, penetration) = if overlap.x <= overlap.y && overlap.x <= overlap.z {
        (Vec3::x(), overlap.x)
    } else if overlap.y <= overlap.z {
        (Vec3::y(), overlap.y)
    } else {
        (Vec3::z(), overlap.z)
    };

    let normal = if axis.dot(&delta) >= 0.0 { axis } else { -axis };
    // Midpoint of the overlap region is a reasonable single contact point
    let point = bounds_a.intersection_center(bounds_b);
    Some((normal, penetration, point))
}

/// Dispatch the exact test for a shape pair
///
/// Positions and scales come from the owning entities' transforms.
pub fn test_pair(
    a: EntityId,
    shape_a: &CollisionShape,
    position_a: Vec3,
    scale_a: Vec3,
    b: EntityId,
    shape_b: &CollisionShape,
    position_b: Vec3,
    scale_b: Vec3,
) -> Option<Contact> {
    let result = match (shape_a, shape_b) {
        (CollisionShape::Sphere { radius: ra }, CollisionShape::Sphere { radius: rb }) => {
            sphere_sphere(
                position_a,
                CollisionShape::scaled_radius(*ra, scale_a),
                position_b,
                CollisionShape::scaled_radius(*rb, scale_b),
            )
        }
        (CollisionShape::Sphere { radius }, CollisionShape::Box { .. }) => sphere_box(
            position_a,
            CollisionShape::scaled_radius(*radius, scale_a),
            &shape_b.world_bounds(position_b, scale_b),
        ),
        (CollisionShape::Box { .. }, CollisionShape::Sphere { radius }) => sphere_box(
            position_b,
            CollisionShape::scaled_radius(*radius, scale_b),
            &shape_a.world_bounds(position_a, scale_a),
        )
        // Flip: the sphere test reports sphere-to-box, we need a-to-b
        .map(|(normal, penetration, point)| (-normal, penetration, point)),
        (CollisionShape::Box { .. }, CollisionShape::Box { .. }) => box_box(
            &shape_a.world_bounds(position_a, scale_a),
            &shape_b.world_bounds(position_b, scale_b),
        ),
    };

    result.map(|(normal, penetration, point)| Contact {
        a,
        b,
        normal,
        penetration,
        point,
    })
}
