//! Hierarchical transform propagation
//!
//! Depth-first pass over the scene hierarchy, roots first. A transform is
//! recomputed when its own dirty flag is set or any ancestor was
//! recomputed this pass, so a parent move carries its whole subtree.
//! Cached values derived from the world matrix (render bounds, camera
//! view, light direction) are refreshed in the same pass.

use crate::foundation::math::{Mat4, Vec3};
use crate::scene::component::{
    CameraComponent, ComponentData, ComponentKind, LightComponent, RenderComponent,
    TransformComponent,
};
use crate::scene::{Entity, EntityId};
use std::collections::HashMap;

/// Propagate world transforms through the hierarchy
///
/// Returns the number of transforms recomputed.
pub fn propagate(entities: &mut HashMap<EntityId, Entity>, roots: &[EntityId]) -> usize {
    let mut recomputed = 0;
    // (entity, parent world matrix, ancestor recomputed this pass)
    let mut stack: Vec<(EntityId, Mat4, bool)> = roots
        .iter()
        .rev()
        .map(|id| (*id, Mat4::identity(), false))
        .collect();

    while let Some((id, parent_world, ancestor_dirty)) = stack.pop() {
        let Some(entity) = entities.get_mut(&id) else { continue };
        let children = entity.children.clone();

        // No transform: the subtree inherits the parent's frame untouched
        let mut world = parent_world;
        let mut refreshed = ancestor_dirty;

        if let Some(transform) = entity
            .components
            .get_mut(&ComponentKind::Transform)
            .and_then(TransformComponent::from_component_mut)
        {
            let self_dirty = transform.dirty;
            if self_dirty {
                transform.recompute_local();
            }
            refreshed = self_dirty || ancestor_dirty;
            if refreshed {
                transform.world_matrix = parent_world * transform.local_matrix;
                transform.dirty = false;
                recomputed += 1;
            }
            world = transform.world_matrix;
        }
        if refreshed {
            refresh_derived(entity, &world);
        }

        for child in children.into_iter().rev() {
            stack.push((child, world, refreshed));
        }
    }

    recomputed
}

/// Refresh the caches that depend on an entity's world matrix
fn refresh_derived(entity: &mut Entity, world: &Mat4) {
    if let Some(render) = entity
        .components
        .get_mut(&ComponentKind::Render)
        .and_then(RenderComponent::from_component_mut)
    {
        render.world_bounds = render.local_bounds.transformed(world);
    }

    if let Some(camera) = entity
        .components
        .get_mut(&ComponentKind::Camera)
        .and_then(CameraComponent::from_component_mut)
    {
        camera.view_matrix = world.try_inverse().unwrap_or_else(Mat4::identity);
    }

    if let Some(light) = entity
        .components
        .get_mut(&ComponentKind::Light)
        .and_then(LightComponent::from_component_mut)
    {
        let forward = world.transform_vector(&Vec3::new(0.0, 0.0, -1.0));
        light.direction = forward.try_normalize(1e-6).unwrap_or_else(|| Vec3::new(0.0, 0.0, -1.0));
    }
}
