//! Scene: entity storage, hierarchy, systems, and queries
//!
//! The scene owns every entity and coordinates the per-frame pipeline:
//! scheduled systems run in priority order, transforms are flushed, and
//! the spatial index is rebuilt so queries reflect the finished frame.

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::foundation::logging::{debug, warn};
use crate::foundation::math::Vec3;
use crate::physics::shape::ray_sphere;
use crate::physics::{CollisionEvent, CollisionShape, PhysicsStats, PhysicsSystem};
use crate::scene::component::{
    ComponentData, ComponentKind, PhysicsComponent, RenderComponent, TransformComponent,
};
use crate::scene::events::{EventArg, EventBus, EventData, EventListener};
use crate::scene::scheduler::{priority, SystemId, SystemScheduler, SystemStage};
use crate::scene::transform_system;
use crate::scene::{BoundingBox, Entity, EntityId};
use crate::spatial::Octree;
use std::collections::HashMap;

/// Event name dispatched when two bodies come into contact
pub const EVENT_COLLISION_ENTER: &str = "collision_enter";
/// Event name dispatched when two bodies separate
pub const EVENT_COLLISION_EXIT: &str = "collision_exit";

/// Result of a successful raycast
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// Entity that was hit
    pub entity: EntityId,
    /// Distance from the ray origin to the hit point
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Outward surface normal at the hit point
    pub normal: Vec3,
}

/// Entity container and frame driver
pub struct Scene {
    config: SceneConfig,
    pub(crate) entities: HashMap<EntityId, Entity>,
    roots: Vec<EntityId>,
    next_entity_id: u64,
    octree: Octree,
    physics: PhysicsSystem,
    scheduler: SystemScheduler,
    events: EventBus,
    transform_system: SystemId,
    physics_system: SystemId,
}

impl Scene {
    /// Create a scene with default configuration
    pub fn new() -> Self {
        // Defaults are known-valid, no fallible path here
        Self::from_config(SceneConfig::default())
    }

    /// Create a scene from a validated configuration
    pub fn with_config(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: SceneConfig) -> Self {
        let octree = Octree::new(config.world_bounds, &config.octree);
        let physics = PhysicsSystem::new(config.physics.clone());

        let mut scheduler = SystemScheduler::new();
        let transform_system =
            scheduler.add("transforms", priority::TRANSFORM, SystemStage::Transforms);
        let physics_system = scheduler.add("physics", priority::PHYSICS, SystemStage::Physics);

        Self {
            config,
            entities: HashMap::new(),
            roots: Vec::new(),
            next_entity_id: 0,
            octree,
            physics,
            scheduler,
            events: EventBus::new(),
            transform_system,
            physics_system,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    // ---- entities and hierarchy ----

    /// Create a root entity with a default transform attached
    ///
    /// Ids are monotonically increasing and never reused within a session.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.next_entity_id += 1;
        let id = EntityId(self.next_entity_id);
        let mut entity = Entity::new(id, name);
        entity.components.insert(
            ComponentKind::Transform,
            TransformComponent::default().into_component(),
        );
        self.entities.insert(id, entity);
        self.roots.push(id);
        id
    }

    /// Destroy an entity and its whole subtree
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), SceneError> {
        if !self.entities.contains_key(&id) {
            return Err(SceneError::EntityNotFound(id));
        }

        // Collect the subtree before touching the map
        let mut doomed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(entity) = self.entities.get(&current) {
                stack.extend(entity.children.iter().copied());
                doomed.push(current);
            }
        }

        // Detach the subtree root from its parent or the root list
        match self.entities.get(&id).and_then(|entity| entity.parent) {
            Some(parent) => {
                if let Some(parent) = self.entities.get_mut(&parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        debug!("destroying entity {:?} and {} descendants", id, doomed.len() - 1);
        for id in doomed {
            self.entities.remove(&id);
        }
        Ok(())
    }

    /// Look up an entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Whether an entity is alive
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Root entities in creation order
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Rename an entity
    pub fn set_name(&mut self, id: EntityId, name: impl Into<String>) -> Result<(), SceneError> {
        let entity = self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))?;
        entity.name = name.into();
        Ok(())
    }

    /// Re-tag an entity
    pub fn set_tag(&mut self, id: EntityId, tag: impl Into<String>) -> Result<(), SceneError> {
        let entity = self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))?;
        entity.tag = tag.into();
        Ok(())
    }

    /// Re-parent an entity, or make it a root with `None`
    ///
    /// The local transform is kept as-is, so the world placement changes.
    /// Parenting an entity under its own descendant is rejected.
    pub fn set_parent(
        &mut self,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), SceneError> {
        if !self.entities.contains_key(&child) {
            return Err(SceneError::EntityNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.entities.contains_key(&parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
            // Walk the ancestor chain of the new parent; finding the child
            // there (or the child itself) would close a cycle
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    return Err(SceneError::CycleDetected { child, parent });
                }
                cursor = self.entities.get(&current).and_then(|entity| entity.parent);
            }
        }

        // Detach from the old location
        let old_parent = self.entities.get(&child).and_then(|entity| entity.parent);
        match old_parent {
            Some(old) => {
                if let Some(old) = self.entities.get_mut(&old) {
                    old.children.retain(|c| *c != child);
                }
            }
            None => self.roots.retain(|root| *root != child),
        }

        // Attach to the new one
        match parent {
            Some(parent) => {
                if let Some(parent) = self.entities.get_mut(&parent) {
                    parent.children.push(child);
                }
            }
            None => self.roots.push(child),
        }
        if let Some(entity) = self.entities.get_mut(&child) {
            entity.parent = parent;
            // World placement changed even though the local values did not
            if let Some(transform) = entity
                .components
                .get_mut(&ComponentKind::Transform)
                .and_then(TransformComponent::from_component_mut)
            {
                transform.dirty = true;
            }
        }
        Ok(())
    }

    /// First entity with the given name, lowest id wins
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.name == name)
            .map(|entity| entity.id)
            .min()
    }

    /// All entities with the given tag, in id order
    pub fn find_by_tag(&self, tag: &str) -> Vec<EntityId> {
        let mut found: Vec<_> = self
            .entities
            .values()
            .filter(|entity| entity.tag == tag)
            .map(|entity| entity.id)
            .collect();
        found.sort_unstable();
        found
    }

    // ---- components ----

    /// Attach a component, replacing any existing one of the same kind
    pub fn add_component<T: ComponentData>(
        &mut self,
        id: EntityId,
        data: T,
    ) -> Result<(), SceneError> {
        let entity = self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))?;
        entity.components.insert(T::KIND, data.into_component());
        Ok(())
    }

    /// Borrow a component
    pub fn get_component<T: ComponentData>(&self, id: EntityId) -> Option<&T> {
        self.entities
            .get(&id)?
            .components
            .get(&T::KIND)
            .and_then(T::from_component)
    }

    /// Mutably borrow a component
    pub fn get_component_mut<T: ComponentData>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(&id)?
            .components
            .get_mut(&T::KIND)
            .and_then(T::from_component_mut)
    }

    /// Detach and return a component
    pub fn remove_component<T: ComponentData>(&mut self, id: EntityId) -> Result<T, SceneError> {
        let entity = self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))?;
        entity
            .components
            .remove(&T::KIND)
            .and_then(T::from_component_owned)
            .ok_or(SceneError::ComponentMissing(id, T::NAME))
    }

    // ---- events ----

    /// Register a listener for a named event
    pub fn add_event_listener(&mut self, event_name: impl Into<String>, listener: EventListener) {
        self.events.add_listener(event_name, listener);
    }

    /// Dispatch an event synchronously; returns the number of listeners run
    pub fn dispatch_event(&mut self, event_name: &str, data: &EventData) -> usize {
        self.events.dispatch(event_name, data)
    }

    // ---- systems ----

    /// Schedule a per-frame callback at the given priority
    ///
    /// Lower priorities run earlier; ties run in registration order. The
    /// built-in passes run at [`priority::TRANSFORM`] and
    /// [`priority::PHYSICS`].
    pub fn add_system(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        system: impl FnMut(&mut Scene, f32) + 'static,
    ) -> SystemId {
        self.scheduler.add(name, priority, SystemStage::Callback(Box::new(system)))
    }

    /// Enable or disable a scheduled system
    pub fn set_system_enabled(&mut self, id: SystemId, enabled: bool) -> bool {
        self.scheduler.set_enabled(id, enabled)
    }

    /// Remove a scheduled system; the built-in passes can be removed too
    pub fn remove_system(&mut self, id: SystemId) -> bool {
        self.scheduler.remove(id)
    }

    /// Id of the built-in transform propagation pass
    pub fn transform_system_id(&self) -> SystemId {
        self.transform_system
    }

    /// Id of the built-in physics pass
    pub fn physics_system_id(&self) -> SystemId {
        self.physics_system
    }

    // ---- frame ----

    /// Advance the scene by one frame
    ///
    /// Runs every enabled system in priority order with the time-scaled
    /// delta, flushes transforms dirtied by those systems, and rebuilds
    /// the spatial index.
    pub fn update(&mut self, dt: f32) {
        let scaled = dt * self.config.time_scale;

        // The scheduler leaves `self` while its callbacks borrow the scene;
        // systems registered during the frame land in the fresh default
        // and are absorbed afterwards.
        let mut scheduler = std::mem::take(&mut self.scheduler);
        for slot in scheduler.slots.iter_mut() {
            if !slot.enabled {
                continue;
            }
            match &mut slot.stage {
                SystemStage::Transforms => {
                    transform_system::propagate(&mut self.entities, &self.roots);
                }
                SystemStage::Physics => {
                    let events = self.physics.step(&mut self.entities, scaled);
                    self.dispatch_collision_events(events);
                }
                SystemStage::Callback(callback) => callback(self, scaled),
            }
        }
        scheduler.absorb(std::mem::take(&mut self.scheduler));
        self.scheduler = scheduler;

        // Physics and late systems dirty transforms after the transform
        // pass ran; flush so queries see finished world placement
        transform_system::propagate(&mut self.entities, &self.roots);
        self.rebuild_octree();
    }

    fn dispatch_collision_events(&mut self, events: Vec<CollisionEvent>) {
        for event in events {
            match event {
                CollisionEvent::Started { a, b, normal, penetration, point } => {
                    let data = EventData::new()
                        .with_arg("a", EventArg::Entity(a))
                        .with_arg("b", EventArg::Entity(b))
                        .with_arg("normal", EventArg::Vector(normal))
                        .with_arg("penetration", EventArg::Float(penetration))
                        .with_arg("point", EventArg::Vector(point));
                    self.events.dispatch(EVENT_COLLISION_ENTER, &data);
                }
                CollisionEvent::Stopped { a, b } => {
                    let data = EventData::new()
                        .with_arg("a", EventArg::Entity(a))
                        .with_arg("b", EventArg::Entity(b));
                    self.events.dispatch(EVENT_COLLISION_EXIT, &data);
                }
            }
        }
    }

    /// Counters from the most recent physics step
    pub fn physics_stats(&self) -> PhysicsStats {
        self.physics.stats()
    }

    /// Whether two bodies were in contact after the most recent frame
    pub fn in_contact(&self, a: EntityId, b: EntityId) -> bool {
        self.physics.in_contact(a, b)
    }

    // ---- spatial queries ----

    /// World bounds used for spatial queries, best available per entity
    fn query_bounds(entity: &Entity) -> Option<BoundingBox> {
        if let Some(render) = entity
            .components
            .get(&ComponentKind::Render)
            .and_then(RenderComponent::from_component)
        {
            return Some(render.world_bounds);
        }
        let transform = entity
            .components
            .get(&ComponentKind::Transform)
            .and_then(TransformComponent::from_component)?;
        if let Some(physics) = entity
            .components
            .get(&ComponentKind::Physics)
            .and_then(PhysicsComponent::from_component)
        {
            return Some(physics.shape.world_bounds(transform.world_position(), transform.scale));
        }
        Some(BoundingBox::point(transform.world_position()))
    }

    fn rebuild_octree(&mut self) {
        self.octree.clear();
        for entity in self.entities.values() {
            if let Some(bounds) = Self::query_bounds(entity) {
                if !self.octree.insert(entity.id, bounds) {
                    warn!("entity {:?} is outside the world bounds", entity.id);
                }
            }
        }
    }

    /// Spatial index over the scene as of the last [`update`](Self::update)
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    /// Entities whose bounds intersect the region
    ///
    /// Backed by the octree built at the end of the last update; candidate
    /// node hits are re-tested against exact entity bounds.
    pub fn query_region(&self, region: &BoundingBox) -> Vec<EntityId> {
        self.octree
            .query(region)
            .into_iter()
            .filter(|id| {
                self.entities
                    .get(id)
                    .and_then(Self::query_bounds)
                    .is_some_and(|bounds| bounds.intersects(region))
            })
            .collect()
    }

    /// Closest entity hit by a ray within `max_distance`, if any
    ///
    /// Boxes are tested against their world-space bounds; entities with a
    /// spherical physics shape are refined to an exact sphere hit.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let mut best: Option<RaycastHit> = None;

        for id in self.octree.query_ray(origin, direction) {
            let Some(entity) = self.entities.get(&id) else { continue };

            let hit = match sphere_of(entity) {
                Some((center, radius)) => ray_sphere(origin, direction, center, radius)
                    .map(|(distance, point, normal)| RaycastHit { entity: id, distance, point, normal }),
                None => Self::query_bounds(entity).and_then(|bounds| {
                    bounds.intersect_ray(origin, direction).map(|distance| {
                        let point = origin + direction * distance;
                        RaycastHit {
                            entity: id,
                            distance,
                            point,
                            normal: bounds.normal_at(point),
                        }
                    })
                }),
            };

            if let Some(hit) = hit {
                if hit.distance <= max_distance
                    && best.as_ref().map_or(true, |b| hit.distance < b.distance)
                {
                    best = Some(hit);
                }
            }
        }
        best
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// World-space sphere for entities with a spherical physics shape
fn sphere_of(entity: &Entity) -> Option<(Vec3, f32)> {
    let transform = entity
        .components
        .get(&ComponentKind::Transform)
        .and_then(TransformComponent::from_component)?;
    let physics = entity
        .components
        .get(&ComponentKind::Physics)
        .and_then(PhysicsComponent::from_component)?;
    match physics.shape {
        CollisionShape::Sphere { radius } => Some((
            transform.world_position(),
            CollisionShape::scaled_radius(radius, transform.scale),
        )),
        CollisionShape::Box { .. } => None,
    }
}
