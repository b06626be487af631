//! Fixed-timestep rigid-body pipeline
//!
//! Runs once per frame from the scene scheduler. The frame delta is split
//! into fixed sub-steps; each sub-step integrates dynamic bodies with
//! semi-implicit Euler, finds contacts (AABB broad phase, exact narrow
//! phase), and resolves them with impulses plus positional correction.
//! Contact pairs are tracked across frames to report enter/exit.

use crate::config::PhysicsConfig;
use crate::foundation::logging::trace;
use crate::foundation::math::{Quat, Vec3};
use crate::physics::layers::CollisionLayers;
use crate::physics::narrow_phase::{self, Contact};
use crate::physics::shape::CollisionShape;
use crate::scene::component::{BodyKind, ComponentData, ComponentKind, PhysicsComponent, TransformComponent};
use crate::scene::{Entity, EntityId};
use std::collections::{HashMap, HashSet};

/// Penetration below this depth is left to settle on its own
const PENETRATION_SLOP: f32 = 0.01;

/// Velocities below this magnitude are treated as resting for restitution
const RESTITUTION_THRESHOLD: f32 = 0.5;

/// Contact lifecycle notification produced by a physics step
#[derive(Debug, Clone, Copy)]
pub enum CollisionEvent {
    /// A pair came into contact this frame
    Started {
        /// First body (lower id)
        a: EntityId,
        /// Second body
        b: EntityId,
        /// Contact normal from `a` toward `b`
        normal: Vec3,
        /// Overlap depth at detection
        penetration: f32,
        /// Approximate contact point
        point: Vec3,
    },
    /// A pair separated this frame
    Stopped {
        /// First body (lower id)
        a: EntityId,
        /// Second body
        b: EntityId,
    },
}

/// Counters from the most recent physics step
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsStats {
    /// Bodies considered this frame (awake, with transform and physics)
    pub bodies: usize,
    /// Sub-steps executed
    pub steps: u32,
    /// Pairs surviving the broad phase, summed over sub-steps
    pub broad_phase_pairs: usize,
    /// Contacts produced by the narrow phase, summed over sub-steps
    pub contacts: usize,
}

/// Working copy of one body for a simulation step
///
/// Snapshotting avoids aliasing the entity map while pairs are resolved;
/// results are written back once per frame.
struct BodySnapshot {
    id: EntityId,
    kind: BodyKind,
    inverse_mass: f32,
    position: Vec3,
    scale: Vec3,
    rotation: Quat,
    velocity: Vec3,
    angular_velocity: Vec3,
    force: Vec3,
    restitution: f32,
    friction: f32,
    drag: f32,
    shape: CollisionShape,
    is_trigger: bool,
    layer: CollisionLayers,
    mask: CollisionLayers,
}

impl BodySnapshot {
    fn moves(&self) -> bool {
        !matches!(self.kind, BodyKind::Static)
    }
}

/// Rigid-body simulation state that persists across frames
#[derive(Default)]
pub struct PhysicsSystem {
    config: PhysicsConfig,
    previous_pairs: HashSet<(EntityId, EntityId)>,
    current_pairs: HashSet<(EntityId, EntityId)>,
    stats: PhysicsStats,
}

impl PhysicsSystem {
    /// Create a physics system with the given configuration
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Counters from the most recent step
    pub fn stats(&self) -> PhysicsStats {
        self.stats
    }

    /// Whether a pair was in contact after the most recent step
    pub fn in_contact(&self, a: EntityId, b: EntityId) -> bool {
        self.previous_pairs.contains(&ordered(a, b))
    }

    /// Pairs in contact after the most recent step
    pub fn contact_pairs(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.previous_pairs.iter().copied()
    }

    /// Advance the simulation by a frame delta
    ///
    /// The delta is divided into at most `max_steps` sub-steps of roughly
    /// `fixed_dt` each; a small delta still runs a single step. Returns the
    /// contact lifecycle events for the frame.
    pub fn step(
        &mut self,
        entities: &mut HashMap<EntityId, Entity>,
        dt: f32,
    ) -> Vec<CollisionEvent> {
        self.stats = PhysicsStats::default();
        if dt <= 0.0 {
            return Vec::new();
        }

        let steps = ((dt / self.config.fixed_dt) as u32).clamp(1, self.config.max_steps.max(1));
        let step_dt = dt / steps as f32;
        self.stats.steps = steps;

        let mut bodies = snapshot_bodies(entities);
        self.stats.bodies = bodies.len();

        self.current_pairs.clear();
        let mut started = Vec::new();

        for _ in 0..steps {
            self.integrate(&mut bodies, step_dt);

            let pairs = self.broad_phase(&bodies);
            self.stats.broad_phase_pairs += pairs.len();

            for (i, j) in pairs {
                let contact = {
                    let (a, b) = (&bodies[i], &bodies[j]);
                    narrow_phase::test_pair(
                        a.id, &a.shape, a.position, a.scale, b.id, &b.shape, b.position, b.scale,
                    )
                };
                let Some(contact) = contact else { continue };
                self.stats.contacts += 1;

                let key = ordered(contact.a, contact.b);
                if self.current_pairs.insert(key) && !self.previous_pairs.contains(&key) {
                    started.push(CollisionEvent::Started {
                        a: key.0,
                        b: key.1,
                        normal: if key.0 == contact.a { contact.normal } else { -contact.normal },
                        penetration: contact.penetration,
                        point: contact.point,
                    });
                }

                // Triggers observe contacts without affecting motion
                if bodies[i].is_trigger || bodies[j].is_trigger {
                    continue;
                }
                resolve_contact(&mut bodies, i, j, &contact, self.config.position_correction);
            }
        }

        write_back(entities, &bodies);

        let mut events = started;
        for key in self.previous_pairs.difference(&self.current_pairs) {
            events.push(CollisionEvent::Stopped { a: key.0, b: key.1 });
        }
        std::mem::swap(&mut self.previous_pairs, &mut self.current_pairs);

        trace!(
            "physics: {} bodies, {} sub-steps, {} contacts",
            self.stats.bodies,
            self.stats.steps,
            self.stats.contacts
        );
        events
    }

    /// Semi-implicit Euler: velocity first, then position from the new velocity
    fn integrate(&self, bodies: &mut [BodySnapshot], step_dt: f32) {
        for body in bodies.iter_mut() {
            match body.kind {
                BodyKind::Static => continue,
                BodyKind::Kinematic => {
                    body.position += body.velocity * step_dt;
                }
                BodyKind::Dynamic => {
                    let mut acceleration = body.force * body.inverse_mass;
                    if self.config.gravity_enabled {
                        acceleration += self.config.gravity;
                    }
                    body.velocity += acceleration * step_dt;
                    if body.drag > 0.0 {
                        body.velocity *= 1.0 / (1.0 + body.drag * step_dt);
                    }
                    body.position += body.velocity * step_dt;
                }
            }

            let w = body.angular_velocity;
            if w.norm_squared() > 1e-12 {
                let spin = nalgebra::Quaternion::new(0.0, w.x, w.y, w.z)
                    * body.rotation.into_inner()
                    * (0.5 * step_dt);
                body.rotation = Quat::from_quaternion(body.rotation.into_inner() + spin);
            }
        }
    }

    /// All index pairs whose world bounds overlap and whose layers agree
    fn broad_phase(&self, bodies: &[BodySnapshot]) -> Vec<(usize, usize)> {
        let bounds: Vec<_> = bodies
            .iter()
            .map(|body| body.shape.world_bounds(body.position, body.scale))
            .collect();

        let mut pairs = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (a, b) = (&bodies[i], &bodies[j]);
                // Two immovable bodies have nothing to resolve or report
                if !a.moves() && !b.moves() {
                    continue;
                }
                if !CollisionLayers::should_collide(a.layer, a.mask, b.layer, b.mask) {
                    continue;
                }
                if bounds[i].intersects(&bounds[j]) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

fn ordered(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Collect awake bodies that carry both a transform and physics state
fn snapshot_bodies(entities: &HashMap<EntityId, Entity>) -> Vec<BodySnapshot> {
    let mut bodies: Vec<_> = entities
        .values()
        .filter_map(|entity| {
            let transform = entity
                .components
                .get(&ComponentKind::Transform)
                .and_then(TransformComponent::from_component)?;
            let physics = entity
                .components
                .get(&ComponentKind::Physics)
                .and_then(PhysicsComponent::from_component)?;
            if physics.sleeping {
                return None;
            }
            Some(BodySnapshot {
                id: entity.id,
                kind: physics.kind,
                inverse_mass: physics.inverse_mass(),
                position: transform.position,
                scale: transform.scale,
                rotation: transform.rotation,
                velocity: physics.velocity,
                angular_velocity: physics.angular_velocity,
                force: physics.force,
                restitution: physics.restitution,
                friction: physics.friction,
                drag: physics.drag,
                shape: physics.shape,
                is_trigger: physics.is_trigger,
                layer: physics.layer,
                mask: physics.mask,
            })
        })
        .collect();
    // Deterministic iteration regardless of map order
    bodies.sort_by_key(|body| body.id);
    bodies
}

/// Impulse response with friction, then positional correction
fn resolve_contact(
    bodies: &mut [BodySnapshot],
    i: usize,
    j: usize,
    contact: &Contact,
    correction_factor: f32,
) {
    let inv_a = bodies[i].inverse_mass;
    let inv_b = bodies[j].inverse_mass;
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let normal = contact.normal;
    let relative = bodies[j].velocity - bodies[i].velocity;
    let along_normal = relative.dot(&normal);

    if along_normal < 0.0 {
        // Restitution only for impacts fast enough to visibly bounce
        let restitution = if -along_normal > RESTITUTION_THRESHOLD {
            bodies[i].restitution.min(bodies[j].restitution)
        } else {
            0.0
        };

        let impulse = -(1.0 + restitution) * along_normal / inv_sum;
        let impulse_vec = normal * impulse;
        bodies[i].velocity -= impulse_vec * inv_a;
        bodies[j].velocity += impulse_vec * inv_b;

        // Coulomb friction along the tangent, clamped by the normal impulse
        let relative = bodies[j].velocity - bodies[i].velocity;
        let tangent = relative - normal * relative.dot(&normal);
        let tangent_speed = tangent.norm();
        if tangent_speed > 1e-6 {
            let tangent_dir = tangent / tangent_speed;
            let friction = (bodies[i].friction + bodies[j].friction) * 0.5;
            let jt = (-relative.dot(&tangent_dir) / inv_sum).clamp(
                -friction * impulse,
                friction * impulse,
            );
            let friction_vec = tangent_dir * jt;
            bodies[i].velocity -= friction_vec * inv_a;
            bodies[j].velocity += friction_vec * inv_b;
        }
    }

    // Baumgarte-style positional correction keeps stacks from sinking
    let depth = (contact.penetration - PENETRATION_SLOP).max(0.0);
    if depth > 0.0 {
        let correction = normal * (depth * correction_factor / inv_sum);
        bodies[i].position -= correction * inv_a;
        bodies[j].position += correction * inv_b;
    }
}

/// Push integrated state back into the components
fn write_back(entities: &mut HashMap<EntityId, Entity>, bodies: &[BodySnapshot]) {
    for body in bodies {
        let Some(entity) = entities.get_mut(&body.id) else { continue };

        if let Some(transform) = entity
            .components
            .get_mut(&ComponentKind::Transform)
            .and_then(TransformComponent::from_component_mut)
        {
            if body.moves() {
                transform.set_position(body.position);
                transform.set_rotation(body.rotation);
            }
        }

        if let Some(physics) = entity
            .components
            .get_mut(&ComponentKind::Physics)
            .and_then(PhysicsComponent::from_component_mut)
        {
            physics.velocity = body.velocity;
            physics.force = Vec3::zeros();
            physics.torque = Vec3::zeros();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn body_entity(id: u64, position: Vec3, physics: PhysicsComponent) -> (EntityId, Entity) {
        let entity_id = EntityId(id);
        let mut entity = Entity::new(entity_id, format!("body-{id}"));
        entity.components.insert(
            ComponentKind::Transform,
            TransformComponent::from_position(position).into_component(),
        );
        entity
            .components
            .insert(ComponentKind::Physics, physics.into_component());
        (entity_id, entity)
    }

    fn position_of(entities: &HashMap<EntityId, Entity>, id: EntityId) -> Vec3 {
        entities[&id]
            .components
            .get(&ComponentKind::Transform)
            .and_then(TransformComponent::from_component)
            .map(|t| t.position)
            .unwrap()
    }

    fn velocity_of(entities: &HashMap<EntityId, Entity>, id: EntityId) -> Vec3 {
        entities[&id]
            .components
            .get(&ComponentKind::Physics)
            .and_then(PhysicsComponent::from_component)
            .map(|p| p.velocity)
            .unwrap()
    }

    #[test]
    fn gravity_accelerates_dynamic_bodies() {
        let mut system = PhysicsSystem::new(PhysicsConfig::default());
        let mut entities = HashMap::new();
        let (id, entity) = body_entity(
            1,
            Vec3::new(0.0, 100.0, 0.0),
            PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0),
        );
        entities.insert(id, entity);

        system.step(&mut entities, 1.0 / 60.0);

        assert!(velocity_of(&entities, id).y < 0.0);
        assert!(position_of(&entities, id).y < 100.0);
    }

    #[test]
    fn sixty_fixed_steps_match_reference_euler_loop() {
        let config = PhysicsConfig::default();
        let gravity = config.gravity;
        let dt = config.fixed_dt;

        let mut system = PhysicsSystem::new(config);
        let mut entities = HashMap::new();
        let (id, entity) = body_entity(
            1,
            Vec3::zeros(),
            PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0),
        );
        entities.insert(id, entity);
        for _ in 0..60 {
            system.step(&mut entities, dt);
        }

        // Reference semi-implicit Euler: velocity first, then position
        // from the new velocity. This pins the discretization, which
        // differs from the closed-form half-g-t-squared drop.
        let mut velocity = Vec3::zeros();
        let mut position = Vec3::zeros();
        for _ in 0..60 {
            velocity += gravity * dt;
            position += velocity * dt;
        }

        assert_relative_eq!(velocity_of(&entities, id), velocity, epsilon = 1e-4);
        assert_relative_eq!(position_of(&entities, id), position, epsilon = 1e-4);
    }

    #[test]
    fn static_bodies_never_move() {
        let mut system = PhysicsSystem::new(PhysicsConfig::default());
        let mut entities = HashMap::new();
        let (id, entity) = body_entity(
            1,
            Vec3::zeros(),
            PhysicsComponent::fixed(CollisionShape::cuboid(Vec3::new(10.0, 1.0, 10.0))),
        );
        entities.insert(id, entity);

        for _ in 0..10 {
            system.step(&mut entities, 1.0 / 60.0);
        }

        assert_relative_eq!(position_of(&entities, id), Vec3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn sleeping_bodies_are_skipped() {
        let mut system = PhysicsSystem::new(PhysicsConfig::default());
        let mut entities = HashMap::new();
        let mut physics = PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0);
        physics.sleeping = true;
        let (id, entity) = body_entity(1, Vec3::new(0.0, 10.0, 0.0), physics);
        entities.insert(id, entity);

        system.step(&mut entities, 1.0 / 60.0);

        assert_relative_eq!(position_of(&entities, id), Vec3::new(0.0, 10.0, 0.0), epsilon = 1e-6);
        assert_eq!(system.stats().bodies, 0);
    }

    #[test]
    fn head_on_equal_mass_elastic_collision_swaps_velocities() {
        let mut config = PhysicsConfig::default();
        config.gravity_enabled = false;
        let mut system = PhysicsSystem::new(config);

        let mut entities = HashMap::new();
        let mut left = PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0);
        left.velocity = Vec3::new(2.0, 0.0, 0.0);
        left.restitution = 1.0;
        left.friction = 0.0;
        let mut right = PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0);
        right.velocity = Vec3::new(-2.0, 0.0, 0.0);
        right.restitution = 1.0;
        right.friction = 0.0;

        let (a, ea) = body_entity(1, Vec3::new(-1.0, 0.0, 0.0), left);
        let (b, eb) = body_entity(2, Vec3::new(1.0, 0.0, 0.0), right);
        entities.insert(a, ea);
        entities.insert(b, eb);

        // Step until they touch and rebound
        for _ in 0..30 {
            system.step(&mut entities, 1.0 / 60.0);
        }

        let va = velocity_of(&entities, a);
        let vb = velocity_of(&entities, b);
        assert_relative_eq!(va.x, -2.0, epsilon = 1e-3);
        assert_relative_eq!(vb.x, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn resting_contact_settles_on_static_ground() {
        let mut system = PhysicsSystem::new(PhysicsConfig::default());
        let mut entities = HashMap::new();

        let (ground, ground_entity) = body_entity(
            1,
            Vec3::zeros(),
            PhysicsComponent::fixed(CollisionShape::cuboid(Vec3::new(20.0, 1.0, 20.0))),
        );
        let mut ball = PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0);
        ball.restitution = 0.0;
        let (sphere, sphere_entity) = body_entity(2, Vec3::new(0.0, 2.0, 0.0), ball);
        entities.insert(ground, ground_entity);
        entities.insert(sphere, sphere_entity);

        for _ in 0..240 {
            system.step(&mut entities, 1.0 / 60.0);
        }

        // Settled on the surface: sphere bottom at the box top (y = 1.5)
        let y = position_of(&entities, sphere).y;
        assert!((y - 1.5).abs() < 0.1, "sphere rests at y={y}");
        assert!(velocity_of(&entities, sphere).norm() < 0.2);
        assert!(system.in_contact(ground, sphere));
    }

    #[test]
    fn enter_and_exit_events_fire_once_per_pair() {
        let mut config = PhysicsConfig::default();
        config.gravity_enabled = false;
        let mut system = PhysicsSystem::new(config);

        let mut entities = HashMap::new();
        let mut trigger = PhysicsComponent::fixed(CollisionShape::cuboid(Vec3::new(1.0, 1.0, 1.0)));
        trigger.is_trigger = true;
        let mut mover = PhysicsComponent::kinematic(CollisionShape::sphere(0.5));
        mover.velocity = Vec3::new(2.0, 0.0, 0.0);

        let (zone, zone_entity) = body_entity(1, Vec3::zeros(), trigger);
        let (probe, probe_entity) = body_entity(2, Vec3::new(-3.0, 0.0, 0.0), mover);
        entities.insert(zone, zone_entity);
        entities.insert(probe, probe_entity);

        let mut enters = 0;
        let mut exits = 0;
        for _ in 0..240 {
            for event in system.step(&mut entities, 1.0 / 60.0) {
                match event {
                    CollisionEvent::Started { .. } => enters += 1,
                    CollisionEvent::Stopped { .. } => exits += 1,
                }
            }
        }

        assert_eq!(enters, 1);
        assert_eq!(exits, 1);
        // Trigger never deflected the probe
        assert_relative_eq!(velocity_of(&entities, probe), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn layer_mask_filters_pairs() {
        let mut config = PhysicsConfig::default();
        config.gravity_enabled = false;
        let mut system = PhysicsSystem::new(config);

        let mut entities = HashMap::new();
        let mut ghost = PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0);
        ghost.velocity = Vec3::new(1.0, 0.0, 0.0);
        ghost.layer = CollisionLayers::PLAYER;
        ghost.mask = CollisionLayers::ENVIRONMENT;
        let mut wall = PhysicsComponent::fixed(CollisionShape::cuboid(Vec3::new(0.5, 5.0, 5.0)));
        wall.layer = CollisionLayers::PROJECTILE;
        wall.mask = CollisionLayers::all();

        let (a, ea) = body_entity(1, Vec3::new(-2.0, 0.0, 0.0), ghost);
        let (b, eb) = body_entity(2, Vec3::zeros(), wall);
        entities.insert(a, ea);
        entities.insert(b, eb);

        for _ in 0..240 {
            system.step(&mut entities, 1.0 / 60.0);
        }

        // Mask mismatch: the body passes straight through
        assert!(position_of(&entities, a).x > 1.0);
        assert!(!system.in_contact(a, b));
    }

    #[test]
    fn sub_step_count_is_clamped() {
        let mut system = PhysicsSystem::new(PhysicsConfig::default());
        let mut entities = HashMap::new();
        let (id, entity) = body_entity(
            1,
            Vec3::zeros(),
            PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0),
        );
        entities.insert(id, entity);

        system.step(&mut entities, 1.0);
        assert_eq!(system.stats().steps, PhysicsConfig::default().max_steps);

        system.step(&mut entities, 1e-4);
        assert_eq!(system.stats().steps, 1);
    }
}
