//! Scene graph and physics core for real-time 3D applications
//!
//! An entity-component scene with hierarchical transforms, an octree
//! spatial index, a fixed-timestep rigid-body pipeline, priority-ordered
//! system scheduling, and synchronous events. Rendering, scripting, and
//! audio backends consume the component data stored here; this crate
//! carries no GPU or platform dependencies.
//!
//! # Quick start
//!
//! ```
//! use scene_core::foundation::math::Vec3;
//! use scene_core::physics::CollisionShape;
//! use scene_core::scene::{PhysicsComponent, Scene, TransformComponent};
//!
//! let mut scene = Scene::new();
//! let ball = scene.create_entity("ball");
//! scene.add_component(ball, TransformComponent::from_position(Vec3::new(0.0, 10.0, 0.0)))?;
//! scene.add_component(ball, PhysicsComponent::dynamic(CollisionShape::sphere(0.5), 1.0))?;
//!
//! scene.update(1.0 / 60.0);
//! # Ok::<(), scene_core::error::SceneError>(())
//! ```

pub mod config;
pub mod error;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod spatial;

pub use config::SceneConfig;
pub use error::SceneError;
pub use scene::{EntityId, Scene};
