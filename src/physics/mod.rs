//! Rigid-body physics pipeline
//!
//! Collision layers, shapes, narrow-phase tests, and the fixed-timestep
//! simulation driven by the scene scheduler.

pub mod layers;
pub mod narrow_phase;
pub mod shape;
pub mod system;

pub use layers::CollisionLayers;
pub use narrow_phase::Contact;
pub use shape::CollisionShape;
pub use system::{CollisionEvent, PhysicsStats, PhysicsSystem};
