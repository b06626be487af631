//! Scene graph: entities, components, hierarchy, events, and scheduling

pub mod bounds;
pub mod component;
pub mod entity;
pub mod events;
pub mod scene;
pub mod scheduler;
pub mod transform_system;

pub use bounds::BoundingBox;
pub use component::{
    AudioComponent, BodyKind, CameraComponent, Component, ComponentData, ComponentKind,
    LightComponent, LightKind, MaterialHandle, MeshHandle, PhysicsComponent, RenderComponent,
    ScriptComponent, TransformComponent,
};
pub use entity::{Entity, EntityId};
pub use events::{EventArg, EventBus, EventData, EventListener};
pub use scene::{RaycastHit, Scene, EVENT_COLLISION_ENTER, EVENT_COLLISION_EXIT};
pub use scheduler::{priority, SystemId, SystemScheduler};
