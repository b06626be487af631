//! Component data records and the tagged component union
//!
//! Pure data components, no logic beyond cached-value maintenance. Exactly
//! one instance of each kind may exist per entity; the `Component` union
//! plus `ComponentKind` map enforces that at the storage level.

use crate::foundation::math::{Mat4, Quat, Trs, Vec3};
use crate::physics::{CollisionLayers, CollisionShape};
use crate::scene::BoundingBox;

/// Discriminant for the component union
///
/// Keys the per-entity component map; one slot per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Spatial transform
    Transform,
    /// Mesh/material/visibility data consumed by the renderer
    Render,
    /// Rigid-body simulation state
    Physics,
    /// Script binding consumed by the scripting subsystem
    Script,
    /// 3D audio source parameters consumed by the mixer
    Audio,
    /// Light source parameters consumed by the renderer
    Light,
    /// Camera parameters consumed by the renderer
    Camera,
}

/// Spatial transform with cached matrices and a dirty flag
///
/// Any mutator sets `dirty`; the transform system recomputes the cached
/// matrices top-down once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Local position relative to the parent
    pub position: Vec3,
    /// Local rotation quaternion
    pub rotation: Quat,
    /// Local scale factors
    pub scale: Vec3,
    /// Cached local matrix (valid when not dirty)
    pub local_matrix: Mat4,
    /// Cached world matrix (valid when not dirty)
    pub world_matrix: Mat4,
    /// Stale-cache marker; set by every mutator
    pub dirty: bool,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            local_matrix: Mat4::identity(),
            world_matrix: Mat4::identity(),
            dirty: true,
        }
    }
}

impl TransformComponent {
    /// Create a transform at a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set the local position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    /// Set the local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// Set the local scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Translate by a local-space offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.dirty = true;
    }

    /// Apply an additional rotation
    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = rotation * self.rotation;
        self.dirty = true;
    }

    /// Recompute the cached local matrix from position/rotation/scale
    pub fn recompute_local(&mut self) {
        self.local_matrix = Trs {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
        .to_matrix();
    }

    /// World-space translation from the cached world matrix
    pub fn world_position(&self) -> Vec3 {
        crate::foundation::math::translation_of(&self.world_matrix)
    }
}

/// Opaque handle to a mesh owned by the rendering backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshHandle(pub u64);

/// Opaque handle to a material owned by the rendering backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialHandle(pub u64);

/// Renderable data consumed by the rendering pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RenderComponent {
    /// Mesh handle
    pub mesh: MeshHandle,
    /// Material handle
    pub material: MaterialHandle,
    /// Whether the entity should be drawn
    pub visible: bool,
    /// Whether the entity casts shadows
    pub casts_shadows: bool,
    /// Model-space bounds of the mesh
    pub local_bounds: BoundingBox,
    /// Cached world-space bounds; refreshed when the transform updates
    pub world_bounds: BoundingBox,
}

impl RenderComponent {
    /// Create a render component from handles and model-space bounds
    pub fn new(mesh: MeshHandle, material: MaterialHandle, local_bounds: BoundingBox) -> Self {
        Self {
            mesh,
            material,
            visible: true,
            casts_shadows: true,
            local_bounds,
            world_bounds: local_bounds,
        }
    }
}

impl Default for RenderComponent {
    fn default() -> Self {
        Self::new(MeshHandle::default(), MaterialHandle::default(), BoundingBox::default())
    }
}

/// Rigid-body classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Infinite mass; never integrated, only collided against
    Static,
    /// Externally driven; collides but ignores forces and impulses
    Kinematic,
    /// Fully simulated
    Dynamic,
}

/// Rigid-body simulation state
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsComponent {
    /// Body classification
    pub kind: BodyKind,
    /// Mass in kilograms; ignored for static/kinematic bodies
    pub mass: f32,
    /// Linear velocity
    pub velocity: Vec3,
    /// Angular velocity (radians per second about each axis)
    pub angular_velocity: Vec3,
    /// Force accumulated this frame; cleared after integration
    pub force: Vec3,
    /// Torque accumulated this frame; cleared after integration
    pub torque: Vec3,
    /// Coefficient of bounciness, 0 = inelastic, 1 = elastic
    pub restitution: f32,
    /// Tangential friction coefficient
    pub friction: f32,
    /// Linear damping applied during integration
    pub drag: f32,
    /// Collision shape in model space
    pub shape: CollisionShape,
    /// Caller-managed sleep flag; sleeping bodies are skipped entirely
    pub sleeping: bool,
    /// Trigger volumes report contacts but skip the resolver
    pub is_trigger: bool,
    /// Layer this body occupies
    pub layer: CollisionLayers,
    /// Layers this body collides with
    pub mask: CollisionLayers,
}

impl PhysicsComponent {
    /// Create a dynamic body with the given shape and mass
    pub fn dynamic(shape: CollisionShape, mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            mass,
            ..Self::base(shape)
        }
    }

    /// Create a static body with the given shape
    pub fn fixed(shape: CollisionShape) -> Self {
        Self::base(shape)
    }

    /// Create a kinematic body with the given shape
    pub fn kinematic(shape: CollisionShape) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            ..Self::base(shape)
        }
    }

    fn base(shape: CollisionShape) -> Self {
        Self {
            kind: BodyKind::Static,
            mass: 0.0,
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            force: Vec3::zeros(),
            torque: Vec3::zeros(),
            restitution: 0.5,
            friction: 0.5,
            drag: 0.0,
            shape,
            sleeping: false,
            is_trigger: false,
            layer: CollisionLayers::default(),
            mask: CollisionLayers::default(),
        }
    }

    /// Inverse mass; zero for static/kinematic bodies (immovable)
    pub fn inverse_mass(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic if self.mass > 0.0 => 1.0 / self.mass,
            _ => 0.0,
        }
    }

    /// Accumulate a force for the next integration pass
    pub fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Accumulate a torque for the next integration pass
    pub fn apply_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }
}

/// Script binding; stored by the core, executed by the scripting subsystem
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptComponent {
    /// Name of the script to bind
    pub script_name: String,
    /// Whether the script should run
    pub enabled: bool,
}

/// 3D audio source parameters; stored by the core, consumed by the mixer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioComponent {
    /// Name of the audio clip to play
    pub clip_name: String,
    /// Playback volume, 0..=1
    pub volume: f32,
    /// Playback pitch multiplier
    pub pitch: f32,
    /// Whether playback loops
    pub looping: bool,
    /// Distance at which attenuation begins
    pub min_distance: f32,
    /// Distance beyond which the source is inaudible
    pub max_distance: f32,
}

impl Default for AudioComponent {
    fn default() -> Self {
        Self {
            clip_name: String::new(),
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            min_distance: 1.0,
            max_distance: 100.0,
        }
    }
}

/// Light source classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Directional light; orientation taken from the transform
    Directional,
    /// Point light
    Point,
    /// Spot light
    Spot,
}

/// Light source parameters; stored by the core, consumed by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct LightComponent {
    /// Light classification
    pub kind: LightKind,
    /// RGB color, components 0..=1
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Attenuation range for point/spot lights
    pub range: f32,
    /// Cached world-space direction; refreshed when the transform updates
    pub direction: Vec3,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            range: 10.0,
            direction: Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

/// Camera parameters; stored by the core, consumed by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane distance
    pub near: f32,
    /// Far clip plane distance
    pub far: f32,
    /// Cached view matrix; refreshed when the transform updates
    pub view_matrix: Mat4,
    /// Cached projection matrix; refreshed when parameters change
    pub projection_matrix: Mat4,
}

impl Default for CameraComponent {
    fn default() -> Self {
        let mut camera = Self {
            fov_y: std::f32::consts::FRAC_PI_3,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            view_matrix: Mat4::identity(),
            projection_matrix: Mat4::identity(),
        };
        camera.recompute_projection();
        camera
    }
}

impl CameraComponent {
    /// Recompute the cached projection matrix from the lens parameters
    pub fn recompute_projection(&mut self) {
        self.projection_matrix =
            Mat4::new_perspective(self.aspect, self.fov_y, self.near, self.far);
    }
}

/// Tagged union of every component kind
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Spatial transform
    Transform(TransformComponent),
    /// Renderable data
    Render(RenderComponent),
    /// Rigid-body state
    Physics(PhysicsComponent),
    /// Script binding
    Script(ScriptComponent),
    /// Audio source
    Audio(AudioComponent),
    /// Light source
    Light(LightComponent),
    /// Camera
    Camera(CameraComponent),
}

impl Component {
    /// Which slot of the per-entity component map this value occupies
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Render(_) => ComponentKind::Render,
            Self::Physics(_) => ComponentKind::Physics,
            Self::Script(_) => ComponentKind::Script,
            Self::Audio(_) => ComponentKind::Audio,
            Self::Light(_) => ComponentKind::Light,
            Self::Camera(_) => ComponentKind::Camera,
        }
    }
}

/// Typed access into the component union
///
/// Lets `Scene::get_component::<PhysicsComponent>(id)` and friends resolve
/// the right union slot at compile time.
pub trait ComponentData: Sized {
    /// The union slot this record occupies
    const KIND: ComponentKind;

    /// Human-readable kind name for error reporting
    const NAME: &'static str;

    /// Borrow this record out of a union value of the matching kind
    fn from_component(component: &Component) -> Option<&Self>;

    /// Mutably borrow this record out of a union value of the matching kind
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;

    /// Take this record out of a union value of the matching kind
    fn from_component_owned(component: Component) -> Option<Self>;

    /// Wrap this record into the union
    fn into_component(self) -> Component;
}

macro_rules! impl_component_data {
    ($record:ty, $variant:ident, $name:literal) => {
        impl ComponentData for $record {
            const KIND: ComponentKind = ComponentKind::$variant;
            const NAME: &'static str = $name;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                match component {
                    Component::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn from_component_owned(component: Component) -> Option<Self> {
                match component {
                    Component::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn into_component(self) -> Component {
                Component::$variant(self)
            }
        }
    };
}

impl_component_data!(TransformComponent, Transform, "Transform");
impl_component_data!(RenderComponent, Render, "Render");
impl_component_data!(PhysicsComponent, Physics, "Physics");
impl_component_data!(ScriptComponent, Script, "Script");
impl_component_data!(AudioComponent, Audio, "Audio");
impl_component_data!(LightComponent, Light, "Light");
impl_component_data!(CameraComponent, Camera, "Camera");

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mutators_set_dirty() {
        let mut transform = TransformComponent::default();
        transform.dirty = false;

        transform.set_position(Vec3::new(1.0, 0.0, 0.0));
        assert!(transform.dirty);

        transform.dirty = false;
        transform.translate(Vec3::new(0.0, 1.0, 0.0));
        assert!(transform.dirty);
        assert_relative_eq!(transform.position, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-6);

        transform.dirty = false;
        transform.rotate(Quat::from_axis_angle(&Vec3::y_axis(), 0.5));
        assert!(transform.dirty);

        transform.dirty = false;
        transform.set_scale(Vec3::new(2.0, 2.0, 2.0));
        assert!(transform.dirty);
    }

    #[test]
    fn union_round_trip() {
        let physics = PhysicsComponent::dynamic(CollisionShape::sphere(1.0), 2.0);
        let component = physics.clone().into_component();
        assert_eq!(component.kind(), ComponentKind::Physics);
        assert_eq!(PhysicsComponent::from_component(&component), Some(&physics));
        assert!(RenderComponent::from_component(&component).is_none());
    }

    #[test]
    fn inverse_mass_zero_for_immovable_bodies() {
        let shape = CollisionShape::sphere(1.0);
        assert_eq!(PhysicsComponent::fixed(shape).inverse_mass(), 0.0);
        assert_eq!(PhysicsComponent::kinematic(shape).inverse_mass(), 0.0);
        assert_relative_eq!(
            PhysicsComponent::dynamic(shape, 4.0).inverse_mass(),
            0.25,
            epsilon = 1e-6
        );
    }
}
