//! Scene and physics configuration
//!
//! All tuning knobs for the scene graph, spatial index, and physics
//! pipeline live here. Configurations are serializable so applications can
//! load them from TOML alongside their other settings.

use crate::error::SceneError;
use crate::foundation::math::Vec3;
use crate::scene::BoundingBox;
use serde::{Deserialize, Serialize};

/// Configuration for octree behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum entities per leaf before subdivision
    pub max_entities_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_entities_per_node: 8,
            max_depth: 8,
        }
    }
}

/// Configuration for the rigid-body physics pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravitational acceleration applied to dynamic bodies
    pub gravity: Vec3,

    /// Whether gravity is applied during integration
    pub gravity_enabled: bool,

    /// Fixed timestep for physics sub-stepping (seconds)
    pub fixed_dt: f32,

    /// Maximum sub-steps per frame (caps the cost of a slow frame)
    pub max_steps: u32,

    /// Fraction of penetration depth corrected per resolution pass
    pub position_correction: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            gravity_enabled: true,
            fixed_dt: 1.0 / 60.0,
            max_steps: 8,
            position_correction: 0.2,
        }
    }
}

/// Top-level scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Fixed world extent of the spatial index. Entities outside these
    /// bounds are dropped from insertion.
    pub world_bounds: BoundingBox,

    /// Multiplier applied to the frame delta passed to every system
    pub time_scale: f32,

    /// Octree tuning
    pub octree: OctreeConfig,

    /// Physics tuning
    pub physics: PhysicsConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            world_bounds: BoundingBox::new(
                Vec3::new(-1000.0, -1000.0, -1000.0),
                Vec3::new(1000.0, 1000.0, 1000.0),
            ),
            time_scale: 1.0,
            octree: OctreeConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Parse a configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Serialize this configuration to a TOML document
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate the configuration before building a scene from it
    pub fn validate(&self) -> Result<(), SceneError> {
        if !self.world_bounds.is_valid() || self.world_bounds.is_degenerate() {
            return Err(SceneError::InvalidBounds);
        }
        if !self.physics.fixed_dt.is_finite() || self.physics.fixed_dt <= 0.0 {
            return Err(SceneError::InvalidConfig(
                "physics.fixed_dt must be positive and finite",
            ));
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(SceneError::InvalidConfig(
                "time_scale must be positive and finite",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_world_bounds_rejected() {
        let mut config = SceneConfig::default();
        config.world_bounds = BoundingBox::new(Vec3::new(10.0, 0.0, 0.0), Vec3::zeros());
        assert_eq!(config.validate(), Err(SceneError::InvalidBounds));
    }

    #[test]
    fn toml_round_trip() {
        let config = SceneConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = SceneConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.time_scale, config.time_scale);
        assert_eq!(parsed.physics.max_steps, config.physics.max_steps);
        assert_eq!(parsed.octree.max_depth, config.octree.max_depth);
    }

    #[test]
    fn partial_document_falls_back_to_defaults() {
        let text = r#"
            time_scale = 0.5

            [octree]
            max_depth = 5

            [physics]
            gravity = [0.0, -3.7, 0.0]
        "#;
        let config = SceneConfig::from_toml_str(text).unwrap();

        // Overridden values
        assert_eq!(config.time_scale, 0.5);
        assert_eq!(config.octree.max_depth, 5);
        assert_eq!(config.physics.gravity.y, -3.7);

        // Everything omitted falls back to defaults
        let defaults = SceneConfig::default();
        assert_eq!(config.world_bounds, defaults.world_bounds);
        assert_eq!(
            config.octree.max_entities_per_node,
            defaults.octree.max_entities_per_node
        );
        assert_eq!(config.physics.fixed_dt, defaults.physics.fixed_dt);
        assert_eq!(config.physics.max_steps, defaults.physics.max_steps);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_is_the_default_config() {
        let config = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(config.time_scale, SceneConfig::default().time_scale);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_or_non_finite_timing_rejected() {
        let mut config = SceneConfig::default();
        config.physics.fixed_dt = 0.0;
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));

        let mut config = SceneConfig::default();
        config.physics.fixed_dt = f32::NAN;
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));

        let mut config = SceneConfig::default();
        config.time_scale = -1.0;
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));

        let mut config = SceneConfig::default();
        config.time_scale = f32::INFINITY;
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));
    }
}
