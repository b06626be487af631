//! Crate-wide error types
//!
//! Lookup operations stay `Option`-returning; these errors cover the
//! mutating operations that surface failures explicitly. No failure here is
//! fatal — the worst case for a malformed request is a skipped operation.

use crate::scene::EntityId;
use thiserror::Error;

/// Errors surfaced by scene and spatial-index operations
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    /// An entity id did not resolve to a live entity
    #[error("entity {0:?} not found")]
    EntityNotFound(EntityId),

    /// A typed component accessor was used on an entity lacking that kind
    #[error("entity {0:?} has no {1} component")]
    ComponentMissing(EntityId, &'static str),

    /// Reparenting would create a cycle in the entity hierarchy
    #[error("reparenting {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// The entity being reparented
        child: EntityId,
        /// The proposed parent
        parent: EntityId,
    },

    /// A degenerate or inverted bounding box was passed to the spatial index
    #[error("invalid bounds: min must be <= max componentwise")]
    InvalidBounds,

    /// A configuration value failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
