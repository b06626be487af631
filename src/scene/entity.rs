//! Entity identifiers and the entity record

use crate::scene::component::{Component, ComponentKind};
use std::collections::HashMap;

/// Opaque, monotonically increasing entity handle
///
/// Ids are never reused within a session; id 0 is the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    /// Sentinel id that never resolves to a live entity
    pub const INVALID: EntityId = EntityId(0);

    /// Raw id value
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Whether this id could refer to a live entity
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Scene object: name, tag, hierarchy links, and a component slot per kind
///
/// Entities are exclusively owned by the [`Scene`](crate::scene::Scene);
/// consumers operate through ids.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) tag: String,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) components: HashMap<ComponentKind, Component>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tag: String::new(),
            parent: None,
            children: Vec::new(),
            components: HashMap::new(),
        }
    }

    /// This entity's id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Parent id, if parented
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Child ids in insertion order
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether a component of the given kind is attached
    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Kinds of all attached components (arbitrary order)
    pub fn component_kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_id_is_invalid() {
        assert!(!EntityId::INVALID.is_valid());
        assert!(EntityId(1).is_valid());
    }

    #[test]
    fn new_entity_is_empty() {
        let entity = Entity::new(EntityId(1), "player");
        assert_eq!(entity.name(), "player");
        assert_eq!(entity.tag(), "");
        assert!(entity.parent().is_none());
        assert!(entity.children().is_empty());
        assert!(!entity.has_component(ComponentKind::Transform));
    }
}
