//! Priority-ordered system scheduling
//!
//! Systems are callbacks invoked once per frame, synchronously, in
//! ascending priority order with ties broken by insertion order. The
//! built-in transform and physics passes are scheduled through the same
//! list so callers can interleave their own systems around them.

use crate::scene::Scene;

/// Unique identifier for a scheduled system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub(crate) u64);

/// Default priorities for the well-known system slots
pub mod priority {
    /// Transform propagation
    pub const TRANSFORM: i32 = 0;
    /// Physics pipeline
    pub const PHYSICS: i32 = 100;
    /// Script updates
    pub const SCRIPT: i32 = 200;
    /// Audio parameter updates
    pub const AUDIO: i32 = 300;
    /// Render submission
    pub const RENDER: i32 = 1000;
}

/// What a scheduled slot runs when its turn comes
pub(crate) enum SystemStage {
    /// Built-in hierarchical transform propagation
    Transforms,
    /// Built-in physics broad/narrow phase, resolution, and integration
    Physics,
    /// Caller-provided callback
    Callback(Box<dyn FnMut(&mut Scene, f32)>),
}

/// One scheduled system
pub(crate) struct SystemSlot {
    pub(crate) id: SystemId,
    pub(crate) name: String,
    pub(crate) priority: i32,
    pub(crate) enabled: bool,
    pub(crate) stage: SystemStage,
}

/// Ordered list of systems invoked by `Scene::update`
#[derive(Default)]
pub struct SystemScheduler {
    pub(crate) slots: Vec<SystemSlot>,
    next_id: u64,
}

impl SystemScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        stage: SystemStage,
    ) -> SystemId {
        self.next_id += 1;
        let id = SystemId(self.next_id);
        self.slots.push(SystemSlot {
            id,
            name: name.into(),
            priority,
            enabled: true,
            stage,
        });
        // Stable sort: equal priorities keep insertion order
        self.slots.sort_by_key(|slot| slot.priority);
        id
    }

    /// Enable or disable a system; returns false for an unknown id
    pub fn set_enabled(&mut self, id: SystemId, enabled: bool) -> bool {
        match self.slots.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Remove a system; returns false for an unknown id
    pub fn remove(&mut self, id: SystemId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        self.slots.len() != before
    }

    /// Name of a scheduled system
    pub fn name_of(&self, id: SystemId) -> Option<&str> {
        self.slots.iter().find(|slot| slot.id == id).map(|slot| slot.name.as_str())
    }

    /// Number of scheduled systems
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no systems are scheduled
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fold another scheduler's slots into this one, preserving order rules
    ///
    /// Used to re-absorb systems registered while an update was in flight.
    pub(crate) fn absorb(&mut self, other: SystemScheduler) {
        self.next_id = self.next_id.max(other.next_id);
        self.slots.extend(other.slots);
        self.slots.sort_by_key(|slot| slot.priority);
    }
}
