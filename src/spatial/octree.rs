//! Octree spatial partitioning structure
//!
//! Recursive spatial partition over entity world bounds. The tree is
//! rebuilt from scratch once per frame by the scene rather than maintained
//! incrementally, so there is no removal primitive. Queries are
//! conservative at node granularity: callers re-test exact bounds.

use crate::config::OctreeConfig;
use crate::foundation::math::Vec3;
use crate::scene::{BoundingBox, EntityId};

/// Single node in the octree hierarchy
///
/// A node either has zero children (leaf) or exactly eight (subdivided).
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// World-space bounds of this node
    pub bounds: BoundingBox,

    /// Entities stored at this node with their world bounds
    entries: Vec<(EntityId, BoundingBox)>,

    /// Child octants, None while this node is a leaf
    children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    depth: u32,
}

impl OctreeNode {
    fn new(bounds: BoundingBox, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Split this node into 8 equal octants and redistribute its entries
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter = self.bounds.half_extents() * 0.5;

        let octant = |index: usize| {
            let x_sign = if index & 1 != 0 { 1.0 } else { -1.0 };
            let y_sign = if index & 2 != 0 { 1.0 } else { -1.0 };
            let z_sign = if index & 4 != 0 { 1.0 } else { -1.0 };
            let child_center = Vec3::new(
                center.x + quarter.x * x_sign,
                center.y + quarter.y * y_sign,
                center.z + quarter.z * z_sign,
            );
            OctreeNode::new(
                BoundingBox::from_center_half_extents(child_center, quarter),
                self.depth + 1,
            )
        };

        self.children = Some(Box::new([
            octant(0),
            octant(1),
            octant(2),
            octant(3),
            octant(4),
            octant(5),
            octant(6),
            octant(7),
        ]));

        // Push existing entries down into every intersecting child
        let entries = std::mem::take(&mut self.entries);
        if let Some(children) = self.children.as_deref_mut() {
            for (id, bounds) in entries {
                for child in children.iter_mut() {
                    if child.bounds.intersects(&bounds) {
                        child.insert(id, bounds, usize::MAX, 0);
                    }
                }
            }
        }
    }

    /// Insert an entity into this subtree
    ///
    /// An entity straddling an octant boundary is stored in every
    /// intersecting child. Returns true if stored anywhere in the subtree.
    fn insert(
        &mut self,
        id: EntityId,
        bounds: BoundingBox,
        max_entities: usize,
        max_depth: u32,
    ) -> bool {
        if !self.bounds.intersects(&bounds) {
            return false;
        }

        if self.is_leaf() {
            if self.entries.len() < max_entities || self.depth >= max_depth {
                self.entries.push((id, bounds));
                return true;
            }
            self.subdivide();
        }

        let mut stored = false;
        if let Some(children) = self.children.as_deref_mut() {
            for child in children.iter_mut() {
                if child.insert(id, bounds, max_entities, max_depth) {
                    stored = true;
                }
            }
        }
        stored
    }

    /// Collect every entity in any node whose bounds intersect the region
    fn query(&self, region: &BoundingBox, results: &mut Vec<EntityId>) {
        if !self.bounds.intersects(region) {
            return;
        }

        results.extend(self.entries.iter().map(|(id, _)| *id));

        if let Some(children) = self.children.as_deref() {
            for child in children.iter() {
                child.query(region, results);
            }
        }
    }

    /// Collect every entity in any node the ray passes through
    fn query_ray(&self, origin: Vec3, direction: Vec3, results: &mut Vec<EntityId>) {
        if self.bounds.intersect_ray(origin, direction).is_none() {
            return;
        }

        results.extend(self.entries.iter().map(|(id, _)| *id));

        if let Some(children) = self.children.as_deref() {
            for child in children.iter() {
                child.query_ray(origin, direction, results);
            }
        }
    }

    fn count_entries(&self) -> usize {
        let mut count = self.entries.len();
        if let Some(children) = self.children.as_deref() {
            for child in children.iter() {
                count += child.count_entries();
            }
        }
        count
    }
}

/// Octree over entity world bounds
#[derive(Debug, Clone)]
pub struct Octree {
    root: OctreeNode,
    max_entities: usize,
    max_depth: u32,
}

impl Octree {
    /// Create a new octree with a fixed world extent
    ///
    /// The extent is chosen once and does not adapt to scene growth;
    /// entities outside it are dropped from insertion.
    pub fn new(world_bounds: BoundingBox, config: &OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(world_bounds, 0),
            max_entities: config.max_entities_per_node.max(1),
            max_depth: config.max_depth,
        }
    }

    /// World extent covered by the tree
    pub fn world_bounds(&self) -> BoundingBox {
        self.root.bounds
    }

    /// Insert an entity with its world bounds
    ///
    /// Returns false when the bounds do not intersect the world extent.
    pub fn insert(&mut self, id: EntityId, bounds: BoundingBox) -> bool {
        self.root.insert(id, bounds, self.max_entities, self.max_depth)
    }

    /// Entities in any node intersecting the region (conservative superset)
    ///
    /// May include false positives at node granularity; never omits a true
    /// intersection within the world extent. Results are deduplicated.
    pub fn query(&self, region: &BoundingBox) -> Vec<EntityId> {
        let mut results = Vec::new();
        self.root.query(region, &mut results);
        results.sort_unstable();
        results.dedup();
        results
    }

    /// Entities in any node the ray passes through (conservative superset)
    pub fn query_ray(&self, origin: Vec3, direction: Vec3) -> Vec<EntityId> {
        let mut results = Vec::new();
        self.root.query_ray(origin, direction, &mut results);
        results.sort_unstable();
        results.dedup();
        results
    }

    /// Total stored entries (an entity straddling octants counts once per leaf)
    pub fn entry_count(&self) -> usize {
        self.root.count_entries()
    }

    /// Drop all entries, keeping the world extent
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.root.bounds, 0);
    }
}
