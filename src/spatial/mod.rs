//! Spatial acceleration structures

pub mod octree;

pub use octree::{Octree, OctreeNode};
