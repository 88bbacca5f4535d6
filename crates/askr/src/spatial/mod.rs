//! Spatial indexing.
//!
//! - [`quadtree`] — region quadtree over integer boxes, built on
//!   [`FreeList`](crate::collections::FreeList)s

pub mod quadtree;

pub use quadtree::{NodeView, QuadTree, QuadTreeStats};
