//! # Scene Graph
//!
//! A tree of boxed game objects with generational handles, 2D transform
//! propagation, and a per-frame layered update/draw order.
//!
//! ## Module Overview
//!
//! - [`entity`] — `EntityId` handles, `Layer`, and the `Entity` capability trait
//! - [`hierarchy`] — `HierarchyStore`, the owner of the tree
//! - [`transform`] — `Transform2D` and the top-down propagation pass
//! - [`traversal`] — `FrameOrder`: the per-frame walk and layer buckets
//! - [`commands`] — structural edits deferred out of entity hooks

pub mod commands;
pub mod entity;
pub mod hierarchy;
pub mod transform;
pub mod traversal;

pub use commands::Commands;
pub use entity::{Entity, EntityId, Group, Layer, Node2D};
pub use hierarchy::HierarchyStore;
pub use transform::Transform2D;
pub use traversal::{FrameOrder, UpdateContext};
