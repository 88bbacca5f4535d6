//! # Entity — Handles and the Capability Trait
//!
//! Game objects implement [`Entity`]. The [`HierarchyStore`](super::HierarchyStore)
//! owns them (boxed) and hands out an [`EntityId`] for each one. All structural
//! data (parent, children, layer, draw index) lives in the store, not in the
//! entity, so an entity only carries its own state and hooks.
//!
//! ## Design: Generational Handles
//!
//! Node slots are recycled when entities are removed. A bare slot index would
//! then silently point at whatever moved in next:
//!
//! ```text
//! 1. Add entity → slot #5
//! 2. Keep a handle: saved = EntityId(5)
//! 3. Remove it
//! 4. Add another entity — reuses slot #5
//! 5. Use `saved` — now addresses the wrong entity!
//! ```
//!
//! Each handle therefore pairs the slot index with a **generation** that the
//! store bumps on removal. A stale handle fails every lookup instead of
//! aliasing, which is also what makes double removal a harmless no-op.
//!
//! ## Capabilities
//!
//! Every hook on [`Entity`] has a default, so an implementor overrides only
//! what it needs. The optional 2D capability is exposed through
//! [`Entity::transform`] / [`Entity::transform_mut`]: an entity that returns
//! `Some` takes part in transform propagation, one that returns `None` is
//! transparent to it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::traversal::UpdateContext;
use super::transform::Transform2D;
use crate::input::InputEvent;
use crate::render::DrawContext;

/// A handle to an entity in a [`HierarchyStore`](super::HierarchyStore).
///
/// Only valid for the store that created it, and only until that entity is
/// removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    /// Slot index in the store. Recycled after removal.
    pub(crate) index: u32,
    /// Bumped every time the slot is freed.
    pub(crate) generation: u32,
}

impl EntityId {
    /// Returns the raw index. Useful for diagnostics, not for general use.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation. Useful for diagnostics.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A render layer. Layers are drawn in ascending order; input is offered in
/// descending order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Layer(pub u32);

impl Layer {
    pub const DEFAULT: Layer = Layer(0);
}

/// The capability contract every entity in the hierarchy implements.
pub trait Entity: 'static {
    /// Display name. Defaults to the short type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Called once, right after the entity is linked under its parent.
    fn init(&mut self, _id: EntityId) {}

    /// Called once, right before the entity leaves the hierarchy. Children
    /// have already been removed.
    fn deinit(&mut self) {}

    /// Called once per frame during traversal.
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Called on frames where a fixed-timestep interval has elapsed.
    fn fixed_update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Called once per frame, in layer then draw-index order.
    fn draw(&mut self, _ctx: &mut DrawContext<'_>) {}

    fn on_child_added(&mut self, _child: EntityId) {}

    fn on_child_removed(&mut self, _child: EntityId) {}

    /// Offered an input event. Return `false` to consume it and stop
    /// propagation, `true` to let entities behind this one see it.
    fn on_input_event(&mut self, _event: &InputEvent) -> bool {
        true
    }

    /// The 2D capability, if this entity has one.
    fn transform(&self) -> Option<&Transform2D> {
        None
    }

    fn transform_mut(&mut self) -> Option<&mut Transform2D> {
        None
    }
}

/// The sentinel at the top of every hierarchy.
pub(crate) struct SceneRoot;

impl Entity for SceneRoot {
    fn name(&self) -> &str {
        "scene root"
    }
}

/// A named grouping node with no transform.
///
/// Its subtree is positioned only by 2D ancestors further up.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Entity for Group {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A named node with a 2D transform and no behavior of its own.
///
/// Handy as a pivot: rotate a `Node2D` and everything under it swings around.
#[derive(Debug, Clone)]
pub struct Node2D {
    name: String,
    pub transform: Transform2D,
}

impl Node2D {
    pub fn new(name: impl Into<String>, transform: Transform2D) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }
}

impl Entity for Node2D {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> Option<&Transform2D> {
        Some(&self.transform)
    }

    fn transform_mut(&mut self) -> Option<&mut Transform2D> {
        Some(&mut self.transform)
    }
}

/// Strip the module path from a type name (`game::units::Ant` → `Ant`).
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ant;
    impl Entity for Ant {}

    #[test]
    fn default_name_is_short_type_name() {
        assert_eq!(Ant.name(), "Ant");
        assert_eq!(short_type_name("a::b::Wrapper<c::D>"), "Wrapper");
    }

    #[test]
    fn only_node2d_exposes_a_transform() {
        let group = Group::new("g");
        let node = Node2D::new("n", Transform2D::from_xy(1.0, 2.0));
        assert!(group.transform().is_none());
        assert!(node.transform().is_some());
        assert_eq!(node.name(), "n");
    }

    #[test]
    fn entity_id_formats_with_generation() {
        let id = EntityId {
            index: 3,
            generation: 2,
        };
        assert_eq!(format!("{id}"), "3v2");
        assert_eq!(format!("{id:?}"), "Entity(3v2)");
    }

    #[test]
    fn default_input_hook_lets_events_through() {
        let mut ant = Ant;
        let event = InputEvent::KeyPressed(crate::input::Key(1));
        assert!(ant.on_input_event(&event));
    }
}
