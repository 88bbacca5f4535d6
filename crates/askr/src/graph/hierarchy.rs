//! # Hierarchy Store — The Entity Tree
//!
//! The [`HierarchyStore`] is the single owner of every entity in a scene. It
//! keeps the tree structure (parent, ordered children, layer, draw index) next
//! to each boxed entity, indexed by generational [`EntityId`].
//!
//! ```text
//!                 scene root (fixed, never removed)
//!                /          \
//!          ship (layer 1)   hud (layer 5)
//!          /      \              \
//!      turret   exhaust        score
//! ```
//!
//! ## Structure
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ HierarchyStore                                        │
//! │                                                       │
//! │  nodes: FreeList<HierarchyNode>                       │
//! │    slot index = EntityId::index                       │
//! │    value = { entity, parent, children, layer, draw }  │
//! │                                                       │
//! │  generations: Vec<u32>                                │
//! │    bumped on removal, so stale ids never alias        │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Every structural operation validates its arguments before touching
//! anything. A rejected call logs an error, returns a [`HierarchyError`] and
//! leaves the tree exactly as it was.
//!
//! ## Hook Order
//!
//! - **add**: attach transform → link under parent → `parent.on_child_added`
//!   → `entity.init`
//! - **remove**: children first (post-order) → `entity.deinit` → unlink →
//!   `parent.on_child_removed`
//! - **reparent**: unlink → `old_parent.on_child_removed` → snap transform →
//!   link → `new_parent.on_child_added`

use super::entity::{Entity, EntityId, Layer, SceneRoot};
use super::transform::Transform2D;
use crate::collections::FreeList;
use crate::error::HierarchyError;
use crate::math::Pose2D;

/// One entity plus its place in the tree.
pub(crate) struct HierarchyNode {
    pub(crate) entity: Box<dyn Entity>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) layer: Layer,
    pub(crate) draw_index: i32,
}

/// Owner of the entity tree and its id → node index.
pub struct HierarchyStore {
    nodes: FreeList<HierarchyNode>,
    /// Current generation per slot.
    generations: Vec<u32>,
    root: EntityId,
}

impl HierarchyStore {
    /// Create a store holding only the scene root.
    pub fn new() -> Self {
        let mut store = Self {
            nodes: FreeList::new(),
            generations: Vec::new(),
            root: EntityId {
                index: 0,
                generation: 0,
            },
        };
        store.root = store.alloc(HierarchyNode {
            entity: Box::new(SceneRoot),
            parent: None,
            children: Vec::new(),
            layer: Layer::DEFAULT,
            draw_index: 0,
        });
        store
    }

    /// The scene root. Always registered.
    pub fn root(&self) -> EntityId {
        self.root
    }

    // ── Add / Remove ─────────────────────────────────────────────────

    /// Add `entity` as the last child of `parent`, on `layer`.
    ///
    /// The new entity draws one step in front of its parent. If both have a
    /// 2D transform, the child's local pose is composed into the parent's
    /// space. Then `parent.on_child_added` and `entity.init` run.
    pub fn add_entity<E: Entity>(
        &mut self,
        parent: EntityId,
        entity: E,
        layer: Layer,
    ) -> Result<EntityId, HierarchyError> {
        self.add_boxed(parent, Box::new(entity), layer)
    }

    /// [`add_entity`](Self::add_entity) for an already boxed entity.
    pub fn add_boxed(
        &mut self,
        parent: EntityId,
        mut entity: Box<dyn Entity>,
        layer: Layer,
    ) -> Result<EntityId, HierarchyError> {
        if !self.contains(parent) {
            log::error!(
                "Cannot add '{}': parent {parent} is not registered",
                entity.name()
            );
            return Err(HierarchyError::ParentNotRegistered(parent));
        }

        let parent_world = self.world_transform(parent).unwrap_or(Pose2D::IDENTITY);
        let draw_index = self.draw_index(parent).unwrap_or(0) + 1;
        if let Some(transform) = entity.transform_mut() {
            transform.attach(parent_world);
        }

        let id = self.alloc(HierarchyNode {
            entity,
            parent: Some(parent),
            children: Vec::new(),
            layer,
            draw_index,
        });

        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(id);
            parent_node.entity.on_child_added(id);
        }
        if let Some(node) = self.node_mut(id) {
            node.entity.init(id);
            log::debug!("Added '{}' as {id} under {parent}", node.entity.name());
        }
        Ok(id)
    }

    /// Remove `id` and its whole subtree. Returns how many entities were removed.
    ///
    /// Children go first, deepest first, each one getting `deinit` before it
    /// is unlinked and its parent hears `on_child_removed`.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<usize, HierarchyError> {
        if id == self.root {
            log::error!("Precondition violated: the scene root cannot be removed");
            return Err(HierarchyError::RootImmutable);
        }
        if !self.contains(id) {
            log::error!("Cannot remove {id}: not registered (already removed?)");
            return Err(HierarchyError::NotRegistered(id));
        }

        let victims = self.post_order(id);
        for &victim in &victims {
            self.remove_single(victim);
        }
        Ok(victims.len())
    }

    /// Remove every entity except the root.
    pub fn clear(&mut self) -> usize {
        let top_level = self.children(self.root).to_vec();
        top_level
            .into_iter()
            .filter_map(|child| self.remove_entity(child).ok())
            .sum()
    }

    fn remove_single(&mut self, id: EntityId) {
        if let Some(node) = self.node_mut(id) {
            node.entity.deinit();
        }
        let Some(node) = self.nodes.remove(id.index as usize) else {
            return;
        };
        let generation = &mut self.generations[id.index as usize];
        *generation = generation.wrapping_add(1);

        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|&c| c != id);
                parent_node.entity.on_child_removed(id);
            }
        }
        log::debug!("Removed '{}' ({id})", node.entity.name());
    }

    // ── Reparent ─────────────────────────────────────────────────────

    /// Move `id` (with its subtree) to the end of `new_parent`'s children.
    ///
    /// The draw index resets to one in front of the new parent and the 2D
    /// transform snaps onto the new parent: its local pose becomes identity,
    /// so its absolute pose equals the new parent's. The subtree follows.
    pub fn reparent(&mut self, id: EntityId, new_parent: EntityId) -> Result<(), HierarchyError> {
        if id == self.root {
            log::error!("Precondition violated: the scene root cannot be reparented");
            return Err(HierarchyError::RootImmutable);
        }
        if !self.contains(id) {
            log::error!("Cannot reparent {id}: not registered");
            return Err(HierarchyError::NotRegistered(id));
        }
        if !self.contains(new_parent) {
            log::error!("Cannot reparent {id}: new parent {new_parent} is not registered");
            return Err(HierarchyError::ParentNotRegistered(new_parent));
        }
        if new_parent == id || self.is_ancestor(id, new_parent) {
            log::error!("Precondition violated: cannot move {id} under its own descendant {new_parent}");
            return Err(HierarchyError::WouldCreateCycle {
                entity: id,
                new_parent,
            });
        }

        if let Some(old_parent) = self.parent(id) {
            if let Some(old_node) = self.node_mut(old_parent) {
                old_node.children.retain(|&c| c != id);
                old_node.entity.on_child_removed(id);
            }
        }

        let parent_world = self.world_transform(new_parent).unwrap_or(Pose2D::IDENTITY);
        let draw_index = self.draw_index(new_parent).unwrap_or(0) + 1;
        if let Some(node) = self.node_mut(id) {
            node.parent = Some(new_parent);
            node.draw_index = draw_index;
            if let Some(transform) = node.entity.transform_mut() {
                transform.snap_to(parent_world);
            }
        }
        if let Some(parent_node) = self.node_mut(new_parent) {
            parent_node.children.push(id);
            parent_node.entity.on_child_added(id);
        }

        self.propagate_from(id, parent_world, true);
        log::debug!("Reparented {id} under {new_parent}");
        Ok(())
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Children of `id` in insertion order. Empty (and logged) if `id` is not
    /// registered.
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        match self.node(id) {
            Some(node) => &node.children,
            None => {
                log::error!("Cannot list children of {id}: not registered");
                &[]
            }
        }
    }

    /// Parent of `id`. `None` for the root, and (logged) for unregistered ids.
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        match self.node(id) {
            Some(node) => node.parent,
            None => {
                log::error!("Cannot look up parent of {id}: not registered");
                None
            }
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.node(id).is_some()
    }

    /// Number of entities, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        let node = self.node(id)?;
        Some(node.entity.as_ref())
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity> {
        let node = self.node_mut(id)?;
        let entity: &mut dyn Entity = node.entity.as_mut();
        Some(entity)
    }

    /// The entity's 2D transform, if it has one.
    pub fn transform(&self, id: EntityId) -> Option<&Transform2D> {
        self.node(id)?.entity.transform()
    }

    /// Mutable 2D transform. Edits reach descendants on the next
    /// [`propagate_transforms`](Self::propagate_transforms).
    pub fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform2D> {
        self.node_mut(id)?.entity.transform_mut()
    }

    pub fn name(&self, id: EntityId) -> Option<&str> {
        Some(self.node(id)?.entity.name())
    }

    pub fn layer(&self, id: EntityId) -> Option<Layer> {
        Some(self.node(id)?.layer)
    }

    /// Move `id` to another layer. Takes effect on the next frame's ordering.
    pub fn set_layer(&mut self, id: EntityId, layer: Layer) -> Result<(), HierarchyError> {
        let Some(node) = self.node_mut(id) else {
            log::error!("Cannot set layer of {id}: not registered");
            return Err(HierarchyError::NotRegistered(id));
        };
        node.layer = layer;
        Ok(())
    }

    pub fn draw_index(&self, id: EntityId) -> Option<i32> {
        Some(self.node(id)?.draw_index)
    }

    pub fn set_draw_index(&mut self, id: EntityId, draw_index: i32) -> Result<(), HierarchyError> {
        let Some(node) = self.node_mut(id) else {
            log::error!("Cannot set draw index of {id}: not registered");
            return Err(HierarchyError::NotRegistered(id));
        };
        node.draw_index = draw_index;
        Ok(())
    }

    /// Every entity below `id`, in pre-order. Excludes `id` itself.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self
            .node(id)
            .map(|node| node.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.node(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// First entity named `name`, in pre-order from the root.
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.name(id) == Some(name))
    }

    /// `true` if `ancestor` lies on the path from `id` up to the root.
    pub fn is_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut current = self.node(id).and_then(|node| node.parent);
        while let Some(step) = current {
            if step == ancestor {
                return true;
            }
            current = self.node(step).and_then(|node| node.parent);
        }
        false
    }

    /// Absolute pose of `id`, folded fresh from the root through every 2D
    /// ancestor. Ignores cached parent poses, so it is exact even before
    /// propagation. Entities without a transform report the pose of their
    /// nearest 2D ancestor.
    pub fn world_transform(&self, id: EntityId) -> Option<Pose2D> {
        self.node(id)?;
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(step) = current {
            let node = self.node(step)?;
            path.push(step);
            current = node.parent;
        }

        let world = path.iter().rev().fold(Pose2D::IDENTITY, |world, &step| {
            match self.transform(step) {
                Some(transform) => world.compose(&transform.local()),
                None => world,
            }
        });
        Some(world)
    }

    /// Iterate over every live entity, root included, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> + '_ {
        self.nodes.iter().map(|(index, node)| {
            let id = EntityId {
                index: index as u32,
                generation: self.generations[index],
            };
            (id, node.entity.as_ref())
        })
    }

    // ── Internals ────────────────────────────────────────────────────

    pub(crate) fn node(&self, id: EntityId) -> Option<&HierarchyNode> {
        let index = id.index as usize;
        if self.generations.get(index) != Some(&id.generation) {
            return None;
        }
        self.nodes.get(index)
    }

    pub(crate) fn node_mut(&mut self, id: EntityId) -> Option<&mut HierarchyNode> {
        let index = id.index as usize;
        if self.generations.get(index) != Some(&id.generation) {
            return None;
        }
        self.nodes.get_mut(index)
    }

    fn alloc(&mut self, node: HierarchyNode) -> EntityId {
        let index = self.nodes.insert(node);
        if index == self.generations.len() {
            self.generations.push(0);
        }
        EntityId {
            index: index as u32,
            generation: self.generations[index],
        }
    }

    /// Subtree of `id` with every node after all of its descendants and
    /// siblings left to right.
    fn post_order(&self, id: EntityId) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            if let Some(node) = self.node(current) {
                stack.extend(node.children.iter().copied());
            }
        }
        order.reverse();
        order
    }
}

impl Default for HierarchyStore {
    fn default() -> Self {
        Self::new()
    }
}
