//! # Transform Propagation — Parent Edits Cascade to Descendants
//!
//! A 2D-capable entity carries a [`Transform2D`]: its **local** pose plus a
//! cached copy of its parent's **absolute** pose. The absolute pose an entity
//! reports is always `parent ∘ local`, computed on demand, so editing an
//! entity is immediately visible on that entity.
//!
//! Descendants catch up in [`HierarchyStore::propagate_transforms`], a
//! top-down pass that refreshes every cached parent pose below an edited node:
//!
//! ```text
//! set_position(P)        P.local changes, P.dirty = true
//!        │
//! propagate_transforms   walk root → leaves
//!        │                 P dirty      → C.parent = P.world, C changed
//!        ▼                 C changed    → G.parent = C.world
//!   C, G follow
//! ```
//!
//! The pass never accumulates offsets, so repeated edits can't drift, and the
//! result does not depend on the order entities were inserted in.
//!
//! The composition rule mirrors how an edit on a parent moves its children:
//!
//! - moving a parent by `Δp` moves every descendant by `Δp`;
//! - scaling a parent by a ratio multiplies descendants' scale by that ratio
//!   (their offsets are not stretched);
//! - rotating a parent by `Δr` swings descendants around the parent's position
//!   by `Δr` and adds `Δr` to their rotation.
//!
//! Entities without the 2D capability are transparent: the pose of the nearest
//! 2D ancestor passes straight through them.

use crate::graph::hierarchy::HierarchyStore;
use crate::graph::EntityId;
use crate::math::{Pose2D, Vec2, rotate_degrees};

/// Local pose plus the parent's cached absolute pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    local: Pose2D,
    /// Absolute pose of the nearest 2D ancestor, as of the last propagation.
    parent: Pose2D,
    /// Local pose changed since the last propagation.
    dirty: bool,
}

impl Transform2D {
    pub fn new(local: Pose2D) -> Self {
        Self {
            local,
            parent: Pose2D::IDENTITY,
            dirty: true,
        }
    }

    /// Create a transform at the given local position.
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::new(Pose2D::from_xy(x, y))
    }

    /// Return a copy with the given local rotation in degrees.
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.local.rotation = degrees;
        self
    }

    /// Return a copy with the given local scale.
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.local.scale = scale;
        self
    }

    // ── Absolute accessors ───────────────────────────────────────────

    /// Absolute pose: the parent's absolute pose composed with the local one.
    pub fn world(&self) -> Pose2D {
        self.parent.compose(&self.local)
    }

    pub fn position(&self) -> Vec2 {
        self.world().position
    }

    /// Move to an absolute position.
    pub fn set_position(&mut self, position: Vec2) {
        let world = Pose2D {
            position,
            ..self.world()
        };
        self.local.position = self.parent.to_local(&world).position;
        self.dirty = true;
    }

    /// Move by an absolute offset.
    pub fn translate(&mut self, delta: Vec2) {
        self.local.position += rotate_degrees(delta, -self.parent.rotation);
        self.dirty = true;
    }

    /// Absolute rotation in degrees.
    pub fn rotation(&self) -> f32 {
        self.parent.rotation + self.local.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.local.rotation = degrees - self.parent.rotation;
        self.dirty = true;
    }

    pub fn scale(&self) -> Vec2 {
        self.parent.scale * self.local.scale
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        let world = Pose2D {
            scale,
            ..self.world()
        };
        self.local.scale = self.parent.to_local(&world).scale;
        self.dirty = true;
    }

    // ── Local accessors ──────────────────────────────────────────────

    pub fn local(&self) -> Pose2D {
        self.local
    }

    pub fn set_local(&mut self, local: Pose2D) {
        self.local = local;
        self.dirty = true;
    }

    pub fn local_position(&self) -> Vec2 {
        self.local.position
    }

    pub fn set_local_position(&mut self, position: Vec2) {
        self.local.position = position;
        self.dirty = true;
    }

    /// `true` if the local pose changed and descendants haven't caught up.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ── Propagation hooks ────────────────────────────────────────────

    /// Compose into a new parent's space, keeping the local pose.
    pub(crate) fn attach(&mut self, parent: Pose2D) {
        self.parent = parent;
    }

    /// Discard the local pose so the absolute pose equals `parent`.
    pub(crate) fn snap_to(&mut self, parent: Pose2D) {
        self.local = Pose2D::IDENTITY;
        self.parent = parent;
        self.dirty = true;
    }

    pub(crate) fn set_parent_pose(&mut self, parent: Pose2D) {
        self.parent = parent;
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::new(Pose2D::IDENTITY)
    }
}

impl HierarchyStore {
    /// Bring every cached parent pose up to date. Returns the number of
    /// transforms whose parent pose was refreshed.
    ///
    /// Cheap when nothing moved: clean subtrees are walked but not written.
    pub fn propagate_transforms(&mut self) -> usize {
        self.propagate_from(self.root(), Pose2D::IDENTITY, false)
    }

    /// Propagate below `start`, whose 2D ancestors compose to `parent_world`.
    /// With `force`, `start` itself is re-attached even if nothing is dirty.
    pub(crate) fn propagate_from(
        &mut self,
        start: EntityId,
        parent_world: Pose2D,
        force: bool,
    ) -> usize {
        let mut refreshed = 0;
        let mut stack = vec![(start, parent_world, force)];

        while let Some((id, parent_world, parent_changed)) = stack.pop() {
            let Some(node) = self.node_mut(id) else {
                continue;
            };

            let (world, changed) = match node.entity.transform_mut() {
                Some(transform) => {
                    if parent_changed {
                        transform.set_parent_pose(parent_world);
                        refreshed += 1;
                    }
                    let changed = transform.take_dirty() || parent_changed;
                    (transform.world(), changed)
                }
                None => (parent_world, parent_changed),
            };

            for &child in node.children.iter().rev() {
                stack.push((child, world, changed));
            }
        }

        refreshed
    }
}
