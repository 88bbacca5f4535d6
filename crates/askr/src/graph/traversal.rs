//! # Traversal & Layering — Per-Frame Update and Draw Order
//!
//! Once per frame, [`FrameOrder::rebuild`] walks the whole tree depth-first
//! from the root (with an explicit stack, so deep trees can't overflow the
//! call stack). Every visited entity:
//!
//! 1. is appended to the bucket for its layer;
//! 2. gets `update` exactly once, then `fixed_update` once per fixed step due.
//!
//! After the walk each bucket is stably sorted by draw index, so entities with
//! equal draw indices keep their traversal order.
//!
//! ```text
//!  tree (draw index)              buckets after sort
//!  root                           Layer(0): bg(0) ship(1) turret(2)
//!   ├─ bg(0)       L0             Layer(5): score(1)
//!   ├─ ship(1)     L0
//!   │   └─ turret(2) L0           draw:  Layer(0) back to front, then Layer(5)
//!   └─ score(1)    L5             input: Layer(5) first, turret → ship → bg
//! ```
//!
//! Buckets are rebuilt from scratch every frame. Between rebuilds,
//! [`FrameOrder::prune`] drops ids that were removed so draw and input never
//! see a dead entity.

use std::collections::BTreeMap;

use super::commands::Commands;
use super::entity::{EntityId, Layer};
use super::hierarchy::{HierarchyNode, HierarchyStore};
use crate::render::{DrawContext, RenderStage};
use crate::time::Time;

/// Passed to [`Entity::update`](super::Entity::update) and
/// [`Entity::fixed_update`](super::Entity::fixed_update).
pub struct UpdateContext<'a> {
    id: EntityId,
    layer: Layer,
    draw_index: &'a mut i32,
    delta: f32,
    frame: u64,
    commands: &'a mut Commands,
}

impl UpdateContext<'_> {
    /// The entity being updated.
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Seconds covered by this hook: the frame delta for `update`, the fixed
    /// step for `fixed_update`.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn draw_index(&self) -> i32 {
        *self.draw_index
    }

    /// Change this entity's draw index. Applies to this frame's sort.
    pub fn set_draw_index(&mut self, draw_index: i32) {
        *self.draw_index = draw_index;
    }

    /// Queue structural edits, applied after the update walk.
    pub fn commands(&mut self) -> &mut Commands {
        &mut *self.commands
    }
}

/// Layer buckets for one frame, each sorted by draw index.
#[derive(Debug, Default, Clone)]
pub struct FrameOrder {
    layers: BTreeMap<Layer, Vec<EntityId>>,
}

impl FrameOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `store`, running update hooks and rebuilding every bucket.
    /// Returns the number of entities visited.
    pub fn rebuild(
        &mut self,
        store: &mut HierarchyStore,
        time: &Time,
        commands: &mut Commands,
    ) -> usize {
        self.layers.clear();

        let root = store.root();
        let mut stack: Vec<EntityId> = store.children(root).iter().rev().copied().collect();
        let mut visited = 0;

        while let Some(id) = stack.pop() {
            let Some(node) = store.node_mut(id) else {
                continue;
            };
            let HierarchyNode {
                entity,
                children,
                layer,
                draw_index,
                ..
            } = node;

            self.layers.entry(*layer).or_default().push(id);

            let mut ctx = UpdateContext {
                id,
                layer: *layer,
                draw_index,
                delta: time.delta_secs(),
                frame: time.frame_count(),
                commands: &mut *commands,
            };
            entity.update(&mut ctx);

            ctx.delta = time.fixed_step_secs();
            for _ in 0..time.fixed_steps() {
                entity.fixed_update(&mut ctx);
            }

            stack.extend(children.iter().rev().copied());
            visited += 1;
        }

        for bucket in self.layers.values_mut() {
            bucket.sort_by_key(|&id| store.draw_index(id).unwrap_or(0));
        }
        visited
    }

    /// Drop ids that are no longer registered, and any bucket left empty.
    pub fn prune(&mut self, store: &HierarchyStore) {
        for bucket in self.layers.values_mut() {
            bucket.retain(|&id| store.contains(id));
        }
        self.layers.retain(|_, bucket| !bucket.is_empty());
    }

    /// Run every draw hook, layer by layer in ascending order, back to front
    /// within a layer.
    pub fn draw(&self, store: &mut HierarchyStore, stage: &mut dyn RenderStage) {
        for (&layer, bucket) in &self.layers {
            stage.begin_layer(layer);
            for &id in bucket {
                let Some(node) = store.node_mut(id) else {
                    continue;
                };
                let mut ctx = DrawContext {
                    id,
                    layer,
                    draw_index: node.draw_index,
                    stage: &mut *stage,
                };
                node.entity.draw(&mut ctx);
            }
            stage.end_layer(layer);
        }
    }

    /// Buckets in ascending layer order. Reverse it for input order.
    pub fn layers(&self) -> impl DoubleEndedIterator<Item = (Layer, &[EntityId])> + '_ {
        self.layers
            .iter()
            .map(|(&layer, bucket)| (layer, bucket.as_slice()))
    }

    /// The bucket for `layer`, back to front. Empty if nothing is on it.
    pub fn layer(&self, layer: Layer) -> &[EntityId] {
        self.layers.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total entities across all buckets.
    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
