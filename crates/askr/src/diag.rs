//! Diagnostics snapshots.
//!
//! Enabled by the `diagnostics` feature flag. [`SceneSnapshot::capture`]
//! flattens a scene into plain serializable data (tree, layer buckets, clock)
//! that a debug overlay or an external inspector can consume as JSON.

use serde::Serialize;

use crate::graph::{EntityId, HierarchyStore, Layer};
use crate::math::Vec2;
use crate::scene::Scene;
use crate::spatial::{QuadTree, QuadTreeStats};

// ── Snapshot types (wire format) ────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub frame_count: u64,
    pub delta_ms: f32,
    pub elapsed_secs: f32,
    pub entity_count: usize,
    pub layers: Vec<LayerSnapshot>,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSnapshot {
    pub layer: Layer,
    /// Back to front.
    pub entities: Vec<EntityId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: EntityId,
    pub name: String,
    pub parent: Option<EntityId>,
    pub layer: Layer,
    pub draw_index: i32,
    pub child_count: usize,
    /// Absolute position, for entities with a 2D transform.
    pub position: Option<Vec2>,
}

impl SceneSnapshot {
    pub fn capture(scene: &Scene) -> Self {
        let time = scene.time();
        Self {
            frame_count: time.frame_count(),
            delta_ms: time.delta_secs() * 1000.0,
            elapsed_secs: time.elapsed_secs(),
            entity_count: scene.hierarchy().len(),
            layers: scene
                .order()
                .layers()
                .map(|(layer, bucket)| LayerSnapshot {
                    layer,
                    entities: bucket.to_vec(),
                })
                .collect(),
            nodes: snapshot_nodes(scene.hierarchy()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Every non-root entity in pre-order.
pub fn snapshot_nodes(store: &HierarchyStore) -> Vec<NodeSnapshot> {
    store
        .descendants(store.root())
        .into_iter()
        .filter_map(|id| {
            let node = store.node(id)?;
            Some(NodeSnapshot {
                id,
                name: node.entity.name().to_string(),
                parent: node.parent,
                layer: node.layer,
                draw_index: node.draw_index,
                child_count: node.children.len(),
                position: node.entity.transform().map(|t| t.position()),
            })
        })
        .collect()
}

/// Quadtree statistics as JSON.
pub fn quadtree_json<I: Copy + PartialEq>(tree: &QuadTree<I>) -> serde_json::Result<String> {
    let stats: QuadTreeStats = tree.stats();
    serde_json::to_string(&stats)
}
