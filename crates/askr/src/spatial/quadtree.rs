//! # QuadTree — Region Quadtree over Integer Boxes
//!
//! Indexes axis-aligned rectangles for range queries. The whole tree lives in
//! three flat arrays; nothing is boxed and nothing points at anything.
//!
//! ```text
//! nodes:        Vec<QuadNode>            ← node 0 is the root; children of a
//!                                           branch are 4 contiguous entries
//! elements:     FreeList<QtElement>      ← one entry per inserted box (id + rect)
//! occurrences:  FreeList<QtElemNode>     ← singly linked per-leaf chains; one
//!                                           entry per (leaf, element) pair
//! ```
//!
//! ## Node States
//!
//! A node is a `Leaf` (head of its occurrence chain + count) or a `Branch`
//! (index of its first child). The root starts as an empty leaf. A leaf whose
//! count exceeds `leaf_capacity` after an insert, and whose depth is below
//! `max_depth`, is split: its elements are drained, four empty child leaves are
//! allocated, the node becomes a branch, and the drained elements are inserted
//! again from that node down. At `max_depth`, or once a leaf's half extents
//! reach zero, a leaf just keeps growing.
//!
//! Node rectangles are not stored. They are recomputed while descending by
//! halving the parent's half extents with integer division, so odd sizes
//! consistently lose a unit on the far side.
//!
//! ## Duplication
//!
//! An element whose box straddles a split line is linked into every leaf it
//! touches. Removal therefore revisits every leaf under the element's stored
//! box, and [`elements_in_rect`](QuadTree::elements_in_rect) may report the same
//! id more than once. Deduplicate on the caller side if that matters.
//!
//! ## Lazy Merge
//!
//! Removal never restructures the tree. [`cleanup`](QuadTree::cleanup) does one
//! top-down pass collapsing any branch whose four children are empty leaves,
//! and threads the freed block onto a free chain that the next split reuses.
//! A deep empty subtree collapses one level per pass, so call it every frame
//! (or every few frames) rather than once.

use crate::collections::FreeList;
use crate::config::QuadTreeConfig;
use crate::math::{IRect, IVec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuadNode {
    Leaf { first: Option<u32>, count: u32 },
    Branch { first_child: u32 },
    /// Slot in a merged block. The first slot of a freed block links to the
    /// next freed block.
    Vacant { next_block: Option<u32> },
}

const EMPTY_LEAF: QuadNode = QuadNode::Leaf {
    first: None,
    count: 0,
};

#[derive(Debug, Clone, Copy)]
struct QtElement<I> {
    id: I,
    rect: IRect,
}

/// One link in a leaf's occurrence chain.
#[derive(Debug, Clone, Copy)]
struct QtElemNode {
    next: Option<u32>,
    element: u32,
}

/// A node index together with the geometry recomputed on the way down.
#[derive(Debug, Clone, Copy)]
struct NodeData {
    index: u32,
    center: IVec2,
    half: IVec2,
    depth: u32,
}

impl NodeData {
    /// Quadrants: 0 = min x/min y, 1 = max x/min y, 2 = min x/max y, 3 = max x/max y.
    fn child(&self, first_child: u32, quadrant: u32) -> NodeData {
        let half = IVec2::new(self.half.x / 2, self.half.y / 2);
        let dx = if quadrant & 1 == 0 { -half.x } else { half.x };
        let dy = if quadrant & 2 == 0 { -half.y } else { half.y };
        NodeData {
            index: first_child + quadrant,
            center: self.center + IVec2::new(dx, dy),
            half,
            depth: self.depth + 1,
        }
    }

    fn rect(&self) -> IRect {
        IRect::from_center_half(self.center, self.half)
    }
}

/// A node as seen by [`QuadTree::visit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeView {
    Leaf { rect: IRect, depth: u32, count: u32 },
    Branch { rect: IRect, depth: u32 },
}

/// Structural counters, mostly for diagnostics overlays and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct QuadTreeStats {
    pub elements: usize,
    pub occurrences: usize,
    pub leaves: usize,
    pub branches: usize,
    /// Length of the node array, including freed blocks.
    pub node_slots: usize,
    pub free_blocks: usize,
}

/// A region quadtree mapping boxes to external ids of type `I`.
#[derive(Debug, Clone)]
pub struct QuadTree<I = u32> {
    config: QuadTreeConfig,
    bounds: IRect,
    nodes: Vec<QuadNode>,
    free_block: Option<u32>,
    elements: FreeList<QtElement<I>>,
    occurrences: FreeList<QtElemNode>,
}

impl<I: Copy + PartialEq> QuadTree<I> {
    pub fn new(bounds: IRect) -> Self {
        Self::with_config(bounds, QuadTreeConfig::default())
    }

    pub fn with_config(bounds: IRect, config: QuadTreeConfig) -> Self {
        Self {
            config,
            bounds,
            nodes: vec![EMPTY_LEAF],
            free_block: None,
            elements: FreeList::new(),
            occurrences: FreeList::new(),
        }
    }

    pub fn bounds(&self) -> IRect {
        self.bounds
    }

    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Number of distinct elements stored.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Look up an element by the handle [`insert`](Self::insert) returned.
    pub fn get(&self, handle: u32) -> Option<(I, IRect)> {
        self.elements
            .get(handle as usize)
            .map(|element| (element.id, element.rect))
    }

    // ── Insert / Remove ──────────────────────────────────────────────

    /// Insert `id` with bounding box `rect`. Returns a handle that stays valid
    /// until the element is removed.
    ///
    /// Boxes outside the tree bounds are clamped into the edge leaves.
    pub fn insert(&mut self, id: I, rect: IRect) -> u32 {
        let element = self.elements.insert(QtElement { id, rect }) as u32;
        self.node_insert(self.root_data(), element);
        element
    }

    /// Remove one element with `id` found under `rect`. An element whose
    /// stored box equals `rect` is preferred; otherwise the first match is
    /// taken. Returns `false` if no leaf under `rect` holds that id.
    pub fn remove(&mut self, id: I, rect: IRect) -> bool {
        match self.find_element(id, rect) {
            Some(handle) => self.remove_element(handle),
            None => false,
        }
    }

    /// Remove an element by handle, unlinking it from every leaf its stored
    /// box touches.
    pub fn remove_element(&mut self, handle: u32) -> bool {
        let Some(element) = self.elements.get(handle as usize) else {
            return false;
        };
        let mut leaves = Vec::new();
        self.find_leaves(self.root_data(), &element.rect, &mut leaves);
        for leaf in leaves {
            self.leaf_unlink(leaf.index, handle);
        }
        self.elements.remove(handle as usize);
        true
    }

    /// Drop every element and collapse back to a single empty root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(EMPTY_LEAF);
        self.free_block = None;
        self.elements.clear();
        self.occurrences.clear();
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Ids of every element linked into a leaf that intersects `rect`.
    ///
    /// The result is the leaves' contents, not an exact overlap test: it may
    /// include boxes that miss `rect` but share a leaf with it, and elements
    /// stored in several leaves under `rect` are reported once per leaf.
    pub fn elements_in_rect(&self, rect: IRect) -> Vec<I> {
        let mut leaves = Vec::new();
        self.find_leaves(self.root_data(), &rect, &mut leaves);

        let mut out = Vec::new();
        for leaf in leaves {
            let QuadNode::Leaf { first, .. } = self.nodes[leaf.index as usize] else {
                continue;
            };
            let mut cursor = first;
            while let Some(occ) = cursor {
                let link = self.occurrences[occ as usize];
                out.push(self.elements[link.element as usize].id);
                cursor = link.next;
            }
        }
        out
    }

    /// Walk the tree depth-first, root first.
    pub fn visit(&self, mut f: impl FnMut(NodeView)) {
        let mut stack = vec![self.root_data()];
        while let Some(node) = stack.pop() {
            match self.nodes[node.index as usize] {
                QuadNode::Leaf { count, .. } => f(NodeView::Leaf {
                    rect: node.rect(),
                    depth: node.depth,
                    count,
                }),
                QuadNode::Branch { first_child } => {
                    f(NodeView::Branch {
                        rect: node.rect(),
                        depth: node.depth,
                    });
                    for quadrant in (0..4).rev() {
                        stack.push(node.child(first_child, quadrant));
                    }
                }
                QuadNode::Vacant { .. } => {}
            }
        }
    }

    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats {
            elements: self.elements.len(),
            occurrences: self.occurrences.len(),
            node_slots: self.nodes.len(),
            ..Default::default()
        };
        self.visit(|view| match view {
            NodeView::Leaf { .. } => stats.leaves += 1,
            NodeView::Branch { .. } => stats.branches += 1,
        });
        let mut cursor = self.free_block;
        while let Some(block) = cursor {
            stats.free_blocks += 1;
            cursor = match self.nodes[block as usize] {
                QuadNode::Vacant { next_block } => next_block,
                _ => None,
            };
        }
        stats
    }

    // ── Maintenance ──────────────────────────────────────────────────

    /// One top-down merge pass. Returns the number of branches collapsed.
    pub fn cleanup(&mut self) -> usize {
        let mut merged = 0;
        let mut stack = Vec::new();
        if let QuadNode::Branch { .. } = self.nodes[0] {
            stack.push(0u32);
        }

        while let Some(index) = stack.pop() {
            let QuadNode::Branch { first_child } = self.nodes[index as usize] else {
                continue;
            };
            let mut empty_leaves = 0;
            for quadrant in 0..4 {
                let child = first_child + quadrant;
                match self.nodes[child as usize] {
                    QuadNode::Leaf { count: 0, .. } => empty_leaves += 1,
                    QuadNode::Branch { .. } => stack.push(child),
                    _ => {}
                }
            }

            if empty_leaves == 4 {
                let block = first_child as usize;
                self.nodes[block] = QuadNode::Vacant {
                    next_block: self.free_block,
                };
                for slot in &mut self.nodes[block + 1..block + 4] {
                    *slot = QuadNode::Vacant { next_block: None };
                }
                self.free_block = Some(first_child);
                self.nodes[index as usize] = EMPTY_LEAF;
                merged += 1;
            }
        }

        if merged > 0 {
            log::trace!("quadtree cleanup merged {merged} branch(es)");
        }
        merged
    }

    // ── Internals ────────────────────────────────────────────────────

    fn root_data(&self) -> NodeData {
        NodeData {
            index: 0,
            center: self.bounds.center(),
            half: self.bounds.half_extents(),
            depth: 0,
        }
    }

    /// Collect every leaf under `start` whose region intersects `rect`.
    fn find_leaves(&self, start: NodeData, rect: &IRect, out: &mut Vec<NodeData>) {
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            match self.nodes[node.index as usize] {
                QuadNode::Leaf { .. } => out.push(node),
                QuadNode::Branch { first_child } => {
                    let c = node.center;
                    let left = rect.min.x <= c.x;
                    let right = rect.max.x > c.x;
                    if rect.min.y <= c.y {
                        if left {
                            stack.push(node.child(first_child, 0));
                        }
                        if right {
                            stack.push(node.child(first_child, 1));
                        }
                    }
                    if rect.max.y > c.y {
                        if left {
                            stack.push(node.child(first_child, 2));
                        }
                        if right {
                            stack.push(node.child(first_child, 3));
                        }
                    }
                }
                QuadNode::Vacant { .. } => {
                    debug_assert!(false, "descended into a freed quadtree block");
                }
            }
        }
    }

    fn node_insert(&mut self, start: NodeData, element: u32) {
        let rect = self.elements[element as usize].rect;
        let mut leaves = Vec::new();
        self.find_leaves(start, &rect, &mut leaves);
        for leaf in leaves {
            self.leaf_insert(leaf, element);
        }
    }

    fn leaf_insert(&mut self, leaf: NodeData, element: u32) {
        let index = leaf.index as usize;
        let QuadNode::Leaf { first, count } = self.nodes[index] else {
            return;
        };
        let occ = self.occurrences.insert(QtElemNode {
            next: first,
            element,
        }) as u32;
        let count = count + 1;
        self.nodes[index] = QuadNode::Leaf {
            first: Some(occ),
            count,
        };

        // A leaf with zero half extents can't be divided any further.
        let divisible = leaf.half.x > 0 || leaf.half.y > 0;
        if count > self.config.leaf_capacity && leaf.depth < self.config.max_depth && divisible {
            self.subdivide(leaf);
        }
    }

    fn subdivide(&mut self, leaf: NodeData) {
        let index = leaf.index as usize;
        let QuadNode::Leaf { first, count } = self.nodes[index] else {
            return;
        };

        let mut drained = Vec::with_capacity(count as usize);
        let mut cursor = first;
        while let Some(occ) = cursor {
            let Some(link) = self.occurrences.remove(occ as usize) else {
                break;
            };
            drained.push(link.element);
            cursor = link.next;
        }

        let first_child = self.alloc_block();
        self.nodes[index] = QuadNode::Branch { first_child };
        log::trace!(
            "quadtree split node {} at depth {} ({} elements)",
            leaf.index,
            leaf.depth,
            drained.len()
        );

        for element in drained {
            self.node_insert(leaf, element);
        }
    }

    /// Four contiguous empty leaves, reusing a merged block when possible.
    fn alloc_block(&mut self) -> u32 {
        match self.free_block {
            Some(block) => {
                if let QuadNode::Vacant { next_block } = self.nodes[block as usize] {
                    self.free_block = next_block;
                }
                let start = block as usize;
                self.nodes[start..start + 4].fill(EMPTY_LEAF);
                block
            }
            None => {
                let block = self.nodes.len() as u32;
                self.nodes.extend([EMPTY_LEAF; 4]);
                block
            }
        }
    }

    /// Handle of an element with `id` under `rect`, preferring an exact box
    /// match.
    fn find_element(&self, id: I, rect: IRect) -> Option<u32> {
        let mut leaves = Vec::new();
        self.find_leaves(self.root_data(), &rect, &mut leaves);

        let mut first_match = None;
        for leaf in leaves {
            let QuadNode::Leaf { first, .. } = self.nodes[leaf.index as usize] else {
                continue;
            };
            let mut cursor = first;
            while let Some(occ) = cursor {
                let link = self.occurrences[occ as usize];
                let element = &self.elements[link.element as usize];
                if element.id == id {
                    if element.rect == rect {
                        return Some(link.element);
                    }
                    first_match.get_or_insert(link.element);
                }
                cursor = link.next;
            }
        }
        first_match
    }

    /// Drop every occurrence of `element` from one leaf's chain.
    fn leaf_unlink(&mut self, leaf: u32, element: u32) {
        let index = leaf as usize;
        let QuadNode::Leaf { mut first, mut count } = self.nodes[index] else {
            return;
        };

        let mut prev: Option<u32> = None;
        let mut cursor = first;
        while let Some(occ) = cursor {
            let link = self.occurrences[occ as usize];
            if link.element == element {
                match prev {
                    Some(p) => self.occurrences[p as usize].next = link.next,
                    None => first = link.next,
                }
                self.occurrences.remove(occ as usize);
                count -= 1;
            } else {
                prev = Some(occ);
            }
            cursor = link.next;
        }
        self.nodes[index] = QuadNode::Leaf { first, count };
    }
}
