//! Region quadtree — broad-phase demo.
//!
//! Scatters a few hundred boxes over a 1024×1024 world, queries a window,
//! removes half the boxes, and runs cleanup passes until the tree stops
//! shrinking. Prints the tree stats after each step.
//!
//! Run with: `RUST_LOG=trace cargo run -p askr --example quadtree`

use askr::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    env_logger::init();

    let config = QuadTreeConfig {
        leaf_capacity: 6,
        max_depth: 6,
    };
    let mut tree: QuadTree<u32> = QuadTree::with_config(IRect::new(0, 0, 1023, 1023), config);
    let mut rng = StdRng::seed_from_u64(7);

    let mut boxes = Vec::new();
    for id in 0..400u32 {
        let x = rng.gen_range(0..1000);
        let y = rng.gen_range(0..1000);
        let rect = IRect::new(x, y, x + rng.gen_range(1..24), y + rng.gen_range(1..24));
        tree.insert(id, rect);
        boxes.push((id, rect));
    }
    println!("after insert:  {:?}", tree.stats());

    let window = IRect::new(256, 256, 511, 511);
    let mut hits = tree.elements_in_rect(window);
    let occurrences = hits.len();
    hits.sort_unstable();
    hits.dedup();
    println!(
        "window {window:?}: {} candidate(s), {occurrences} occurrence(s)",
        hits.len()
    );

    for &(id, rect) in boxes.iter().filter(|(id, _)| id % 2 == 0) {
        tree.remove(id, rect);
    }
    println!("after removal: {:?}", tree.stats());

    let mut pass = 1;
    while tree.cleanup() > 0 {
        println!("cleanup #{pass}:    {:?}", tree.stats());
        pass += 1;
    }

    let mut deepest = 0;
    tree.visit(|node| {
        if let NodeView::Leaf { depth, .. } = node {
            deepest = deepest.max(depth);
        }
    });
    println!("deepest leaf: {deepest}");
}
