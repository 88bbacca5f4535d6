//! # Askr — Scene Graph and Spatial Index
//!
//! The object-management core of a 2D game: a tree of entities with
//! generational handles, transform propagation from parents to children, a
//! deterministic per-frame update/draw/input order across render layers, and a
//! region quadtree for spatial queries.
//!
//! Rendering, windowing and platform input stay outside. The scene talks to a
//! renderer only through [`RenderStage`](render::RenderStage) and takes input
//! as a plain list of [`InputEvent`](input::InputEvent)s.
//!
//! Start with `use askr::prelude::*` and build a [`Scene`](scene::Scene).

pub mod collections;
pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod math;
pub mod prelude;
pub mod render;
pub mod scene;
pub mod spatial;
pub mod time;

#[cfg(feature = "diagnostics")]
pub mod diag;
