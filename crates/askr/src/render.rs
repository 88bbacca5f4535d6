//! The render collaborator.
//!
//! The scene never draws anything itself. It walks its layers in order and
//! hands each entity a [`DrawContext`]; whatever renderer sits behind
//! [`RenderStage`] does the actual work. The scene also asks the stage to
//! convert screen points into each layer's space when dispatching input.

use crate::graph::{EntityId, Layer};
use crate::math::Vec2;

/// A renderer (or a test double) the scene draws through.
pub trait RenderStage {
    /// Convert a screen-space point into `layer`'s world space, e.g. through
    /// that layer's camera. Identity by default.
    fn screen_to_world(&self, _layer: Layer, screen: Vec2) -> Vec2 {
        screen
    }

    /// Called before the first entity of `layer` draws.
    fn begin_layer(&mut self, _layer: Layer) {}

    /// Called after the last entity of `layer` drew.
    fn end_layer(&mut self, _layer: Layer) {}
}

/// A stage that discards everything. Useful for headless scenes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStage;

impl RenderStage for NullStage {}

/// Passed to [`Entity::draw`](crate::graph::Entity::draw).
pub struct DrawContext<'a> {
    pub(crate) id: EntityId,
    pub(crate) layer: Layer,
    pub(crate) draw_index: i32,
    pub(crate) stage: &'a mut dyn RenderStage,
}

impl DrawContext<'_> {
    /// The entity being drawn.
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn draw_index(&self) -> i32 {
        self.draw_index
    }

    /// The stage to draw into.
    pub fn stage(&mut self) -> &mut dyn RenderStage {
        &mut *self.stage
    }
}
