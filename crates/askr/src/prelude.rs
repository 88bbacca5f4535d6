//! Convenient re-exports. Start with `use askr::prelude::*`.

pub use crate::collections::FreeList;
pub use crate::config::{Config, QuadTreeConfig, SceneConfig};
pub use crate::error::{ConfigError, HierarchyError};
pub use crate::graph::{
    Commands, Entity, EntityId, FrameOrder, Group, HierarchyStore, Layer, Node2D, Transform2D,
    UpdateContext,
};
pub use crate::input::{InputEvent, InputState, Key, MouseButton};
pub use crate::math::{IRect, IVec2, Pose2D, Vec2};
pub use crate::render::{DrawContext, NullStage, RenderStage};
pub use crate::scene::{FrameStats, Scene};
pub use crate::spatial::{NodeView, QuadTree};
pub use crate::time::Time;
