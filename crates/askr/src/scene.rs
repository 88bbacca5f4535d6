//! # Scene — One Hierarchy and Its Frame Loop
//!
//! A [`Scene`] owns a [`HierarchyStore`] together with everything needed to
//! step it: the frame clock, the per-frame layer order, the deferred command
//! queue, and held-input state. Nothing is global, so any number of scenes can
//! live side by side (a game world and an editor preview, or one per test).
//!
//! ## Frame Phases
//!
//! ```text
//! update(dt)
//!   ├─ clock advances, fixed steps counted
//!   ├─ transforms propagate (edits since last frame)
//!   ├─ tree walked: buckets rebuilt, update / fixed_update hooks
//!   ├─ queued commands applied
//!   ├─ transforms propagate again (edits made by hooks)
//!   └─ removed entities pruned from the buckets
//! draw(stage)            layers ascending, back to front
//! dispatch_input(events) layers descending, front to back
//! ```
//!
//! Update always precedes draw within a frame; [`Scene::frame`] runs all three
//! in order.

use std::time::Duration;

use serde::Serialize;

use crate::config::SceneConfig;
use crate::graph::{Commands, EntityId, FrameOrder, HierarchyStore};
use crate::input::{self, InputEvent, InputState};
use crate::render::RenderStage;
use crate::time::Time;

/// What one [`Scene::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Entities whose update hook ran.
    pub visited: usize,
    /// Fixed steps run this frame.
    pub fixed_steps: u32,
    /// Queued commands that succeeded.
    pub commands_applied: usize,
    /// Cached parent poses refreshed.
    pub transforms_refreshed: usize,
}

pub struct Scene {
    hierarchy: HierarchyStore,
    order: FrameOrder,
    commands: Commands,
    time: Time,
    input: InputState,
    config: SceneConfig,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            hierarchy: HierarchyStore::new(),
            order: FrameOrder::new(),
            commands: Commands::new(),
            time: Time::new(&config),
            input: InputState::default(),
            config,
        }
    }

    pub fn hierarchy(&self) -> &HierarchyStore {
        &self.hierarchy
    }

    /// Direct access for setup and between frames. Removals made here are
    /// pruned from the current order on the next [`draw`](Self::draw).
    pub fn hierarchy_mut(&mut self) -> &mut HierarchyStore {
        &mut self.hierarchy
    }

    /// Queue structural edits from outside the frame loop.
    pub fn commands(&mut self) -> &mut Commands {
        &mut self.commands
    }

    /// The order built by the last [`update`](Self::update).
    pub fn order(&self) -> &FrameOrder {
        &self.order
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Run the update phase for a frame lasting `delta`.
    pub fn update(&mut self, delta: Duration) -> FrameStats {
        let fixed_steps = self.time.advance(delta);
        let mut transforms_refreshed = self.hierarchy.propagate_transforms();

        let visited = self
            .order
            .rebuild(&mut self.hierarchy, &self.time, &mut self.commands);

        let commands_applied = self.commands.apply(&mut self.hierarchy);
        transforms_refreshed += self.hierarchy.propagate_transforms();
        self.order.prune(&self.hierarchy);

        log::trace!(
            "Frame {}: {visited} updated, {fixed_steps} fixed step(s), {commands_applied} command(s)",
            self.time.frame_count()
        );
        FrameStats {
            visited,
            fixed_steps,
            commands_applied,
            transforms_refreshed,
        }
    }

    /// Run the draw phase through `stage`.
    pub fn draw(&mut self, stage: &mut dyn RenderStage) {
        self.order.prune(&self.hierarchy);
        self.order.draw(&mut self.hierarchy, stage);
    }

    /// Offer this frame's events front to back. Returns the consumer of each
    /// event, if any.
    pub fn dispatch_input(
        &mut self,
        events: &[InputEvent],
        stage: &dyn RenderStage,
    ) -> Vec<Option<EntityId>> {
        self.input.apply(events);
        self.order.prune(&self.hierarchy);
        input::dispatch(&self.order, &mut self.hierarchy, events, stage)
    }

    /// Update, draw, then dispatch input, in that order.
    pub fn frame(
        &mut self,
        delta: Duration,
        events: &[InputEvent],
        stage: &mut dyn RenderStage,
    ) -> FrameStats {
        let stats = self.update(delta);
        self.draw(stage);
        self.dispatch_input(events, &*stage);
        stats
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::graph::{Entity, Group, Layer, Node2D, Transform2D, UpdateContext};
    use crate::input::Key;
    use crate::math::Vec2;
    use crate::render::{DrawContext, NullStage};

    type Log = Rc<RefCell<Vec<String>>>;

    /// Spawns one child on its first update, then removes itself on the next.
    struct Spawner {
        log: Log,
        spawned: bool,
    }

    impl Entity for Spawner {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            let id = ctx.id();
            if self.spawned {
                ctx.commands().despawn(id);
            } else {
                ctx.commands().spawn(id, Group::new("spawned"), Layer(1));
                self.spawned = true;
            }
            self.log.borrow_mut().push("update".to_string());
        }
        fn draw(&mut self, _ctx: &mut DrawContext<'_>) {
            self.log.borrow_mut().push("draw".to_string());
        }
        fn on_input_event(&mut self, _event: &InputEvent) -> bool {
            self.log.borrow_mut().push("input".to_string());
            false
        }
    }

    struct Painter {
        log: Log,
    }

    impl Entity for Painter {
        fn draw(&mut self, _ctx: &mut DrawContext<'_>) {
            self.log.borrow_mut().push("draw".to_string());
        }
    }

    /// Moves itself right by 10 units per second.
    struct Mover {
        transform: Transform2D,
    }

    impl Entity for Mover {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            self.transform.translate(Vec2::new(10.0 * ctx.delta(), 0.0));
        }
        fn transform(&self) -> Option<&Transform2D> {
            Some(&self.transform)
        }
        fn transform_mut(&mut self) -> Option<&mut Transform2D> {
            Some(&mut self.transform)
        }
    }

    #[test]
    fn frame_runs_update_then_draw_then_input() {
        let log: Log = Rc::default();
        let mut scene = Scene::new();
        let root = scene.hierarchy().root();
        scene
            .hierarchy_mut()
            .add_entity(root, Spawner { log: Rc::clone(&log), spawned: false }, Layer::DEFAULT)
            .unwrap();

        scene.frame(
            Duration::from_millis(16),
            &[InputEvent::KeyPressed(Key(1))],
            &mut NullStage,
        );
        assert_eq!(*log.borrow(), ["update", "draw", "input"]);
        assert!(scene.input().keys.just_pressed(Key(1)));
    }

    #[test]
    fn commands_from_hooks_apply_after_the_walk() {
        let log: Log = Rc::default();
        let mut scene = Scene::new();
        let root = scene.hierarchy().root();
        let spawner = scene
            .hierarchy_mut()
            .add_entity(root, Spawner { log: Rc::clone(&log), spawned: false }, Layer::DEFAULT)
            .unwrap();

        let stats = scene.update(Duration::from_millis(16));
        assert_eq!(stats.visited, 1);
        assert_eq!(stats.commands_applied, 1);
        assert_eq!(scene.hierarchy().children(spawner).len(), 1);
        // Spawned after the walk, so not in this frame's order yet.
        assert_eq!(scene.order().len(), 1);

        let stats = scene.update(Duration::from_millis(16));
        assert_eq!(stats.visited, 2);
        assert!(scene.hierarchy().is_empty());
        assert!(scene.order().is_empty());
    }

    #[test]
    fn hook_edits_propagate_within_the_frame() {
        let mut scene = Scene::new();
        let root = scene.hierarchy().root();
        let mover = scene
            .hierarchy_mut()
            .add_entity(
                root,
                Mover {
                    transform: Transform2D::default(),
                },
                Layer::DEFAULT,
            )
            .unwrap();
        let rider = scene
            .hierarchy_mut()
            .add_entity(mover, Node2D::new("rider", Transform2D::from_xy(0.0, 1.0)), Layer::DEFAULT)
            .unwrap();

        scene.update(Duration::from_millis(500));
        let position = scene.hierarchy().transform(rider).unwrap().position();
        approx::assert_abs_diff_eq!(position.x, 5.0, epsilon = 1e-4);
        approx::assert_abs_diff_eq!(position.y, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn removal_between_frames_is_pruned_before_draw() {
        let log: Log = Rc::default();
        let mut scene = Scene::new();
        let root = scene.hierarchy().root();
        let spawner = scene
            .hierarchy_mut()
            .add_entity(root, Spawner { log: Rc::clone(&log), spawned: true }, Layer::DEFAULT)
            .unwrap();
        scene.commands().despawn(spawner);
        scene.hierarchy_mut().add_entity(root, Group::new("keep"), Layer::DEFAULT).unwrap();

        // The despawn queued from outside runs after this frame's walk.
        scene.update(Duration::from_millis(16));
        log.borrow_mut().clear();
        scene.draw(&mut NullStage);
        assert!(log.borrow().is_empty());
        assert_eq!(scene.order().len(), 1);
    }

    #[test]
    fn removed_subtree_is_not_drawn_next_frame() {
        let log: Log = Rc::default();
        let mut scene = Scene::new();
        let root = scene.hierarchy().root();
        let a = scene.hierarchy_mut().add_entity(root, Group::new("A"), Layer::DEFAULT).unwrap();
        let b = scene
            .hierarchy_mut()
            .add_entity(a, Painter { log: Rc::clone(&log) }, Layer::DEFAULT)
            .unwrap();
        scene.update(Duration::from_millis(16));
        assert_eq!(scene.order().len(), 2);

        assert_eq!(scene.hierarchy_mut().remove_entity(a), Ok(2));
        assert!(!scene.hierarchy().contains(b));
        log.borrow_mut().clear();
        scene.draw(&mut NullStage);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn fixed_steps_follow_config() {
        let mut scene = Scene::with_config(SceneConfig {
            fixed_timestep_secs: 0.01,
            max_fixed_steps_per_frame: 3,
        });
        assert_eq!(scene.update(Duration::from_millis(25)).fixed_steps, 2);
        assert_eq!(scene.update(Duration::from_millis(100)).fixed_steps, 3);
    }
}
