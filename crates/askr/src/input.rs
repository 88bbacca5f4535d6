//! Input events, held-input state, and back-to-front dispatch.
//!
//! Each frame the caller hands the scene an ordered list of [`InputEvent`]s.
//! [`dispatch`] offers every event to entities front to back: the last-drawn
//! layer first, and within a layer from the highest draw index down. The
//! first entity whose [`on_input_event`](crate::graph::Entity::on_input_event)
//! returns `false` consumes the event.
//!
//! Pointer positions arrive in screen space and are converted into each
//! layer's space through the [`RenderStage`] before that layer sees them.
//!
//! The [`InputState`] tracks which keys/buttons are currently pressed,
//! just pressed this frame, or just released this frame, independent of who
//! consumed the events.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::graph::{EntityId, FrameOrder, HierarchyStore, Layer};
use crate::math::Vec2;
use crate::render::RenderStage;

/// A key, identified by a platform scan code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// One input event. Pointer positions are in screen space when handed to the
/// scene and in the receiving layer's space when an entity sees them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerMoved { position: Vec2 },
    PointerPressed { button: MouseButton, position: Vec2 },
    PointerReleased { button: MouseButton, position: Vec2 },
    KeyPressed(Key),
    KeyReleased(Key),
    Wheel { delta: Vec2 },
}

impl InputEvent {
    /// Pointer position carried by the event, if any.
    pub fn position(&self) -> Option<Vec2> {
        match *self {
            InputEvent::PointerMoved { position }
            | InputEvent::PointerPressed { position, .. }
            | InputEvent::PointerReleased { position, .. } => Some(position),
            _ => None,
        }
    }

    /// The same event with its pointer position converted into `layer`'s
    /// space.
    pub fn in_layer_space(&self, layer: Layer, stage: &dyn RenderStage) -> InputEvent {
        let to_layer = |p: Vec2| stage.screen_to_world(layer, p);
        match *self {
            InputEvent::PointerMoved { position } => InputEvent::PointerMoved {
                position: to_layer(position),
            },
            InputEvent::PointerPressed { button, position } => InputEvent::PointerPressed {
                button,
                position: to_layer(position),
            },
            InputEvent::PointerReleased { button, position } => InputEvent::PointerReleased {
                button,
                position: to_layer(position),
            },
            other => other,
        }
    }
}

/// Offer each event to the entities in `order`, front to back. Returns, per
/// event, the entity that consumed it (`None` if every entity let it through).
pub fn dispatch(
    order: &FrameOrder,
    store: &mut HierarchyStore,
    events: &[InputEvent],
    stage: &dyn RenderStage,
) -> Vec<Option<EntityId>> {
    events
        .iter()
        .map(|event| dispatch_one(order, store, event, stage))
        .collect()
}

fn dispatch_one(
    order: &FrameOrder,
    store: &mut HierarchyStore,
    event: &InputEvent,
    stage: &dyn RenderStage,
) -> Option<EntityId> {
    for (layer, bucket) in order.layers().rev() {
        let local = event.in_layer_space(layer, stage);
        for &id in bucket.iter().rev() {
            let Some(entity) = store.entity_mut(id) else {
                continue;
            };
            if !entity.on_input_event(&local) {
                log::trace!("{event:?} consumed by {id}");
                return Some(id);
            }
        }
    }
    None
}

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Held keys and buttons plus the last pointer position, in screen space.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keys: Input<Key>,
    pub buttons: Input<MouseButton>,
    pub cursor: Vec2,
}

impl InputState {
    /// Fold one frame's events in. Forgets last frame's edges first.
    pub fn apply(&mut self, events: &[InputEvent]) {
        self.keys.clear_just();
        self.buttons.clear_just();
        for event in events {
            match *event {
                InputEvent::KeyPressed(key) => self.keys.press(key),
                InputEvent::KeyReleased(key) => self.keys.release(key),
                InputEvent::PointerPressed { button, position } => {
                    self.buttons.press(button);
                    self.cursor = position;
                }
                InputEvent::PointerReleased { button, position } => {
                    self.buttons.release(button);
                    self.cursor = position;
                }
                InputEvent::PointerMoved { position } => self.cursor = position,
                InputEvent::Wheel { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::graph::{Commands, Entity};
    use crate::time::Time;

    type Seen = Rc<RefCell<Vec<(&'static str, InputEvent)>>>;

    struct Button {
        name: &'static str,
        consumes: bool,
        seen: Seen,
    }

    impl Entity for Button {
        fn on_input_event(&mut self, event: &InputEvent) -> bool {
            self.seen.borrow_mut().push((self.name, *event));
            !self.consumes
        }
    }

    /// Layer `n` is offset by `n * 100` on x.
    struct OffsetStage;

    impl RenderStage for OffsetStage {
        fn screen_to_world(&self, layer: Layer, screen: Vec2) -> Vec2 {
            screen + Vec2::new(layer.0 as f32 * 100.0, 0.0)
        }
    }

    fn button(name: &'static str, consumes: bool, seen: &Seen) -> Button {
        Button {
            name,
            consumes,
            seen: Rc::clone(seen),
        }
    }

    fn ordered(store: &mut HierarchyStore) -> FrameOrder {
        let mut time = Time::default();
        time.advance(Duration::ZERO);
        let mut order = FrameOrder::new();
        order.rebuild(store, &time, &mut Commands::new());
        order
    }

    #[test]
    fn top_layer_and_frontmost_entity_see_events_first() {
        let seen: Seen = Rc::default();
        let mut store = HierarchyStore::new();
        let root = store.root();
        let back = store.add_entity(root, button("back", false, &seen), Layer(0)).unwrap();
        store.add_entity(back, button("front", false, &seen), Layer(0)).unwrap();
        store.add_entity(root, button("hud", false, &seen), Layer(3)).unwrap();

        let order = ordered(&mut store);
        let consumed = dispatch(&order, &mut store, &[InputEvent::KeyPressed(Key(7))], &OffsetStage);

        assert_eq!(consumed, [None]);
        let names: Vec<&str> = seen.borrow().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["hud", "front", "back"]);
    }

    #[test]
    fn consuming_entity_stops_propagation() {
        let seen: Seen = Rc::default();
        let mut store = HierarchyStore::new();
        let root = store.root();
        store.add_entity(root, button("back", false, &seen), Layer(0)).unwrap();
        let mid = store.add_entity(root, button("mid", true, &seen), Layer(1)).unwrap();
        store.add_entity(root, button("top", false, &seen), Layer(2)).unwrap();

        let order = ordered(&mut store);
        let events = [InputEvent::KeyPressed(Key(1)), InputEvent::KeyReleased(Key(1))];
        let consumed = dispatch(&order, &mut store, &events, &OffsetStage);

        assert_eq!(consumed, [Some(mid), Some(mid)]);
        let names: Vec<&str> = seen.borrow().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["top", "mid", "top", "mid"]);
    }

    #[test]
    fn pointer_positions_are_converted_per_layer() {
        let seen: Seen = Rc::default();
        let mut store = HierarchyStore::new();
        let root = store.root();
        store.add_entity(root, button("l0", false, &seen), Layer(0)).unwrap();
        store.add_entity(root, button("l2", false, &seen), Layer(2)).unwrap();

        let order = ordered(&mut store);
        let event = InputEvent::PointerMoved {
            position: Vec2::new(5.0, 5.0),
        };
        dispatch(&order, &mut store, &[event], &OffsetStage);

        let positions: Vec<Vec2> = seen
            .borrow()
            .iter()
            .filter_map(|(_, event)| event.position())
            .collect();
        assert_eq!(positions, [Vec2::new(205.0, 5.0), Vec2::new(5.0, 5.0)]);
    }

    #[test]
    fn input_state_tracks_edges() {
        let mut state = InputState::default();
        state.apply(&[
            InputEvent::KeyPressed(Key(4)),
            InputEvent::PointerPressed {
                button: MouseButton::Left,
                position: Vec2::new(3.0, 4.0),
            },
        ]);
        assert!(state.keys.pressed(Key(4)));
        assert!(state.keys.just_pressed(Key(4)));
        assert!(state.buttons.just_pressed(MouseButton::Left));
        assert_eq!(state.cursor, Vec2::new(3.0, 4.0));

        state.apply(&[InputEvent::KeyReleased(Key(4))]);
        assert!(!state.keys.pressed(Key(4)));
        assert!(!state.keys.just_pressed(Key(4)));
        assert!(state.keys.just_released(Key(4)));
        assert!(state.buttons.pressed(MouseButton::Left));
    }
}
