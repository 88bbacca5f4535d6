//! Deferred structural edits.
//!
//! Entity hooks run while the store is being walked, so they can't add,
//! remove, or move entities directly. They queue the edit on [`Commands`]
//! instead (reachable through [`UpdateContext::commands`](super::UpdateContext::commands)),
//! and the scene applies the queue once the update walk has finished.

use super::entity::{Entity, EntityId, Layer};
use super::hierarchy::HierarchyStore;

pub(crate) enum Command {
    Spawn {
        parent: EntityId,
        entity: Box<dyn Entity>,
        layer: Layer,
    },
    Despawn(EntityId),
    Reparent {
        entity: EntityId,
        new_parent: EntityId,
    },
}

/// A FIFO queue of structural edits.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue adding `entity` under `parent` on `layer`.
    pub fn spawn<E: Entity>(&mut self, parent: EntityId, entity: E, layer: Layer) {
        self.spawn_boxed(parent, Box::new(entity), layer);
    }

    pub fn spawn_boxed(&mut self, parent: EntityId, entity: Box<dyn Entity>, layer: Layer) {
        self.queue.push(Command::Spawn {
            parent,
            entity,
            layer,
        });
    }

    /// Queue removing `entity` and its subtree.
    pub fn despawn(&mut self, entity: EntityId) {
        self.queue.push(Command::Despawn(entity));
    }

    pub fn reparent(&mut self, entity: EntityId, new_parent: EntityId) {
        self.queue.push(Command::Reparent { entity, new_parent });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Apply every queued edit in order and empty the queue. Returns how many
    /// edits succeeded; rejected ones were already logged by the store.
    pub fn apply(&mut self, store: &mut HierarchyStore) -> usize {
        let mut applied = 0;
        for command in self.queue.drain(..) {
            let ok = match command {
                Command::Spawn {
                    parent,
                    entity,
                    layer,
                } => store.add_boxed(parent, entity, layer).is_ok(),
                Command::Despawn(entity) => store.remove_entity(entity).is_ok(),
                Command::Reparent { entity, new_parent } => {
                    store.reparent(entity, new_parent).is_ok()
                }
            };
            applied += ok as usize;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Group;

    #[test]
    fn applies_in_queue_order() {
        let mut store = HierarchyStore::new();
        let root = store.root();
        let a = store.add_entity(root, Group::new("a"), Layer::DEFAULT).unwrap();
        let b = store.add_entity(root, Group::new("b"), Layer::DEFAULT).unwrap();

        let mut commands = Commands::new();
        commands.spawn(a, Group::new("a1"), Layer(3));
        commands.reparent(a, b);
        commands.despawn(b);
        assert_eq!(commands.len(), 3);

        assert_eq!(commands.apply(&mut store), 3);
        assert!(commands.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn rejected_edits_are_skipped() {
        let mut store = HierarchyStore::new();
        let root = store.root();
        let a = store.add_entity(root, Group::new("a"), Layer::DEFAULT).unwrap();

        let mut commands = Commands::new();
        commands.despawn(a);
        commands.despawn(a);
        commands.spawn(a, Group::new("late"), Layer::DEFAULT);

        assert_eq!(commands.apply(&mut store), 1);
        assert!(store.is_empty());
    }
}
