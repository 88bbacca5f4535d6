//! Error types.
//!
//! Hierarchy errors are never fatal: every operation that returns one has
//! already logged it and left the tree exactly as it was.

use thiserror::Error;

use crate::graph::EntityId;

/// A structural operation on the [`HierarchyStore`](crate::graph::HierarchyStore)
/// was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The entity handle is stale, already removed, or was never registered.
    #[error("entity {0} is not registered in the hierarchy")]
    NotRegistered(EntityId),

    /// The parent handle passed to an insert or reparent is not registered.
    #[error("parent {0} is not registered in the hierarchy")]
    ParentNotRegistered(EntityId),

    /// The scene root cannot be removed or moved.
    #[error("precondition violated: the scene root cannot be removed or reparented")]
    RootImmutable,

    /// Reparenting would make an entity its own ancestor.
    #[error("precondition violated: cannot move {entity} under its own descendant {new_parent}")]
    WouldCreateCycle {
        entity: EntityId,
        new_parent: EntityId,
    },
}

impl HierarchyError {
    /// `true` for misuse that breaks an API precondition, as opposed to
    /// operating on an entity that simply isn't there.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            HierarchyError::RootImmutable | HierarchyError::WouldCreateCycle { .. }
        )
    }
}

/// Loading or validating a configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
