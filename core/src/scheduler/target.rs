use crate::engine::{EntityId, GameEngine, Location};

/// What a sequence is anchored to. A lookup key, never an owning
/// reference: entities are re-resolved through the engine every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetRef {
    Entity(EntityId),
    /// A fixed point. Always live.
    Location(Location),
    /// A display object the sequence owns and removes when it ends.
    Transient(EntityId),
}

impl TargetRef {
    pub fn is_live(&self, engine: &dyn GameEngine) -> bool {
        match self {
            Self::Entity(id) | Self::Transient(id) => engine.is_entity_live(*id),
            Self::Location(_) => true,
        }
    }

    pub fn location(&self, engine: &dyn GameEngine) -> Option<Location> {
        match self {
            Self::Entity(id) | Self::Transient(id) => engine.location_of(*id),
            Self::Location(at) => Some(*at),
        }
    }

    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) | Self::Transient(id) => Some(*id),
            Self::Location(_) => None,
        }
    }
}
