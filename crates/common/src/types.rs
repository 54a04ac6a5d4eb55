use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a body registered on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub Uuid);

impl BodyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BodyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a spring constraint between two bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstraintId(pub Uuid);

impl ConstraintId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConstraintId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a composite assembly (e.g. a slider rail).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeId(pub Uuid);

impl CompositeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CompositeId {
    fn default() -> Self {
        Self::new()
    }
}
