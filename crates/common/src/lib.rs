//! Shared types for the tabletop workspace.
//!
//! # Invariants
//! - Ids are opaque; nothing outside this crate may assume anything about
//!   their internal representation.
//! - Style types are pure data; painting is the host's concern.

pub mod style;
pub mod types;

pub use style::{Color, PALETTE, RenderStyle, Sprite, StyleError};
pub use types::{BodyId, CompositeId, ConstraintId};
