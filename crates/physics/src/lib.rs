//! Tabletop physics: a convenience layer over the rapier2d engine for
//! interactive-surface applications.
//!
//! # Invariants
//! - All engine state is owned by [`Surface`]; there are no globals.
//! - Registry iteration follows insertion order.
//! - Deleting a body always detaches it from constraints, composites, and
//!   the attraction map.
//! - All mutation happens on the host's frame tick; nothing here blocks.

mod animate;
pub mod attraction;
mod delete;
pub mod error;
mod factory;
mod mutate;
pub mod options;
pub mod query;
pub mod surface;

pub use attraction::{Attracted, AttractorEntry, DEFAULT_ATTRACTION_STRENGTH, OrbitBand};
pub use error::SurfaceError;
pub use factory::RailHandles;
pub use options::{
    BearingOptions, BodyOptions, CircleOptions, CollisionFilter, ConstraintOptions,
    IrregularOptions, PolygonOptions, RailOptions, RectangleOptions, SurfaceOptions,
};
pub use query::{angle_between_points, random_angle_deg};
pub use surface::{
    BodyEntry, BodyKind, CompositeEntry, ConstraintEntry, DEFAULT_DT, Surface, SurfaceEvent,
};
