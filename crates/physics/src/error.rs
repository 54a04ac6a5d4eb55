use tabletop_common::{BodyId, CompositeId, ConstraintId};

/// Errors from surface operations.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("unknown body {0:?}")]
    UnknownBody(BodyId),
    #[error("unknown constraint {0:?}")]
    UnknownConstraint(ConstraintId),
    #[error("unknown composite {0:?}")]
    UnknownComposite(CompositeId),
    #[error("surface dimensions must be positive")]
    InvalidSurfaceSize,
    #[error("body dimensions must be positive")]
    NonPositiveSize,
    #[error("a regular polygon needs at least 3 sides, got {0}")]
    TooFewSides(u32),
    #[error("vertex list does not form a usable convex hull")]
    DegenerateHull,
    #[error("constraint stiffness must lie in [0, 1], got {0}")]
    StiffnessOutOfRange(f32),
    #[error("scale factors must be positive")]
    NonPositiveScale,
    #[error("circles can only be scaled uniformly")]
    NonUniformCircleScale,
    #[error("a slider rail needs at least one bearing")]
    EmptyRail,
    #[error("animation step count must be positive")]
    ZeroAnimationSteps,
}
