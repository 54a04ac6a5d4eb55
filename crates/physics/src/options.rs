use serde::{Deserialize, Serialize};
use tabletop_common::{BodyId, Color, RenderStyle};

/// Options for creating a [`Surface`](crate::Surface).
///
/// The canvas spans `[0, width] x [0, height]` in surface units. The table
/// is horizontal, so gravity defaults to zero; hosts simulating a vertical
/// scene set it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceOptions {
    pub width: f32,
    pub height: f32,
    /// Create four static boundary walls just outside the canvas edges.
    pub walls: bool,
    pub gravity: [f32; 2],
    /// Allow resting bodies to fall asleep.
    pub sleeping: bool,
    /// Extract outline-only scenes.
    pub wireframes: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            walls: true,
            gravity: [0.0, 0.0],
            sleeping: false,
            wireframes: false,
        }
    }
}

impl SurfaceOptions {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// Collision filter: a body collides with another when each one's `mask`
/// contains a bit of the other's `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            category: 1,
            mask: u32::MAX,
        }
    }
}

/// Physical attributes shared by every body factory.
///
/// Defaults suit light table pucks: friction 0.1, air friction 0.01,
/// restitution 0, density 0.001.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyOptions {
    pub friction: f32,
    /// Motion damping standing in for drag against the table surface.
    pub air_friction: f32,
    pub restitution: f32,
    pub density: f32,
    /// Extra mass on top of the density-derived mass.
    pub additional_mass: Option<f32>,
    /// Initial angle in radians.
    pub angle: f32,
    pub is_static: bool,
    /// Sensors detect overlap but produce no contact forces.
    pub is_sensor: bool,
    pub start_asleep: bool,
    pub label: Option<String>,
    pub collision_filter: Option<CollisionFilter>,
    /// `None` picks the next palette color.
    pub style: Option<RenderStyle>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            friction: 0.1,
            air_friction: 0.01,
            restitution: 0.0,
            density: 0.001,
            additional_mass: None,
            angle: 0.0,
            is_static: false,
            is_sensor: false,
            start_asleep: false,
            label: None,
            collision_filter: None,
            style: None,
        }
    }
}

impl BodyOptions {
    pub fn fixed() -> Self {
        Self {
            is_static: true,
            ..Self::default()
        }
    }
}

/// A rectangle centered at `(x, y)` with full width `w` and height `h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangleOptions {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub body: BodyOptions,
}

impl RectangleOptions {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            body: BodyOptions::default(),
        }
    }

    pub fn with_body(mut self, body: BodyOptions) -> Self {
        self.body = body;
        self
    }
}

/// A circle centered at `(x, y)` with radius `r`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleOptions {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub body: BodyOptions,
}

impl CircleOptions {
    pub fn new(x: f32, y: f32, r: f32) -> Self {
        Self {
            x,
            y,
            r,
            body: BodyOptions::default(),
        }
    }

    pub fn with_body(mut self, body: BodyOptions) -> Self {
        self.body = body;
        self
    }
}

/// A regular polygon with `sides` vertices on a circle of radius `r`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonOptions {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub sides: u32,
    pub body: BodyOptions,
}

impl PolygonOptions {
    pub fn new(x: f32, y: f32, r: f32, sides: u32) -> Self {
        Self {
            x,
            y,
            r,
            sides,
            body: BodyOptions::default(),
        }
    }

    pub fn with_body(mut self, body: BodyOptions) -> Self {
        self.body = body;
        self
    }
}

/// An irregular convex body built from vertices local to `(x, y)`.
///
/// The engine takes the convex hull of the vertex list; concave outlines
/// lose their concavities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrregularOptions {
    pub x: f32,
    pub y: f32,
    pub vertices: Vec<[f32; 2]>,
    pub body: BodyOptions,
}

impl IrregularOptions {
    pub fn new(x: f32, y: f32, vertices: Vec<[f32; 2]>) -> Self {
        Self {
            x,
            y,
            vertices,
            body: BodyOptions::default(),
        }
    }

    pub fn with_body(mut self, body: BodyOptions) -> Self {
        self.body = body;
        self
    }
}

/// A spring constraint holding two bodies near a rest length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintOptions {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Anchor offset from body A's center, in its local frame.
    pub point_a: [f32; 2],
    pub point_b: [f32; 2],
    /// Rest length in surface units.
    pub length: f32,
    /// 0 for very elastic, 1 for very stiff.
    pub stiffness: f32,
    pub damping: f32,
    /// Grow the rest length in from near zero across this many ticks.
    pub grow_over: Option<u32>,
    /// Line color for scene extraction.
    pub color: Option<Color>,
}

impl ConstraintOptions {
    pub fn new(body_a: BodyId, body_b: BodyId, length: f32, stiffness: f32) -> Self {
        Self {
            body_a,
            body_b,
            point_a: [0.0, 0.0],
            point_b: [0.0, 0.0],
            length,
            stiffness,
            damping: 0.1,
            grow_over: None,
            color: None,
        }
    }
}

/// One bearing riding a slider rail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingOptions {
    pub r: f32,
    /// Resting spot along the rail: 0 is one end, 1 the other.
    pub at: f32,
    /// Body dragged along by this bearing through a spring link.
    pub target: Option<BodyId>,
    pub body: BodyOptions,
}

impl BearingOptions {
    pub fn new(r: f32) -> Self {
        Self {
            r,
            at: 0.5,
            target: None,
            body: BodyOptions::default(),
        }
    }

    pub fn at(mut self, at: f32) -> Self {
        self.at = at;
        self
    }

    pub fn linked_to(mut self, target: BodyId) -> Self {
        self.target = Some(target);
        self
    }
}

/// A slider rail: a static rectangle whose bearings slide along its long
/// axis, constrained to stay on the rail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailOptions {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Rail orientation in radians.
    pub angle: f32,
    pub bearings: Vec<BearingOptions>,
    pub body: BodyOptions,
}

impl RailOptions {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            angle: 0.0,
            bearings: Vec::new(),
            body: BodyOptions::default(),
        }
    }

    pub fn angled(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn bearing(mut self, bearing: BearingOptions) -> Self {
        self.bearings.push(bearing);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_defaults_are_light_pucks() {
        let b = BodyOptions::default();
        assert_eq!(b.friction, 0.1);
        assert_eq!(b.air_friction, 0.01);
        assert_eq!(b.restitution, 0.0);
        assert_eq!(b.density, 0.001);
        assert!(!b.is_static);
        assert!(!b.is_sensor);
    }

    #[test]
    fn surface_defaults_have_no_gravity() {
        let s = SurfaceOptions::default();
        assert_eq!(s.gravity, [0.0, 0.0]);
        assert!(s.walls);
        assert!(!s.wireframes);
    }

    #[test]
    fn collision_filter_default_collides_with_everything() {
        let f = CollisionFilter::default();
        assert_eq!(f.category, 1);
        assert_eq!(f.mask, u32::MAX);
    }

    #[test]
    fn rail_builder_accumulates_bearings() {
        let rail = RailOptions::new(0.0, 0.0, 200.0, 20.0)
            .bearing(BearingOptions::new(8.0).at(0.25))
            .bearing(BearingOptions::new(8.0).at(0.75));
        assert_eq!(rail.bearings.len(), 2);
        assert_eq!(rail.bearings[0].at, 0.25);
    }
}
