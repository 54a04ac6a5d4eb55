use tabletop_common::{BodyId, RenderStyle};
use tabletop_physics::{BodyKind, Surface};

/// Geometry of one draw command. Shape vertices are local to the command's
/// position and angle; lines are in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawShape {
    Rect { w: f32, h: f32 },
    Circle { r: f32 },
    Polygon { points: Vec<[f32; 2]> },
    Line { from: [f32; 2], to: [f32; 2] },
}

/// One paintable item extracted from the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Originating body, `None` for constraint lines.
    pub body: Option<BodyId>,
    pub shape: DrawShape,
    pub position: [f32; 2],
    pub angle: f32,
    pub style: RenderStyle,
    /// Paint outlines only.
    pub wireframe: bool,
    pub sleeping: bool,
}

/// An ordered list of draw commands for one frame.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    /// Extract the surface into draw commands: bodies in registry order,
    /// then constraint lines on top.
    pub fn capture(surface: &Surface) -> Scene {
        let wireframe = surface.options().wireframes;
        let mut commands = Vec::new();

        for entry in surface.bodies() {
            if !entry.style.visible {
                continue;
            }
            let (Ok(position), Ok(angle)) = (surface.position(entry.id), surface.angle(entry.id))
            else {
                continue;
            };
            let shape = match &entry.kind {
                BodyKind::Rectangle { w, h } => DrawShape::Rect { w: *w, h: *h },
                BodyKind::Circle { r } => DrawShape::Circle { r: *r },
                BodyKind::Polygon { r, sides } => DrawShape::Polygon {
                    points: regular_polygon_points(*r, *sides),
                },
                BodyKind::Irregular { vertices } => DrawShape::Polygon {
                    points: vertices.clone(),
                },
            };
            commands.push(DrawCommand {
                body: Some(entry.id),
                shape,
                position,
                angle,
                style: entry.style.clone(),
                wireframe,
                sleeping: entry.sleeping(),
            });
        }

        for constraint in surface.constraints() {
            let (Ok(pos_a), Ok(angle_a)) = (
                surface.position(constraint.body_a),
                surface.angle(constraint.body_a),
            ) else {
                continue;
            };
            let (Ok(pos_b), Ok(angle_b)) = (
                surface.position(constraint.body_b),
                surface.angle(constraint.body_b),
            ) else {
                continue;
            };
            let style = RenderStyle {
                stroke: constraint.color,
                line_width: 1.0,
                ..RenderStyle::default()
            };
            commands.push(DrawCommand {
                body: None,
                shape: DrawShape::Line {
                    from: rotate_offset(pos_a, angle_a, constraint.anchor_a),
                    to: rotate_offset(pos_b, angle_b, constraint.anchor_b),
                },
                position: [0.0, 0.0],
                angle: 0.0,
                style,
                wireframe,
                sleeping: false,
            });
        }

        Scene { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn rotate_offset(center: [f32; 2], angle: f32, offset: [f32; 2]) -> [f32; 2] {
    let (sin, cos) = angle.sin_cos();
    [
        center[0] + cos * offset[0] - sin * offset[1],
        center[1] + sin * offset[0] + cos * offset[1],
    ]
}

fn regular_polygon_points(r: f32, sides: u32) -> Vec<[f32; 2]> {
    (0..sides)
        .map(|i| {
            let theta = i as f32 * std::f32::consts::TAU / sides as f32;
            [r * theta.cos(), r * theta.sin()]
        })
        .collect()
}
