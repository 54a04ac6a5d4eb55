use tabletop_physics::Surface;

use crate::scene::{DrawShape, Scene};

/// Viewport the host paints into. Usually mirrors the surface options, but
/// embedders with letterboxing may differ.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl RenderView {
    /// A view matching the surface's canvas.
    pub fn of(surface: &Surface) -> Self {
        Self {
            width: surface.options().width,
            height: surface.options().height,
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads surface state and a view, then produces output. It never
/// mutates the surface.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given surface state and view.
    fn render(&self, surface: &Surface, view: &RenderView) -> Self::Output;
}

/// Text renderer for headless hosts, logging, and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, surface: &Surface, view: &RenderView) -> String {
        let scene = Scene::capture(surface);
        let mut out = String::new();
        out.push_str(&format!(
            "=== Surface (tick={}, bodies={}, constraints={}, composites={}) ===\n",
            surface.tick(),
            surface.body_count(),
            surface.constraint_count(),
            surface.composite_count(),
        ));
        out.push_str(&format!("View: {}x{}\n", view.width, view.height));

        for command in &scene.commands {
            let kind = match &command.shape {
                DrawShape::Rect { w, h } => format!("rect {w:.1}x{h:.1}"),
                DrawShape::Circle { r } => format!("circle r={r:.1}"),
                DrawShape::Polygon { points } => format!("polygon n={}", points.len()),
                DrawShape::Line { from, to } => format!(
                    "line ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                    from[0], from[1], to[0], to[1]
                ),
            };
            let mut flags = String::new();
            if command.wireframe {
                flags.push_str(" wire");
            }
            if command.sleeping {
                flags.push_str(" asleep");
            }
            out.push_str(&format!(
                "  {kind} at ({:.1}, {:.1}) angle={:.2}{flags}\n",
                command.position[0], command.position[1], command.angle
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletop_physics::{CircleOptions, SurfaceOptions};

    #[test]
    fn debug_renderer_empty_surface() {
        let mut options = SurfaceOptions::sized(640.0, 480.0);
        options.walls = false;
        let surface = Surface::new(options).unwrap();
        let output = DebugTextRenderer::new().render(&surface, &RenderView::of(&surface));
        assert!(output.contains("tick=0"));
        assert!(output.contains("bodies=0"));
        assert!(output.contains("640x480"));
    }

    #[test]
    fn debug_renderer_lists_bodies() {
        let mut options = SurfaceOptions::sized(640.0, 480.0);
        options.walls = false;
        let mut surface = Surface::new(options).unwrap();
        surface
            .create_circle(CircleOptions::new(100.0, 100.0, 25.0))
            .unwrap();
        let output = DebugTextRenderer::new().render(&surface, &RenderView::of(&surface));
        assert!(output.contains("circle r=25.0"));
        assert!(output.contains("(100.0, 100.0)"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.width, 1280.0);
        assert_eq!(view.height, 720.0);
    }
}
