//! Scene extraction: renderer-agnostic view of a surface.
//!
//! # Invariants
//! - Extraction never mutates the surface; surface truth is physics-owned.
//! - Draw commands preserve registry insertion order, so painting them in
//!   sequence reproduces the creation stacking order.

mod renderer;
mod scene;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use scene::{DrawCommand, DrawShape, Scene};

pub fn crate_info() -> &'static str {
    "tabletop-render v0.1.0"
}
