use serde::{Deserialize, Serialize};

/// RGBA color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string.
    pub fn from_hex(hex: &str) -> Result<Self, StyleError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return Err(StyleError::MalformedHex(hex.to_string()));
        }
        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| StyleError::MalformedHex(hex.to_string()))
        };
        let r = byte(0..2)?;
        let g = byte(2..4)?;
        let b = byte(4..6)?;
        let a = if digits.len() == 8 { byte(6..8)? } else { 1.0 };
        Ok(Self { r, g, b, a })
    }
}

/// Errors from style parsing.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("malformed hex color {0:?}")]
    MalformedHex(String),
}

/// Fill colors cycled by the body factories when options carry no explicit
/// style. A fixed palette keeps repeated runs visually identical.
pub const PALETTE: [Color; 8] = [
    Color::rgb(0.91, 0.30, 0.24),
    Color::rgb(0.20, 0.60, 0.86),
    Color::rgb(0.18, 0.80, 0.44),
    Color::rgb(0.95, 0.77, 0.06),
    Color::rgb(0.61, 0.35, 0.71),
    Color::rgb(0.90, 0.49, 0.13),
    Color::rgb(0.10, 0.74, 0.61),
    Color::rgb(0.75, 0.22, 0.17),
];

/// Sprite painted by the host in place of the filled shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Texture path or key resolved by the host.
    pub texture: String,
    pub x_scale: f32,
    pub y_scale: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

impl Sprite {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            x_scale: 1.0,
            y_scale: 1.0,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }
}

/// How a body should be painted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStyle {
    pub fill: Color,
    pub stroke: Color,
    pub line_width: f32,
    pub opacity: f32,
    pub visible: bool,
    pub sprite: Option<Sprite>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            fill: Color::rgb(0.5, 0.5, 0.5),
            stroke: Color::WHITE,
            line_width: 0.0,
            opacity: 1.0,
            visible: true,
            sprite: None,
        }
    }
}

impl RenderStyle {
    /// A style filled with the given color, everything else default.
    pub fn filled(fill: Color) -> Self {
        Self {
            fill,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parse_rgb() {
        let c = Color::from_hex("#ff0000").unwrap();
        assert_eq!(c, Color::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn hex_parse_rgba() {
        let c = Color::from_hex("00ff00ff").unwrap();
        assert_eq!(c, Color::rgba(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn hex_parse_rejects_garbage() {
        assert!(Color::from_hex("#xyz").is_err());
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn default_style_is_visible_and_opaque() {
        let s = RenderStyle::default();
        assert!(s.visible);
        assert_eq!(s.opacity, 1.0);
        assert!(s.sprite.is_none());
    }

    #[test]
    fn palette_colors_are_distinct() {
        for (i, a) in PALETTE.iter().enumerate() {
            for b in &PALETTE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
