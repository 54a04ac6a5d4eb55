use nalgebra::point;
use rand::Rng;
use rapier2d::parry::bounding_volume::{Aabb, BoundingVolume};
use tabletop_common::BodyId;

use crate::error::SurfaceError;
use crate::surface::Surface;

/// Attempts made before `suggest_position` gives up.
const SUGGEST_ATTEMPTS: usize = 32;

/// Angle from `a` to `b` in radians, measured from the positive x axis.
pub fn angle_between_points(a: [f32; 2], b: [f32; 2]) -> f32 {
    (b[1] - a[1]).atan2(b[0] - a[0])
}

/// A uniform random angle in `[min, max]` degrees.
pub fn random_angle_deg(min: f32, max: f32) -> f32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if lo == hi {
        return lo;
    }
    rand::thread_rng().gen_range(lo..hi)
}

impl Surface {
    /// Whether any registered body's bounding box overlaps the axis-aligned
    /// probe centered at `(cx, cy)` with extent `w x h`.
    pub fn is_space_occupied(&self, cx: f32, cy: f32, w: f32, h: f32) -> bool {
        let probe = Aabb::new(
            point![cx - w / 2.0, cy - h / 2.0],
            point![cx + w / 2.0, cy + h / 2.0],
        );
        self.bodies().any(|entry| {
            self.colliders
                .get(entry.collider)
                .map(|c| c.compute_aabb().intersects(&probe))
                .unwrap_or(false)
        })
    }

    /// Whether a body's bounding box overlaps the canvas.
    pub fn is_on_screen(&self, id: BodyId) -> Result<bool, SurfaceError> {
        let entry = self.body(id).ok_or(SurfaceError::UnknownBody(id))?;
        let collider = self
            .colliders
            .get(entry.collider)
            .ok_or(SurfaceError::UnknownBody(id))?;
        let screen = Aabb::new(
            point![0.0, 0.0],
            point![self.options().width, self.options().height],
        );
        Ok(collider.compute_aabb().intersects(&screen))
    }

    /// Angle from body `a`'s center to body `b`'s center, in radians.
    pub fn angle_between_bodies(&self, a: BodyId, b: BodyId) -> Result<f32, SurfaceError> {
        Ok(angle_between_points(self.position(a)?, self.position(b)?))
    }

    /// Distance between two body centers.
    pub fn distance_between(&self, a: BodyId, b: BodyId) -> Result<f32, SurfaceError> {
        let pa = self.position(a)?;
        let pb = self.position(b)?;
        Ok(((pb[0] - pa[0]).powi(2) + (pb[1] - pa[1]).powi(2)).sqrt())
    }

    /// Find a spot where a `w x h` body would fit fully on the canvas
    /// without overlapping anything. Random search with a bounded number of
    /// attempts; `None` when the canvas is too small or too crowded.
    pub fn suggest_position(&self, w: f32, h: f32) -> Option<[f32; 2]> {
        let (width, height) = (self.options().width, self.options().height);
        if w <= 0.0 || h <= 0.0 || w >= width || h >= height {
            return None;
        }
        let mut rng = rand::thread_rng();
        for _ in 0..SUGGEST_ATTEMPTS {
            let x = rng.gen_range(w / 2.0..width - w / 2.0);
            let y = rng.gen_range(h / 2.0..height - h / 2.0);
            if !self.is_space_occupied(x, y, w, h) {
                return Some([x, y]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CircleOptions, RectangleOptions, SurfaceOptions};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn bare_surface() -> Surface {
        let mut options = SurfaceOptions::sized(1000.0, 1000.0);
        options.walls = false;
        Surface::new(options).unwrap()
    }

    #[test]
    fn angle_between_cardinal_points() {
        assert_eq!(angle_between_points([0.0, 0.0], [10.0, 0.0]), 0.0);
        assert!((angle_between_points([0.0, 0.0], [0.0, 10.0]) - FRAC_PI_2).abs() < 1e-6);
        assert!((angle_between_points([5.0, 5.0], [-5.0, 5.0]).abs() - PI).abs() < 1e-6);
    }

    #[test]
    fn occupancy_sees_a_body_and_misses_empty_space() {
        let mut surface = bare_surface();
        surface
            .create_rectangle(RectangleOptions::new(100.0, 100.0, 20.0, 20.0))
            .unwrap();
        assert!(surface.is_space_occupied(100.0, 100.0, 10.0, 10.0));
        assert!(surface.is_space_occupied(112.0, 100.0, 10.0, 10.0));
        assert!(!surface.is_space_occupied(500.0, 500.0, 10.0, 10.0));
    }

    #[test]
    fn on_screen_tracks_the_canvas() {
        let mut surface = bare_surface();
        let inside = surface
            .create_circle(CircleOptions::new(500.0, 500.0, 10.0))
            .unwrap();
        let outside = surface
            .create_circle(CircleOptions::new(-200.0, 500.0, 10.0))
            .unwrap();
        assert!(surface.is_on_screen(inside).unwrap());
        assert!(!surface.is_on_screen(outside).unwrap());
    }

    #[test]
    fn distance_and_angle_between_bodies() {
        let mut surface = bare_surface();
        let a = surface
            .create_circle(CircleOptions::new(100.0, 100.0, 5.0))
            .unwrap();
        let b = surface
            .create_circle(CircleOptions::new(100.0, 400.0, 5.0))
            .unwrap();
        assert!((surface.distance_between(a, b).unwrap() - 300.0).abs() < 1e-3);
        assert!((surface.angle_between_bodies(a, b).unwrap() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn random_angle_stays_in_range() {
        for _ in 0..100 {
            let a = random_angle_deg(30.0, 60.0);
            assert!((30.0..=60.0).contains(&a), "angle {a}");
        }
        assert_eq!(random_angle_deg(45.0, 45.0), 45.0);
    }

    #[test]
    fn suggested_positions_are_free_and_in_bounds() {
        let mut surface = bare_surface();
        surface
            .create_rectangle(RectangleOptions::new(500.0, 500.0, 400.0, 400.0))
            .unwrap();
        for _ in 0..10 {
            if let Some([x, y]) = surface.suggest_position(50.0, 50.0) {
                assert!((25.0..=975.0).contains(&x));
                assert!((25.0..=975.0).contains(&y));
                assert!(!surface.is_space_occupied(x, y, 50.0, 50.0));
            }
        }
    }

    #[test]
    fn suggest_rejects_oversized_requests() {
        let surface = bare_surface();
        assert!(surface.suggest_position(1000.0, 50.0).is_none());
        assert!(surface.suggest_position(0.0, 50.0).is_none());
    }
}
