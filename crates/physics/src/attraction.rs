use nalgebra::Vector2;
use rapier2d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};
use tabletop_common::BodyId;

use crate::error::SurfaceError;
use crate::surface::Surface;

/// Pull strength applied when an attractor entry does not override it. The
/// force on an attracted body is `strength * m_a * m_b / d^2`.
pub const DEFAULT_ATTRACTION_STRENGTH: f32 = 1e-3;

/// Distance band an attracted body is held inside, in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitBand {
    pub min: f32,
    pub max: f32,
}

impl OrbitBand {
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A band collapsed onto a single radius.
    pub fn exact(radius: f32) -> Self {
        Self {
            min: radius,
            max: radius,
        }
    }
}

/// One body pulled toward an attractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attracted {
    pub body: BodyId,
    /// Exact orbit radius overriding the attractor's band.
    pub custom_orbit: Option<f32>,
    /// Keep the record but stop pulling.
    pub paused: bool,
}

/// An attractor and the bodies it pulls. Without a band (and without
/// per-body overrides) the attracted bodies are pulled until they touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractorEntry {
    pub attractor: BodyId,
    pub orbit: Option<OrbitBand>,
    pub strength: f32,
    pub attracted: Vec<Attracted>,
}

struct Pull {
    handle: RigidBodyHandle,
    force: Vector2<f32>,
    /// Position and velocity rewrite produced by orbit clamping.
    snap: Option<(Vector2<f32>, Vector2<f32>)>,
}

impl Surface {
    /// Register a body as an attractor. Idempotent.
    pub fn add_attractor(&mut self, id: BodyId) -> Result<(), SurfaceError> {
        if !self.registry.contains_key(&id) {
            return Err(SurfaceError::UnknownBody(id));
        }
        if self.attractor_entry(id).is_none() {
            self.attractors.push(AttractorEntry {
                attractor: id,
                orbit: None,
                strength: DEFAULT_ATTRACTION_STRENGTH,
                attracted: Vec::new(),
            });
        }
        Ok(())
    }

    /// Drop an attractor and all its records. Returns whether it existed.
    pub fn remove_attractor(&mut self, id: BodyId) -> bool {
        let before = self.attractors.len();
        self.attractors.retain(|e| e.attractor != id);
        self.attractors.len() != before
    }

    /// Set the orbit band bodies attracted to `id` are held inside,
    /// registering the attractor if needed.
    pub fn set_attractor_orbit(
        &mut self,
        id: BodyId,
        min: f32,
        max: f32,
    ) -> Result<(), SurfaceError> {
        self.add_attractor(id)?;
        if let Some(entry) = self.attractor_entry_mut(id) {
            entry.orbit = Some(OrbitBand::new(min, max));
        }
        Ok(())
    }

    /// Override the pull strength for one attractor.
    pub fn set_attraction_strength(
        &mut self,
        id: BodyId,
        strength: f32,
    ) -> Result<(), SurfaceError> {
        self.add_attractor(id)?;
        if let Some(entry) = self.attractor_entry_mut(id) {
            entry.strength = strength;
        }
        Ok(())
    }

    /// Attract `body` to `attractor`, registering the attractor if needed.
    pub fn add_attracted(&mut self, attractor: BodyId, body: BodyId) -> Result<(), SurfaceError> {
        if !self.registry.contains_key(&body) {
            return Err(SurfaceError::UnknownBody(body));
        }
        self.add_attractor(attractor)?;
        if let Some(entry) = self.attractor_entry_mut(attractor) {
            if !entry.attracted.iter().any(|a| a.body == body) {
                entry.attracted.push(Attracted {
                    body,
                    custom_orbit: None,
                    paused: false,
                });
            }
        }
        Ok(())
    }

    /// Attract `body` to `attractor` at an exact orbit radius.
    pub fn add_attracted_with_orbit(
        &mut self,
        attractor: BodyId,
        body: BodyId,
        orbit: f32,
    ) -> Result<(), SurfaceError> {
        self.add_attracted(attractor, body)?;
        self.set_custom_orbit(attractor, body, Some(orbit))
    }

    /// Set or clear the per-body orbit override.
    pub fn set_custom_orbit(
        &mut self,
        attractor: BodyId,
        body: BodyId,
        orbit: Option<f32>,
    ) -> Result<(), SurfaceError> {
        let record = self
            .attracted_record_mut(attractor, body)
            .ok_or(SurfaceError::UnknownBody(body))?;
        record.custom_orbit = orbit;
        Ok(())
    }

    /// Stop attracting `body` to `attractor`. Returns whether a record was
    /// removed.
    pub fn remove_attracted(&mut self, attractor: BodyId, body: BodyId) -> bool {
        if let Some(entry) = self.attractor_entry_mut(attractor) {
            let before = entry.attracted.len();
            entry.attracted.retain(|a| a.body != body);
            entry.attracted.len() != before
        } else {
            false
        }
    }

    /// Keep the record but suspend the pull.
    pub fn pause_attraction(&mut self, attractor: BodyId, body: BodyId) -> Result<(), SurfaceError> {
        let record = self
            .attracted_record_mut(attractor, body)
            .ok_or(SurfaceError::UnknownBody(body))?;
        record.paused = true;
        Ok(())
    }

    pub fn resume_attraction(
        &mut self,
        attractor: BodyId,
        body: BodyId,
    ) -> Result<(), SurfaceError> {
        let record = self
            .attracted_record_mut(attractor, body)
            .ok_or(SurfaceError::UnknownBody(body))?;
        record.paused = false;
        Ok(())
    }

    /// Attract every dynamic body on the surface to one attractor.
    pub fn attract_all_to_one(&mut self, attractor: BodyId) -> Result<(), SurfaceError> {
        let candidates: Vec<BodyId> = self
            .bodies()
            .map(|entry| entry.id)
            .filter(|id| *id != attractor)
            .filter(|id| matches!(self.is_static(*id), Ok(false)))
            .collect();
        self.attract_some_to_one(attractor, &candidates)
    }

    /// Attract a specific set of bodies to one attractor.
    pub fn attract_some_to_one(
        &mut self,
        attractor: BodyId,
        bodies: &[BodyId],
    ) -> Result<(), SurfaceError> {
        for body in bodies {
            self.add_attracted(attractor, *body)?;
        }
        Ok(())
    }

    /// Attraction entries, in registration order.
    pub fn attractors(&self) -> &[AttractorEntry] {
        &self.attractors
    }

    fn attractor_entry(&self, id: BodyId) -> Option<&AttractorEntry> {
        self.attractors.iter().find(|e| e.attractor == id)
    }

    fn attractor_entry_mut(&mut self, id: BodyId) -> Option<&mut AttractorEntry> {
        self.attractors.iter_mut().find(|e| e.attractor == id)
    }

    fn attracted_record_mut(&mut self, attractor: BodyId, body: BodyId) -> Option<&mut Attracted> {
        self.attractor_entry_mut(attractor)?
            .attracted
            .iter_mut()
            .find(|a| a.body == body)
    }

    /// Remove every attraction reference to a body; called on deletion so
    /// the map never holds dangling ids.
    pub(crate) fn detach_from_attraction(&mut self, id: BodyId) {
        self.attractors.retain(|e| e.attractor != id);
        for entry in &mut self.attractors {
            entry.attracted.retain(|a| a.body != id);
        }
    }

    /// Per-tick attraction pass: inverse-square pull plus orbit clamping.
    ///
    /// The clamp repositions the attracted body radially onto the violated
    /// bound and cancels its radial velocity, so the band holds through the
    /// following integration step.
    pub(crate) fn apply_attraction(&mut self) {
        let mut pulls = Vec::new();
        for entry in &self.attractors {
            let Some(attractor) = self.registry.get(&entry.attractor) else {
                continue;
            };
            let Some(attractor_rb) = self.bodies.get(attractor.rigid) else {
                continue;
            };
            let attractor_pos = *attractor_rb.translation();
            // fixed attractors report no effective mass; pull as unit mass
            let attractor_mass = attractor_rb.mass().max(1.0);

            for record in &entry.attracted {
                if record.paused {
                    continue;
                }
                let Some(target) = self.registry.get(&record.body) else {
                    continue;
                };
                let Some(rb) = self.bodies.get(target.rigid) else {
                    continue;
                };
                if !rb.is_dynamic() {
                    continue;
                }
                let pos = *rb.translation();
                let delta = attractor_pos - pos;
                let dist = delta.norm();
                if dist <= f32::EPSILON {
                    continue;
                }
                let dir = delta / dist;
                let force = dir * (entry.strength * attractor_mass * rb.mass() / (dist * dist));

                let band = record.custom_orbit.map(OrbitBand::exact).or(entry.orbit);
                let snap = band.and_then(|band| {
                    let clamped = dist.clamp(band.min, band.max);
                    if (clamped - dist).abs() <= f32::EPSILON {
                        return None;
                    }
                    let position = attractor_pos - dir * clamped;
                    let velocity = *rb.linvel();
                    let radial = dir * velocity.dot(&dir);
                    Some((position, velocity - radial))
                });
                pulls.push(Pull {
                    handle: target.rigid,
                    force,
                    snap,
                });
            }
        }

        for pull in pulls {
            if let Some(rb) = self.bodies.get_mut(pull.handle) {
                if let Some((position, velocity)) = pull.snap {
                    rb.set_translation(position, true);
                    rb.set_linvel(velocity, true);
                }
                rb.add_force(pull.force, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CircleOptions, SurfaceOptions};
    use crate::surface::DEFAULT_DT;

    fn bare_surface() -> Surface {
        let mut options = SurfaceOptions::sized(2000.0, 2000.0);
        options.walls = false;
        Surface::new(options).unwrap()
    }

    fn distance(surface: &Surface, a: BodyId, b: BodyId) -> f32 {
        let pa = surface.position(a).unwrap();
        let pb = surface.position(b).unwrap();
        ((pa[0] - pb[0]).powi(2) + (pa[1] - pb[1]).powi(2)).sqrt()
    }

    #[test]
    fn attraction_pulls_bodies_together() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        surface.set_static(center, true).unwrap();
        let moon = surface
            .create_circle(CircleOptions::new(1200.0, 1000.0, 10.0))
            .unwrap();
        surface.add_attracted(center, moon).unwrap();
        surface.set_attraction_strength(center, 1e6).unwrap();

        let before = distance(&surface, center, moon);
        for _ in 0..120 {
            surface.step(DEFAULT_DT);
        }
        let after = distance(&surface, center, moon);
        assert!(after < before, "distance went {before} -> {after}");
    }

    #[test]
    fn orbit_band_clamps_in_one_tick() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        surface.set_static(center, true).unwrap();
        let moon = surface
            .create_circle(CircleOptions::new(1300.0, 1000.0, 10.0))
            .unwrap();
        surface.add_attracted(center, moon).unwrap();
        surface.set_attractor_orbit(center, 80.0, 120.0).unwrap();

        surface.step(DEFAULT_DT);
        let d = distance(&surface, center, moon);
        assert!(d <= 121.0, "distance after clamp: {d}");
        assert!(d >= 79.0, "distance after clamp: {d}");
    }

    #[test]
    fn orbit_band_holds_over_many_ticks() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        surface.set_static(center, true).unwrap();
        let moon = surface
            .create_circle(CircleOptions::new(1040.0, 1000.0, 10.0))
            .unwrap();
        surface.add_attracted(center, moon).unwrap();
        surface.set_attractor_orbit(center, 80.0, 120.0).unwrap();

        for _ in 0..60 {
            surface.step(DEFAULT_DT);
            let d = distance(&surface, center, moon);
            assert!(d >= 78.0 && d <= 122.0, "distance escaped band: {d}");
        }
    }

    #[test]
    fn custom_orbit_overrides_the_band() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        surface.set_static(center, true).unwrap();
        let moon = surface
            .create_circle(CircleOptions::new(1400.0, 1000.0, 10.0))
            .unwrap();
        surface
            .add_attracted_with_orbit(center, moon, 150.0)
            .unwrap();

        surface.step(DEFAULT_DT);
        let d = distance(&surface, center, moon);
        assert!((d - 150.0).abs() < 2.0, "distance: {d}");
    }

    #[test]
    fn paused_records_do_not_pull() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        surface.set_static(center, true).unwrap();
        let moon = surface
            .create_circle(CircleOptions::new(1200.0, 1000.0, 10.0))
            .unwrap();
        surface.add_attracted(center, moon).unwrap();
        surface.set_attraction_strength(center, 1e6).unwrap();
        surface.pause_attraction(center, moon).unwrap();

        let before = surface.position(moon).unwrap();
        for _ in 0..30 {
            surface.step(DEFAULT_DT);
        }
        let after = surface.position(moon).unwrap();
        assert!((after[0] - before[0]).abs() < 1e-3);
    }

    #[test]
    fn attract_all_skips_statics_and_self() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        surface.set_static(center, true).unwrap();
        let a = surface
            .create_circle(CircleOptions::new(500.0, 500.0, 10.0))
            .unwrap();
        let b = surface
            .create_circle(CircleOptions::new(1500.0, 1500.0, 10.0))
            .unwrap();
        surface.attract_all_to_one(center).unwrap();

        let entry = &surface.attractors()[0];
        let ids: Vec<BodyId> = entry.attracted.iter().map(|r| r.body).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn add_attracted_is_deduplicated() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        let moon = surface
            .create_circle(CircleOptions::new(1200.0, 1000.0, 10.0))
            .unwrap();
        surface.add_attracted(center, moon).unwrap();
        surface.add_attracted(center, moon).unwrap();
        assert_eq!(surface.attractors()[0].attracted.len(), 1);
    }

    #[test]
    fn remove_attractor_and_attracted() {
        let mut surface = bare_surface();
        let center = surface
            .create_circle(CircleOptions::new(1000.0, 1000.0, 30.0))
            .unwrap();
        let moon = surface
            .create_circle(CircleOptions::new(1200.0, 1000.0, 10.0))
            .unwrap();
        surface.add_attracted(center, moon).unwrap();
        assert!(surface.remove_attracted(center, moon));
        assert!(!surface.remove_attracted(center, moon));
        assert!(surface.remove_attractor(center));
        assert!(surface.attractors().is_empty());
    }
}
