use std::collections::BTreeMap;

use nalgebra::{Vector2, vector};
use rapier2d::prelude::{
    CCDSolver, ColliderHandle, ColliderSet, DefaultBroadPhase, ImpulseJointHandle,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, QueryPipeline, RigidBodyHandle, RigidBodySet,
};
use serde::{Deserialize, Serialize};
use tabletop_common::{BodyId, Color, CompositeId, ConstraintId, RenderStyle};

use crate::animate::Animation;
use crate::attraction::AttractorEntry;
use crate::error::SurfaceError;
use crate::options::{BodyOptions, RectangleOptions, SurfaceOptions};

/// Tick duration used by hosts that drive the surface at 60 frames a second.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Declarative shape of a registered body. Dimensions here are the source of
/// truth for scene extraction; the collider mirrors them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyKind {
    Rectangle { w: f32, h: f32 },
    Circle { r: f32 },
    Polygon { r: f32, sides: u32 },
    Irregular { vertices: Vec<[f32; 2]> },
}

/// A body registered on the surface, pairing the engine handles with the
/// declarative data the host cares about.
#[derive(Debug, Clone)]
pub struct BodyEntry {
    pub id: BodyId,
    pub label: String,
    pub kind: BodyKind,
    pub style: RenderStyle,
    pub composite: Option<CompositeId>,
    pub(crate) rigid: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) sleeping: bool,
}

impl BodyEntry {
    /// Whether the body was asleep after the last tick.
    pub fn sleeping(&self) -> bool {
        self.sleeping
    }
}

/// A spring constraint registered on the surface.
#[derive(Debug, Clone)]
pub struct ConstraintEntry {
    pub id: ConstraintId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Anchor offsets in each body's local frame.
    pub anchor_a: [f32; 2],
    pub anchor_b: [f32; 2],
    /// Target rest length.
    pub length: f32,
    /// Rest length currently applied (differs while growing in).
    pub current_length: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub color: Color,
    pub composite: Option<CompositeId>,
    pub(crate) joint: ImpulseJointHandle,
}

/// A group of bodies and constraints treated as one unit.
#[derive(Debug, Clone)]
pub struct CompositeEntry {
    pub id: CompositeId,
    pub label: String,
    pub bodies: Vec<BodyId>,
    pub constraints: Vec<ConstraintId>,
}

/// An event record produced by every mutation to the surface.
///
/// Sleep transitions are reported here instead of through callbacks; hosts
/// drain the log once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    BodyCreated { id: BodyId },
    BodyRemoved { id: BodyId },
    ConstraintCreated { id: ConstraintId },
    ConstraintRemoved { id: ConstraintId },
    CompositeCreated { id: CompositeId },
    CompositeRemoved { id: CompositeId },
    SleepStarted { id: BodyId },
    SleepEnded { id: BodyId },
    Stepped { tick: u64 },
    Cleared,
}

/// The owned context for one interactive surface.
///
/// Owns the wrapped engine's state (body/collider/joint sets and pipelines)
/// together with the registry, attraction map, animation queue, and event
/// log. Every operation in this crate is a method on it; hosts call
/// [`Surface::step`] once per frame.
pub struct Surface {
    options: SurfaceOptions,
    gravity: Vector2<f32>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    pub(crate) islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    pub(crate) impulse_joints: ImpulseJointSet,
    pub(crate) multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    pub(crate) registry: BTreeMap<BodyId, BodyEntry>,
    pub(crate) order: Vec<BodyId>,
    pub(crate) constraints: BTreeMap<ConstraintId, ConstraintEntry>,
    pub(crate) composites: BTreeMap<CompositeId, CompositeEntry>,
    pub(crate) attractors: Vec<AttractorEntry>,
    pub(crate) animations: Vec<Animation>,
    events: Vec<SurfaceEvent>,
    tick: u64,
    pub(crate) created: usize,
}

impl Surface {
    /// Build a surface from the given options, with boundary walls unless
    /// disabled.
    pub fn new(options: SurfaceOptions) -> Result<Self, SurfaceError> {
        if options.width <= 0.0 || options.height <= 0.0 {
            return Err(SurfaceError::InvalidSurfaceSize);
        }
        let mut surface = Self {
            gravity: vector![options.gravity[0], options.gravity[1]],
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            registry: BTreeMap::new(),
            order: Vec::new(),
            constraints: BTreeMap::new(),
            composites: BTreeMap::new(),
            attractors: Vec::new(),
            animations: Vec::new(),
            events: Vec::new(),
            tick: 0,
            created: 0,
            options,
        };
        if surface.options.walls {
            surface.create_walls()?;
        }
        Ok(surface)
    }

    /// The four boundary walls: 50 units thick, centered 25 units outside
    /// each canvas edge so their inner faces sit exactly on the edges.
    fn create_walls(&mut self) -> Result<(), SurfaceError> {
        let (w, h) = (self.options.width, self.options.height);
        let wall = |x: f32, y: f32, ww: f32, wh: f32| {
            RectangleOptions::new(x, y, ww, wh).with_body(BodyOptions {
                is_static: true,
                label: Some("wall".to_string()),
                ..BodyOptions::default()
            })
        };
        self.create_rectangle(wall(-25.0, h / 2.0, 50.0, h))?;
        self.create_rectangle(wall(w + 25.0, h / 2.0, 50.0, h))?;
        self.create_rectangle(wall(w / 2.0, -25.0, w, 50.0))?;
        self.create_rectangle(wall(w / 2.0, h + 25.0, w, 50.0))?;
        Ok(())
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    /// Ticks stepped so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn body_count(&self) -> usize {
        self.registry.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn composite_count(&self) -> usize {
        self.composites.len()
    }

    /// Registered bodies in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = &BodyEntry> {
        self.order.iter().filter_map(|id| self.registry.get(id))
    }

    pub fn body(&self, id: BodyId) -> Option<&BodyEntry> {
        self.registry.get(&id)
    }

    pub fn constraints(&self) -> impl Iterator<Item = &ConstraintEntry> {
        self.constraints.values()
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&ConstraintEntry> {
        self.constraints.get(&id)
    }

    pub fn composites(&self) -> impl Iterator<Item = &CompositeEntry> {
        self.composites.values()
    }

    pub fn composite(&self, id: CompositeId) -> Option<&CompositeEntry> {
        self.composites.get(&id)
    }

    /// Center position of a body.
    pub fn position(&self, id: BodyId) -> Result<[f32; 2], SurfaceError> {
        let rb = self.rigid(id)?;
        let t = rb.translation();
        Ok([t.x, t.y])
    }

    /// Orientation of a body in radians.
    pub fn angle(&self, id: BodyId) -> Result<f32, SurfaceError> {
        Ok(self.rigid(id)?.rotation().angle())
    }

    pub fn velocity(&self, id: BodyId) -> Result<[f32; 2], SurfaceError> {
        let v = *self.rigid(id)?.linvel();
        Ok([v.x, v.y])
    }

    pub fn mass(&self, id: BodyId) -> Result<f32, SurfaceError> {
        Ok(self.rigid(id)?.mass())
    }

    pub fn is_static(&self, id: BodyId) -> Result<bool, SurfaceError> {
        Ok(self.rigid(id)?.is_fixed())
    }

    pub fn is_sleeping(&self, id: BodyId) -> Result<bool, SurfaceError> {
        Ok(self.rigid(id)?.is_sleeping())
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }

    pub(crate) fn rigid(&self, id: BodyId) -> Result<&rapier2d::prelude::RigidBody, SurfaceError> {
        let entry = self.registry.get(&id).ok_or(SurfaceError::UnknownBody(id))?;
        self.bodies
            .get(entry.rigid)
            .ok_or(SurfaceError::UnknownBody(id))
    }

    pub(crate) fn rigid_mut(
        &mut self,
        id: BodyId,
    ) -> Result<&mut rapier2d::prelude::RigidBody, SurfaceError> {
        let entry = self.registry.get(&id).ok_or(SurfaceError::UnknownBody(id))?;
        self.bodies
            .get_mut(entry.rigid)
            .ok_or(SurfaceError::UnknownBody(id))
    }

    /// Advance the surface by one frame.
    ///
    /// Order: animations, attraction and orbit clamping, engine step, then
    /// one-shot force clearing and sleep-transition events.
    pub fn step(&mut self, dt: f32) {
        self.advance_animations();
        self.apply_attraction();

        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        // Forces act for exactly one frame; hosts reapply them each tick
        // for a sustained push.
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }

        self.tick += 1;

        let mut transitions = Vec::new();
        for id in &self.order {
            if let Some(entry) = self.registry.get(id) {
                let asleep = self
                    .bodies
                    .get(entry.rigid)
                    .map(|b| b.is_sleeping())
                    .unwrap_or(false);
                if asleep != entry.sleeping {
                    transitions.push((*id, asleep));
                }
            }
        }
        for (id, asleep) in transitions {
            if let Some(entry) = self.registry.get_mut(&id) {
                entry.sleeping = asleep;
            }
            self.events.push(if asleep {
                SurfaceEvent::SleepStarted { id }
            } else {
                SurfaceEvent::SleepEnded { id }
            });
        }

        self.events.push(SurfaceEvent::Stepped { tick: self.tick });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CircleOptions;

    #[test]
    fn new_surface_with_walls_registers_four_bodies() {
        let surface = Surface::new(SurfaceOptions::default()).unwrap();
        assert_eq!(surface.body_count(), 4);
        assert!(surface.bodies().all(|b| b.label == "wall"));
    }

    #[test]
    fn new_surface_without_walls_is_empty() {
        let mut options = SurfaceOptions::default();
        options.walls = false;
        let surface = Surface::new(options).unwrap();
        assert_eq!(surface.body_count(), 0);
    }

    #[test]
    fn degenerate_canvas_is_rejected() {
        assert!(matches!(
            Surface::new(SurfaceOptions::sized(0.0, 100.0)),
            Err(SurfaceError::InvalidSurfaceSize)
        ));
    }

    #[test]
    fn step_increments_tick_and_logs() {
        let mut surface = Surface::new(SurfaceOptions::default()).unwrap();
        surface.step(DEFAULT_DT);
        surface.step(DEFAULT_DT);
        assert_eq!(surface.tick(), 2);
        assert!(
            surface
                .events()
                .iter()
                .any(|e| matches!(e, SurfaceEvent::Stepped { tick: 2 }))
        );
    }

    #[test]
    fn registry_preserves_insertion_order() {
        let mut surface = Surface::new(SurfaceOptions::sized(500.0, 500.0)).unwrap();
        let mut created = Vec::new();
        for i in 0..5 {
            let id = surface
                .create_circle(CircleOptions::new(100.0 + i as f32 * 50.0, 100.0, 10.0))
                .unwrap();
            created.push(id);
        }
        let walls = 4;
        let listed: Vec<_> = surface.bodies().skip(walls).map(|b| b.id).collect();
        assert_eq!(listed, created);
    }

    #[test]
    fn drain_events_clears_log() {
        let mut surface = Surface::new(SurfaceOptions::default()).unwrap();
        surface.step(DEFAULT_DT);
        let events = surface.drain_events();
        assert!(!events.is_empty());
        assert!(surface.events().is_empty());
    }

    #[test]
    fn walls_are_static() {
        let surface = Surface::new(SurfaceOptions::default()).unwrap();
        let ids: Vec<_> = surface.bodies().map(|b| b.id).collect();
        for id in ids {
            assert!(surface.is_static(id).unwrap());
        }
    }
}
