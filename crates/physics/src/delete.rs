use tabletop_common::{BodyId, CompositeId, ConstraintId};

use crate::error::SurfaceError;
use crate::surface::{ConstraintEntry, Surface, SurfaceEvent};

impl Surface {
    /// Remove a body from the engine and the registry, along with every
    /// constraint, composite membership, attraction record, and animation
    /// referencing it.
    pub fn delete_body(&mut self, id: BodyId) -> Result<(), SurfaceError> {
        let entry = self
            .registry
            .remove(&id)
            .ok_or(SurfaceError::UnknownBody(id))?;
        self.order.retain(|b| *b != id);

        let dead: Vec<ConstraintId> = self
            .constraints
            .values()
            .filter(|c| c.body_a == id || c.body_b == id)
            .map(|c| c.id)
            .collect();
        for constraint in dead {
            self.remove_constraint_entry(constraint);
        }

        if let Some(composite) = entry.composite {
            if let Some(group) = self.composites.get_mut(&composite) {
                group.bodies.retain(|b| *b != id);
            }
        }

        self.detach_from_attraction(id);
        self.animations.retain(|a| !a.targets_body(id));

        self.bodies.remove(
            entry.rigid,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        tracing::debug!(?id, "removed body");
        self.push_event(SurfaceEvent::BodyRemoved { id });
        Ok(())
    }

    /// Remove a constraint from the engine and the registry.
    pub fn delete_constraint(&mut self, id: ConstraintId) -> Result<(), SurfaceError> {
        if self.remove_constraint_entry(id).is_none() {
            return Err(SurfaceError::UnknownConstraint(id));
        }
        Ok(())
    }

    /// Remove a composite together with all its member bodies and
    /// constraints.
    pub fn delete_composite(&mut self, id: CompositeId) -> Result<(), SurfaceError> {
        let group = self
            .composites
            .remove(&id)
            .ok_or(SurfaceError::UnknownComposite(id))?;
        for constraint in group.constraints {
            self.remove_constraint_entry(constraint);
        }
        for body in group.bodies {
            // member bodies may already be gone through direct deletion
            let _ = self.delete_body(body);
        }
        self.push_event(SurfaceEvent::CompositeRemoved { id });
        Ok(())
    }

    /// Empty the surface. With `keep_static` the walls (and any other
    /// frozen bodies) survive.
    pub fn clear(&mut self, keep_static: bool) {
        let victims: Vec<BodyId> = self
            .bodies()
            .filter(|entry| {
                !keep_static
                    || !self
                        .bodies
                        .get(entry.rigid)
                        .map(|b| b.is_fixed())
                        .unwrap_or(false)
            })
            .map(|entry| entry.id)
            .collect();
        for id in victims {
            let _ = self.delete_body(id);
        }
        if !keep_static {
            // no bodies left, so nothing can hold stale references
            self.constraints.clear();
            self.composites.clear();
            self.attractors.clear();
            self.animations.clear();
        } else {
            self.composites.retain(|_, group| !group.bodies.is_empty());
        }
        tracing::debug!(keep_static, "cleared surface");
        self.push_event(SurfaceEvent::Cleared);
    }

    /// Shared removal tail: drop the joint, the registry entry, composite
    /// membership, and any growth animation.
    pub(crate) fn remove_constraint_entry(&mut self, id: ConstraintId) -> Option<ConstraintEntry> {
        let entry = self.constraints.remove(&id)?;
        self.impulse_joints.remove(entry.joint, true);
        if let Some(composite) = entry.composite {
            if let Some(group) = self.composites.get_mut(&composite) {
                group.constraints.retain(|c| *c != id);
            }
        }
        self.animations.retain(|a| !a.targets_constraint(id));
        self.push_event(SurfaceEvent::ConstraintRemoved { id });
        Some(entry)
    }
}
