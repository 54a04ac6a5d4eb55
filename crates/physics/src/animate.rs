use tabletop_common::{BodyId, ConstraintId};

use crate::error::SurfaceError;
use crate::factory::spring_joint;
use crate::surface::Surface;

/// A mutation spread across ticks. Advanced once per [`Surface::step`],
/// dropped when finished or when its subject disappears.
#[derive(Debug, Clone)]
pub(crate) enum Animation {
    Scale {
        id: BodyId,
        per_step: [f32; 2],
        remaining: u32,
    },
    GrowConstraint {
        id: ConstraintId,
        step_length: f32,
        remaining: u32,
    },
}

impl Animation {
    pub(crate) fn targets_body(&self, body: BodyId) -> bool {
        matches!(self, Animation::Scale { id, .. } if *id == body)
    }

    pub(crate) fn targets_constraint(&self, constraint: ConstraintId) -> bool {
        matches!(self, Animation::GrowConstraint { id, .. } if *id == constraint)
    }
}

impl Surface {
    pub(crate) fn advance_animations(&mut self) {
        let mut queue = std::mem::take(&mut self.animations);
        queue.retain_mut(|animation| match animation {
            Animation::Scale {
                id,
                per_step,
                remaining,
            } => {
                if self.scale_body(*id, per_step[0], per_step[1]).is_err() {
                    return false;
                }
                *remaining -= 1;
                *remaining > 0
            }
            Animation::GrowConstraint {
                id,
                step_length,
                remaining,
            } => {
                if self.grow_constraint(*id, *step_length).is_err() {
                    return false;
                }
                *remaining -= 1;
                *remaining > 0
            }
        });
        // anything scheduled while advancing runs from the next tick on
        queue.append(&mut self.animations);
        self.animations = queue;
    }

    /// Lengthen a growing constraint by one increment, capped at its target.
    fn grow_constraint(&mut self, id: ConstraintId, step_length: f32) -> Result<(), SurfaceError> {
        let entry = self
            .constraints
            .get(&id)
            .ok_or(SurfaceError::UnknownConstraint(id))?;
        let new_length = (entry.current_length + step_length).min(entry.length);
        let (body_a, body_b) = (entry.body_a, entry.body_b);
        let (anchor_a, anchor_b) = (entry.anchor_a, entry.anchor_b);
        let (stiffness, damping) = (entry.stiffness, entry.damping);
        let old_joint = entry.joint;

        let rigid_a = self
            .registry
            .get(&body_a)
            .ok_or(SurfaceError::UnknownBody(body_a))?
            .rigid;
        let rigid_b = self
            .registry
            .get(&body_b)
            .ok_or(SurfaceError::UnknownBody(body_b))?
            .rigid;

        // The engine keeps spring parameters inside the joint, so a new rest
        // length means a rebuilt joint.
        self.impulse_joints.remove(old_joint, true);
        let joint = self.impulse_joints.insert(
            rigid_a,
            rigid_b,
            spring_joint(anchor_a, anchor_b, new_length, stiffness, damping),
            true,
        );
        if let Some(entry) = self.constraints.get_mut(&id) {
            entry.current_length = new_length;
            entry.joint = joint;
        }
        Ok(())
    }
}
