use nalgebra::{Point2, point, vector};
use rapier2d::math::Rotation;
use rapier2d::prelude::{RigidBodyType, SharedShape};
use tabletop_common::{BodyId, RenderStyle, Sprite};

use crate::animate::Animation;
use crate::error::SurfaceError;
use crate::surface::{BodyKind, Surface};

impl Surface {
    /// Move a body by an offset.
    pub fn translate_body(&mut self, id: BodyId, delta: [f32; 2]) -> Result<(), SurfaceError> {
        let rb = self.rigid_mut(id)?;
        let t = *rb.translation();
        rb.set_translation(t + vector![delta[0], delta[1]], true);
        Ok(())
    }

    /// Place a body's center at an absolute position.
    pub fn set_position(&mut self, id: BodyId, x: f32, y: f32) -> Result<(), SurfaceError> {
        self.rigid_mut(id)?.set_translation(vector![x, y], true);
        Ok(())
    }

    /// Rotate a body by an angle delta, in radians.
    pub fn rotate_body(&mut self, id: BodyId, delta: f32) -> Result<(), SurfaceError> {
        let rb = self.rigid_mut(id)?;
        let angle = rb.rotation().angle();
        rb.set_rotation(Rotation::new(angle + delta), true);
        Ok(())
    }

    /// Set a body's absolute angle, in radians. Spinning a body this way
    /// bypasses the solver, so prefer forces for continuous motion.
    pub fn set_angle(&mut self, id: BodyId, angle: f32) -> Result<(), SurfaceError> {
        self.rigid_mut(id)?.set_rotation(Rotation::new(angle), true);
        Ok(())
    }

    /// Freeze or unfreeze a body.
    pub fn set_static(&mut self, id: BodyId, is_static: bool) -> Result<(), SurfaceError> {
        let kind = if is_static {
            RigidBodyType::Fixed
        } else {
            RigidBodyType::Dynamic
        };
        self.rigid_mut(id)?.set_body_type(kind, true);
        Ok(())
    }

    /// Apply a force for the next tick only.
    pub fn apply_force(&mut self, id: BodyId, force: [f32; 2]) -> Result<(), SurfaceError> {
        self.rigid_mut(id)?
            .add_force(vector![force[0], force[1]], true);
        Ok(())
    }

    /// Apply a force for the next tick at a world-space point, producing
    /// torque when the point is off-center.
    pub fn apply_force_at(
        &mut self,
        id: BodyId,
        force: [f32; 2],
        at: [f32; 2],
    ) -> Result<(), SurfaceError> {
        self.rigid_mut(id)?.add_force_at_point(
            vector![force[0], force[1]],
            point![at[0], at[1]],
            true,
        );
        Ok(())
    }

    /// Apply an instantaneous velocity change.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: [f32; 2]) -> Result<(), SurfaceError> {
        self.rigid_mut(id)?
            .apply_impulse(vector![impulse[0], impulse[1]], true);
        Ok(())
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: [f32; 2]) -> Result<(), SurfaceError> {
        self.rigid_mut(id)?
            .set_linvel(vector![velocity[0], velocity[1]], true);
        Ok(())
    }

    pub fn set_friction(&mut self, id: BodyId, friction: f32) -> Result<(), SurfaceError> {
        let entry = self.registry.get(&id).ok_or(SurfaceError::UnknownBody(id))?;
        let collider = self
            .colliders
            .get_mut(entry.collider)
            .ok_or(SurfaceError::UnknownBody(id))?;
        collider.set_friction(friction);
        Ok(())
    }

    /// Elasticity on collision: 0 for none, 1 for a full kinetic bounce.
    pub fn set_restitution(&mut self, id: BodyId, restitution: f32) -> Result<(), SurfaceError> {
        let entry = self.registry.get(&id).ok_or(SurfaceError::UnknownBody(id))?;
        let collider = self
            .colliders
            .get_mut(entry.collider)
            .ok_or(SurfaceError::UnknownBody(id))?;
        collider.set_restitution(restitution);
        Ok(())
    }

    /// Resize a body in place. Circles only scale uniformly; polygons scale
    /// their hull points.
    pub fn scale_body(&mut self, id: BodyId, sx: f32, sy: f32) -> Result<(), SurfaceError> {
        if sx <= 0.0 || sy <= 0.0 {
            return Err(SurfaceError::NonPositiveScale);
        }
        let entry = self
            .registry
            .get_mut(&id)
            .ok_or(SurfaceError::UnknownBody(id))?;
        let shape = match &mut entry.kind {
            BodyKind::Rectangle { w, h } => {
                *w *= sx;
                *h *= sy;
                SharedShape::cuboid(*w / 2.0, *h / 2.0)
            }
            BodyKind::Circle { r } => {
                if (sx - sy).abs() > f32::EPSILON {
                    return Err(SurfaceError::NonUniformCircleScale);
                }
                *r *= sx;
                SharedShape::ball(*r)
            }
            kind @ (BodyKind::Polygon { .. } | BodyKind::Irregular { .. }) => {
                let scaled: Vec<Point2<f32>> = polygon_points(kind)
                    .iter()
                    .map(|p| point![p[0] * sx, p[1] * sy])
                    .collect();
                let shape =
                    SharedShape::convex_hull(&scaled).ok_or(SurfaceError::DegenerateHull)?;
                match kind {
                    BodyKind::Polygon { r, .. } => *r *= sx,
                    BodyKind::Irregular { vertices } => {
                        for v in vertices.iter_mut() {
                            v[0] *= sx;
                            v[1] *= sy;
                        }
                    }
                    _ => {}
                }
                shape
            }
        };
        let collider = self
            .colliders
            .get_mut(entry.collider)
            .ok_or(SurfaceError::UnknownBody(id))?;
        collider.set_shape(shape);
        Ok(())
    }

    /// Scale a body gradually across `steps` ticks; the combined factor
    /// after the last tick is `(sx, sy)`.
    pub fn scale_body_over_time(
        &mut self,
        id: BodyId,
        sx: f32,
        sy: f32,
        steps: u32,
    ) -> Result<(), SurfaceError> {
        if steps == 0 {
            return Err(SurfaceError::ZeroAnimationSteps);
        }
        if sx <= 0.0 || sy <= 0.0 {
            return Err(SurfaceError::NonPositiveScale);
        }
        if !self.registry.contains_key(&id) {
            return Err(SurfaceError::UnknownBody(id));
        }
        let exponent = 1.0 / steps as f32;
        self.animations.push(Animation::Scale {
            id,
            per_step: [sx.powf(exponent), sy.powf(exponent)],
            remaining: steps,
        });
        Ok(())
    }

    pub fn set_style(&mut self, id: BodyId, style: RenderStyle) -> Result<(), SurfaceError> {
        self.registry
            .get_mut(&id)
            .ok_or(SurfaceError::UnknownBody(id))?
            .style = style;
        Ok(())
    }

    pub fn set_visible(&mut self, id: BodyId, visible: bool) -> Result<(), SurfaceError> {
        self.registry
            .get_mut(&id)
            .ok_or(SurfaceError::UnknownBody(id))?
            .style
            .visible = visible;
        Ok(())
    }

    /// Attach or remove the sprite painted in place of the filled shape.
    pub fn set_sprite(&mut self, id: BodyId, sprite: Option<Sprite>) -> Result<(), SurfaceError> {
        self.registry
            .get_mut(&id)
            .ok_or(SurfaceError::UnknownBody(id))?
            .style
            .sprite = sprite;
        Ok(())
    }
}

fn polygon_points(kind: &BodyKind) -> Vec<[f32; 2]> {
    match kind {
        BodyKind::Polygon { r, sides } => crate::factory::regular_polygon_points(*r, *sides)
            .iter()
            .map(|p| [p.x, p.y])
            .collect(),
        BodyKind::Irregular { vertices } => vertices.clone(),
        _ => Vec::new(),
    }
}
