use nalgebra::{Point2, Vector2, point, vector};
use rapier2d::prelude::{
    ColliderBuilder, Group, InteractionGroups, PrismaticJointBuilder, RigidBodyBuilder,
    SpringJoint, SpringJointBuilder,
};
use tabletop_common::{BodyId, CompositeId, ConstraintId, PALETTE, RenderStyle};

use crate::animate::Animation;
use crate::error::SurfaceError;
use crate::options::{
    BodyOptions, CircleOptions, ConstraintOptions, IrregularOptions, PolygonOptions, RailOptions,
    RectangleOptions,
};
use crate::surface::{BodyEntry, BodyKind, CompositeEntry, ConstraintEntry, Surface, SurfaceEvent};

/// Spring constant applied at stiffness 1.0. The [0, 1] stiffness knob
/// scales linearly up to this.
const STIFFNESS_SCALE: f32 = 100.0;

/// Stiffness used for the spring link between a bearing and its target.
const BEARING_LINK_STIFFNESS: f32 = 0.5;

/// Ids of everything created for one slider rail.
#[derive(Debug, Clone)]
pub struct RailHandles {
    pub composite: CompositeId,
    pub rail: BodyId,
    pub bearings: Vec<BodyId>,
}

pub(crate) fn spring_joint(
    anchor_a: [f32; 2],
    anchor_b: [f32; 2],
    rest_length: f32,
    stiffness: f32,
    damping: f32,
) -> SpringJoint {
    SpringJointBuilder::new(rest_length, STIFFNESS_SCALE * stiffness, damping)
        .local_anchor1(point![anchor_a[0], anchor_a[1]])
        .local_anchor2(point![anchor_b[0], anchor_b[1]])
        .build()
}

impl Surface {
    /// Create a rectangle centered at the requested position.
    pub fn create_rectangle(&mut self, options: RectangleOptions) -> Result<BodyId, SurfaceError> {
        if options.w <= 0.0 || options.h <= 0.0 {
            return Err(SurfaceError::NonPositiveSize);
        }
        let collider = ColliderBuilder::cuboid(options.w / 2.0, options.h / 2.0);
        Ok(self.insert_body(
            options.x,
            options.y,
            BodyKind::Rectangle {
                w: options.w,
                h: options.h,
            },
            collider,
            options.body,
        ))
    }

    /// Create a circle centered at the requested position.
    pub fn create_circle(&mut self, options: CircleOptions) -> Result<BodyId, SurfaceError> {
        if options.r <= 0.0 {
            return Err(SurfaceError::NonPositiveSize);
        }
        let collider = ColliderBuilder::ball(options.r);
        Ok(self.insert_body(
            options.x,
            options.y,
            BodyKind::Circle { r: options.r },
            collider,
            options.body,
        ))
    }

    /// Create a regular polygon with vertices on a circle of radius `r`.
    pub fn create_polygon(&mut self, options: PolygonOptions) -> Result<BodyId, SurfaceError> {
        if options.sides < 3 {
            return Err(SurfaceError::TooFewSides(options.sides));
        }
        if options.r <= 0.0 {
            return Err(SurfaceError::NonPositiveSize);
        }
        let points = regular_polygon_points(options.r, options.sides);
        let collider =
            ColliderBuilder::convex_hull(&points).ok_or(SurfaceError::DegenerateHull)?;
        Ok(self.insert_body(
            options.x,
            options.y,
            BodyKind::Polygon {
                r: options.r,
                sides: options.sides,
            },
            collider,
            options.body,
        ))
    }

    /// Create a convex body from a local vertex list.
    pub fn create_irregular(&mut self, options: IrregularOptions) -> Result<BodyId, SurfaceError> {
        if options.vertices.len() < 3 {
            return Err(SurfaceError::DegenerateHull);
        }
        let points: Vec<Point2<f32>> = options
            .vertices
            .iter()
            .map(|v| point![v[0], v[1]])
            .collect();
        let collider =
            ColliderBuilder::convex_hull(&points).ok_or(SurfaceError::DegenerateHull)?;
        Ok(self.insert_body(
            options.x,
            options.y,
            BodyKind::Irregular {
                vertices: options.vertices,
            },
            collider,
            options.body,
        ))
    }

    /// Create a spring constraint between two registered bodies.
    pub fn create_constraint(
        &mut self,
        options: ConstraintOptions,
    ) -> Result<ConstraintId, SurfaceError> {
        if !(0.0..=1.0).contains(&options.stiffness) {
            return Err(SurfaceError::StiffnessOutOfRange(options.stiffness));
        }
        if options.length < 0.0 {
            return Err(SurfaceError::NonPositiveSize);
        }
        if options.grow_over == Some(0) {
            return Err(SurfaceError::ZeroAnimationSteps);
        }
        let rigid_a = self
            .registry
            .get(&options.body_a)
            .ok_or(SurfaceError::UnknownBody(options.body_a))?
            .rigid;
        let rigid_b = self
            .registry
            .get(&options.body_b)
            .ok_or(SurfaceError::UnknownBody(options.body_b))?
            .rigid;

        let (initial_length, animation_steps) = match options.grow_over {
            Some(steps) => (options.length / steps as f32, Some(steps)),
            None => (options.length, None),
        };
        let joint = self.impulse_joints.insert(
            rigid_a,
            rigid_b,
            spring_joint(
                options.point_a,
                options.point_b,
                initial_length,
                options.stiffness,
                options.damping,
            ),
            true,
        );

        let id = ConstraintId::new();
        self.constraints.insert(
            id,
            ConstraintEntry {
                id,
                body_a: options.body_a,
                body_b: options.body_b,
                anchor_a: options.point_a,
                anchor_b: options.point_b,
                length: options.length,
                current_length: initial_length,
                stiffness: options.stiffness,
                damping: options.damping,
                color: options.color.unwrap_or(tabletop_common::Color::WHITE),
                composite: None,
                joint,
            },
        );
        if let Some(steps) = animation_steps {
            self.animations.push(Animation::GrowConstraint {
                id,
                step_length: options.length / steps as f32,
                remaining: steps.saturating_sub(1),
            });
        }
        self.push_event(SurfaceEvent::ConstraintCreated { id });
        Ok(id)
    }

    /// Create a slider rail: a static rail rectangle plus bearings riding
    /// its long axis on prismatic joints, grouped as one composite.
    pub fn create_rail(&mut self, options: RailOptions) -> Result<RailHandles, SurfaceError> {
        if options.w <= 0.0 || options.h <= 0.0 {
            return Err(SurfaceError::NonPositiveSize);
        }
        if options.bearings.is_empty() {
            return Err(SurfaceError::EmptyRail);
        }
        for bearing in &options.bearings {
            if bearing.r <= 0.0 {
                return Err(SurfaceError::NonPositiveSize);
            }
            if let Some(target) = bearing.target {
                if !self.registry.contains_key(&target) {
                    return Err(SurfaceError::UnknownBody(target));
                }
            }
        }

        let composite = CompositeId::new();
        let rail = self.insert_body(
            options.x,
            options.y,
            BodyKind::Rectangle {
                w: options.w,
                h: options.h,
            },
            ColliderBuilder::cuboid(options.w / 2.0, options.h / 2.0),
            BodyOptions {
                is_static: true,
                angle: options.angle,
                label: Some(
                    options
                        .body
                        .label
                        .clone()
                        .unwrap_or_else(|| "rail".to_string()),
                ),
                ..options.body.clone()
            },
        );
        self.assign_composite(rail, composite);
        let rail_rigid = self.registry[&rail].rigid;

        let mut bearing_ids = Vec::with_capacity(options.bearings.len());
        let mut link_ids = Vec::new();
        for bearing in &options.bearings {
            let travel = (options.w / 2.0 - bearing.r).max(0.0);
            let local_x = ((bearing.at.clamp(0.0, 1.0) - 0.5) * options.w).clamp(-travel, travel);
            let (sin, cos) = options.angle.sin_cos();
            let bearing_id = self.insert_body(
                options.x + cos * local_x,
                options.y + sin * local_x,
                BodyKind::Circle { r: bearing.r },
                ColliderBuilder::ball(bearing.r),
                BodyOptions {
                    is_static: false,
                    label: Some(
                        bearing
                            .body
                            .label
                            .clone()
                            .unwrap_or_else(|| "bearing".to_string()),
                    ),
                    ..bearing.body.clone()
                },
            );
            self.assign_composite(bearing_id, composite);

            let bearing_rigid = self.registry[&bearing_id].rigid;
            // the bearing rides inside the rail, so contacts between the
            // two must not fight the joint
            let joint = PrismaticJointBuilder::new(Vector2::x_axis())
                .local_anchor1(point![0.0, 0.0])
                .local_anchor2(point![0.0, 0.0])
                .limits([-travel, travel])
                .contacts_enabled(false)
                .build();
            self.impulse_joints
                .insert(rail_rigid, bearing_rigid, joint, true);

            if let Some(target) = bearing.target {
                let bearing_pos = self.position(bearing_id)?;
                let target_pos = self.position(target)?;
                let length = vector![
                    target_pos[0] - bearing_pos[0],
                    target_pos[1] - bearing_pos[1]
                ]
                .norm();
                let link = self.create_constraint(ConstraintOptions::new(
                    bearing_id,
                    target,
                    length,
                    BEARING_LINK_STIFFNESS,
                ))?;
                if let Some(entry) = self.constraints.get_mut(&link) {
                    entry.composite = Some(composite);
                }
                link_ids.push(link);
            }
            bearing_ids.push(bearing_id);
        }

        self.composites.insert(
            composite,
            CompositeEntry {
                id: composite,
                label: "slider-rail".to_string(),
                bodies: std::iter::once(rail).chain(bearing_ids.iter().copied()).collect(),
                constraints: link_ids,
            },
        );
        self.push_event(SurfaceEvent::CompositeCreated { id: composite });
        Ok(RailHandles {
            composite,
            rail,
            bearings: bearing_ids,
        })
    }

    fn assign_composite(&mut self, id: BodyId, composite: CompositeId) {
        if let Some(entry) = self.registry.get_mut(&id) {
            entry.composite = Some(composite);
        }
    }

    /// Shared tail of every body factory: build the rigid body and collider,
    /// register the entry, log the event.
    fn insert_body(
        &mut self,
        x: f32,
        y: f32,
        kind: BodyKind,
        collider: ColliderBuilder,
        opts: BodyOptions,
    ) -> BodyId {
        let mut builder = if opts.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        }
        .translation(vector![x, y])
        .rotation(opts.angle)
        .linear_damping(opts.air_friction)
        .angular_damping(opts.air_friction)
        .can_sleep(self.options().sleeping)
        .sleeping(opts.start_asleep);
        if let Some(mass) = opts.additional_mass {
            builder = builder.additional_mass(mass);
        }

        let mut collider = collider
            .friction(opts.friction)
            .restitution(opts.restitution)
            .density(opts.density)
            .sensor(opts.is_sensor);
        if let Some(filter) = opts.collision_filter {
            collider = collider.collision_groups(InteractionGroups::new(
                Group::from_bits_truncate(filter.category),
                Group::from_bits_truncate(filter.mask),
            ));
        }

        let rigid = self.bodies.insert(builder.build());
        let collider = self
            .colliders
            .insert_with_parent(collider.build(), rigid, &mut self.bodies);

        let id = BodyId::new();
        let style = opts
            .style
            .unwrap_or_else(|| RenderStyle::filled(PALETTE[self.created % PALETTE.len()]));
        self.created += 1;
        let label = opts.label.unwrap_or_else(|| "body".to_string());
        tracing::debug!(?id, %label, "registered body");
        self.registry.insert(
            id,
            BodyEntry {
                id,
                label,
                kind,
                style,
                composite: None,
                rigid,
                collider,
                sleeping: opts.start_asleep,
            },
        );
        self.order.push(id);
        self.push_event(SurfaceEvent::BodyCreated { id });
        id
    }
}

pub(crate) fn regular_polygon_points(r: f32, sides: u32) -> Vec<Point2<f32>> {
    (0..sides)
        .map(|i| {
            let theta = i as f32 * std::f32::consts::TAU / sides as f32;
            point![r * theta.cos(), r * theta.sin()]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{BearingOptions, SurfaceOptions};
    use crate::surface::DEFAULT_DT;

    fn bare_surface() -> Surface {
        let mut options = SurfaceOptions::sized(1000.0, 1000.0);
        options.walls = false;
        Surface::new(options).unwrap()
    }

    #[test]
    fn rectangle_passes_position_and_size_through() {
        let mut surface = bare_surface();
        let id = surface
            .create_rectangle(RectangleOptions::new(10.0, 10.0, 5.0, 5.0))
            .unwrap();
        assert_eq!(surface.position(id).unwrap(), [10.0, 10.0]);
        assert_eq!(
            surface.body(id).unwrap().kind,
            BodyKind::Rectangle { w: 5.0, h: 5.0 }
        );
    }

    #[test]
    fn circle_passes_radius_through() {
        let mut surface = bare_surface();
        let id = surface
            .create_circle(CircleOptions::new(50.0, 60.0, 12.5))
            .unwrap();
        assert_eq!(surface.position(id).unwrap(), [50.0, 60.0]);
        assert_eq!(surface.body(id).unwrap().kind, BodyKind::Circle { r: 12.5 });
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let mut surface = bare_surface();
        assert!(matches!(
            surface.create_rectangle(RectangleOptions::new(0.0, 0.0, -1.0, 5.0)),
            Err(SurfaceError::NonPositiveSize)
        ));
        assert!(matches!(
            surface.create_circle(CircleOptions::new(0.0, 0.0, 0.0)),
            Err(SurfaceError::NonPositiveSize)
        ));
    }

    #[test]
    fn polygon_needs_three_sides() {
        let mut surface = bare_surface();
        assert!(matches!(
            surface.create_polygon(PolygonOptions::new(0.0, 0.0, 10.0, 2)),
            Err(SurfaceError::TooFewSides(2))
        ));
        assert!(
            surface
                .create_polygon(PolygonOptions::new(0.0, 0.0, 10.0, 6))
                .is_ok()
        );
    }

    #[test]
    fn irregular_rejects_collinear_vertices() {
        let mut surface = bare_surface();
        let flat = vec![[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]];
        assert!(matches!(
            surface.create_irregular(IrregularOptions::new(0.0, 0.0, flat)),
            Err(SurfaceError::DegenerateHull)
        ));
    }

    #[test]
    fn irregular_accepts_a_triangle() {
        let mut surface = bare_surface();
        let tri = vec![[0.0, -10.0], [10.0, 10.0], [-10.0, 10.0]];
        let id = surface
            .create_irregular(IrregularOptions::new(200.0, 200.0, tri))
            .unwrap();
        assert_eq!(surface.position(id).unwrap(), [200.0, 200.0]);
    }

    #[test]
    fn constraint_requires_known_bodies() {
        let mut surface = bare_surface();
        let a = surface
            .create_circle(CircleOptions::new(0.0, 0.0, 5.0))
            .unwrap();
        let ghost = BodyId::new();
        assert!(matches!(
            surface.create_constraint(ConstraintOptions::new(a, ghost, 50.0, 0.5)),
            Err(SurfaceError::UnknownBody(_))
        ));
    }

    #[test]
    fn constraint_validates_stiffness() {
        let mut surface = bare_surface();
        let a = surface
            .create_circle(CircleOptions::new(0.0, 0.0, 5.0))
            .unwrap();
        let b = surface
            .create_circle(CircleOptions::new(50.0, 0.0, 5.0))
            .unwrap();
        assert!(matches!(
            surface.create_constraint(ConstraintOptions::new(a, b, 50.0, 1.5)),
            Err(SurfaceError::StiffnessOutOfRange(_))
        ));
        let id = surface
            .create_constraint(ConstraintOptions::new(a, b, 50.0, 0.5))
            .unwrap();
        assert_eq!(surface.constraint(id).unwrap().length, 50.0);
    }

    #[test]
    fn growing_constraint_starts_short() {
        let mut surface = bare_surface();
        let a = surface
            .create_circle(CircleOptions::new(0.0, 0.0, 5.0))
            .unwrap();
        let b = surface
            .create_circle(CircleOptions::new(100.0, 0.0, 5.0))
            .unwrap();
        let mut options = ConstraintOptions::new(a, b, 80.0, 0.5);
        options.grow_over = Some(8);
        let id = surface.create_constraint(options).unwrap();
        assert_eq!(surface.constraint(id).unwrap().current_length, 10.0);
        for _ in 0..8 {
            surface.step(DEFAULT_DT);
        }
        let grown = surface.constraint(id).unwrap().current_length;
        assert!((grown - 80.0).abs() < 1e-3);
    }

    #[test]
    fn rail_registers_composite_with_all_parts() {
        let mut surface = bare_surface();
        let handles = surface
            .create_rail(
                RailOptions::new(500.0, 500.0, 300.0, 20.0)
                    .bearing(BearingOptions::new(10.0).at(0.0))
                    .bearing(BearingOptions::new(10.0).at(1.0)),
            )
            .unwrap();
        assert_eq!(handles.bearings.len(), 2);
        assert_eq!(surface.body_count(), 3);
        let composite = surface.composite(handles.composite).unwrap();
        assert_eq!(composite.bodies.len(), 3);
        assert!(surface.is_static(handles.rail).unwrap());

        // bearings sit at the travel limits, not past the rail ends
        let left = surface.position(handles.bearings[0]).unwrap();
        let right = surface.position(handles.bearings[1]).unwrap();
        assert!((left[0] - 360.0).abs() < 1e-3);
        assert!((right[0] - 640.0).abs() < 1e-3);
    }

    #[test]
    fn rail_needs_bearings() {
        let mut surface = bare_surface();
        assert!(matches!(
            surface.create_rail(RailOptions::new(0.0, 0.0, 100.0, 10.0)),
            Err(SurfaceError::EmptyRail)
        ));
    }

    #[test]
    fn bearing_link_joins_the_composite() {
        let mut surface = bare_surface();
        let cargo = surface
            .create_rectangle(RectangleOptions::new(500.0, 700.0, 40.0, 40.0))
            .unwrap();
        let handles = surface
            .create_rail(
                RailOptions::new(500.0, 500.0, 300.0, 20.0)
                    .bearing(BearingOptions::new(10.0).linked_to(cargo)),
            )
            .unwrap();
        let composite = surface.composite(handles.composite).unwrap();
        assert_eq!(composite.constraints.len(), 1);
        let link = surface.constraint(composite.constraints[0]).unwrap();
        assert_eq!(link.body_b, cargo);
        assert!((link.length - 200.0).abs() < 1e-3);
    }
}
