//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.
//!
//! The rope is a Rapier spring joint between the hooked body and a fixed,
//! collider-less anchor body spawned at the hook point. The anchor entity
//! owns the joint, so despawning it tears the rope down completely.

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::GrapplePhysicsBackend;
use crate::collision::{CollisionData, LayerMask};
use crate::hook::GrappleHook;
use crate::rope::RopeConstraint;

/// Rapier2D physics backend for the grapple hook.
///
/// Velocities, impulses and rotation go through `Velocity`,
/// `ExternalImpulse`, `Transform` and `LockedAxes`. Swing forces are
/// committed to `ExternalForce` by [`commit_swing_forces`] at the end of the
/// logic tick.
pub struct Rapier2dBackend;

impl GrapplePhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn raycast(
        world: &mut World,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude_entity: Entity,
        mask: LayerMask,
    ) -> Option<CollisionData> {
        let mut state: SystemState<ReadRapierContext> = SystemState::new(world);
        let rapier_context = state.get(world);
        let Ok(context) = rapier_context.single() else {
            return None;
        };
        rapier_raycast(&context, origin, direction, max_distance, exclude_entity, mask)
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            // Fallback: apply as velocity change if no ExternalImpulse component
            vel.linvel += impulse;
        }
    }

    fn apply_torque_impulse(world: &mut World, entity: Entity, torque_impulse: f32) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.torque_impulse += torque_impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.angvel += torque_impulse;
        }
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> f32 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.angvel)
            .unwrap_or(0.0)
    }

    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: f32) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.angvel = angular_velocity;
        }
    }

    fn get_rotation(world: &World, entity: Entity) -> f32 {
        world
            .get::<Transform>(entity)
            .map(|t| {
                let (_, _, z) = t.rotation.to_euler(EulerRot::XYZ);
                z
            })
            .unwrap_or(0.0)
    }

    fn set_rotation(world: &mut World, entity: Entity, rotation: f32) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = Quat::from_rotation_z(rotation);
        }
    }

    fn set_rotation_locked(world: &mut World, entity: Entity, locked: bool) {
        if let Some(mut axes) = world.get_mut::<LockedAxes>(entity) {
            if axes.contains(LockedAxes::ROTATION_LOCKED) != locked {
                axes.set(LockedAxes::ROTATION_LOCKED, locked);
            }
        } else if locked {
            if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
                entity_mut.insert(LockedAxes::ROTATION_LOCKED);
            }
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn create_rope(world: &mut World, entity: Entity, rope: &RopeConstraint) {
        Self::destroy_rope(world, entity);

        let anchor = world
            .spawn((
                Name::new("Rope Anchor"),
                RopeAnchor { owner: entity },
                RigidBody::Fixed,
                Transform::from_translation(rope.anchor().extend(0.0)),
                ImpulseJoint::new(entity, rope_joint(rope)),
            ))
            .id();

        if let Ok(mut owner) = world.get_entity_mut(entity) {
            owner.insert(RopeAnchorLink(anchor));
        }
    }

    fn set_rope_length(world: &mut World, entity: Entity, rope: &RopeConstraint) {
        let Some(RopeAnchorLink(anchor)) = world.get::<RopeAnchorLink>(entity).copied() else {
            return;
        };
        if let Some(mut joint) = world.get_mut::<ImpulseJoint>(anchor) {
            *joint = ImpulseJoint::new(entity, rope_joint(rope));
        }
    }

    fn destroy_rope(world: &mut World, entity: Entity) {
        let Some(RopeAnchorLink(anchor)) = world.get::<RopeAnchorLink>(entity).copied() else {
            return;
        };
        if let Ok(mut owner) = world.get_entity_mut(entity) {
            owner.remove::<RopeAnchorLink>();
        }
        world.despawn(anchor);
    }
}

/// Spring joint between the body center and the anchor.
fn rope_joint(rope: &RopeConstraint) -> SpringJointBuilder {
    SpringJointBuilder::new(rope.length(), rope.stiffness(), rope.damping())
        .local_anchor1(Vec2::ZERO)
        .local_anchor2(Vec2::ZERO)
}

/// Perform a raycast using RapierContext.
fn rapier_raycast(
    context: &RapierContext,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    exclude_entity: Entity,
    mask: LayerMask,
) -> Option<CollisionData> {
    let direction = direction.normalize_or_zero();
    if direction == Vec2::ZERO || max_distance <= 0.0 {
        return None;
    }

    // Colliders pass when one of their membership groups is in the mask.
    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(mask.bits()),
        ));

    context
        .cast_ray(origin, direction, max_distance, true, filter)
        .map(|(hit_entity, toi)| {
            let hit_point = origin + direction * toi;
            // For a simple ray, we approximate the normal as opposite of ray direction
            CollisionData::new(toi, -direction, hit_point, Some(hit_entity))
        })
}

/// Fixed body holding the rope joint of `owner`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RopeAnchor {
    /// The swinging body.
    pub owner: Entity,
}

/// Link from a swinging body to its [`RopeAnchor`] entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RopeAnchorLink(pub Entity);

/// Swing force currently committed to `ExternalForce`.
///
/// Lets [`commit_swing_forces`] replace last tick's swing force without
/// touching forces applied by anything else.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Default)]
#[reflect(Component)]
pub struct CommittedSwingForce(pub Vec2);

/// Plugin that sets up Rapier2D-specific systems for the grapple hook.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::GrappleHookSet;

        app.register_type::<CommittedSwingForce>();

        app.add_systems(
            Update,
            (commit_swing_forces, despawn_orphaned_rope_anchors)
                .in_set(GrappleHookSet::FinalApplication),
        );
    }
}

/// Replace last tick's swing force with this tick's in `ExternalForce`.
///
/// A hook released this tick has a zero swing force, so the release also
/// removes the force.
pub fn commit_swing_forces(
    mut q: Query<(&GrappleHook, &mut ExternalForce, &mut CommittedSwingForce)>,
) {
    for (hook, mut ext_force, mut committed) in &mut q {
        let next = hook.swing_force();
        if next == committed.0 {
            continue;
        }
        ext_force.force += next - committed.0;
        committed.0 = next;
    }
}

/// Despawn rope anchors whose owner is gone or no longer points at them.
pub fn despawn_orphaned_rope_anchors(
    mut commands: Commands,
    q_anchors: Query<(Entity, &RopeAnchor)>,
    q_links: Query<&RopeAnchorLink>,
) {
    for (anchor, rope_anchor) in &q_anchors {
        let linked = q_links
            .get(rope_anchor.owner)
            .is_ok_and(|link| link.0 == anchor);
        if !linked {
            commands.entity(anchor).despawn();
        }
    }
}

/// Bundle for creating a grappling body with Rapier2D physics.
///
/// Provides every Rapier component the backend reads or writes. Rotation
/// starts locked, matching [`MotionGate`](crate::state::MotionGate)'s
/// default; the hook unlocks it while hooked and upright recovery locks it
/// again once the body is back on its feet.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use msg_grapple_hook::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         GrappleHookBundle::new(GrappleConfig::default()),
///         Rapier2dGrappleBundle::new(),
///         Collider::capsule_y(0.25, 0.25),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dGrappleBundle {
    /// The rigid body type. Should be [`RigidBody::Dynamic`].
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity.
    pub velocity: Velocity,
    /// Forces applied to the body. The swing force is committed here.
    pub external_force: ExternalForce,
    /// Impulses applied this frame (swing kick, release launch, jumps).
    pub external_impulse: ExternalImpulse,
    /// Which axes are locked. Rotation is toggled by the hook.
    pub locked_axes: LockedAxes,
    /// Damping coefficients for velocity reduction.
    pub damping: Damping,
    /// Swing force bookkeeping.
    pub committed_swing_force: CommittedSwingForce,
}

impl Default for Rapier2dGrappleBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dGrappleBundle {
    /// Dynamic body with rotation locked and light damping.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            committed_swing_force: CommittedSwingForce::default(),
        }
    }

    /// Set the damping coefficients for velocity reduction.
    ///
    /// Linear damping bleeds swing speed, so keep it low for a lively swing.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}
