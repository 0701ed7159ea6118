//! Deterministic in-memory backend for exercising the hook state machine.
//!
//! Bodies are plain [`TestBody`] components: no integration, no gravity.
//! Raycasts run against axis-aligned boxes in [`TestColliders`]. Every
//! impulse and rope call is recorded so tests can assert on exactly what the
//! state machine asked the engine to do.

use bevy::prelude::*;

use crate::backend::{GrapplePhysicsBackend, NoOpBackendPlugin};
use crate::collision::{CollisionData, LayerMask};
use crate::config::GrappleConfig;
use crate::events::{HookBlocked, HookImpact, HookMiss, HookReleased};
use crate::rope::RopeConstraint;
use crate::GrappleHookBundle;

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub(crate) struct TestBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub rotation: f32,
    pub rotation_locked: bool,
    pub impulses: Vec<Vec2>,
    pub torque_impulses: Vec<f32>,
    pub rope: Option<RopeConstraint>,
    pub ropes_created: u32,
    pub ropes_destroyed: u32,
}

impl TestBody {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation_locked: true,
            ..default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TestCollider {
    pub entity: Entity,
    pub min: Vec2,
    pub max: Vec2,
    pub layers: LayerMask,
}

#[derive(Resource, Debug, Default)]
pub(crate) struct TestColliders(pub Vec<TestCollider>);

/// Entry distance of a ray into an axis-aligned box, with the entry normal.
fn ray_aabb(origin: Vec2, direction: Vec2, min: Vec2, max: Vec2) -> Option<(f32, Vec2)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = -direction;

    for axis in 0..2 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let mut near = (min[axis] - o) / d;
        let mut far = (max[axis] - o) / d;
        let mut face = if axis == 0 { Vec2::NEG_X } else { Vec2::NEG_Y };
        if near > far {
            std::mem::swap(&mut near, &mut far);
            face = -face;
        }
        if near > t_enter {
            t_enter = near;
            normal = face;
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    Some((t_enter.max(0.0), normal))
}

pub(crate) struct TestBackend;

impl GrapplePhysicsBackend for TestBackend {
    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }

    fn raycast(
        world: &mut World,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude_entity: Entity,
        mask: LayerMask,
    ) -> Option<CollisionData> {
        let colliders = world.get_resource::<TestColliders>()?;
        colliders
            .0
            .iter()
            .filter(|c| c.entity != exclude_entity && c.layers.intersects(mask))
            .filter_map(|c| {
                ray_aabb(origin, direction, c.min, c.max).map(|(toi, normal)| (c, toi, normal))
            })
            .filter(|(_, toi, _)| *toi <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, toi, normal)| {
                CollisionData::new(toi, normal, origin + direction * toi, Some(c.entity))
            })
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.impulses.push(impulse);
        }
    }

    fn apply_torque_impulse(world: &mut World, entity: Entity, torque_impulse: f32) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.torque_impulses.push(torque_impulse);
        }
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> f32 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.angular_velocity)
            .unwrap_or(0.0)
    }

    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: f32) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.angular_velocity = angular_velocity;
        }
    }

    fn get_rotation(world: &World, entity: Entity) -> f32 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.rotation)
            .unwrap_or(0.0)
    }

    fn set_rotation(world: &mut World, entity: Entity, rotation: f32) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.rotation = rotation;
        }
    }

    fn set_rotation_locked(world: &mut World, entity: Entity, locked: bool) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.rotation_locked = locked;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.position)
            .unwrap_or(Vec2::ZERO)
    }

    fn create_rope(world: &mut World, entity: Entity, rope: &RopeConstraint) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.rope = Some(*rope);
            body.ropes_created += 1;
        }
    }

    fn set_rope_length(world: &mut World, entity: Entity, rope: &RopeConstraint) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            if body.rope.is_some() {
                body.rope = Some(*rope);
            }
        }
    }

    fn destroy_rope(world: &mut World, entity: Entity) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            if body.rope.take().is_some() {
                body.ropes_destroyed += 1;
            }
        }
    }
}

/// World with the resources the transition functions expect.
pub(crate) fn test_world() -> World {
    let mut world = World::new();
    world.init_resource::<TestColliders>();
    world.init_resource::<Events<HookImpact>>();
    world.init_resource::<Events<HookMiss>>();
    world.init_resource::<Events<HookBlocked>>();
    world.init_resource::<Events<HookReleased>>();
    world
}

/// Add a box collider spanning `min..max` on `layers`.
pub(crate) fn add_box(world: &mut World, min: Vec2, max: Vec2, layers: LayerMask) -> Entity {
    let entity = world.spawn_empty().id();
    world.resource_mut::<TestColliders>().0.push(TestCollider {
        entity,
        min,
        max,
        layers,
    });
    entity
}

pub(crate) fn spawn_grappler(world: &mut World, position: Vec2, config: GrappleConfig) -> Entity {
    world
        .spawn((TestBody::at(position), GrappleHookBundle::new(config)))
        .id()
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::config::LocomotionConfig;
    use crate::hook::{GrappleHook, HookSide, HookState, ReleaseReason};
    use crate::intent::GrappleIntent;
    use crate::momentum::SwingMomentum;
    use crate::resolver::{resolve_target, HookPreview};
    use crate::state::{Grounded, MotionGate, Swinging, Zipping};
    use crate::systems::*;

    const HOOKABLE: LayerMask = LayerMask::layer(0);
    const BLOCKER: LayerMask = LayerMask::layer(1);

    fn config() -> GrappleConfig {
        GrappleConfig::default().with_masks(HOOKABLE, BLOCKER)
    }

    /// Ceiling slab with its underside at `y`.
    fn ceiling(world: &mut World, y: f32) -> Entity {
        add_box(world, Vec2::new(-20.0, y), Vec2::new(20.0, y + 1.0), HOOKABLE)
    }

    /// Floor slab with its top at `y`.
    fn floor(world: &mut World, y: f32) -> Entity {
        add_box(world, Vec2::new(-20.0, y - 1.0), Vec2::new(20.0, y), HOOKABLE)
    }

    fn hook(world: &World, entity: Entity) -> &GrappleHook {
        world.get::<GrappleHook>(entity).unwrap()
    }

    fn body(world: &World, entity: Entity) -> &TestBody {
        world.get::<TestBody>(entity).unwrap()
    }

    fn gate(world: &World, entity: Entity) -> MotionGate {
        *world.get::<MotionGate>(entity).unwrap()
    }

    fn released(world: &World) -> Vec<ReleaseReason> {
        world
            .resource::<Events<HookReleased>>()
            .iter_current_update_events()
            .map(|e| e.reason)
            .collect()
    }

    fn move_body(world: &mut World, entity: Entity, position: Vec2, velocity: Vec2) {
        let mut body = world.get_mut::<TestBody>(entity).unwrap();
        body.position = position;
        body.velocity = velocity;
    }

    mod resolver {
        use super::*;

        #[test]
        fn nearest_hookable_hit_within_range() {
            let mut world = test_world();
            let caster = world.spawn_empty().id();
            let near = ceiling(&mut world, 4.0);
            add_box(&mut world, Vec2::new(-1.0, 7.0), Vec2::new(1.0, 8.0), HOOKABLE);

            let result = resolve_target::<TestBackend>(
                &mut world,
                caster,
                Vec2::ZERO,
                Vec2::new(0.0, 2.0),
                10.0,
                HOOKABLE,
                BLOCKER,
            );
            let hit = result.hit.unwrap();
            assert_eq!(hit.entity, Some(near));
            assert_eq!(hit.point, Vec2::new(0.0, 4.0));
            assert!(!result.blocked);
            assert_eq!(result.clear_point(), Some(Vec2::new(0.0, 4.0)));
        }

        #[test]
        fn out_of_range_is_a_miss() {
            let mut world = test_world();
            let caster = world.spawn_empty().id();
            ceiling(&mut world, 12.0);

            let result = resolve_target::<TestBackend>(
                &mut world,
                caster,
                Vec2::ZERO,
                Vec2::Y,
                10.0,
                HOOKABLE,
                BLOCKER,
            );
            assert!(result.is_miss());
            assert!(!result.blocked);
        }

        #[test]
        fn blocker_in_front_of_target_blocks() {
            let mut world = test_world();
            let caster = world.spawn_empty().id();
            ceiling(&mut world, 5.0);
            add_box(&mut world, Vec2::new(-1.0, 2.0), Vec2::new(1.0, 3.0), BLOCKER);

            let result = resolve_target::<TestBackend>(
                &mut world,
                caster,
                Vec2::ZERO,
                Vec2::Y,
                10.0,
                HOOKABLE,
                BLOCKER,
            );
            assert!(result.hit.is_some());
            assert!(result.blocked);
            assert_eq!(result.clear_point(), None);
        }

        #[test]
        fn blocker_behind_target_does_not_block() {
            let mut world = test_world();
            let caster = world.spawn_empty().id();
            ceiling(&mut world, 3.0);
            add_box(&mut world, Vec2::new(-1.0, 6.0), Vec2::new(1.0, 7.0), BLOCKER);

            let result = resolve_target::<TestBackend>(
                &mut world,
                caster,
                Vec2::ZERO,
                Vec2::Y,
                10.0,
                HOOKABLE,
                BLOCKER,
            );
            assert!(!result.blocked);
        }

        #[test]
        fn surface_in_both_masks_blocks_itself() {
            let mut world = test_world();
            let caster = world.spawn_empty().id();
            add_box(
                &mut world,
                Vec2::new(-1.0, 4.0),
                Vec2::new(1.0, 5.0),
                HOOKABLE | BLOCKER,
            );

            let result = resolve_target::<TestBackend>(
                &mut world,
                caster,
                Vec2::ZERO,
                Vec2::Y,
                10.0,
                HOOKABLE,
                BLOCKER,
            );
            assert!(result.hit.is_some());
            assert!(result.blocked);
        }

        #[test]
        fn zero_direction_is_a_miss() {
            let mut world = test_world();
            let caster = world.spawn_empty().id();
            ceiling(&mut world, 0.0);

            let result = resolve_target::<TestBackend>(
                &mut world,
                caster,
                Vec2::ZERO,
                Vec2::ZERO,
                10.0,
                HOOKABLE,
                BLOCKER,
            );
            assert!(result.is_miss());
        }
    }

    mod fire {
        use super::*;

        #[test]
        fn no_charge_never_leaves_idle() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config().with_max_charge(1));
            world
                .get_mut::<GrappleHook>(e)
                .unwrap()
                .charges_mut()
                .try_consume();

            let outcome = fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            assert_eq!(outcome, FireOutcome::Rejected(FireRejection::NoCharge));
            assert_eq!(hook(&world, e).state(), HookState::Idle);
            assert_eq!(hook(&world, e).charges().current(), 0);
            assert!(gate(&world, e).can_move);
            assert!(world.resource::<Events<HookMiss>>().is_empty());
        }

        #[test]
        fn anchor_above_swings_with_rope_at_fire_distance() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            move_body(&mut world, e, Vec2::ZERO, Vec2::new(3.0, -4.0));

            let outcome = fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            assert_eq!(outcome, FireOutcome::Swinging);
            let h = hook(&world, e);
            assert_eq!(h.state(), HookState::Swinging);
            assert_eq!(h.charges().current(), 1);
            assert_eq!(h.anchor(), Some(Vec2::new(0.0, 5.0)));
            assert_eq!(h.rope().map(|r| r.length()), Some(5.0));
            assert_eq!(h.side(), HookSide::None);

            let b = body(&world, e);
            assert_eq!(b.velocity, Vec2::ZERO);
            assert_eq!(b.ropes_created, 1);
            assert_eq!(b.rope.map(|r| r.length()), Some(5.0));
            // Directly below the anchor: only the downward kick.
            assert_eq!(b.impulses, vec![Vec2::new(0.0, -15.0)]);
            assert!(!b.rotation_locked);

            let g = gate(&world, e);
            assert!(!g.can_move);
            assert!(!g.can_jump);
            assert!(!g.rotation_locked);
            assert_eq!(world.resource::<Events<HookImpact>>().len(), 1);
        }

        #[test]
        fn swing_kick_points_toward_anchor_side() {
            let mut world = test_world();
            add_box(&mut world, Vec2::new(-5.0, 4.0), Vec2::new(-3.0, 6.0), HOOKABLE);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());

            let outcome = fire_hook::<TestBackend>(&mut world, e, Vec2::new(-4.0, 4.0));

            assert_eq!(outcome, FireOutcome::Swinging);
            assert_eq!(hook(&world, e).side(), HookSide::Left);
            let impulses = &body(&world, e).impulses;
            assert_eq!(impulses.len(), 2);
            assert_eq!(impulses[0], Vec2::new(0.0, -15.0));
            assert_eq!(impulses[1], Vec2::new(-15.0, 0.0));
        }

        #[test]
        fn anchor_below_zips_without_rope() {
            let mut world = test_world();
            floor(&mut world, -5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());

            let outcome = fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, -8.0));

            assert_eq!(outcome, FireOutcome::Zipping);
            let h = hook(&world, e);
            assert_eq!(h.state(), HookState::Zipping);
            assert_eq!(h.anchor(), Some(Vec2::new(0.0, -5.0)));
            assert!(h.rope().is_none());
            assert_eq!(h.charges().current(), 1);

            let b = body(&world, e);
            assert_eq!(b.ropes_created, 0);
            assert!(b.impulses.is_empty());
        }

        #[test]
        fn miss_restores_locks_and_keeps_charge() {
            let mut world = test_world();
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());

            let outcome = fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            assert_eq!(outcome, FireOutcome::Miss);
            assert_eq!(hook(&world, e).state(), HookState::Idle);
            assert_eq!(hook(&world, e).charges().current(), 2);
            let g = gate(&world, e);
            assert!(g.can_move && g.can_jump);
            assert_eq!(world.resource::<Events<HookMiss>>().len(), 1);
            assert!(world.resource::<Events<HookBlocked>>().is_empty());
        }

        #[test]
        fn blocked_target_restores_locks_and_signals_once() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            add_box(&mut world, Vec2::new(-1.0, 2.0), Vec2::new(1.0, 3.0), BLOCKER);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());

            let outcome = fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            assert_eq!(outcome, FireOutcome::Blocked);
            assert_eq!(hook(&world, e).state(), HookState::Idle);
            assert_eq!(hook(&world, e).charges().current(), 2);
            let g = gate(&world, e);
            assert!(g.can_move);
            assert!(g.can_jump);
            assert_eq!(world.resource::<Events<HookBlocked>>().len(), 1);
            assert!(world.resource::<Events<HookMiss>>().is_empty());
            assert!(world.resource::<Events<HookImpact>>().is_empty());
        }

        #[test]
        fn blocked_fire_keeps_locks_set_by_others() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            add_box(&mut world, Vec2::new(-1.0, 2.0), Vec2::new(1.0, 3.0), BLOCKER);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            world.get_mut::<MotionGate>(e).unwrap().lock_jump();

            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            let g = gate(&world, e);
            assert!(g.can_move);
            assert!(!g.can_jump);
        }

        #[test]
        fn fire_while_hooked_is_ignored() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            let outcome = fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            assert_eq!(outcome, FireOutcome::Rejected(FireRejection::AlreadyHooked));
            assert_eq!(hook(&world, e).charges().current(), 1);
            assert_eq!(body(&world, e).ropes_created, 1);
            assert_eq!(world.resource::<Events<HookImpact>>().len(), 1);
            assert!(world.resource::<Events<HookMiss>>().is_empty());
        }

        #[test]
        fn fire_point_offset_moves_the_origin() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(
                &mut world,
                Vec2::ZERO,
                config().with_fire_point_offset(Vec2::new(0.0, 1.0)),
            );

            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            assert_eq!(hook(&world, e).rope().map(|r| r.length()), Some(4.0));
        }

        #[test]
        fn short_fire_clamps_rope_to_floor() {
            let mut world = test_world();
            ceiling(&mut world, 0.5);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config().with_pull(5.0, 1.0));

            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            assert_eq!(hook(&world, e).rope().map(|r| r.length()), Some(1.0));
        }
    }

    mod release {
        use super::*;

        fn swinging(world: &mut World, config: GrappleConfig) -> Entity {
            ceiling(world, 5.0);
            let e = spawn_grappler(world, Vec2::ZERO, config);
            assert!(fire_hook::<TestBackend>(world, e, Vec2::new(0.0, 8.0)).attached());
            e
        }

        #[test]
        fn release_is_idempotent() {
            let mut world = test_world();
            let e = swinging(&mut world, config().with_release(2.5, 3.0, 1.0));
            let impulses_before = body(&world, e).impulses.len();

            assert!(release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual));
            let after_first = body(&world, e).clone();
            assert!(!release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual));

            assert_eq!(body(&world, e), &after_first);
            assert_eq!(after_first.impulses.len(), impulses_before + 1);
            assert_eq!(after_first.impulses.last(), Some(&Vec2::new(0.0, 3.0)));
            assert_eq!(after_first.ropes_destroyed, 1);
            assert!(after_first.rope.is_none());

            let h = hook(&world, e);
            assert_eq!(h.state(), HookState::Idle);
            assert!(h.rope().is_none());
            assert!(h.anchor().is_none());
            assert_eq!(h.momentum().magnitude(), 0.0);
            let g = gate(&world, e);
            assert!(g.can_move && g.can_jump);
            assert_eq!(released(&world), vec![ReleaseReason::Manual]);
        }

        #[test]
        fn release_launches_along_swing_momentum() {
            let mut world = test_world();
            let config = config()
                .with_swing(0.5, 0.5, 15.0)
                .with_release(2.5, 2.0, 1.0);
            let e = swinging(&mut world, config);
            world
                .get_mut::<GrappleHook>(e)
                .unwrap()
                .set_momentum(SwingMomentum::from_parts(6.0, Vec2::X));

            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);

            let launch = *body(&world, e).impulses.last().unwrap();
            let expected = Vec2::X * 15.0 + Vec2::Y * 2.0 * (6.0 / 15.0);
            assert!((launch - expected).length() < 1e-5, "launch = {launch}");
        }

        #[test]
        fn release_torque_kick_turns_toward_upright() {
            let mut world = test_world();
            add_box(&mut world, Vec2::new(-5.0, 4.0), Vec2::new(-3.0, 6.0), HOOKABLE);
            let e = spawn_grappler(
                &mut world,
                Vec2::ZERO,
                config().with_release(2.5, 1.0, 1.5),
            );
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(-4.0, 4.0));
            {
                let mut b = world.get_mut::<TestBody>(e).unwrap();
                b.rotation = 0.4;
                b.angular_velocity = 2.0;
            }

            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);

            let b = body(&world, e);
            assert_eq!(b.angular_velocity, -2.0);
            assert_eq!(b.torque_impulses, vec![-1.5]);
        }

        #[test]
        fn release_torque_kick_keeps_spin_already_turning_upright() {
            let mut world = test_world();
            add_box(&mut world, Vec2::new(-5.0, 4.0), Vec2::new(-3.0, 6.0), HOOKABLE);
            let e = spawn_grappler(
                &mut world,
                Vec2::ZERO,
                config().with_release(2.5, 1.0, 1.5),
            );
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(-4.0, 4.0));
            {
                // Tilt does not decide the cancel, only the spin does.
                let mut b = world.get_mut::<TestBody>(e).unwrap();
                b.rotation = 0.4;
                b.angular_velocity = -2.0;
            }

            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);

            let b = body(&world, e);
            assert_eq!(b.angular_velocity, -2.0);
            assert_eq!(b.torque_impulses, vec![-1.5]);
        }

        #[test]
        fn release_torque_kick_cancels_positive_spin_when_tilted_clockwise() {
            let mut world = test_world();
            add_box(&mut world, Vec2::new(-5.0, 4.0), Vec2::new(-3.0, 6.0), HOOKABLE);
            let e = spawn_grappler(
                &mut world,
                Vec2::ZERO,
                config().with_release(2.5, 1.0, 1.5),
            );
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(-4.0, 4.0));
            {
                let mut b = world.get_mut::<TestBody>(e).unwrap();
                b.rotation = -0.3;
                b.angular_velocity = 2.0;
            }

            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);

            let b = body(&world, e);
            assert_eq!(b.angular_velocity, -2.0);
            assert_eq!(b.torque_impulses, vec![-1.5]);
        }

        #[test]
        fn zip_release_applies_no_linear_impulse() {
            let mut world = test_world();
            floor(&mut world, -5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, -8.0));

            assert!(release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual));

            let b = body(&world, e);
            assert!(b.impulses.is_empty());
            assert!(b.torque_impulses.is_empty());
            assert_eq!(b.ropes_destroyed, 0);
        }

        #[test]
        fn refire_after_release_does_not_stack_ropes() {
            let mut world = test_world();
            let e = swinging(&mut world, config().with_max_charge(3));
            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));

            let b = body(&world, e);
            assert_eq!(b.ropes_created, 2);
            assert_eq!(b.ropes_destroyed, 1);
            assert!(b.rope.is_some());
        }
    }

    mod zip {
        use super::*;

        fn zipping(world: &mut World, config: GrappleConfig) -> Entity {
            floor(world, -5.0);
            let e = spawn_grappler(world, Vec2::ZERO, config);
            assert_eq!(
                fire_hook::<TestBackend>(world, e, Vec2::new(0.0, -8.0)),
                FireOutcome::Zipping
            );
            e
        }

        #[test]
        fn zip_drives_velocity_at_anchor() {
            let mut world = test_world();
            let e = zipping(&mut world, config().with_zip(20.0, 0.5, true));

            apply_zip_velocity::<TestBackend>(&mut world);

            assert_eq!(body(&world, e).velocity, Vec2::new(0.0, -20.0));
            assert!(hook(&world, e).is_zipping());
        }

        #[test]
        fn arrival_at_exact_stop_distance_auto_releases() {
            let mut world = test_world();
            let e = zipping(&mut world, config().with_zip(20.0, 0.5, true));
            move_body(&mut world, e, Vec2::new(0.0, -4.5), Vec2::new(0.0, -20.0));

            apply_zip_velocity::<TestBackend>(&mut world);

            assert_eq!(hook(&world, e).state(), HookState::Idle);
            assert_eq!(released(&world), vec![ReleaseReason::Arrived]);
            assert!(gate(&world, e).can_move);
        }

        #[test]
        fn arrival_without_auto_release_holds_until_released() {
            let mut world = test_world();
            let e = zipping(&mut world, config().with_zip(20.0, 0.5, false));
            move_body(&mut world, e, Vec2::new(0.0, -4.6), Vec2::new(1.0, -2.0));

            apply_zip_velocity::<TestBackend>(&mut world);

            let h = hook(&world, e);
            assert!(h.is_zipping());
            assert!(h.zip_arrived());
            assert!(released(&world).is_empty());
            // Left to normal physics from here on.
            apply_zip_velocity::<TestBackend>(&mut world);
            assert_eq!(body(&world, e).velocity, Vec2::new(1.0, -2.0));

            assert!(release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual));
            assert!(body(&world, e).impulses.is_empty());
        }
    }

    mod swing {
        use super::*;

        fn swinging(world: &mut World, config: GrappleConfig) -> Entity {
            ceiling(world, 5.0);
            let e = spawn_grappler(world, Vec2::ZERO, config);
            fire_hook::<TestBackend>(world, e, Vec2::new(0.0, 8.0));
            e
        }

        #[test]
        fn input_builds_momentum_and_swing_force() {
            let mut world = test_world();
            let e = swinging(&mut world, config());
            world.get_mut::<GrappleIntent>(e).unwrap().set_horizontal(1.0);

            for _ in 0..30 {
                apply_swing_with_dt::<TestBackend>(&mut world, 1.0 / 60.0);
            }

            let h = hook(&world, e);
            assert!(h.momentum().magnitude() > 0.2);
            // Anchor straight above: input right swings the body right.
            assert_eq!(h.momentum().direction(), Vec2::X);
            assert!(h.swing_force().x > 0.0);
            assert!((h.hooked_time() - 0.5).abs() < 1e-4);
        }

        #[test]
        fn release_clears_swing_force() {
            let mut world = test_world();
            let e = swinging(&mut world, config());
            world.get_mut::<GrappleIntent>(e).unwrap().set_horizontal(-1.0);
            for _ in 0..30 {
                apply_swing_with_dt::<TestBackend>(&mut world, 1.0 / 60.0);
            }
            assert_ne!(hook(&world, e).swing_force(), Vec2::ZERO);

            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);

            assert_eq!(hook(&world, e).swing_force(), Vec2::ZERO);
        }

        #[test]
        fn pull_never_goes_below_floor() {
            let mut world = test_world();
            let e = swinging(&mut world, config().with_pull(5.0, 1.0));
            world.get_mut::<GrappleIntent>(e).unwrap().set_pull(true);

            for dt in [0.1, 0.5, 0.0, 2.0, 0.3] {
                apply_swing_with_dt::<TestBackend>(&mut world, dt);
                let length = hook(&world, e).rope().unwrap().length();
                assert!(length >= 1.0, "length = {length}");
            }
            assert_eq!(hook(&world, e).rope().unwrap().length(), 1.0);
            assert_eq!(body(&world, e).rope.map(|r| r.length()), Some(1.0));
            assert!(!pull_rope::<TestBackend>(&mut world, e, 1.0));
        }

        #[test]
        fn pull_while_zipping_is_a_no_op() {
            let mut world = test_world();
            floor(&mut world, -5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, -8.0));

            assert!(!pull_rope::<TestBackend>(&mut world, e, 0.5));
        }
    }

    mod auto_release {
        use super::*;

        fn swinging(world: &mut World) -> Entity {
            ceiling(world, 5.0);
            let e = spawn_grappler(world, Vec2::ZERO, config());
            fire_hook::<TestBackend>(world, e, Vec2::new(0.0, 8.0));
            e
        }

        #[test]
        fn passing_above_anchor_releases() {
            let mut world = test_world();
            let e = swinging(&mut world);
            move_body(&mut world, e, Vec2::new(0.0, 5.5), Vec2::new(6.0, 6.0));

            release_hooks_above_anchor::<TestBackend>(&mut world);

            assert_eq!(hook(&world, e).state(), HookState::Idle);
            assert_eq!(released(&world), vec![ReleaseReason::AnchorPassed]);
        }

        #[test]
        fn level_with_anchor_keeps_swinging() {
            let mut world = test_world();
            let e = swinging(&mut world);
            move_body(&mut world, e, Vec2::new(5.0, 5.0), Vec2::new(0.0, 6.0));

            release_hooks_above_anchor::<TestBackend>(&mut world);

            assert!(hook(&world, e).is_swinging());
        }

        #[test]
        fn rest_rule_waits_for_delay() {
            let mut world = test_world();
            let e = swinging(&mut world);

            release_hooks_at_rest::<TestBackend>(&mut world);
            assert!(hook(&world, e).is_swinging());

            apply_swing_with_dt::<TestBackend>(&mut world, 0.2);
            move_body(&mut world, e, Vec2::ZERO, Vec2::new(1.0, -1.0));
            release_hooks_at_rest::<TestBackend>(&mut world);

            assert_eq!(hook(&world, e).state(), HookState::Idle);
            assert_eq!(released(&world), vec![ReleaseReason::AtRest]);
        }

        #[test]
        fn moving_body_is_not_at_rest() {
            let mut world = test_world();
            let e = swinging(&mut world);
            apply_swing_with_dt::<TestBackend>(&mut world, 0.2);
            move_body(&mut world, e, Vec2::ZERO, Vec2::new(3.0, 0.0));

            release_hooks_at_rest::<TestBackend>(&mut world);

            assert!(hook(&world, e).is_swinging());
        }

        #[test]
        fn both_rules_in_one_tick_release_once() {
            let mut world = test_world();
            let e = swinging(&mut world);
            apply_swing_with_dt::<TestBackend>(&mut world, 0.2);
            move_body(&mut world, e, Vec2::new(0.0, 5.5), Vec2::ZERO);

            release_hooks_above_anchor::<TestBackend>(&mut world);
            release_hooks_at_rest::<TestBackend>(&mut world);

            assert_eq!(released(&world), vec![ReleaseReason::AnchorPassed]);
        }

        #[test]
        fn zips_are_never_auto_released_by_swing_rules() {
            let mut world = test_world();
            floor(&mut world, -5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, -8.0));
            apply_swing_with_dt::<TestBackend>(&mut world, 0.2);

            release_hooks_above_anchor::<TestBackend>(&mut world);
            release_hooks_at_rest::<TestBackend>(&mut world);

            assert!(hook(&world, e).is_zipping());
        }
    }

    mod input {
        use super::*;

        #[test]
        fn press_fires_and_let_go_releases() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            {
                let mut intent = world.get_mut::<GrappleIntent>(e).unwrap();
                intent.set_aim_point(Vec2::new(0.0, 8.0));
                intent.set_hook_pressed(true);
            }

            handle_hook_input::<TestBackend>(&mut world);
            assert!(hook(&world, e).is_swinging());

            world.run_system_once(latch_intents).unwrap();
            handle_hook_input::<TestBackend>(&mut world);
            assert!(hook(&world, e).is_swinging());

            world
                .get_mut::<GrappleIntent>(e)
                .unwrap()
                .set_hook_pressed(false);
            handle_hook_input::<TestBackend>(&mut world);
            assert_eq!(hook(&world, e).state(), HookState::Idle);
            assert_eq!(released(&world), vec![ReleaseReason::Manual]);
        }
    }

    mod gate {
        use super::*;

        fn grounded(world: &mut World) -> Entity {
            floor(world, -0.5);
            let e = spawn_grappler(world, Vec2::ZERO, config());
            update_ground_sensors::<TestBackend>(world);
            e
        }

        #[test]
        fn ground_sensor_sets_grounded() {
            let mut world = test_world();
            let e = grounded(&mut world);
            assert!(gate(&world, e).grounded);

            move_body(&mut world, e, Vec2::new(0.0, 3.0), Vec2::ZERO);
            update_ground_sensors::<TestBackend>(&mut world);
            assert!(!gate(&world, e).grounded);
        }

        #[test]
        fn grounded_refills_charges() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));
            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);
            assert_eq!(hook(&world, e).charges().current(), 1);

            world.run_system_once(refill_charges).unwrap();
            assert_eq!(hook(&world, e).charges().current(), 1);

            world.get_mut::<MotionGate>(e).unwrap().grounded = true;
            world.run_system_once(refill_charges).unwrap();
            assert_eq!(hook(&world, e).charges().current(), 2);
        }

        #[test]
        fn charge_capacity_follows_config() {
            let mut world = test_world();
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            world.get_mut::<GrappleConfig>(e).unwrap().max_charge = 4;
            world.get_mut::<MotionGate>(e).unwrap().grounded = true;

            world.run_system_once(refill_charges).unwrap();

            assert_eq!(hook(&world, e).charges().max(), 4);
            assert_eq!(hook(&world, e).charges().current(), 4);
        }

        #[test]
        fn grounded_run_sets_speed() {
            let mut world = test_world();
            let e = grounded(&mut world);
            world.get_mut::<GrappleIntent>(e).unwrap().set_horizontal(-1.0);

            apply_locomotion::<TestBackend>(&mut world);

            assert_eq!(body(&world, e).velocity.x, -LocomotionConfig::default().run_speed);
        }

        #[test]
        fn airborne_run_keeps_faster_momentum() {
            let mut world = test_world();
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            move_body(&mut world, e, Vec2::ZERO, Vec2::new(25.0, 3.0));
            world.get_mut::<GrappleIntent>(e).unwrap().set_horizontal(1.0);

            apply_locomotion::<TestBackend>(&mut world);
            assert_eq!(body(&world, e).velocity, Vec2::new(25.0, 3.0));

            world.get_mut::<GrappleIntent>(e).unwrap().set_horizontal(-1.0);
            apply_locomotion::<TestBackend>(&mut world);
            assert_eq!(body(&world, e).velocity.x, -10.0);
        }

        #[test]
        fn locked_gate_ignores_run_and_jump() {
            let mut world = test_world();
            let e = grounded(&mut world);
            world.get_mut::<MotionGate>(e).unwrap().lock_all();
            {
                let mut intent = world.get_mut::<GrappleIntent>(e).unwrap();
                intent.set_horizontal(1.0);
                intent.set_jump_pressed(true);
            }

            apply_locomotion::<TestBackend>(&mut world);

            let b = body(&world, e);
            assert_eq!(b.velocity, Vec2::ZERO);
            assert!(b.impulses.is_empty());
        }

        #[test]
        fn jump_only_on_press_while_grounded() {
            let mut world = test_world();
            let e = grounded(&mut world);
            world
                .get_mut::<GrappleIntent>(e)
                .unwrap()
                .set_jump_pressed(true);

            apply_locomotion::<TestBackend>(&mut world);
            world.run_system_once(latch_intents).unwrap();
            apply_locomotion::<TestBackend>(&mut world);

            assert_eq!(body(&world, e).impulses, vec![Vec2::Y]);
        }

        #[test]
        fn recovers_upright_when_grounded_and_resting() {
            let mut world = test_world();
            let e = grounded(&mut world);
            world.get_mut::<MotionGate>(e).unwrap().rotation_locked = false;
            {
                let mut b = world.get_mut::<TestBody>(e).unwrap();
                b.rotation = 0.7;
                b.angular_velocity = 0.3;
                b.rotation_locked = false;
            }

            recover_upright::<TestBackend>(&mut world);

            let b = body(&world, e);
            assert_eq!(b.rotation, 0.0);
            assert_eq!(b.angular_velocity, 0.0);
            assert!(b.rotation_locked);
            assert!(gate(&world, e).rotation_locked);
        }

        #[test]
        fn no_upright_recovery_while_moving() {
            let mut world = test_world();
            let e = grounded(&mut world);
            world.get_mut::<MotionGate>(e).unwrap().rotation_locked = false;
            {
                let mut b = world.get_mut::<TestBody>(e).unwrap();
                b.rotation = 0.7;
                b.velocity = Vec2::new(5.0, 0.0);
            }

            recover_upright::<TestBackend>(&mut world);

            assert_eq!(body(&world, e).rotation, 0.7);
            assert!(!gate(&world, e).rotation_locked);
        }
    }

    mod feedback {
        use super::*;

        #[test]
        fn preview_tracks_aim() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            world
                .get_mut::<GrappleIntent>(e)
                .unwrap()
                .set_aim_point(Vec2::new(0.0, 8.0));

            update_hook_previews::<TestBackend>(&mut world);

            let preview = *world.get::<HookPreview>(e).unwrap();
            assert_eq!(preview.point, Some(Vec2::new(0.0, 5.0)));
            assert!(preview.ready);
            assert!(preview.would_attach());

            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));
            update_hook_previews::<TestBackend>(&mut world);
            assert!(!world.get::<HookPreview>(e).unwrap().ready);
        }

        #[test]
        fn markers_follow_state() {
            let mut world = test_world();
            ceiling(&mut world, 5.0);
            let e = spawn_grappler(&mut world, Vec2::ZERO, config());
            fire_hook::<TestBackend>(&mut world, e, Vec2::new(0.0, 8.0));
            world.get_mut::<MotionGate>(e).unwrap().grounded = true;

            world.run_system_once(sync_state_markers).unwrap();
            assert!(world.get::<Swinging>(e).is_some());
            assert!(world.get::<Zipping>(e).is_none());
            assert!(world.get::<Grounded>(e).is_some());

            release_hook::<TestBackend>(&mut world, e, ReleaseReason::Manual);
            world.get_mut::<MotionGate>(e).unwrap().grounded = false;
            world.run_system_once(sync_state_markers).unwrap();
            assert!(world.get::<Swinging>(e).is_none());
            assert!(world.get::<Grounded>(e).is_none());
        }
    }
}
