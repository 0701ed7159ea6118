//! Hook state machine transitions and per-tick systems.
//!
//! The transition functions ([`fire_hook`], [`release_hook`], [`pull_rope`])
//! are plain functions over `&mut World` so they can be called from your own
//! systems as well as from the ones registered by
//! [`GrappleHookPlugin`](crate::GrappleHookPlugin). All of them are generic
//! over the physics backend.
//!
//! Logic systems run in `Update`, one pass per frame. The zip velocity law
//! runs in `FixedUpdate` alongside the physics step.

use bevy::prelude::*;

use crate::backend::GrapplePhysicsBackend;
use crate::config::{GrappleConfig, LocomotionConfig};
use crate::events::{HookBlocked, HookImpact, HookMiss, HookReleased};
use crate::hook::{GrappleHook, HookSide, HookState, ReleaseReason, SwingKick, TorqueKick};
use crate::intent::GrappleIntent;
use crate::resolver::{resolve_for, HookPreview};
use crate::rope::RopeConstraint;
use crate::state::{Grounded, GroundSensor, MotionGate, Swinging, Zipping};

/// What a call to [`fire_hook`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Attached above the body and started swinging.
    Swinging,
    /// Attached below the body and started zipping.
    Zipping,
    /// Nothing hookable in range.
    Miss,
    /// A blocker sits between the fire point and the target.
    Blocked,
    /// The fire was dropped before any raycast.
    Rejected(FireRejection),
}

impl FireOutcome {
    /// True if the hook attached.
    pub fn attached(self) -> bool {
        matches!(self, FireOutcome::Swinging | FireOutcome::Zipping)
    }
}

/// Why a fire was dropped without trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireRejection {
    /// The entity has no `GrappleHook` or `GrappleConfig`.
    NotAGrappler,
    /// Already swinging or zipping.
    AlreadyHooked,
    /// No charge left.
    NoCharge,
}

/// Fire the hook of `entity` toward `aim_point`.
///
/// Rejected outright while hooked or out of charges. Otherwise movement and
/// jump are locked for the duration of the target resolution; a miss or a
/// blocked target puts the locks back exactly as they were and emits
/// [`HookMiss`] or [`HookBlocked`]. On a clear hit the body's velocity is
/// zeroed, one charge is spent and the hook enters [`HookState::Zipping`] or
/// [`HookState::Swinging`] depending on whether the anchor is below the body.
pub fn fire_hook<B: GrapplePhysicsBackend>(
    world: &mut World,
    entity: Entity,
    aim_point: Vec2,
) -> FireOutcome {
    let (Some(hook), Some(config)) = (
        world.get::<GrappleHook>(entity),
        world.get::<GrappleConfig>(entity).map(GrappleConfig::sanitized),
    ) else {
        return FireOutcome::Rejected(FireRejection::NotAGrappler);
    };
    if hook.is_hooked() {
        return FireOutcome::Rejected(FireRejection::AlreadyHooked);
    }
    if hook.charges().is_empty() {
        trace!("{entity}: hook fire dropped, no charge left");
        return FireOutcome::Rejected(FireRejection::NoCharge);
    }

    // Lock before resolving so input during this tick cannot interfere.
    let saved_gate = world.get::<MotionGate>(entity).copied();
    if let Some(mut gate) = world.get_mut::<MotionGate>(entity) {
        gate.lock_all();
    }

    let (origin, resolution) = resolve_for::<B>(world, entity, &config, aim_point);

    let anchor = match (resolution.hit, resolution.blocked) {
        (None, _) => {
            restore_gate(world, entity, saved_gate);
            world.send_event(HookMiss { entity });
            debug!("{entity}: hook missed");
            return FireOutcome::Miss;
        }
        (Some(_), true) => {
            restore_gate(world, entity, saved_gate);
            world.send_event(HookBlocked { entity });
            debug!("{entity}: hook blocked");
            return FireOutcome::Blocked;
        }
        (Some(hit), false) => hit.point,
    };

    let body_position = B::get_position(world, entity);
    B::set_velocity(world, entity, Vec2::ZERO);

    let state = HookState::for_target(anchor, body_position);
    match state {
        HookState::Zipping => {
            if let Some(mut hook) = world.get_mut::<GrappleHook>(entity) {
                hook.charges_mut().try_consume();
                hook.attach_zip(anchor);
            }
        }
        HookState::Swinging | HookState::Idle => {
            let rope = RopeConstraint::new(
                anchor,
                origin.distance(anchor),
                config.min_rope_length,
                config.rope_stiffness,
                config.rope_damping,
            );
            let side = HookSide::from_positions(anchor, body_position);

            B::destroy_rope(world, entity);
            B::create_rope(world, entity, &rope);
            if let Some(mut hook) = world.get_mut::<GrappleHook>(entity) {
                hook.charges_mut().try_consume();
                hook.attach_swing(rope, side);
            }

            let kick = SwingKick::new(side, config.hook_speed);
            B::apply_impulse(world, entity, kick.down);
            if kick.sideways != Vec2::ZERO {
                B::apply_impulse(world, entity, kick.sideways);
            }
        }
    }

    // The release torque kick needs a free body.
    B::set_rotation(world, entity, 0.0);
    B::set_rotation_locked(world, entity, false);
    if let Some(mut gate) = world.get_mut::<MotionGate>(entity) {
        gate.rotation_locked = false;
    }

    world.send_event(HookImpact {
        entity,
        anchor,
        state,
    });
    debug!("{entity}: hooked at {anchor} ({state:?})");

    if state == HookState::Zipping {
        FireOutcome::Zipping
    } else {
        FireOutcome::Swinging
    }
}

fn restore_gate(world: &mut World, entity: Entity, saved: Option<MotionGate>) {
    let (Some(saved), Some(mut gate)) = (saved, world.get_mut::<MotionGate>(entity)) else {
        return;
    };
    gate.can_move = saved.can_move;
    gate.can_jump = saved.can_jump;
}

/// Release the hook of `entity`.
///
/// Applies the release impulse (momentum launch or hop for swings, nothing
/// for zips) and the stabilizing torque kick, tears down the rope, clears
/// the hook state and unlocks movement and jump. Calling it while idle does
/// nothing and returns `false`.
pub fn release_hook<B: GrapplePhysicsBackend>(
    world: &mut World,
    entity: Entity,
    reason: ReleaseReason,
) -> bool {
    let Some(hook) = world.get::<GrappleHook>(entity) else {
        return false;
    };
    if !hook.is_hooked() {
        return false;
    }
    let config = world
        .get::<GrappleConfig>(entity)
        .map(GrappleConfig::sanitized)
        .unwrap_or_default();
    let impulse = hook.release_impulse(&config);
    let side = hook.side();

    if impulse != Vec2::ZERO {
        B::apply_impulse(world, entity, impulse);
    }

    let angular_velocity = B::get_angular_velocity(world, entity);
    let kick = TorqueKick::for_release(side, angular_velocity, config.hook_rotation_force);
    if let Some(kick) = kick {
        B::set_angular_velocity(world, entity, kick.angular_velocity);
        B::apply_torque_impulse(world, entity, kick.torque_impulse);
    }

    let rope = world
        .get_mut::<GrappleHook>(entity)
        .and_then(|mut hook| hook.detach());
    if rope.is_some() {
        B::destroy_rope(world, entity);
    }

    if let Some(mut gate) = world.get_mut::<MotionGate>(entity) {
        gate.unlock_all();
    }

    world.send_event(HookReleased { entity, reason });
    debug!("{entity}: hook released ({reason:?}), impulse {impulse}");
    true
}

/// Shorten the rope of a swinging `entity` by `pull_speed * dt`, down to the
/// configured floor. Returns `true` if the length changed.
///
/// Does nothing while idle or zipping.
pub fn pull_rope<B: GrapplePhysicsBackend>(world: &mut World, entity: Entity, dt: f32) -> bool {
    let Some(pull_speed) = world
        .get::<GrappleConfig>(entity)
        .map(|c| c.sanitized().pull_speed)
    else {
        return false;
    };
    let Some(rope) = world
        .get_mut::<GrappleHook>(entity)
        .and_then(|mut hook| hook.pull_rope(pull_speed, dt))
    else {
        return false;
    };
    B::set_rope_length(world, entity, &rope);
    trace!("{entity}: rope pulled to {:.3}", rope.length());
    true
}

// ==================== Logic tick (Update) ====================

/// Cast each body's ground sensor and store the result on its gate.
pub fn update_ground_sensors<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, GroundSensor)> = world
        .query_filtered::<(Entity, &GroundSensor), With<MotionGate>>()
        .iter(world)
        .map(|(e, sensor)| (e, *sensor))
        .collect();

    for (entity, sensor) in entities {
        let origin = B::get_position(world, entity);
        let grounded = B::raycast(world, origin, Vec2::NEG_Y, sensor.distance, entity, sensor.mask)
            .is_some();
        if let Some(mut gate) = world.get_mut::<MotionGate>(entity) {
            if gate.grounded != grounded {
                trace!("{entity}: grounded = {grounded}");
                gate.grounded = grounded;
            }
        }
    }
}

/// Turn hook button edges into fire and release calls.
///
/// A press fires toward the intent's aim point (ignored while hooked); a
/// let-go releases.
pub fn handle_hook_input<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, bool, bool, Vec2)> = world
        .query::<(Entity, &GrappleIntent, &GrappleHook)>()
        .iter(world)
        .map(|(e, intent, hook)| {
            (
                e,
                intent.fire_requested() && !hook.is_hooked(),
                intent.release_requested() && hook.is_hooked(),
                intent.aim_point,
            )
        })
        .collect();

    for (entity, fire, release, aim_point) in entities {
        if fire {
            fire_hook::<B>(world, entity, aim_point);
        } else if release {
            release_hook::<B>(world, entity, ReleaseReason::Manual);
        }
    }
}

/// Advance swing momentum, reel in the rope and count hooked time.
///
/// The swing force computed here is stored on the hook and committed to the
/// physics engine by the backend at the end of the tick.
pub fn apply_swing<B: GrapplePhysicsBackend>(world: &mut World) {
    let dt = world.resource::<Time>().delta_secs();
    apply_swing_with_dt::<B>(world, dt);
}

pub(crate) fn apply_swing_with_dt<B: GrapplePhysicsBackend>(world: &mut World, dt: f32) {
    let entities: Vec<(Entity, GrappleConfig, f32, bool)> = world
        .query::<(Entity, &GrappleHook, &GrappleConfig, Option<&GrappleIntent>)>()
        .iter(world)
        .filter(|(_, hook, _, _)| hook.is_hooked())
        .map(|(e, _, config, intent)| {
            let (horizontal, pull) = intent.map(|i| (i.horizontal, i.pull)).unwrap_or_default();
            (e, config.sanitized(), horizontal, pull)
        })
        .collect();

    for (entity, config, horizontal, pull) in entities {
        let position = B::get_position(world, entity);
        if let Some(mut hook) = world.get_mut::<GrappleHook>(entity) {
            hook.advance_hooked_time(dt);
            let force = hook.tick_swing(position, horizontal, dt, &config);
            if force.is_active() {
                trace!(
                    "{entity}: swing force {:.3} along {}",
                    force.magnitude,
                    force.direction
                );
            }
        }
        if pull {
            pull_rope::<B>(world, entity, dt);
        }
    }
}

/// Minimal run and jump for gated bodies.
///
/// Grounded, horizontal input sets the horizontal speed outright. Airborne,
/// it never slows down momentum that already exceeds the run speed in the
/// input direction, so swing launches carry.
pub fn apply_locomotion<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, MotionGate, LocomotionConfig, f32, bool)> = world
        .query::<(Entity, &MotionGate, &LocomotionConfig, &GrappleIntent)>()
        .iter(world)
        .map(|(e, gate, locomotion, intent)| {
            let horizontal = if intent.is_moving() { intent.horizontal } else { 0.0 };
            (e, *gate, *locomotion, horizontal, intent.jump_requested())
        })
        .collect();

    for (entity, gate, locomotion, horizontal, jump) in entities {
        if gate.can_move && horizontal != 0.0 {
            let mut velocity = B::get_velocity(world, entity);
            let target = horizontal * locomotion.run_speed;
            velocity.x = if gate.grounded {
                target
            } else if target > 0.0 {
                velocity.x.max(target)
            } else {
                velocity.x.min(target)
            };
            B::set_velocity(world, entity, velocity);
        }

        if jump && gate.can_jump && gate.grounded {
            B::apply_impulse(world, entity, Vec2::Y * locomotion.jump_impulse);
            trace!("{entity}: jump");
        }
    }
}

/// Release swings whose body has risen above the anchor.
///
/// Runs before [`release_hooks_at_rest`]; a body that satisfies both rules in
/// the same tick is released once, as [`ReleaseReason::AnchorPassed`].
pub fn release_hooks_above_anchor<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, Vec2)> = world
        .query::<(Entity, &GrappleHook)>()
        .iter(world)
        .filter(|(_, hook)| hook.is_swinging())
        .filter_map(|(e, hook)| hook.anchor().map(|a| (e, a)))
        .collect();

    for (entity, anchor) in entities {
        if anchor.y < B::get_position(world, entity).y {
            release_hook::<B>(world, entity, ReleaseReason::AnchorPassed);
        }
    }
}

/// Release swings that have come to rest so the body is never left hanging.
///
/// Ignores the first `rest_release_delay` seconds after attaching: the body
/// is stopped on fire and the kick-start impulse has not been integrated yet.
pub fn release_hooks_at_rest<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, f32)> = world
        .query::<(Entity, &GrappleHook, &GrappleConfig)>()
        .iter(world)
        .map(|(e, hook, config)| (e, hook, config.sanitized()))
        .filter(|(_, hook, config)| {
            hook.is_swinging() && hook.hooked_time() >= config.rest_release_delay
        })
        .map(|(e, _, config)| (e, config.rest_release_speed))
        .collect();

    for (entity, rest_speed) in entities {
        let velocity = B::get_velocity(world, entity);
        if velocity.x.abs() < rest_speed && velocity.y.abs() < rest_speed {
            release_hook::<B>(world, entity, ReleaseReason::AtRest);
        }
    }
}

/// Keep charge capacity in sync with the config and refill on the ground.
pub fn refill_charges(mut q: Query<(Entity, &mut GrappleHook, &GrappleConfig, &MotionGate)>) {
    for (entity, mut hook, config, gate) in &mut q {
        let max = config.max_charge.max(1);
        if hook.charges().max() != max {
            hook.charges_mut().set_max(max);
        }
        if gate.grounded && !hook.charges().is_full() {
            hook.charges_mut().refill();
            debug!("{entity}: charges refilled to {}", hook.charges().current());
        }
    }
}

/// Stand grounded, resting, unhooked bodies back up and lock their rotation.
pub fn recover_upright<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, LocomotionConfig)> = world
        .query::<(Entity, &MotionGate, Option<&GrappleHook>, Option<&LocomotionConfig>)>()
        .iter(world)
        .filter(|(_, gate, hook, _)| {
            gate.grounded && !gate.rotation_locked && !hook.is_some_and(|h| h.is_hooked())
        })
        .map(|(e, _, _, locomotion)| (e, locomotion.copied().unwrap_or_default()))
        .collect();

    for (entity, locomotion) in entities {
        if !locomotion.is_at_rest(B::get_velocity(world, entity)) {
            continue;
        }
        B::set_rotation(world, entity, 0.0);
        B::set_angular_velocity(world, entity, 0.0);
        B::set_rotation_locked(world, entity, true);
        if let Some(mut gate) = world.get_mut::<MotionGate>(entity) {
            gate.rotation_locked = true;
        }
        debug!("{entity}: upright");
    }
}

/// Refresh [`HookPreview`] from the current aim.
pub fn update_hook_previews<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, GrappleConfig, Vec2, bool)> = world
        .query_filtered::<(Entity, &GrappleConfig, &GrappleIntent, &GrappleHook), With<HookPreview>>()
        .iter(world)
        .map(|(e, config, intent, hook)| {
            let ready = !hook.is_hooked() && !hook.charges().is_empty();
            (e, config.sanitized(), intent.aim_point, ready)
        })
        .collect();

    for (entity, config, aim_point, ready) in entities {
        let (origin, resolution) = resolve_for::<B>(world, entity, &config, aim_point);
        if let Some(mut preview) = world.get_mut::<HookPreview>(entity) {
            let next = HookPreview {
                origin,
                point: resolution.hit.map(|h| h.point),
                blocked: resolution.blocked,
                ready,
            };
            if *preview != next {
                *preview = next;
            }
        }
    }
}

/// Sync state marker components from the hook and gate.
pub fn sync_state_markers(
    mut commands: Commands,
    q: Query<(
        Entity,
        Option<&GrappleHook>,
        Option<&MotionGate>,
        Has<Swinging>,
        Has<Zipping>,
        Has<Grounded>,
    )>,
) {
    for (entity, hook, gate, has_swinging, has_zipping, has_grounded) in &q {
        let state = hook.map(|h| h.state()).unwrap_or_default();

        let swinging = state == HookState::Swinging;
        if swinging && !has_swinging {
            commands.entity(entity).insert(Swinging);
        } else if !swinging && has_swinging {
            commands.entity(entity).remove::<Swinging>();
        }

        let zipping = state == HookState::Zipping;
        if zipping && !has_zipping {
            commands.entity(entity).insert(Zipping);
        } else if !zipping && has_zipping {
            commands.entity(entity).remove::<Zipping>();
        }

        let grounded = gate.is_some_and(|g| g.grounded);
        if grounded && !has_grounded {
            commands.entity(entity).insert(Grounded);
        } else if !grounded && has_grounded {
            commands.entity(entity).remove::<Grounded>();
        }
    }
}

/// Warn once per change about configs that will be clamped.
pub fn warn_invalid_configs(q: Query<(Entity, &GrappleConfig), Changed<GrappleConfig>>) {
    for (entity, config) in &q {
        if let Err(err) = config.validate() {
            warn!("{entity}: {err}; using clamped values");
        }
    }
}

/// Remember this tick's button states for edge detection.
pub fn latch_intents(mut q: Query<&mut GrappleIntent>) {
    for mut intent in &mut q {
        if intent.hook_pressed != intent.hook_pressed_prev
            || intent.jump_pressed != intent.jump_pressed_prev
        {
            intent.latch();
        }
    }
}

// ==================== Physics tick (FixedUpdate) ====================

/// Drive zipping bodies straight at their anchor.
///
/// Within `zip_stop_distance` the hook is released when `auto_release` is
/// set; otherwise the body is left to normal physics, still hooked, until an
/// explicit release.
pub fn apply_zip_velocity<B: GrapplePhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, Vec2, GrappleConfig)> = world
        .query::<(Entity, &GrappleHook, &GrappleConfig)>()
        .iter(world)
        .filter(|(_, hook, _)| hook.is_zipping() && !hook.zip_arrived())
        .filter_map(|(e, hook, config)| hook.anchor().map(|a| (e, a, config.sanitized())))
        .collect();

    for (entity, anchor, config) in entities {
        let position = B::get_position(world, entity);
        if position.distance(anchor) <= config.zip_stop_distance {
            if config.auto_release {
                release_hook::<B>(world, entity, ReleaseReason::Arrived);
            } else if let Some(mut hook) = world.get_mut::<GrappleHook>(entity) {
                hook.mark_zip_arrived();
                debug!("{entity}: zip arrived, holding");
            }
            continue;
        }

        let velocity = (anchor - position).normalize_or_zero() * config.zip_speed;
        B::set_velocity(world, entity, velocity);
    }
}
