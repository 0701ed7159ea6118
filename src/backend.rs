//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement to
//! drive the grapple hook. The hook logic only talks to the engine through
//! these functions, which keeps the state machine engine-agnostic and lets
//! tests run it against a deterministic stand-in.

use bevy::prelude::*;

use crate::collision::{CollisionData, LayerMask};
use crate::rope::RopeConstraint;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the grapple hook.
/// See the `rapier` module's `Rapier2dBackend` for the Rapier2D
/// implementation.
///
/// Continuous swing forces are not pushed through this trait: the hook stores
/// the force for the current tick on
/// [`GrappleHook`](crate::hook::GrappleHook), and the backend's plugin commits
/// it to the engine once all logic for the tick has run.
pub trait GrapplePhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Cast a ray and return the closest hit.
    ///
    /// # Arguments
    /// * `world` - The ECS world
    /// * `origin` - Ray origin in world space
    /// * `direction` - Ray direction (normalized)
    /// * `max_distance` - Maximum cast distance
    /// * `exclude_entity` - Body whose colliders are ignored (usually the caster)
    /// * `mask` - Only colliders in these layers can be hit
    fn raycast(
        world: &mut World,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude_entity: Entity,
        mask: LayerMask,
    ) -> Option<CollisionData>;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply a linear impulse (instantaneous change in momentum).
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2);

    /// Apply an angular impulse. Positive values turn counter-clockwise.
    fn apply_torque_impulse(world: &mut World, entity: Entity, torque_impulse: f32);

    /// Get the current angular velocity of an entity.
    fn get_angular_velocity(world: &World, entity: Entity) -> f32;

    /// Set the angular velocity of an entity.
    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: f32);

    /// Get the current rotation angle of an entity (in radians).
    fn get_rotation(world: &World, entity: Entity) -> f32;

    /// Set the rotation angle of an entity (in radians).
    fn set_rotation(world: &mut World, entity: Entity, rotation: f32);

    /// Lock or unlock rotation of an entity.
    fn set_rotation_locked(world: &mut World, entity: Entity, locked: bool);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Create the engine-side rope joint between `entity` and the rope anchor.
    ///
    /// Any rope previously created for `entity` must be destroyed first.
    fn create_rope(world: &mut World, entity: Entity, rope: &RopeConstraint);

    /// Update the rest length of the rope attached to `entity`.
    fn set_rope_length(world: &mut World, entity: Entity, rope: &RopeConstraint);

    /// Destroy the rope attached to `entity`, if any.
    fn destroy_rope(world: &mut World, entity: Entity);
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
