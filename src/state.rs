//! State marker components and the body motion gate.
//!
//! [`MotionGate`] is the explicit shared surface between the hook and the
//! body's locomotion: the hook writes the lock flags, locomotion honours them,
//! and ground detection writes `grounded`, which the hook reads for charge
//! refills.
//!
//! The marker components mirror [`GrappleHook`](crate::hook::GrappleHook) and
//! [`MotionGate`] state so other systems can filter on them. They are synced
//! automatically at the end of each logic tick.

use bevy::prelude::*;

use crate::collision::LayerMask;

/// Locomotion locks and ground contact for a controlled body.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct MotionGate {
    /// Whether run input may move the body.
    pub can_move: bool,
    /// Whether jump input may make the body jump.
    pub can_jump: bool,
    /// Whether the body is standing on ground.
    pub grounded: bool,
    /// Whether body rotation is currently locked upright.
    pub rotation_locked: bool,
}

impl Default for MotionGate {
    fn default() -> Self {
        Self {
            can_move: true,
            can_jump: true,
            grounded: false,
            rotation_locked: true,
        }
    }
}

impl MotionGate {
    /// Disable run input.
    pub fn lock_movement(&mut self) {
        self.can_move = false;
    }

    /// Enable run input.
    pub fn unlock_movement(&mut self) {
        self.can_move = true;
    }

    /// Disable jumping.
    pub fn lock_jump(&mut self) {
        self.can_jump = false;
    }

    /// Enable jumping.
    pub fn unlock_jump(&mut self) {
        self.can_jump = true;
    }

    /// Disable both run and jump.
    pub fn lock_all(&mut self) {
        self.lock_movement();
        self.lock_jump();
    }

    /// Enable both run and jump.
    pub fn unlock_all(&mut self) {
        self.unlock_movement();
        self.unlock_jump();
    }
}

/// Downward ray that feeds [`MotionGate::grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct GroundSensor {
    /// Ray length from the body center. Should slightly exceed the distance
    /// from the center to the bottom of the collider.
    pub distance: f32,
    /// Colliders that count as ground.
    pub mask: LayerMask,
}

impl Default for GroundSensor {
    fn default() -> Self {
        Self {
            distance: 0.6,
            mask: LayerMask::ALL,
        }
    }
}

impl GroundSensor {
    /// Create a sensor with the given ray length and ground mask.
    pub fn new(distance: f32, mask: LayerMask) -> Self {
        Self { distance, mask }
    }
}

/// Marker component indicating the body is grounded.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the body is swinging on a rope.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Swinging;

/// Marker component indicating the body is zipping toward an anchor.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Zipping;
