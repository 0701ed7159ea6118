//! Rope constraint model.
//!
//! The rope is a variable-length spring anchored at a world point. This type
//! only tracks the parameters; the physics backend turns them into an engine
//! joint (see [`GrapplePhysicsBackend::create_rope`]).
//!
//! [`GrapplePhysicsBackend::create_rope`]: crate::backend::GrapplePhysicsBackend::create_rope

use bevy::prelude::*;

/// A spring tether between the controlled body and a fixed anchor.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct RopeConstraint {
    anchor: Vec2,
    length: f32,
    length_floor: f32,
    stiffness: f32,
    damping: f32,
}

impl RopeConstraint {
    /// Create a rope with the given rest length.
    ///
    /// A negative `length_floor` is treated as zero, and a length below the
    /// floor is raised to it.
    pub fn new(anchor: Vec2, length: f32, length_floor: f32, stiffness: f32, damping: f32) -> Self {
        let length_floor = length_floor.max(0.0);
        Self {
            anchor,
            length: length.max(length_floor),
            length_floor,
            stiffness,
            damping,
        }
    }

    /// World-space anchor point.
    #[inline]
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Current rest length.
    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Shortest length the rope can be pulled to.
    #[inline]
    pub fn length_floor(&self) -> f32 {
        self.length_floor
    }

    /// Spring stiffness, passed to the engine unchanged.
    #[inline]
    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    /// Spring damping, passed to the engine unchanged.
    #[inline]
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Set the rest length, clamped to the floor.
    ///
    /// Returns `true` if the length changed.
    pub fn set_length(&mut self, length: f32) -> bool {
        let clamped = length.max(self.length_floor);
        if clamped == self.length {
            return false;
        }
        self.length = clamped;
        true
    }

    /// Shorten the rope by `speed * dt`, stopping at the floor.
    ///
    /// Non-positive `dt` or `speed` leave the rope untouched. Returns `true`
    /// if the length changed.
    pub fn pull(&mut self, speed: f32, dt: f32) -> bool {
        if speed <= 0.0 || dt <= 0.0 {
            return false;
        }
        self.set_length(self.length - speed * dt)
    }

    /// Whether the rope has been pulled all the way to its floor.
    pub fn at_floor(&self) -> bool {
        self.length <= self.length_floor
    }
}
