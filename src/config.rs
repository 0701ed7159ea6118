//! Grapple and locomotion configuration components.
//!
//! [`GrappleConfig`] holds every tuning parameter of the hook: target
//! acquisition, rope spring, swing momentum, zip and release behaviour, and
//! the charge budget. [`LocomotionConfig`] tunes the minimal run/jump
//! locomotion that the hook locks and unlocks.
//!
//! Both can be built in code with the `with_*` builders or loaded from TOML,
//! where missing keys fall back to the defaults below.

use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::collision::LayerMask;
use crate::error::{require_non_negative, require_positive, ConfigError, ConfigResult};

/// Configuration parameters for the grapple hook.
///
/// Defaults are in world units (meters) and match a character roughly one
/// unit tall.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct GrappleConfig {
    // === Target Acquisition ===
    /// Maximum distance the hook can travel.
    pub max_hook_distance: f32,
    /// Offset of the fire point from the body center.
    #[serde(skip)]
    pub fire_point_offset: Vec2,
    /// Colliders the hook can attach to.
    pub hookable_mask: LayerMask,
    /// Colliders that block the hook line.
    pub blocker_mask: LayerMask,

    // === Swing Kick-off ===
    /// Impulse applied downward and toward the anchor when a swing starts.
    pub hook_speed: f32,

    // === Rope ===
    /// Rope shortening speed while pull is held (units/second).
    pub pull_speed: f32,
    /// Shortest rope length reachable by pulling.
    pub min_rope_length: f32,
    /// Spring stiffness handed to the physics engine.
    pub rope_stiffness: f32,
    /// Spring damping handed to the physics engine.
    pub rope_damping: f32,

    // === Swing Momentum ===
    /// Gain converting accumulated momentum into lateral force.
    pub swing_force: f32,
    /// Momentum decay per second without lateral input.
    pub swing_damping: f32,
    /// Momentum gained per second at full lateral input.
    pub swing_acceleration: f32,
    /// Upper bound of accumulated momentum.
    pub max_swing_speed: f32,
    /// Multiplier applied to momentum when converting it to a release impulse.
    pub swing_momentum_multiplier: f32,

    // === Release ===
    /// Upward impulse applied on release.
    pub hook_jump_force: f32,
    /// Torque impulse applied on release to turn the body upright.
    pub hook_rotation_force: f32,

    // === Zip ===
    /// Speed toward an anchor below the body.
    pub zip_speed: f32,
    /// Distance from the anchor at which a zip is considered arrived.
    pub zip_stop_distance: f32,
    /// Release automatically on zip arrival.
    pub auto_release: bool,

    // === Rest Release ===
    /// Swing releases when both velocity components fall below this speed.
    pub rest_release_speed: f32,
    /// Time after attaching during which the rest rule is not checked.
    pub rest_release_delay: f32,

    // === Charges ===
    /// Number of hook fires available between ground contacts.
    pub max_charge: u32,
}

impl Default for GrappleConfig {
    fn default() -> Self {
        Self {
            // Target acquisition
            max_hook_distance: 10.0,
            fire_point_offset: Vec2::ZERO,
            hookable_mask: LayerMask::ALL,
            blocker_mask: LayerMask::NONE,

            // Swing kick-off
            hook_speed: 15.0,

            // Rope
            pull_speed: 5.0,
            min_rope_length: 1.0,
            rope_stiffness: 90.0,
            rope_damping: 2.0,

            // Swing momentum
            swing_force: 1.5,
            swing_damping: 0.5,
            swing_acceleration: 0.5,
            max_swing_speed: 15.0,
            swing_momentum_multiplier: 2.5,

            // Release
            hook_jump_force: 1.0,
            hook_rotation_force: 1.0,

            // Zip
            zip_speed: 20.0,
            zip_stop_distance: 0.5,
            auto_release: true,

            // Rest release
            rest_release_speed: 2.0,
            rest_release_delay: 0.1,

            // Charges
            max_charge: 2,
        }
    }
}

impl GrappleConfig {
    /// Create a config tuned for fast, arcade-style swinging.
    pub fn arcade() -> Self {
        Self {
            swing_acceleration: 4.0,
            swing_force: 3.0,
            pull_speed: 8.0,
            hook_jump_force: 3.0,
            ..default()
        }
    }

    /// Parse a config from TOML text and validate it.
    ///
    /// Missing keys keep their default values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every range constraint.
    pub fn validate(&self) -> ConfigResult<()> {
        require_positive("max_hook_distance", self.max_hook_distance)?;
        require_positive("pull_speed", self.pull_speed)?;
        require_non_negative("min_rope_length", self.min_rope_length)?;
        require_positive("max_swing_speed", self.max_swing_speed)?;
        require_non_negative("swing_damping", self.swing_damping)?;
        require_non_negative("swing_acceleration", self.swing_acceleration)?;
        require_non_negative("zip_stop_distance", self.zip_stop_distance)?;
        require_non_negative("rest_release_speed", self.rest_release_speed)?;
        require_non_negative("rest_release_delay", self.rest_release_delay)?;
        if self.max_charge < 1 {
            return Err(ConfigError::OutOfRange {
                name: "max_charge",
                value: self.max_charge as f32,
                expected: "[1, ∞)",
            });
        }
        Ok(())
    }

    /// Return a copy with every out-of-range value clamped into range.
    ///
    /// Values that must be strictly positive fall back to their default when
    /// not positive. Systems always read configs through this.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let positive_or = |value: f32, fallback: f32| {
            if value > 0.0 && value.is_finite() {
                value
            } else {
                fallback
            }
        };
        let non_negative = |value: f32| if value.is_finite() { value.max(0.0) } else { 0.0 };

        Self {
            max_hook_distance: positive_or(self.max_hook_distance, defaults.max_hook_distance),
            pull_speed: positive_or(self.pull_speed, defaults.pull_speed),
            min_rope_length: non_negative(self.min_rope_length),
            max_swing_speed: positive_or(self.max_swing_speed, defaults.max_swing_speed),
            swing_damping: non_negative(self.swing_damping),
            swing_acceleration: non_negative(self.swing_acceleration),
            zip_stop_distance: non_negative(self.zip_stop_distance),
            rest_release_speed: non_negative(self.rest_release_speed),
            rest_release_delay: non_negative(self.rest_release_delay),
            max_charge: self.max_charge.max(1),
            ..*self
        }
    }

    /// Builder: set hook range.
    pub fn with_max_hook_distance(mut self, distance: f32) -> Self {
        self.max_hook_distance = distance;
        self
    }

    /// Builder: set fire point offset from the body center.
    pub fn with_fire_point_offset(mut self, offset: Vec2) -> Self {
        self.fire_point_offset = offset;
        self
    }

    /// Builder: set hookable and blocker masks.
    pub fn with_masks(mut self, hookable: LayerMask, blocker: LayerMask) -> Self {
        self.hookable_mask = hookable;
        self.blocker_mask = blocker;
        self
    }

    /// Builder: set rope pull speed and minimum length.
    pub fn with_pull(mut self, pull_speed: f32, min_rope_length: f32) -> Self {
        self.pull_speed = pull_speed;
        self.min_rope_length = min_rope_length;
        self
    }

    /// Builder: set rope spring parameters.
    pub fn with_rope_spring(mut self, stiffness: f32, damping: f32) -> Self {
        self.rope_stiffness = stiffness;
        self.rope_damping = damping;
        self
    }

    /// Builder: set swing momentum parameters.
    pub fn with_swing(mut self, acceleration: f32, damping: f32, max_speed: f32) -> Self {
        self.swing_acceleration = acceleration;
        self.swing_damping = damping;
        self.max_swing_speed = max_speed;
        self
    }

    /// Builder: set release impulse parameters.
    pub fn with_release(
        mut self,
        momentum_multiplier: f32,
        jump_force: f32,
        rotation_force: f32,
    ) -> Self {
        self.swing_momentum_multiplier = momentum_multiplier;
        self.hook_jump_force = jump_force;
        self.hook_rotation_force = rotation_force;
        self
    }

    /// Builder: set zip parameters.
    pub fn with_zip(mut self, speed: f32, stop_distance: f32, auto_release: bool) -> Self {
        self.zip_speed = speed;
        self.zip_stop_distance = stop_distance;
        self.auto_release = auto_release;
        self
    }

    /// Builder: set the charge budget.
    pub fn with_max_charge(mut self, max_charge: u32) -> Self {
        self.max_charge = max_charge;
        self
    }
}

/// Configuration for the minimal locomotion driven alongside the hook.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Horizontal run speed (units/second).
    pub run_speed: f32,
    /// Upward impulse of a grounded jump.
    pub jump_impulse: f32,
    /// A grounded body whose horizontal speed is below this counts as at rest.
    pub rest_speed_x: f32,
    /// A grounded body whose vertical speed is below this counts as at rest.
    pub rest_speed_y: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            run_speed: 10.0,
            jump_impulse: 1.0,
            rest_speed_x: 2.0,
            rest_speed_y: 1.0,
        }
    }
}

impl LocomotionConfig {
    /// Builder: set run speed.
    pub fn with_run_speed(mut self, speed: f32) -> Self {
        self.run_speed = speed;
        self
    }

    /// Check whether a velocity counts as at rest.
    pub fn is_at_rest(&self, velocity: Vec2) -> bool {
        velocity.x.abs() < self.rest_speed_x && velocity.y.abs() < self.rest_speed_y
    }

    /// Builder: set jump impulse.
    pub fn with_jump_impulse(mut self, impulse: f32) -> Self {
        self.jump_impulse = impulse;
        self
    }
}
