//! Swing momentum model.
//!
//! Sustained horizontal input while swinging builds up a scalar momentum that
//! pushes the body sideways along the rope tangent. Without input the momentum
//! decays. The last swing direction is kept so a release can launch the body
//! along it.

use bevy::prelude::*;

/// Lateral input below this magnitude counts as no input.
pub const INPUT_DEADZONE: f32 = 0.1;

/// Momentum at or below this value produces no force.
pub const FORCE_THRESHOLD: f32 = 0.1;

/// Tuning for a single [`SwingMomentum::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingParams {
    /// Momentum gained per second at full input.
    pub acceleration: f32,
    /// Momentum lost per second without input.
    pub damping: f32,
    /// Upper bound of the momentum.
    pub max_speed: f32,
    /// Force per unit of momentum.
    pub force_gain: f32,
}

/// Force produced by one momentum tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwingForce {
    /// Unit direction of the force (zero when no force).
    pub direction: Vec2,
    /// Force magnitude.
    pub magnitude: f32,
}

impl SwingForce {
    /// No force.
    pub const ZERO: Self = Self {
        direction: Vec2::ZERO,
        magnitude: 0.0,
    };

    /// The force as a vector.
    #[inline]
    pub fn vector(&self) -> Vec2 {
        self.direction * self.magnitude
    }

    /// Whether the force is non-zero.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.magnitude > 0.0 && self.direction != Vec2::ZERO
    }
}

/// Accumulated swing momentum and its last lateral direction.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct SwingMomentum {
    magnitude: f32,
    direction: Vec2,
}

impl SwingMomentum {
    #[cfg(test)]
    pub(crate) fn from_parts(magnitude: f32, direction: Vec2) -> Self {
        Self {
            magnitude,
            direction,
        }
    }

    /// Current momentum.
    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    /// Last swing direction (unit, or zero if no input was ever given).
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Momentum relative to `max_speed`, in `[0, 1]`.
    ///
    /// Meant for external feedback such as tinting the rope.
    pub fn normalized(&self, max_speed: f32) -> f32 {
        if max_speed <= 0.0 {
            return 0.0;
        }
        (self.magnitude / max_speed).clamp(0.0, 1.0)
    }

    /// Clear momentum and direction.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Swing direction for the given rope geometry and input sign.
    ///
    /// This is the anchor-to-body vector rotated by 90° counter-clockwise,
    /// normalized, and flipped for negative input.
    pub fn swing_direction(anchor_to_body: Vec2, lateral_input: f32) -> Vec2 {
        let perpendicular = Vec2::new(-anchor_to_body.y, anchor_to_body.x).normalize_or_zero();
        perpendicular * lateral_input.signum()
    }

    /// Advance the momentum by `dt` and return the lateral force to apply.
    pub fn tick(
        &mut self,
        anchor_to_body: Vec2,
        lateral_input: f32,
        dt: f32,
        params: &SwingParams,
    ) -> SwingForce {
        let dt = dt.max(0.0);
        let input = lateral_input.clamp(-1.0, 1.0);
        let max_speed = params.max_speed.max(0.0);

        if input.abs() > INPUT_DEADZONE {
            self.magnitude = (self.magnitude + params.acceleration * input.abs() * dt)
                .clamp(0.0, max_speed);
            let direction = Self::swing_direction(anchor_to_body, input);
            if direction != Vec2::ZERO {
                self.direction = direction;
            }
        } else {
            self.magnitude = (self.magnitude - params.damping * dt).max(0.0);
        }

        if self.magnitude > FORCE_THRESHOLD {
            SwingForce {
                direction: self.direction,
                magnitude: self.magnitude * params.force_gain,
            }
        } else {
            SwingForce::ZERO
        }
    }
}
