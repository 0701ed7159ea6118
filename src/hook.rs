//! Hook state machine data.
//!
//! [`GrappleHook`] is the per-body component that owns the hook lifecycle:
//! state, charges, anchor, rope and swing momentum. Its mutators are
//! crate-private so the invariants hold no matter how the component is
//! accessed from outside:
//!
//! - anchor, rope and momentum only exist while hooked, and are cleared
//!   together on release;
//! - a rope exists only while swinging;
//! - charges stay within `[0, max]`.
//!
//! The transition functions that talk to the physics backend live in
//! [`crate::systems`]; everything here is pure.

use bevy::prelude::*;

use crate::config::GrappleConfig;
use crate::momentum::{SwingForce, SwingMomentum, SwingParams};
use crate::rope::RopeConstraint;

/// Momentum above which a release launches the body along the swing.
pub const RELEASE_MOMENTUM_THRESHOLD: f32 = 0.5;

/// Lifecycle state of the hook.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HookState {
    /// Not attached.
    #[default]
    Idle,
    /// Attached above the body, swinging on a rope.
    Swinging,
    /// Attached below the body, pulled straight toward the anchor.
    Zipping,
}

impl HookState {
    /// Pick the hook mode for an anchor relative to the body.
    ///
    /// Anchors strictly below the body zip; everything else swings.
    pub fn for_target(anchor: Vec2, body_position: Vec2) -> Self {
        if anchor.y < body_position.y {
            HookState::Zipping
        } else {
            HookState::Swinging
        }
    }
}

/// Side of the body the anchor was on when the hook attached.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HookSide {
    /// Directly above/below, or not hooked.
    #[default]
    None,
    /// Anchor left of the body.
    Left,
    /// Anchor right of the body.
    Right,
}

impl HookSide {
    /// Classify the anchor's horizontal side.
    pub fn from_positions(anchor: Vec2, body_position: Vec2) -> Self {
        if anchor.x < body_position.x {
            HookSide::Left
        } else if anchor.x > body_position.x {
            HookSide::Right
        } else {
            HookSide::None
        }
    }

    /// Unit vector pointing toward this side.
    pub fn direction(self) -> Vec2 {
        match self {
            HookSide::None => Vec2::ZERO,
            HookSide::Left => Vec2::NEG_X,
            HookSide::Right => Vec2::X,
        }
    }
}

/// Why a hook was released.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseReason {
    /// The owner let go of the hook button or called release directly.
    Manual,
    /// The body swung above its anchor.
    AnchorPassed,
    /// The body came to rest while swinging.
    AtRest,
    /// A zip reached its anchor.
    Arrived,
}

/// Bounded hook charge counter.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charges {
    current: u32,
    max: u32,
}

impl Default for Charges {
    fn default() -> Self {
        Self::new(GrappleConfig::default().max_charge)
    }
}

impl Charges {
    /// Full counter with the given capacity (at least 1).
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    /// Remaining charges.
    #[inline]
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Capacity.
    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// True when no charge is left.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// True when at capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Remaining charges relative to capacity, in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.max as f32
    }

    /// Spend one charge. Returns `false` (and spends nothing) when empty.
    pub(crate) fn try_consume(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Restore to capacity. Returns `true` if anything changed.
    pub(crate) fn refill(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.current = self.max;
        true
    }

    /// Change capacity, keeping the current count within it.
    pub(crate) fn set_max(&mut self, max: u32) {
        self.max = max.max(1);
        self.current = self.current.min(self.max);
    }
}

/// Angular correction applied at release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorqueKick {
    /// Angular velocity to set before the impulse.
    pub angular_velocity: f32,
    /// Torque impulse to apply.
    pub torque_impulse: f32,
}

impl TorqueKick {
    /// Compute the stabilizing kick for a release.
    ///
    /// A body hooked on the left is turned clockwise, one hooked on the right
    /// counter-clockwise. Spin in the opposite direction is reversed first, so
    /// the kick always turns toward upright whatever spin built up while
    /// hooked. No kick without a recorded side.
    pub fn for_release(
        side: HookSide,
        angular_velocity: f32,
        rotation_force: f32,
    ) -> Option<Self> {
        match side {
            HookSide::None => None,
            HookSide::Left => Some(Self {
                angular_velocity: if angular_velocity > 0.0 {
                    -angular_velocity
                } else {
                    angular_velocity
                },
                torque_impulse: -rotation_force,
            }),
            HookSide::Right => Some(Self {
                angular_velocity: if angular_velocity < 0.0 {
                    -angular_velocity
                } else {
                    angular_velocity
                },
                torque_impulse: rotation_force,
            }),
        }
    }
}

/// The pair of impulses that kick-starts a swing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingKick {
    /// Downward impulse.
    pub down: Vec2,
    /// Impulse toward the anchor's side (zero when directly above).
    pub sideways: Vec2,
}

impl SwingKick {
    /// Kick for a swing anchored on `side`.
    pub fn new(side: HookSide, hook_speed: f32) -> Self {
        Self {
            down: Vec2::NEG_Y * hook_speed,
            sideways: side.direction() * hook_speed,
        }
    }
}

/// Grapple hook state for one controlled body.
#[derive(Component, Reflect, Debug, Clone, PartialEq, Default)]
#[reflect(Component)]
pub struct GrappleHook {
    state: HookState,
    charges: Charges,
    anchor: Option<Vec2>,
    rope: Option<RopeConstraint>,
    momentum: SwingMomentum,
    side: HookSide,
    zip_arrived: bool,
    hooked_time: f32,
    swing_force: Vec2,
}

impl GrappleHook {
    /// Create an idle hook with full charges.
    pub fn new(max_charge: u32) -> Self {
        Self {
            charges: Charges::new(max_charge),
            ..default()
        }
    }

    /// Create an idle hook with the charge budget of `config`.
    pub fn from_config(config: &GrappleConfig) -> Self {
        Self::new(config.max_charge)
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> HookState {
        self.state
    }

    /// True while swinging or zipping.
    #[inline]
    pub fn is_hooked(&self) -> bool {
        self.state != HookState::Idle
    }

    /// True while swinging.
    #[inline]
    pub fn is_swinging(&self) -> bool {
        self.state == HookState::Swinging
    }

    /// True while zipping, including after arrival without auto-release.
    #[inline]
    pub fn is_zipping(&self) -> bool {
        self.state == HookState::Zipping
    }

    /// True once a zip reached its anchor and the body was left in place.
    #[inline]
    pub fn zip_arrived(&self) -> bool {
        self.zip_arrived
    }

    /// Charge counter.
    #[inline]
    pub fn charges(&self) -> &Charges {
        &self.charges
    }

    /// Anchor point while hooked.
    #[inline]
    pub fn anchor(&self) -> Option<Vec2> {
        self.anchor
    }

    /// Rope while swinging.
    #[inline]
    pub fn rope(&self) -> Option<&RopeConstraint> {
        self.rope.as_ref()
    }

    /// Swing momentum (zero when idle).
    #[inline]
    pub fn momentum(&self) -> &SwingMomentum {
        &self.momentum
    }

    /// Side recorded at attach time.
    #[inline]
    pub fn side(&self) -> HookSide {
        self.side
    }

    /// Seconds since the hook attached.
    #[inline]
    pub fn hooked_time(&self) -> f32 {
        self.hooked_time
    }

    /// Lateral swing force computed this tick.
    #[inline]
    pub fn swing_force(&self) -> Vec2 {
        self.swing_force
    }

    /// Normalized swing momentum for feedback such as rope tinting.
    pub fn swing_intensity(&self, config: &GrappleConfig) -> f32 {
        self.momentum.normalized(config.max_swing_speed)
    }

    /// Linear impulse a release would apply right now.
    ///
    /// A swing with momentum launches the body along the last swing direction
    /// with a proportional upward boost; a swing without momentum gets a flat
    /// hop. Zips and idle hooks get nothing.
    pub fn release_impulse(&self, config: &GrappleConfig) -> Vec2 {
        match self.state {
            HookState::Idle | HookState::Zipping => Vec2::ZERO,
            HookState::Swinging => {
                let magnitude = self.momentum.magnitude();
                if magnitude > RELEASE_MOMENTUM_THRESHOLD {
                    let launch =
                        self.momentum.direction() * magnitude * config.swing_momentum_multiplier;
                    let boost = Vec2::Y
                        * config.hook_jump_force
                        * self.momentum.normalized(config.max_swing_speed);
                    launch + boost
                } else {
                    Vec2::Y * config.hook_jump_force
                }
            }
        }
    }

    pub(crate) fn charges_mut(&mut self) -> &mut Charges {
        &mut self.charges
    }

    /// Enter the swinging state.
    pub(crate) fn attach_swing(&mut self, rope: RopeConstraint, side: HookSide) {
        self.state = HookState::Swinging;
        self.anchor = Some(rope.anchor());
        self.rope = Some(rope);
        self.side = side;
        self.momentum.reset();
        self.zip_arrived = false;
        self.hooked_time = 0.0;
        self.swing_force = Vec2::ZERO;
    }

    /// Enter the zipping state.
    pub(crate) fn attach_zip(&mut self, anchor: Vec2) {
        self.state = HookState::Zipping;
        self.anchor = Some(anchor);
        self.rope = None;
        self.side = HookSide::None;
        self.momentum.reset();
        self.zip_arrived = false;
        self.hooked_time = 0.0;
        self.swing_force = Vec2::ZERO;
    }

    /// Return to idle, clearing anchor, rope, momentum, side and force
    /// together. Returns the rope that was attached, if any.
    pub(crate) fn detach(&mut self) -> Option<RopeConstraint> {
        self.state = HookState::Idle;
        self.anchor = None;
        self.momentum.reset();
        self.side = HookSide::None;
        self.zip_arrived = false;
        self.hooked_time = 0.0;
        self.swing_force = Vec2::ZERO;
        self.rope.take()
    }

    /// Stop the zip velocity law and leave the body hanging in place.
    pub(crate) fn mark_zip_arrived(&mut self) {
        if self.state == HookState::Zipping {
            self.zip_arrived = true;
        }
    }

    pub(crate) fn advance_hooked_time(&mut self, dt: f32) {
        if self.is_hooked() {
            self.hooked_time += dt.max(0.0);
        }
    }

    /// Advance swing momentum and store the resulting lateral force.
    ///
    /// Does nothing unless swinging.
    pub(crate) fn tick_swing(
        &mut self,
        body_position: Vec2,
        lateral_input: f32,
        dt: f32,
        config: &GrappleConfig,
    ) -> SwingForce {
        let (HookState::Swinging, Some(anchor)) = (self.state, self.anchor) else {
            return SwingForce::ZERO;
        };
        let params = SwingParams {
            acceleration: config.swing_acceleration,
            damping: config.swing_damping,
            max_speed: config.max_swing_speed,
            force_gain: config.swing_force,
        };
        let force = self
            .momentum
            .tick(body_position - anchor, lateral_input, dt, &params);
        self.swing_force = force.vector();
        force
    }

    /// Shorten the rope while swinging. Returns the rope if its length changed.
    pub(crate) fn pull_rope(&mut self, speed: f32, dt: f32) -> Option<RopeConstraint> {
        if self.state != HookState::Swinging {
            return None;
        }
        let rope = self.rope.as_mut()?;
        rope.pull(speed, dt).then_some(*rope)
    }

    #[cfg(test)]
    pub(crate) fn set_momentum(&mut self, momentum: SwingMomentum) {
        self.momentum = momentum;
    }
}
