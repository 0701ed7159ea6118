//! Input intent component.
//!
//! Intents are a same-frame snapshot of what the owner wants to do. Your code
//! (or an AI) writes them from whatever input source it has; the hook and
//! locomotion systems read them. Button states are plain booleans: the crate
//! does its own edge detection and latches the previous state at the end of
//! each logic tick.

use bevy::prelude::*;

/// Grapple and locomotion intent for one controlled body.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_grapple_hook::prelude::*;
///
/// let mut intent = GrappleIntent::default();
/// intent.set_aim_point(Vec2::new(4.0, 6.0));
/// intent.set_hook_pressed(true);
/// assert!(intent.fire_requested());
///
/// intent.latch();
/// assert!(!intent.fire_requested());
///
/// intent.set_hook_pressed(false);
/// assert!(intent.release_requested());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct GrappleIntent {
    /// World-space point the hook is aimed at.
    pub aim_point: Vec2,
    /// Horizontal axis (-1.0 = left, 1.0 = right). Drives running and swinging.
    pub horizontal: f32,
    /// Whether the pull (reel-in) input is held.
    pub pull: bool,
    /// Whether the hook button is held.
    pub hook_pressed: bool,
    /// Whether the jump button is held.
    pub jump_pressed: bool,
    pub(crate) hook_pressed_prev: bool,
    pub(crate) jump_pressed_prev: bool,
}

impl GrappleIntent {
    /// Create an empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the world-space aim point.
    pub fn set_aim_point(&mut self, point: Vec2) {
        self.aim_point = point;
    }

    /// Set the horizontal axis, clamped to `[-1, 1]`.
    pub fn set_horizontal(&mut self, direction: f32) {
        self.horizontal = direction.clamp(-1.0, 1.0);
    }

    /// Set whether pull is held.
    pub fn set_pull(&mut self, held: bool) {
        self.pull = held;
    }

    /// Set whether the hook button is held.
    ///
    /// Pressing fires the hook at [`aim_point`](Self::aim_point); letting go
    /// releases it.
    pub fn set_hook_pressed(&mut self, pressed: bool) {
        self.hook_pressed = pressed;
    }

    /// Set whether the jump button is held.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Hook button went down this tick.
    #[inline]
    pub fn fire_requested(&self) -> bool {
        self.hook_pressed && !self.hook_pressed_prev
    }

    /// Hook button went up this tick.
    #[inline]
    pub fn release_requested(&self) -> bool {
        !self.hook_pressed && self.hook_pressed_prev
    }

    /// Jump button went down this tick.
    #[inline]
    pub fn jump_requested(&self) -> bool {
        self.jump_pressed && !self.jump_pressed_prev
    }

    /// Check if there is active horizontal input.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.horizontal.abs() > 0.001
    }

    /// Remember the current button states for next tick's edge detection.
    pub fn latch(&mut self) {
        self.hook_pressed_prev = self.hook_pressed;
        self.jump_pressed_prev = self.jump_pressed;
    }

    /// Clear axes and buttons.
    pub fn clear(&mut self) {
        self.horizontal = 0.0;
        self.pull = false;
        self.hook_pressed = false;
        self.jump_pressed = false;
    }
}
