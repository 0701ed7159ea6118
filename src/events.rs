//! Feedback events.
//!
//! Fire-and-forget notifications for audio, particles, rope rendering and the
//! like. The hook never reads them back, so no state transition depends on
//! whether anything listens.

use bevy::prelude::*;

use crate::hook::{HookState, ReleaseReason};

/// The hook attached to a surface.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct HookImpact {
    /// The hooking body.
    pub entity: Entity,
    /// Attachment point.
    pub anchor: Vec2,
    /// Whether the body is now swinging or zipping.
    pub state: HookState,
}

/// The hook found nothing to attach to within range.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookMiss {
    /// The hooking body.
    pub entity: Entity,
}

/// A blocker sits between the fire point and the hookable surface.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookBlocked {
    /// The hooking body.
    pub entity: Entity,
}

/// The hook let go.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookReleased {
    /// The released body.
    pub entity: Entity,
    /// What triggered the release.
    pub reason: ReleaseReason,
}
