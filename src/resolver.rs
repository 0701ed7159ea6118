//! Hook target acquisition.
//!
//! A hook target is resolved with two raycasts: one against hookable surfaces
//! up to the hook range, then one from the same origin toward the found point
//! against blockers. The same resolution feeds both the aim preview and the
//! actual fire, so what the player sees is what the hook does.

use bevy::prelude::*;

use crate::backend::GrapplePhysicsBackend;
use crate::collision::{CollisionData, LayerMask};
use crate::config::GrappleConfig;

/// Result of resolving a hook target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetResolution {
    /// Nearest hookable hit within range.
    pub hit: Option<CollisionData>,
    /// Whether a blocker occludes `hit`. Always `false` without a hit.
    pub blocked: bool,
}

impl TargetResolution {
    /// Nothing hookable in range.
    pub const MISS: Self = Self {
        hit: None,
        blocked: false,
    };

    /// The attachment point, if the target is hookable and unobstructed.
    pub fn clear_point(&self) -> Option<Vec2> {
        if self.blocked {
            None
        } else {
            self.hit.map(|h| h.point)
        }
    }

    /// True when nothing hookable was found.
    pub fn is_miss(&self) -> bool {
        self.hit.is_none()
    }
}

/// Resolve the hook target along `direction` from `origin`.
///
/// `direction` does not need to be normalized. A zero direction or a
/// non-positive range resolves to a miss.
pub fn resolve_target<B: GrapplePhysicsBackend>(
    world: &mut World,
    caster: Entity,
    origin: Vec2,
    direction: Vec2,
    max_range: f32,
    hookable: LayerMask,
    blocker: LayerMask,
) -> TargetResolution {
    let direction = direction.normalize_or_zero();
    if direction == Vec2::ZERO || max_range <= 0.0 || hookable.is_empty() {
        return TargetResolution::MISS;
    }

    let Some(hit) = B::raycast(world, origin, direction, max_range, caster, hookable) else {
        return TargetResolution::MISS;
    };

    if blocker.is_empty() {
        return TargetResolution {
            hit: Some(hit),
            blocked: false,
        };
    }

    // The blocker cast reaches the hit point, so a surface in both masks blocks itself.
    let blocked = B::raycast(world, origin, direction, hit.distance, caster, blocker).is_some();

    TargetResolution {
        hit: Some(hit),
        blocked,
    }
}

/// Resolve the target for `entity` aiming at `aim_point` with its config.
pub(crate) fn resolve_for<B: GrapplePhysicsBackend>(
    world: &mut World,
    entity: Entity,
    config: &GrappleConfig,
    aim_point: Vec2,
) -> (Vec2, TargetResolution) {
    let origin = B::get_position(world, entity) + config.fire_point_offset;
    let resolution = resolve_target::<B>(
        world,
        entity,
        origin,
        aim_point - origin,
        config.max_hook_distance,
        config.hookable_mask,
        config.blocker_mask,
    );
    (origin, resolution)
}

/// Latest aim resolution for a body, refreshed every logic tick.
///
/// Purely informational: crosshairs and preview lines read it, the hook never
/// does.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Default)]
#[reflect(Component)]
pub struct HookPreview {
    /// Fire origin used for the resolution.
    pub origin: Vec2,
    /// Hookable point under the aim, if any.
    pub point: Option<Vec2>,
    /// Whether a blocker sits in front of `point`.
    pub blocked: bool,
    /// Whether a fire right now would be accepted (idle with a charge left).
    pub ready: bool,
}

impl HookPreview {
    /// True when a fire right now would attach.
    pub fn would_attach(&self) -> bool {
        self.ready && self.point.is_some() && !self.blocked
    }
}
