//! # `msg_grapple_hook`
//!
//! A 2D grapple hook traversal mechanic with physics backend abstraction.
//!
//! This crate provides a physics-coupled hook state machine that:
//! - Fires a tethered hook at an aim point, resolved by raycasts against
//!   hookable and blocking layers
//! - Zips straight toward anchors below the body
//! - Swings on a spring rope around anchors above the body, building momentum
//!   from horizontal input
//! - Releases with a momentum launch, a hop, and a stabilizing torque kick
//! - Gates use with charges that refill on the ground
//! - Abstracts the physics backend (Rapier2D included)
//!
//! ## Architecture
//!
//! Each frame the logic tick (in `Update`) reads [`GrappleIntent`](intent::GrappleIntent),
//! fires or releases, advances swing momentum, runs the minimal locomotion the
//! hook gates through [`MotionGate`](state::MotionGate), and checks the
//! auto-release rules. The zip velocity law runs in `FixedUpdate` next to the
//! physics step.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_grapple_hook::prelude::*;
//!
//! // Components for a grappling body
//! let config = GrappleConfig::default().with_max_charge(3);
//! let bundle = GrappleHookBundle::new(config);
//! assert_eq!(bundle.hook.charges().current(), 3);
//!
//! // Spawn it together with a physics bundle such as `Rapier2dGrappleBundle`
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod error;
pub mod events;
pub mod hook;
pub mod intent;
pub mod momentum;
pub mod resolver;
pub mod rope;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

#[cfg(test)]
mod test_backend;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::GrapplePhysicsBackend;
    pub use crate::collision::{CollisionData, LayerMask};
    pub use crate::config::{GrappleConfig, LocomotionConfig};
    pub use crate::error::{ConfigError, ConfigResult};
    pub use crate::events::{HookBlocked, HookImpact, HookMiss, HookReleased};
    pub use crate::hook::{Charges, GrappleHook, HookSide, HookState, ReleaseReason};
    pub use crate::intent::GrappleIntent;
    pub use crate::resolver::{HookPreview, TargetResolution};
    pub use crate::rope::RopeConstraint;
    pub use crate::state::{Grounded, GroundSensor, MotionGate, Swinging, Zipping};
    pub use crate::systems::{fire_hook, pull_rope, release_hook, FireOutcome, FireRejection};
    pub use crate::{GrappleHookBundle, GrappleHookPlugin, GrappleHookSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dGrappleBundle};
}

/// System sets for the grapple hook, in execution order.
///
/// The logic sets run chained in `Update`; [`GrappleHookSet::Physics`] runs
/// in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrappleHookSet {
    /// Ground sensors.
    Sensors,
    /// Fire and release from intent edges.
    Input,
    /// Swing momentum, rope pulling and locomotion.
    Motion,
    /// Geometric and at-rest auto-release. Runs after motion so a hook
    /// released this tick never applies this tick's swing force.
    AutoRelease,
    /// Charge refill and upright recovery.
    Resources,
    /// Previews, state markers and intent latching.
    Feedback,
    /// Backend commits (swing force).
    FinalApplication,
    /// Zip velocity law (`FixedUpdate`).
    Physics,
}

/// Main plugin for the grapple hook.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (raycasting, impulses, rope joints, etc.).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier2dBackend`)
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use msg_grapple_hook::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(GrappleHookPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct GrappleHookPlugin<B: backend::GrapplePhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::GrapplePhysicsBackend> Default for GrappleHookPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::GrapplePhysicsBackend> Plugin for GrappleHookPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::GrappleConfig>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<hook::GrappleHook>();
        app.register_type::<intent::GrappleIntent>();
        app.register_type::<resolver::HookPreview>();
        app.register_type::<state::MotionGate>();
        app.register_type::<state::GroundSensor>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Swinging>();
        app.register_type::<state::Zipping>();

        app.add_event::<events::HookImpact>();
        app.add_event::<events::HookMiss>();
        app.add_event::<events::HookBlocked>();
        app.add_event::<events::HookReleased>();

        app.configure_sets(
            Update,
            (
                GrappleHookSet::Sensors,
                GrappleHookSet::Input,
                GrappleHookSet::Motion,
                GrappleHookSet::AutoRelease,
                GrappleHookSet::Resources,
                GrappleHookSet::Feedback,
                GrappleHookSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            Update,
            (
                (systems::warn_invalid_configs, systems::update_ground_sensors::<B>)
                    .in_set(GrappleHookSet::Sensors),
                systems::handle_hook_input::<B>.in_set(GrappleHookSet::Input),
                (systems::apply_swing::<B>, systems::apply_locomotion::<B>)
                    .chain()
                    .in_set(GrappleHookSet::Motion),
                (
                    systems::release_hooks_above_anchor::<B>,
                    systems::release_hooks_at_rest::<B>,
                )
                    .chain()
                    .in_set(GrappleHookSet::AutoRelease),
                (systems::refill_charges, systems::recover_upright::<B>)
                    .chain()
                    .in_set(GrappleHookSet::Resources),
                (
                    systems::update_hook_previews::<B>,
                    systems::sync_state_markers,
                    systems::latch_intents,
                )
                    .chain()
                    .in_set(GrappleHookSet::Feedback),
            ),
        );

        app.add_systems(
            FixedUpdate,
            systems::apply_zip_velocity::<B>.in_set(GrappleHookSet::Physics),
        );
    }
}

/// Core components for a grappling body, without physics.
///
/// Pair it with a backend bundle such as
/// `rapier::Rapier2dGrappleBundle` and a collider.
#[derive(Bundle, Default)]
pub struct GrappleHookBundle {
    pub hook: hook::GrappleHook,
    pub config: config::GrappleConfig,
    pub intent: intent::GrappleIntent,
    pub gate: state::MotionGate,
    pub sensor: state::GroundSensor,
    pub locomotion: config::LocomotionConfig,
    pub preview: resolver::HookPreview,
}

impl GrappleHookBundle {
    /// Bundle with a hook sized to `config`'s charge budget.
    pub fn new(config: config::GrappleConfig) -> Self {
        Self {
            hook: hook::GrappleHook::from_config(&config),
            config,
            ..default()
        }
    }

    /// Replace the ground sensor.
    pub fn with_ground_sensor(mut self, sensor: state::GroundSensor) -> Self {
        self.sensor = sensor;
        self
    }

    /// Replace the locomotion tuning.
    pub fn with_locomotion(mut self, locomotion: config::LocomotionConfig) -> Self {
        self.locomotion = locomotion;
        self
    }
}
