//! Error taxonomy for snow patch generation and viewpoint tracking.
//!
//! None of these are fatal: the core returns them as values and the plugin
//! reports them through Bevy's logging macros, leaving the last good mesh and
//! camera state in place.

use bevy::prelude::Entity;
use thiserror::Error;

/// Problems reported while sampling a patch or driving its capture camera.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnowPatchError {
    /// The sampling window collapsed to zero area: the anchor is not above the terrain.
    #[error("snow patch at ({x}, {z}) is not above terrain")]
    OutOfBounds { x: f32, z: f32 },

    /// A patch needs its capture camera but none is assigned.
    #[error("snow patch {patch} has no capture camera assigned")]
    MissingCaptureCamera { patch: Entity },

    /// A patch is asked to track an entity but none is assigned or it no longer exists.
    #[error("snow patch {patch} has no tracked entity to follow")]
    MissingTracker { patch: Entity },

    /// The assigned capture camera lacks a `Transform` or `Projection`.
    #[error("capture camera {camera} has no Transform or Projection")]
    InvalidCaptureCamera { camera: Entity },
}

impl SnowPatchError {
    /// Returns `true` for recoverable conditions that only warrant a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, SnowPatchError::OutOfBounds { .. })
    }
}
