//! Top-down capture viewpoint placement over a snow patch footprint.

use bevy::camera::ScalingMode;
use bevy::prelude::*;

/// Where the capture camera should sit and how much it should see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewpointPlacement {
    /// World-space camera position, directly above the footprint centre.
    pub translation: Vec3,
    /// Half of the orthographic view's side length.
    pub half_extent: f32,
}

impl ViewpointPlacement {
    /// Centres a viewpoint over the square footprint `[anchor, anchor + bounds]`
    /// at a fixed `capture_height`, framing exactly the footprint.
    pub fn center(anchor: Vec3, bounds: f32, capture_height: f32) -> Self {
        let mid = anchor.xz() + Vec2::splat(bounds * 0.5);
        Self {
            translation: Vec3::new(mid.x, capture_height, mid.y),
            half_extent: bounds * 0.5,
        }
    }

    /// Moves `transform` and switches `projection` to an orthographic view of
    /// the footprint. Rotation is left to the host.
    ///
    /// `parent` is the world transform of the camera's parent, if any; the
    /// placement is converted into that parent's local space.
    pub fn apply(
        &self,
        transform: &mut Transform,
        projection: &mut Projection,
        parent: Option<&GlobalTransform>,
    ) {
        transform.translation = self.local_translation(parent);

        let scaling_mode = ScalingMode::FixedVertical {
            viewport_height: self.half_extent * 2.0,
        };
        match projection {
            Projection::Orthographic(ortho) => ortho.scaling_mode = scaling_mode,
            other => {
                *other = Projection::Orthographic(OrthographicProjection {
                    scaling_mode,
                    ..OrthographicProjection::default_3d()
                });
            }
        }
    }

    /// Camera translation relative to `parent`, or the world translation for
    /// a root camera.
    pub fn local_translation(&self, parent: Option<&GlobalTransform>) -> Vec3 {
        let Some(parent) = parent else {
            return self.translation;
        };
        parent.affine().inverse().transform_point3(self.translation)
    }
}

/// Whether `tracked` lies strictly inside the footprint starting at `anchor`.
///
/// Both X and Z must fall in the open interval `(anchor, anchor + bounds)`;
/// a position exactly on the boundary is outside.
pub fn should_recenter(tracked: Vec3, anchor: Vec3, bounds: f32) -> bool {
    tracked.x > anchor.x
        && tracked.x < anchor.x + bounds
        && tracked.z > anchor.z
        && tracked.z < anchor.z + bounds
}
