//! Bevy systems that keep snow patches and their capture cameras up to date.
//!
//! A patch is regenerated when its world position or settings change, when it
//! is first spawned, or when a [`RefreshSnowPatch`] message names it. Every
//! tick the tracked entity is tested against the patch footprint and the
//! capture camera re-centred while it stands inside.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::transform::TransformSystems;

use crate::error::SnowPatchError;
use crate::mesher::{SampleWindow, SnowPatchMeshBuilder};
use crate::settings::SnowPatchSettings;
use crate::terrain::ActiveTerrain;
use crate::viewpoint::{ViewpointPlacement, should_recenter};

/// A terrain-conforming snow patch anchored at its entity's world position.
///
/// The generated mesh is inserted as a [`Mesh3d`] on the same entity; the
/// host is expected to supply a material.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component, Default)]
#[require(SnowPatchSettings, SnowPatchState, Transform)]
pub struct SnowPatch {
    /// Orthographic camera that renders the patch from above.
    pub capture_camera: Option<Entity>,
    /// Entity whose presence inside the footprint keeps the camera centred.
    pub tracked: Option<Entity>,
}

/// Footprint of the most recently generated mesh.
#[derive(Component, Debug, Clone, Default)]
pub struct SnowPatchState {
    /// World-space side length of the square footprint.
    pub bounds: f32,
    /// Terrain overlap of the footprint at the last regeneration.
    pub window: SampleWindow,
    camera_reported: bool,
    tracker_reported: bool,
}

impl SnowPatchState {
    /// Whether a capture camera problem was logged and has not been resolved since.
    pub fn camera_issue_reported(&self) -> bool {
        self.camera_reported
    }

    /// Whether a missing tracked entity was logged and has not been resolved since.
    pub fn tracker_issue_reported(&self) -> bool {
        self.tracker_reported
    }
}

/// Requests regeneration of one patch, or of every patch when `patch` is `None`.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct RefreshSnowPatch {
    pub patch: Option<Entity>,
}

impl RefreshSnowPatch {
    pub fn all() -> Self {
        Self { patch: None }
    }

    pub fn entity(patch: Entity) -> Self {
        Self { patch: Some(patch) }
    }
}

/// System sets run by [`SnowPatchPlugin`], in order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnowPatchSystems {
    Regenerate,
    Track,
}

/// Registers the snow patch types, messages and systems.
///
/// Requires an [`ActiveTerrain`] resource and an `Assets<Mesh>` resource.
pub struct SnowPatchPlugin;

impl Plugin for SnowPatchPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SnowPatch>()
            .register_type::<SnowPatchSettings>()
            .add_message::<RefreshSnowPatch>()
            .configure_sets(
                PostUpdate,
                (SnowPatchSystems::Regenerate, SnowPatchSystems::Track)
                    .chain()
                    .after(TransformSystems::Propagate),
            )
            .add_systems(
                PostUpdate,
                (
                    regenerate_snow_patches.in_set(SnowPatchSystems::Regenerate),
                    track_snow_patch_targets.in_set(SnowPatchSystems::Track),
                ),
            );
    }
}

/// Capture cameras and the world transforms of their parents.
#[derive(SystemParam)]
pub struct CaptureCameras<'w, 's> {
    cameras: Query<
        'w,
        's,
        (
            &'static mut Transform,
            &'static mut Projection,
            Option<&'static ChildOf>,
        ),
        Without<SnowPatch>,
    >,
    parents: Query<'w, 's, &'static GlobalTransform>,
}

impl CaptureCameras<'_, '_> {
    /// Applies `placement` to `camera`, converting into its parent's space.
    fn center(
        &mut self,
        camera: Entity,
        placement: ViewpointPlacement,
    ) -> Result<(), SnowPatchError> {
        let Ok((mut transform, mut projection, child_of)) = self.cameras.get_mut(camera) else {
            return Err(SnowPatchError::InvalidCaptureCamera { camera });
        };
        let parent = child_of.map(ChildOf::parent);
        let parent = parent.and_then(|parent| self.parents.get(parent).ok());
        placement.apply(&mut transform, &mut projection, parent);
        Ok(())
    }
}

/// Rebuilds the mesh of every patch that moved, changed, or was asked to refresh.
pub fn regenerate_snow_patches(
    mut commands: Commands,
    terrain: Res<ActiveTerrain>,
    mut refresh: MessageReader<RefreshSnowPatch>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut patches: Query<(
        Entity,
        Ref<GlobalTransform>,
        Ref<SnowPatchSettings>,
        Ref<SnowPatch>,
        &mut SnowPatchState,
    )>,
    mut cameras: CaptureCameras,
) {
    let mut refresh_all = false;
    let mut requested: Vec<Entity> = Vec::new();
    for message in refresh.read() {
        match message.patch {
            Some(patch) => requested.push(patch),
            None => refresh_all = true,
        }
    }

    for (entity, global, settings, patch, mut state) in &mut patches {
        let stale = global.is_changed() || settings.is_changed() || patch.is_changed();
        if !(stale || refresh_all || requested.contains(&entity)) {
            continue;
        }

        let anchor = global.translation();
        let sample = SnowPatchMeshBuilder::new(SnowPatchSettings::clone(&settings))
            .build(anchor, terrain.0.as_ref());
        if let Some(warning) = &sample.warning {
            warn!("{warning}");
        }

        let scale = terrain.0.heightmap_scale();
        if scale.x != scale.z {
            debug!(
                "cell scale differs on X ({}) and Z ({}); patch {entity} bounds follow X",
                scale.x, scale.z
            );
        }

        state.bounds = sample.bounds;
        state.window = sample.window;
        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(sample.geometry.into_mesh())));

        let placement = ViewpointPlacement::center(anchor, state.bounds, settings.capture_height());
        center_capture_camera(entity, &patch, placement, &mut state, &mut cameras);
    }
}

/// Re-centres the capture camera while the tracked entity is inside the footprint.
pub fn track_snow_patch_targets(
    mut patches: Query<(
        Entity,
        &GlobalTransform,
        &SnowPatch,
        &SnowPatchSettings,
        &mut SnowPatchState,
    )>,
    targets: Query<&GlobalTransform>,
    mut cameras: CaptureCameras,
) {
    for (entity, global, patch, settings, mut state) in &mut patches {
        let Some(tracked) = patch.tracked.and_then(|t| targets.get(t).ok()) else {
            if !state.tracker_reported {
                error!("{}", SnowPatchError::MissingTracker { patch: entity });
                state.tracker_reported = true;
            }
            continue;
        };
        state.tracker_reported = false;

        let anchor = global.translation();
        if should_recenter(tracked.translation(), anchor, state.bounds) {
            let placement =
                ViewpointPlacement::center(anchor, state.bounds, settings.capture_height());
            center_capture_camera(entity, patch, placement, &mut state, &mut cameras);
        }
    }
}

// Camera problems are logged once until the camera is usable again.
fn center_capture_camera(
    entity: Entity,
    patch: &SnowPatch,
    placement: ViewpointPlacement,
    state: &mut SnowPatchState,
    cameras: &mut CaptureCameras,
) {
    let result = match patch.capture_camera {
        Some(camera) => cameras.center(camera, placement),
        None => Err(SnowPatchError::MissingCaptureCamera { patch: entity }),
    };

    match result {
        Ok(()) => state.camera_reported = false,
        Err(err) => {
            if !state.camera_reported {
                error!("{err}");
                state.camera_reported = true;
            }
        }
    }
}
