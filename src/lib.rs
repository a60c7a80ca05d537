//! Terrain-conforming snow patches for Bevy.
//!
//! Resamples a small square window of a heightmap terrain below a movable
//! anchor into a mesh that sits a little above the ground, with an edge mask
//! so the patch blends into the terrain, and keeps an orthographic top-down
//! capture camera framed over it.
//!
//! # Features
//!
//! - **Mesh generation**: Sample any [`TerrainSource`] into a patch mesh with
//!   normal-offset vertices, an edge-falloff mask in the red vertex colour and
//!   grid UVs via [`SnowPatchMeshBuilder`].
//! - **Capture viewpoint**: Centre an orthographic camera over the patch
//!   footprint and test whether a tracked position is inside it via
//!   [`viewpoint`].
//! - **Plugin**: [`SnowPatchPlugin`] regenerates patches when they move or when
//!   a [`RefreshSnowPatch`] message arrives, and keeps the capture camera on
//!   the tracked entity.
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_snow_patch::{
//!     ActiveTerrain, HeightfieldTerrain, SnowPatch, SnowPatchPlugin, SnowPatchSettings,
//! };
//!
//! fn setup(mut commands: Commands) {
//!     let terrain = HeightfieldTerrain::from_fn(257, 257, 1.0, |x, z| {
//!         ((x + z) as f32 * 0.05).sin() * 4.0
//!     });
//!     commands.insert_resource(ActiveTerrain::new(terrain));
//!
//!     let camera = commands
//!         .spawn((
//!             Camera3d::default(),
//!             Projection::Orthographic(OrthographicProjection::default_3d()),
//!         ))
//!         .id();
//!     let player = commands.spawn(Transform::from_xyz(20.0, 0.0, 20.0)).id();
//!
//!     commands.spawn((
//!         SnowPatch { capture_camera: Some(camera), tracked: Some(player) },
//!         SnowPatchSettings::default().with_sample_size(64).with_edge_height_offset(0.5),
//!         Transform::from_xyz(0.0, 0.0, 0.0),
//!     ));
//! }
//!
//! App::new()
//!     .add_plugins((DefaultPlugins, SnowPatchPlugin))
//!     .add_systems(Startup, setup)
//!     .run();
//! ```

pub mod error;
pub mod mesher;
pub mod plugin;
pub mod settings;
pub mod terrain;
pub mod viewpoint;

pub use error::SnowPatchError;
pub use mesher::{
    SampleWindow, SnowPatchGeometry, SnowPatchMeshBuilder, SnowPatchSample, falloff_weight,
    snow_bounds,
};
pub use plugin::{RefreshSnowPatch, SnowPatch, SnowPatchPlugin, SnowPatchState, SnowPatchSystems};
pub use settings::{HeightSampling, SnowPatchSettings};
pub use terrain::{ActiveTerrain, HeightfieldTerrain, TerrainSource};
pub use viewpoint::{ViewpointPlacement, should_recenter};
