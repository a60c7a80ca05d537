//! Snow patch mesh generation from a [`TerrainSource`].
//!
//! Resamples an N×N window of the terrain below an anchor position into a mesh
//! with:
//! - `TriangleList` topology, two triangles per grid quad
//! - Terrain-interpolated per-vertex normals
//! - An edge-falloff mask in the red vertex colour channel
//! - Grid-normalised UV coordinates in `[0, 1)²`

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::error::SnowPatchError;
use crate::settings::{HeightSampling, SnowPatchSettings};
use crate::terrain::TerrainSource;

/// World-space side length of a patch footprint.
///
/// Only the X cell scale is used; patches are assumed square over a terrain
/// with equal X and Z spacing.
pub fn snow_bounds(sample_size: u32, heightmap_scale: Vec3) -> f32 {
    sample_size as f32 * heightmap_scale.x
}

/// Edge-falloff weight at continuous grid coordinates `(x, z)`.
///
/// Both coordinates are normalised to `[-1, 1]` about the grid centre, raised
/// to `strength` and averaged, then scaled by `falloff`. The result is `0` at
/// the centre and grows toward the edges in a rounded-square shape that
/// sharpens as `strength` increases.
pub fn falloff_weight(x: f32, z: f32, sample_size: u32, strength: u32, falloff: f32) -> f32 {
    let half = sample_size as f32 * 0.5;
    let xr = ((x - half + 0.5) / half).powi(strength as i32);
    let zr = ((z - half + 0.5) / half).powi(strength as i32);
    falloff * (xr * 0.5 + zr * 0.5).abs()
}

/// The part of the terrain rectangle a patch footprint overlaps, in world XZ.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleWindow {
    pub start: Vec2,
    pub end: Vec2,
}

impl SampleWindow {
    /// Clamps the footprint `[anchor, anchor + bounds]` to the terrain rectangle
    /// `[origin, origin + size]`.
    pub fn compute(anchor: Vec3, bounds: f32, origin: Vec3, size: Vec3) -> Self {
        let min = origin.xz();
        let max = min + size.xz();
        let anchor = anchor.xz();
        Self {
            start: anchor.clamp(min, max),
            end: (anchor + Vec2::splat(bounds)).clamp(min, max),
        }
    }

    /// `true` when the footprint does not overlap the terrain at all.
    pub fn is_empty(&self) -> bool {
        self.start.x >= self.end.x || self.start.y >= self.end.y
    }
}

/// Plain vertex and index data of a snow patch.
///
/// Vertices are stored column-major by grid cell: cell `(x, z)` is vertex
/// `x · N + z`. Positions are local to the patch anchor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnowPatchGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SnowPatchGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts the geometry into a Bevy [`Mesh`].
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }

    pub fn to_mesh(&self) -> Mesh {
        self.clone().into_mesh()
    }
}

/// Result of one sampling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowPatchSample {
    pub geometry: SnowPatchGeometry,
    /// Footprint side length, see [`snow_bounds`].
    pub bounds: f32,
    pub window: SampleWindow,
    /// Set when the anchor is not above the terrain. The geometry is still
    /// produced, it just samples the terrain border.
    pub warning: Option<SnowPatchError>,
}

/// Builds a snow patch mesh from a terrain window below an anchor.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_snow_patch::{HeightfieldTerrain, SnowPatchMeshBuilder, SnowPatchSettings};
///
/// let terrain = HeightfieldTerrain::new(256, 256, 1.0);
/// let sample = SnowPatchMeshBuilder::new(SnowPatchSettings::default().with_sample_size(64))
///     .build(Vec3::new(10.0, 0.0, 10.0), &terrain);
/// let mesh = sample.geometry.into_mesh();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnowPatchMeshBuilder {
    settings: SnowPatchSettings,
}

impl From<SnowPatchSettings> for SnowPatchMeshBuilder {
    fn from(settings: SnowPatchSettings) -> Self {
        Self::new(settings)
    }
}

impl SnowPatchMeshBuilder {
    pub fn new(settings: SnowPatchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SnowPatchSettings {
        &self.settings
    }

    /// Samples the terrain below `anchor` and builds the patch geometry.
    ///
    /// Produces `N²` vertices and `2(N−1)²` triangles for `N = sample_size`,
    /// whether or not the anchor is above the terrain.
    pub fn build(&self, anchor: Vec3, terrain: &dyn TerrainSource) -> SnowPatchSample {
        let settings = &self.settings;
        let n = settings.sample_size() as usize;
        let vs = terrain.heightmap_scale();
        let terrain_size = terrain.world_size();
        let origin = terrain.world_origin();

        let bounds = snow_bounds(settings.sample_size(), vs);
        let window = SampleWindow::compute(anchor, bounds, origin, terrain_size);
        let warning = window.is_empty().then(|| SnowPatchError::OutOfBounds {
            x: anchor.x,
            z: anchor.z,
        });

        // Anchor position in continuous heightmap cells.
        let ct = Vec2::new(
            (anchor.x - origin.x) / vs.x,
            (anchor.z - origin.z) / vs.z,
        );
        let cell = Vec2::new(vs.x, vs.z);
        let to_normalized = cell / terrain_size.xz().max(Vec2::splat(f32::EPSILON));

        let vertex_count = n * n;
        let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
        let mut normals: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
        let mut colors: Vec<[f32; 4]> = Vec::with_capacity(vertex_count);
        let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(vertex_count);

        for x in 0..n {
            for z in 0..n {
                let grid = Vec2::new(x as f32, z as f32);
                let weight = falloff_weight(
                    grid.x,
                    grid.y,
                    settings.sample_size(),
                    settings.edge_falloff_strength(),
                    settings.edge_falloff(),
                );

                let d = grid + ct;
                let uv = d * to_normalized;

                let (local, height) = match settings.height_sampling() {
                    HeightSampling::Nearest => {
                        let c = d.floor();
                        // Snap back onto the heightmap grid so neighbouring
                        // patches line up regardless of the anchor's fraction.
                        let local = grid * cell - (d - c) * cell;
                        (local, terrain.height_at(c.x as i32, c.y as i32))
                    }
                    HeightSampling::Interpolated => {
                        (grid * cell, terrain.interpolated_height_at(uv.x, uv.y))
                    }
                };

                // Lower masked edges so they hide beneath the terrain.
                let y = height - anchor.y - weight * settings.edge_height_offset();
                let normal = terrain.interpolated_normal_at(uv.x, uv.y);
                let position = Vec3::new(local.x, y, local.y) + normal * settings.snow_offset();

                positions.push(position.into());
                normals.push(normal.into());
                colors.push([weight, 0.0, 0.0, 1.0]);
                uvs.push([x as f32 / n as f32, z as f32 / n as f32]);
            }
        }

        // Each quad (x, z) → (x+1, z+1) emits two triangles, both facing +Y
        // on flat terrain:
        //   a──b      a = (x,   z)     b = (x,   z+1)
        //   │ ╲│      c = (x+1, z)     d = (x+1, z+1)
        //   c──d      Triangle 1: a, d, c    Triangle 2: d, a, b
        let quad_count = (n - 1) * (n - 1);
        let mut indices: Vec<u32> = Vec::with_capacity(quad_count * 6);

        for x in 0..(n - 1) {
            for z in 0..(n - 1) {
                let a = (x * n + z) as u32;
                let b = (x * n + z + 1) as u32;
                let c = ((x + 1) * n + z) as u32;
                let d = ((x + 1) * n + z + 1) as u32;

                indices.extend_from_slice(&[a, d, c]);
                indices.extend_from_slice(&[d, a, b]);
            }
        }

        SnowPatchSample {
            geometry: SnowPatchGeometry {
                positions,
                normals,
                colors,
                uvs,
                indices,
            },
            bounds,
            window,
            warning,
        }
    }
}
