//! Terrain data access for snow patch sampling.
//!
//! The sampler never reaches for a global terrain; it is handed a
//! [`TerrainSource`] on every call. [`HeightfieldTerrain`] is the in-memory
//! implementation, and [`ActiveTerrain`] is the resource through which the
//! plugin injects one into its systems.

use std::sync::Arc;

use bevy::prelude::*;

/// Read-only view of a heightmap terrain.
///
/// Heightmap cell coordinates are integers in `[0, width) × [0, depth)`.
/// Normalised coordinates span `[0, 1]²` over the terrain's world extent.
pub trait TerrainSource: Send + Sync {
    /// World-space size of one heightmap cell. `y` is the height scale.
    fn heightmap_scale(&self) -> Vec3;

    /// World-space extent of the whole terrain.
    ///
    /// Queried on every sampling pass, so implementations should answer
    /// without visiting the height data.
    fn world_size(&self) -> Vec3;

    /// World-space position of the terrain's minimum corner.
    fn world_origin(&self) -> Vec3;

    /// World-space height at an integer heightmap cell.
    ///
    /// Implementations clamp out-of-range coordinates to the border.
    fn height_at(&self, x: i32, z: i32) -> f32;

    /// Unit surface normal at normalised terrain coordinates, interpolated
    /// between the surrounding heightmap cells.
    fn interpolated_normal_at(&self, u: f32, v: f32) -> Vec3;

    /// Height at normalised terrain coordinates, bilinearly interpolated from
    /// [`height_at`](Self::height_at).
    fn interpolated_height_at(&self, u: f32, v: f32) -> f32 {
        let scale = self.heightmap_scale();
        let size = self.world_size();
        let fx = u * size.x / scale.x;
        let fz = v * size.z / scale.z;

        let x0 = fx.floor();
        let z0 = fz.floor();
        let tx = fx - x0;
        let tz = fz - z0;
        let (x0, z0) = (x0 as i32, z0 as i32);

        let h00 = self.height_at(x0, z0);
        let h10 = self.height_at(x0 + 1, z0);
        let h01 = self.height_at(x0, z0 + 1);
        let h11 = self.height_at(x0 + 1, z0 + 1);

        let h0 = h00 + (h10 - h00) * tx;
        let h1 = h01 + (h11 - h01) * tx;
        h0 + (h1 - h0) * tz
    }
}

/// The terrain the plugin samples snow patches from.
///
/// Sampling without this resource is a precondition violation: the
/// regeneration system declares it as a required parameter.
#[derive(Resource, Clone)]
pub struct ActiveTerrain(pub Arc<dyn TerrainSource>);

impl ActiveTerrain {
    pub fn new(terrain: impl TerrainSource + 'static) -> Self {
        Self(Arc::new(terrain))
    }
}

/// A row-major grid of world-space heights.
///
/// Cell `(x, z)` sits at world position
/// `origin + (x · cell_scale.x, height, z · cell_scale.y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightfieldTerrain {
    width: usize,
    depth: usize,
    cell_scale: Vec2,
    origin: Vec3,
    heights: Vec<f32>,
    // Cached so `world_size` stays constant time.
    min_height: f32,
    max_height: f32,
}

impl HeightfieldTerrain {
    /// Creates a flat terrain of `width × depth` samples spaced `scale` apart.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is below 2, since no cell could be formed.
    pub fn new(width: usize, depth: usize, scale: f32) -> Self {
        assert!(
            width >= 2 && depth >= 2,
            "HeightfieldTerrain must be at least 2×2 (got {}×{})",
            width,
            depth
        );
        Self {
            width,
            depth,
            cell_scale: Vec2::splat(scale.max(f32::EPSILON)),
            origin: Vec3::ZERO,
            heights: vec![0.0; width * depth],
            min_height: 0.0,
            max_height: 0.0,
        }
    }

    /// Creates a terrain whose heights come from `f(x, z)`.
    pub fn from_fn(
        width: usize,
        depth: usize,
        scale: f32,
        f: impl Fn(usize, usize) -> f32,
    ) -> Self {
        let mut terrain = Self::new(width, depth, scale);
        for z in 0..depth {
            for x in 0..width {
                terrain.heights[z * width + x] = f(x, z);
            }
        }
        terrain.refresh_height_range();
        terrain
    }

    /// Sets independent cell spacing along X and Z.
    pub fn with_cell_scale(mut self, x: f32, z: f32) -> Self {
        self.cell_scale = Vec2::new(x.max(f32::EPSILON), z.max(f32::EPSILON));
        self
    }

    /// Moves the terrain's minimum corner to `origin`.
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Height relative to the terrain origin.
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.width + x]
    }

    /// Overwrites one height.
    ///
    /// Rescans the grid only when the old value was the lowest or highest
    /// sample and the new value moves inward.
    pub fn set(&mut self, x: usize, z: usize, height: f32) {
        let cell = &mut self.heights[z * self.width + x];
        let old = std::mem::replace(cell, height);

        let shrinks = (old == self.min_height && height > old)
            || (old == self.max_height && height < old);
        if shrinks {
            self.refresh_height_range();
        } else {
            self.min_height = self.min_height.min(height);
            self.max_height = self.max_height.max(height);
        }
    }

    fn refresh_height_range(&mut self) {
        let (min, max) = self
            .heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            });
        self.min_height = min;
        self.max_height = max;
    }

    fn clamped(&self, x: i32, z: i32) -> f32 {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let z = z.clamp(0, self.depth as i32 - 1) as usize;
        self.get(x, z)
    }

    // Central differences at a grid vertex, one-sided on the border.
    fn vertex_normal(&self, x: i32, z: i32) -> Vec3 {
        let dx = (self.clamped(x + 1, z) - self.clamped(x - 1, z)) / (2.0 * self.cell_scale.x);
        let dz = (self.clamped(x, z + 1) - self.clamped(x, z - 1)) / (2.0 * self.cell_scale.y);
        Vec3::new(-dx, 1.0, -dz).normalize()
    }
}

impl TerrainSource for HeightfieldTerrain {
    fn heightmap_scale(&self) -> Vec3 {
        Vec3::new(self.cell_scale.x, 1.0, self.cell_scale.y)
    }

    fn world_size(&self) -> Vec3 {
        Vec3::new(
            (self.width - 1) as f32 * self.cell_scale.x,
            self.max_height - self.min_height,
            (self.depth - 1) as f32 * self.cell_scale.y,
        )
    }

    fn world_origin(&self) -> Vec3 {
        self.origin
    }

    fn height_at(&self, x: i32, z: i32) -> f32 {
        self.clamped(x, z) + self.origin.y
    }

    fn interpolated_normal_at(&self, u: f32, v: f32) -> Vec3 {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let fz = v.clamp(0.0, 1.0) * (self.depth - 1) as f32;

        let x0 = (fx as i32).min(self.width as i32 - 2);
        let z0 = (fz as i32).min(self.depth as i32 - 2);
        let tx = fx - x0 as f32;
        let tz = fz - z0 as f32;

        let n0 = self
            .vertex_normal(x0, z0)
            .lerp(self.vertex_normal(x0 + 1, z0), tx);
        let n1 = self
            .vertex_normal(x0, z0 + 1)
            .lerp(self.vertex_normal(x0 + 1, z0 + 1), tx);
        n0.lerp(n1, tz).normalize_or(Vec3::Y)
    }
}
