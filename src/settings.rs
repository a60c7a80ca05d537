//! Tunable parameters for a snow patch.
//!
//! Every setter clamps its input to the supported range, so the sampler can
//! consume a [`SnowPatchSettings`] without validating it again.

use bevy::prelude::*;

/// Smallest supported grid side length.
pub const MIN_SAMPLE_SIZE: u32 = 4;
/// Largest supported grid side length.
pub const MAX_SAMPLE_SIZE: u32 = 128;
/// Default elevation of the capture camera above the world origin.
pub const DEFAULT_CAPTURE_HEIGHT: f32 = 400.0;

/// How vertex heights are read from the terrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum HeightSampling {
    /// Heights come from the nearest heightmap cell and vertices snap to the
    /// terrain grid; normals are still interpolated at the unsnapped position.
    #[default]
    Nearest,
    /// Heights and normals are both interpolated at the unsnapped position, so
    /// the patch slides smoothly with its anchor instead of snapping per cell.
    Interpolated,
}

/// Configuration of a single snow patch.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component, Default)]
pub struct SnowPatchSettings {
    sample_size: u32,
    snow_offset: f32,
    edge_falloff: f32,
    edge_falloff_strength: u32,
    edge_height_offset: f32,
    height_sampling: HeightSampling,
    capture_height: f32,
}

impl Default for SnowPatchSettings {
    fn default() -> Self {
        Self {
            sample_size: 32,
            snow_offset: 1.0,
            edge_falloff: 1.0,
            edge_falloff_strength: 10,
            edge_height_offset: 0.0,
            height_sampling: HeightSampling::Nearest,
            capture_height: DEFAULT_CAPTURE_HEIGHT,
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

impl SnowPatchSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Side length of the sample grid, clamped to `[4, 128]`.
    pub fn with_sample_size(mut self, size: u32) -> Self {
        self.sample_size = size.clamp(MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE);
        self
    }

    /// Distance the surface is pushed out along the terrain normal, clamped to `[0, 5]`.
    pub fn with_snow_offset(mut self, offset: f32) -> Self {
        self.snow_offset = clamp_or(offset, 0.0, 5.0, Self::default().snow_offset);
        self
    }

    /// Overall strength of the edge mask, clamped to `[0, 1]`.
    pub fn with_edge_falloff(mut self, falloff: f32) -> Self {
        self.edge_falloff = clamp_or(falloff, 0.0, 1.0, Self::default().edge_falloff);
        self
    }

    /// Exponent of the edge mask, clamped to `[2, 100]` and rounded down to an
    /// even number so the mask stays non-negative on both sides of the centre.
    pub fn with_edge_falloff_strength(mut self, strength: u32) -> Self {
        self.edge_falloff_strength = strength.clamp(2, 100) & !1;
        self
    }

    /// How far fully masked vertices are lowered, clamped to `[-10, 10]`.
    pub fn with_edge_height_offset(mut self, offset: f32) -> Self {
        self.edge_height_offset = clamp_or(offset, -10.0, 10.0, 0.0);
        self
    }

    pub fn with_height_sampling(mut self, sampling: HeightSampling) -> Self {
        self.height_sampling = sampling;
        self
    }

    /// Elevation of the capture camera. Non-positive or NaN values keep the default.
    pub fn with_capture_height(mut self, height: f32) -> Self {
        self.capture_height = if height > 0.0 {
            height
        } else {
            DEFAULT_CAPTURE_HEIGHT
        };
        self
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    pub fn snow_offset(&self) -> f32 {
        self.snow_offset
    }

    pub fn edge_falloff(&self) -> f32 {
        self.edge_falloff
    }

    pub fn edge_falloff_strength(&self) -> u32 {
        self.edge_falloff_strength
    }

    pub fn edge_height_offset(&self) -> f32 {
        self.edge_height_offset
    }

    pub fn height_sampling(&self) -> HeightSampling {
        self.height_sampling
    }

    pub fn capture_height(&self) -> f32 {
        self.capture_height
    }
}
