use bevy::prelude::*;
use bevy_snow_patch::{
    HeightSampling, HeightfieldTerrain, SnowPatchError, SnowPatchMeshBuilder, SnowPatchSample,
    SnowPatchSettings, TerrainSource, falloff_weight, snow_bounds,
};

fn flat_terrain(size: usize, scale: f32) -> HeightfieldTerrain {
    HeightfieldTerrain::new(size, size, scale)
}

fn ramp_terrain(size: usize, scale: f32) -> HeightfieldTerrain {
    HeightfieldTerrain::from_fn(size, size, scale, |x, _| x as f32 * scale)
}

fn settings(n: u32) -> SnowPatchSettings {
    SnowPatchSettings::default().with_sample_size(n)
}

/// Settings with no normal offset and no edge mask, so vertex heights are raw terrain.
fn bare_settings(n: u32) -> SnowPatchSettings {
    settings(n).with_snow_offset(0.0).with_edge_falloff(0.0)
}

fn build(
    settings: SnowPatchSettings,
    anchor: Vec3,
    terrain: &dyn TerrainSource,
) -> SnowPatchSample {
    SnowPatchMeshBuilder::new(settings).build(anchor, terrain)
}

#[test]
fn vertex_and_triangle_counts_match_sample_size() {
    let terrain = flat_terrain(256, 1.0);
    for n in [4u32, 7, 32, 128] {
        let sample = build(settings(n), Vec3::new(10.0, 0.0, 10.0), &terrain);
        let n = n as usize;
        assert_eq!(sample.geometry.vertex_count(), n * n);
        assert_eq!(sample.geometry.triangle_count(), 2 * (n - 1) * (n - 1));
        assert_eq!(sample.geometry.normals.len(), n * n);
        assert_eq!(sample.geometry.colors.len(), n * n);
        assert_eq!(sample.geometry.uvs.len(), n * n);
    }
}

#[test]
fn flat_terrain_scenario() {
    let terrain = flat_terrain(64, 1.0);
    let config = settings(4).with_snow_offset(1.0).with_edge_falloff(0.0);
    let sample = build(config, Vec3::new(10.0, 0.0, 10.0), &terrain);

    assert_eq!(sample.geometry.vertex_count(), 16);
    assert_eq!(sample.geometry.triangle_count(), 18);
    assert!(sample.warning.is_none());
    for color in &sample.geometry.colors {
        assert_eq!(color[0], 0.0, "red channel should be zero without falloff");
        assert_eq!(color[1], 0.0);
        assert_eq!(color[2], 0.0);
        assert_eq!(color[3], 1.0);
    }
    for p in &sample.geometry.positions {
        assert!(
            (p[1] - 1.0).abs() < 1e-6,
            "flat snow should sit one unit up, got {:?}",
            p
        );
    }
}

#[test]
fn off_terrain_anchor_warns_once_and_still_builds() {
    let terrain = flat_terrain(64, 1.0);
    let sample = build(settings(8), Vec3::new(-500.0, 0.0, -500.0), &terrain);

    assert!(sample.window.is_empty());
    assert_eq!(
        sample.warning,
        Some(SnowPatchError::OutOfBounds {
            x: -500.0,
            z: -500.0
        })
    );
    assert!(
        sample
            .warning
            .as_ref()
            .is_some_and(SnowPatchError::is_warning)
    );
    assert_eq!(sample.geometry.vertex_count(), 64);
    assert_eq!(sample.geometry.triangle_count(), 2 * 7 * 7);
}

#[test]
fn anchor_past_far_edge_is_out_of_bounds() {
    let terrain = flat_terrain(64, 1.0);
    let sample = build(settings(8), Vec3::new(100.0, 0.0, 10.0), &terrain);
    assert!(sample.warning.is_some());
}

#[test]
fn partially_overlapping_anchor_is_not_out_of_bounds() {
    let terrain = flat_terrain(64, 1.0);
    let sample = build(settings(8), Vec3::new(-4.0, 0.0, 60.0), &terrain);
    assert!(sample.warning.is_none());
    assert_eq!(sample.window.start, Vec2::new(0.0, 60.0));
    assert_eq!(sample.window.end, Vec2::new(4.0, 63.0));
}

#[test]
fn winding_faces_along_terrain_normals() {
    let terrain = HeightfieldTerrain::from_fn(64, 64, 1.0, |x, z| {
        (x as f32 * 0.3).sin() * 2.0 + (z as f32 * 0.2).cos() * 3.0
    });
    let config = settings(16).with_snow_offset(0.0);
    let sample = build(config, Vec3::new(20.0, 0.0, 20.0), &terrain);
    let geometry = &sample.geometry;

    for tri in geometry.indices.chunks_exact(3) {
        let p = |k: usize| Vec3::from(geometry.positions[tri[k] as usize]);
        let face = (p(1) - p(0)).cross(p(2) - p(0));
        let normal: Vec3 = tri
            .iter()
            .map(|&i| Vec3::from(geometry.normals[i as usize]))
            .sum();
        assert!(face.dot(normal) > 0.0, "inverted triangle {:?}", tri);
    }
}

#[test]
fn flat_triangles_face_up() {
    let terrain = flat_terrain(64, 2.0);
    let sample = build(settings(6), Vec3::new(8.0, 0.0, 8.0), &terrain);
    let positions = &sample.geometry.positions;
    for tri in sample.geometry.indices.chunks_exact(3) {
        let p = |k: usize| Vec3::from(positions[tri[k] as usize]);
        assert!((p(1) - p(0)).cross(p(2) - p(0)).y > 0.0);
    }
}

#[test]
fn falloff_is_zero_at_center_and_grows_outward() {
    let n = 8;
    let center = n as f32 * 0.5 - 0.5;
    assert!(falloff_weight(center, center, n, 2, 1.0).abs() < 1e-6);

    for strength in [2u32, 4, 10] {
        let toward_high: Vec<f32> = (4..8)
            .map(|x| falloff_weight(x as f32, center, n, strength, 1.0))
            .collect();
        let toward_low: Vec<f32> = (0..4)
            .rev()
            .map(|x| falloff_weight(x as f32, center, n, strength, 1.0))
            .collect();
        for run in [toward_high, toward_low] {
            for pair in run.windows(2) {
                assert!(pair[1] > pair[0], "strength {strength}: {:?}", run);
            }
        }
    }
}

#[test]
fn falloff_colors_stay_in_unit_range() {
    let terrain = flat_terrain(64, 1.0);
    let config = settings(32).with_edge_falloff_strength(2);
    let sample = build(config, Vec3::new(5.0, 0.0, 5.0), &terrain);
    for color in &sample.geometry.colors {
        assert!(
            (0.0..=1.0).contains(&color[0]),
            "weight out of range: {:?}",
            color
        );
    }
}

#[test]
fn edge_height_offset_lowers_masked_vertices() {
    let terrain = flat_terrain(64, 1.0);
    let config = settings(4)
        .with_snow_offset(0.0)
        .with_edge_falloff(1.0)
        .with_edge_falloff_strength(2)
        .with_edge_height_offset(2.0);
    let sample = build(config, Vec3::new(10.0, 0.0, 10.0), &terrain);

    let geometry = &sample.geometry;
    for (p, color) in geometry.positions.iter().zip(&geometry.colors) {
        assert!((p[1] + color[0] * 2.0).abs() < 1e-6);
    }
    // Corner weight for N = 4, k = 2: ½·0.75² + ½·0.75² = 0.5625.
    assert!((geometry.positions[0][1] + 1.125).abs() < 1e-6);
}

#[test]
fn sampling_is_idempotent() {
    let terrain = ramp_terrain(64, 1.0);
    let builder = SnowPatchMeshBuilder::new(settings(12).with_edge_height_offset(1.5));
    let anchor = Vec3::new(13.37, 2.0, 21.5);
    assert_eq!(
        builder.build(anchor, &terrain),
        builder.build(anchor, &terrain)
    );
}

#[test]
fn bounds_scale_linearly_with_sample_size() {
    let scale = Vec3::new(0.5, 1.0, 0.5);
    for n in [4u32, 16, 64] {
        assert_eq!(snow_bounds(2 * n, scale), 2.0 * snow_bounds(n, scale));
    }

    let terrain = flat_terrain(256, 0.5);
    let anchor = Vec3::new(4.0, 0.0, 4.0);
    let small = build(settings(16), anchor, &terrain);
    let large = build(settings(32), anchor, &terrain);
    assert_eq!(small.bounds, 8.0);
    assert_eq!(large.bounds, 2.0 * small.bounds);
}

#[test]
fn bounds_follow_x_cell_scale() {
    let terrain = HeightfieldTerrain::new(64, 64, 1.0).with_cell_scale(2.0, 0.5);
    let sample = build(settings(8), Vec3::new(4.0, 0.0, 4.0), &terrain);
    assert_eq!(sample.bounds, 16.0);
}

#[test]
fn positions_encode_height_data() {
    let mut terrain = flat_terrain(64, 1.0);
    terrain.set(12, 11, 5.0);
    let sample = build(bare_settings(4), Vec3::new(10.0, 0.0, 10.0), &terrain);

    // Grid cell (x=2, z=1) is vertex x·N + z = 9.
    let p = sample.geometry.positions[9];
    assert_eq!(p, [2.0, 5.0, 1.0]);
}

#[test]
fn heights_are_relative_to_anchor() {
    let terrain = HeightfieldTerrain::from_fn(64, 64, 1.0, |_, _| 3.0);
    let sample = build(bare_settings(4), Vec3::new(10.0, 5.0, 10.0), &terrain);
    for p in &sample.geometry.positions {
        assert!((p[1] + 2.0).abs() < 1e-6);
    }
}

#[test]
fn fractional_anchor_snaps_vertices_to_terrain_grid() {
    let terrain = flat_terrain(64, 1.0);
    let anchor = Vec3::new(10.25, 0.0, 10.75);
    let sample = build(settings(4), anchor, &terrain);

    let first = sample.geometry.positions[0];
    assert!((first[0] + 0.25).abs() < 1e-5);
    assert!((first[2] + 0.75).abs() < 1e-5);
    for p in &sample.geometry.positions {
        let world_x = anchor.x + p[0];
        let world_z = anchor.z + p[2];
        assert!(
            (world_x - world_x.round()).abs() < 1e-4,
            "x not on grid: {world_x}"
        );
        assert!(
            (world_z - world_z.round()).abs() < 1e-4,
            "z not on grid: {world_z}"
        );
    }
}

#[test]
fn interpolated_sampling_follows_anchor_smoothly() {
    let terrain = ramp_terrain(64, 1.0);
    let anchor = Vec3::new(10.5, 0.0, 10.0);
    let base = bare_settings(4);

    let nearest = build(base.clone(), anchor, &terrain);
    let config = base.with_height_sampling(HeightSampling::Interpolated);
    let smooth = build(config, anchor, &terrain);

    assert!((nearest.geometry.positions[0][1] - 10.0).abs() < 1e-4);
    assert!((nearest.geometry.positions[0][0] + 0.5).abs() < 1e-5);
    assert!((smooth.geometry.positions[0][1] - 10.5).abs() < 1e-3);
    assert_eq!(smooth.geometry.positions[0][0], 0.0);
}

#[test]
fn terrain_origin_offsets_sampling() {
    let terrain = flat_terrain(64, 1.0).with_origin(Vec3::new(100.0, 5.0, 100.0));
    let config = settings(4).with_snow_offset(1.0).with_edge_falloff(0.0);
    let sample = build(config, Vec3::new(110.0, 5.0, 110.0), &terrain);
    assert!(sample.warning.is_none());
    for p in &sample.geometry.positions {
        assert!((p[1] - 1.0).abs() < 1e-6);
    }
}

#[test]
fn uvs_are_grid_normalized() {
    let terrain = flat_terrain(64, 1.0);
    let sample = build(settings(4), Vec3::new(1.0, 0.0, 1.0), &terrain);
    assert_eq!(sample.geometry.uvs[0], [0.0, 0.0]);
    assert_eq!(sample.geometry.uvs[1], [0.0, 0.25]);
    assert_eq!(sample.geometry.uvs[4], [0.25, 0.0]);
    assert_eq!(*sample.geometry.uvs.last().unwrap(), [0.75, 0.75]);
}

#[test]
fn mesh_has_all_required_attributes() {
    let terrain = flat_terrain(32, 1.0);
    let sample = build(settings(5), Vec3::new(2.0, 0.0, 2.0), &terrain);
    let mesh = sample.geometry.into_mesh();

    assert_eq!(mesh.count_vertices(), 25);
    assert_eq!(
        mesh.indices().expect("mesh must have indices").len(),
        4 * 4 * 6
    );
    assert!(
        mesh.attribute(Mesh::ATTRIBUTE_POSITION).is_some(),
        "missing POSITION"
    );
    assert!(
        mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some(),
        "missing NORMAL"
    );
    assert!(
        mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some(),
        "missing COLOR"
    );
    assert!(
        mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some(),
        "missing UV_0"
    );
}

#[test]
fn mesh_normals_are_unit_length() {
    let terrain = ramp_terrain(32, 2.0);
    let mesh = build(settings(8), Vec3::new(6.0, 0.0, 6.0), &terrain)
        .geometry
        .to_mesh();
    let normals = mesh
        .attribute(Mesh::ATTRIBUTE_NORMAL)
        .unwrap()
        .as_float3()
        .unwrap();
    for n in normals {
        let len = Vec3::from(*n).length();
        assert!((len - 1.0).abs() < 1e-5, "normal length {len} for {:?}", n);
    }
}
