//! End-to-end packing tests.
//!
//! These tests build synthetic texture patches, run the full packing
//! path, and validate the finalized atlases.

use glam::Vec2;
use image::{GrayImage, Rgb32FImage};

use photo_atlas::config::PipelineConfig;
use photo_atlas::types::full_rect_texcoords;
use photo_atlas::{AtlasError, Pipeline, TexturePatch, ToneMapping, generate_texture_atlases};

/// A fully valid solid-color patch with two full-rect triangle faces.
fn solid_patch(w: u32, h: u32, color: [f32; 3], first_face: u32) -> TexturePatch {
    let image = Rgb32FImage::from_pixel(w, h, image::Rgb(color));
    TexturePatch::from_hdr(
        image,
        vec![first_face, first_face + 1],
        full_rect_texcoords(w, h),
    )
    .unwrap()
}

/// A patch with a circular validity region, exercising partial masks.
fn masked_patch(size: u32, first_face: u32) -> TexturePatch {
    let image = Rgb32FImage::from_pixel(size, size, image::Rgb([0.6, 0.3, 0.1]));
    let c = size as f32 / 2.0;
    let r = c - 1.0;
    let mask = GrayImage::from_fn(size, size, |x, y| {
        let dx = x as f32 - c;
        let dy = y as f32 - c;
        if dx * dx + dy * dy <= r * r {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    });
    TexturePatch::new(
        image,
        mask,
        vec![first_face, first_face + 1],
        full_rect_texcoords(size, size),
    )
    .unwrap()
}

#[test]
fn pack_many_patches_preserves_every_face() {
    let mut patches = Vec::new();
    for i in 0..30u32 {
        let edge = 20 + (i % 7) * 10;
        patches.push(solid_patch(edge, edge, [0.5, 0.4, 0.3], i * 2));
    }

    let atlases = generate_texture_atlases(patches).unwrap();
    assert_eq!(atlases.len(), 1);

    let atlas = &atlases[0];
    assert!(atlas.is_finalized());

    let mut faces = atlas.faces().to_vec();
    faces.sort();
    let expected: Vec<u32> = (0..60).collect();
    assert_eq!(faces, expected, "every input face exactly once");

    // Post-merge structure: 3 indices per face, all in range.
    assert_eq!(atlas.texcoord_ids().len(), atlas.faces().len() * 3);
    for &id in atlas.texcoord_ids() {
        assert!(id < atlas.texcoords().len());
    }
    for uv in atlas.texcoords() {
        assert!((0.0..=1.0).contains(&uv.x), "u out of range: {}", uv.x);
        assert!((0.0..=1.0).contains(&uv.y), "v out of range: {}", uv.y);
    }
}

#[test]
fn single_patch_uv_round_trip_is_exact() {
    // One patch: the guillotine places it at (0, 0), so the expected
    // atlas-normalized coordinates are computable by hand.
    let patch = solid_patch(40, 30, [0.5, 0.5, 0.5], 0);
    let raw_uvs: Vec<Vec2> = patch.texcoords().to_vec();

    let atlases = generate_texture_atlases(vec![patch]).unwrap();
    let atlas = &atlases[0];
    assert_eq!(atlas.size(), 256);
    let pad = atlas.padding() as f32;
    let size = atlas.size() as f32;

    assert_eq!(atlas.texcoord_ids().len(), raw_uvs.len());
    for (i, &id) in atlas.texcoord_ids().iter().enumerate() {
        let expected = (raw_uvs[i] + Vec2::splat(pad)) / size;
        assert_eq!(
            atlas.texcoords()[id],
            expected,
            "face corner {i} must resolve exactly"
        );
    }

    // The two triangles share two corners: 6 raw entries, 4 unique.
    assert_eq!(atlas.texcoords().len(), 4);
}

#[test]
fn masked_patch_gets_dilated_seams() {
    let atlases = generate_texture_atlases(vec![masked_patch(64, 0)]).unwrap();
    let atlas = &atlases[0];
    let pad = atlas.padding();

    // The circle center lands at (pad + 32, pad + 32) with radius 31.
    // Two pixels past the circle edge the mask was invalid; after
    // finalize the dilation (padding + 1 rings) has filled it.
    let cx = pad + 32;
    let ring = atlas.image().get_pixel(cx + 33, cx).0;
    assert!(ring[0] > 0, "dilation should grow past the circle edge");

    // Center pixel keeps the tone-mapped patch color.
    let center = atlas.image().get_pixel(cx, cx).0;
    assert!(center[0] > center[1] && center[1] > center[2]);
}

#[test]
fn capacity_overflow_returns_no_atlas() {
    let limits = photo_atlas::AtlasLimits {
        min_size: 256,
        max_size: 512,
    };
    let patches = vec![
        solid_patch(400, 400, [0.5, 0.5, 0.5], 0),
        solid_patch(400, 400, [0.5, 0.5, 0.5], 2),
    ];
    let err = photo_atlas::atlas::generate_texture_atlases_with(patches, limits).unwrap_err();
    assert!(matches!(err, AtlasError::CapacityExceeded(512)));
}

#[test]
fn finalize_twice_is_rejected() {
    let atlases = generate_texture_atlases(vec![solid_patch(16, 16, [0.5, 0.5, 0.5], 0)]).unwrap();
    let mut atlas = atlases.into_iter().next().unwrap();
    assert!(matches!(
        atlas.finalize().unwrap_err(),
        AtlasError::AlreadyFinalized
    ));
}

#[test]
fn insert_after_pipeline_finalize_is_rejected() {
    let patch = solid_patch(16, 16, [0.5, 0.5, 0.5], 0);
    let atlases = generate_texture_atlases(vec![patch.clone()]).unwrap();
    let mut atlas = atlases.into_iter().next().unwrap();
    let err = atlas
        .insert(&patch, &ToneMapping::from_patch(&patch))
        .unwrap_err();
    assert!(matches!(err, AtlasError::AlreadyFinalized));
}

#[test]
fn cli_pipeline_packs_a_directory_of_images() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("atlas.png");

    for i in 0..4u32 {
        let img = image::RgbImage::from_fn(32 + i * 8, 32 + i * 8, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                image::Rgb([200, 60, 60])
            } else {
                image::Rgb([60, 60, 200])
            }
        });
        img.save(dir.path().join(format!("patch_{i}.png"))).unwrap();
    }

    let config = PipelineConfig {
        input: dir.path().to_path_buf(),
        output: out.clone(),
        ..Default::default()
    };

    let result = Pipeline::run(&config).unwrap();
    assert_eq!(result.atlas_count, 1);
    assert_eq!(result.face_count, 8);
    assert!(result.texcoord_count >= 16);

    let atlas = image::open(&out).unwrap().into_rgb8();
    assert_eq!(atlas.width(), result.atlas_size);
    assert_eq!(atlas.height(), result.atlas_size);
    // Some checkerboard color must have survived tone mapping.
    assert!(atlas.pixels().any(|p| p.0[0] > 50));
}

#[test]
fn empty_directory_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        input: dir.path().to_path_buf(),
        output: dir.path().join("atlas.png"),
        ..Default::default()
    };
    assert!(matches!(
        Pipeline::run(&config).unwrap_err(),
        AtlasError::Input(_)
    ));
}
