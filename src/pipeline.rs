use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::info;

use crate::atlas::{self, TextureAtlas};
use crate::config::PipelineConfig;
use crate::error::{AtlasError, Result};
use crate::types::{TexturePatch, full_rect_texcoords};

/// Summary of a completed packing run.
#[derive(Debug)]
pub struct ProcessingResult {
    pub atlas_count: usize,
    pub atlas_size: u32,
    pub face_count: usize,
    pub texcoord_count: usize,
    pub duration: Duration,
}

/// Pipeline orchestrator -- drives loading, packing, and atlas output.
pub struct Pipeline;

impl Pipeline {
    /// Run the full packing pipeline over a directory of patch images.
    pub fn run(config: &PipelineConfig) -> Result<ProcessingResult> {
        let start = Instant::now();

        info!(input = %config.input.display(), "Starting packing run");

        let patches = load_patches(&config.input)?;
        if patches.is_empty() {
            return Err(AtlasError::Input(format!(
                "no patch images found in {}",
                config.input.display()
            )));
        }
        info!(patches = patches.len(), "Patches loaded");

        let atlases = atlas::generate_texture_atlases_with(patches, config.limits)?;
        write_atlases(&atlases, &config.output)?;

        let duration = start.elapsed();
        let atlas = &atlases[0];
        info!(
            atlases = atlases.len(),
            size = atlas.size(),
            elapsed = ?duration,
            "Packing complete"
        );

        Ok(ProcessingResult {
            atlas_count: atlases.len(),
            atlas_size: atlas.size(),
            face_count: atlases.iter().map(|a| a.faces().len()).sum(),
            texcoord_count: atlases.iter().map(|a| a.texcoords().len()).sum(),
            duration,
        })
    }
}

/// Load every supported image in `dir` as a fully valid texture patch.
///
/// Each image becomes one patch covering its full rect with two triangle
/// faces (ids `2i` and `2i + 1` in name order). HDR formats are decoded
/// as linear float; LDR formats are linearized with gamma 2.2.
fn load_patches(dir: &Path) -> Result<Vec<TexturePatch>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                extension_lowercase(path).as_deref(),
                Some("hdr" | "exr" | "png" | "jpg" | "jpeg")
            )
        })
        .collect();
    paths.sort();

    paths
        .par_iter()
        .enumerate()
        .map(|(i, path)| load_patch(path, 2 * i as u32))
        .collect()
}

fn load_patch(path: &Path, first_face: u32) -> Result<TexturePatch> {
    let decoded = image::open(path)?;
    let faces = vec![first_face, first_face + 1];

    let is_hdr = matches!(extension_lowercase(path).as_deref(), Some("hdr" | "exr"));
    if is_hdr {
        let hdr = decoded.into_rgb32f();
        let uvs = full_rect_texcoords(hdr.width(), hdr.height());
        TexturePatch::from_hdr(hdr, faces, uvs)
    } else {
        let ldr = decoded.into_rgb8();
        let uvs = full_rect_texcoords(ldr.width(), ldr.height());
        TexturePatch::from_ldr(&ldr, faces, uvs)
    }
}

// Extensions compare case-insensitively so `patch.PNG` loads like `patch.png`.
fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Write each atlas as PNG: the configured path for the first, an `_N`
/// suffix for any further atlases.
fn write_atlases(atlases: &[TextureAtlas], output: &Path) -> Result<()> {
    for (i, atlas) in atlases.iter().enumerate() {
        let path = if i == 0 {
            output.to_path_buf()
        } else {
            indexed_output(output, i)
        };
        info!(path = %path.display(), size = atlas.size(), "Writing atlas");
        atlas.image().save(&path)?;
    }
    Ok(())
}

fn indexed_output(output: &Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("atlas");
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("png");
    output.with_file_name(format!("{stem}_{index}.{ext}"))
}
