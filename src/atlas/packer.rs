use tracing::{debug, info};

use crate::atlas::sizing::calculate_texture_size;
use crate::atlas::texture_atlas::{TextureAtlas, ToneMapping};
use crate::config::AtlasLimits;
use crate::error::{AtlasError, Result};
use crate::types::TexturePatch;

/// Pack every patch into finalized texture atlases.
///
/// Patches are processed in descending area order (larger patches first
/// reduces fragmentation). The atlas starts at the heuristic size; when a
/// sweep hits a patch that no longer fits, the partial atlas is discarded,
/// the edge length doubles, and the sweep restarts from the beginning.
/// Doubling past `limits.max_size` is fatal: no atlas is returned.
pub fn generate_texture_atlases_with(
    mut patches: Vec<TexturePatch>,
    limits: AtlasLimits,
) -> Result<Vec<TextureAtlas>> {
    // Improve bin-packing efficiency by sorting texture patches in
    // descending order of size.
    patches.sort_by(|a, b| b.area().cmp(&a.area()));

    let total = patches.len();
    let mut size = calculate_texture_size(&patches, limits);
    info!(size, patches = total, "Packing texture atlas");

    let mut atlas = TextureAtlas::new(size);
    'sweep: loop {
        for (done, patch) in patches.iter().enumerate() {
            if total > 100 && done % (total / 100) == 0 {
                debug!(percent = done * 100 / total, "Working on atlas");
            }

            let tone = ToneMapping::from_patch(patch);
            if !atlas.insert(patch, &tone)? {
                // Texture atlas was too small, try again.
                size *= 2;
                if size > limits.max_size {
                    return Err(AtlasError::CapacityExceeded(limits.max_size));
                }
                debug!(size, "Atlas too small, restarting sweep");
                atlas = TextureAtlas::new(size);
                continue 'sweep;
            }
        }
        break;
    }

    atlas.finalize()?;
    info!(
        size = atlas.size(),
        faces = atlas.faces().len(),
        texcoords = atlas.texcoords().len(),
        "Atlas finalized"
    );

    Ok(vec![atlas])
}

/// [`generate_texture_atlases_with`] under the default size bounds.
pub fn generate_texture_atlases(patches: Vec<TexturePatch>) -> Result<Vec<TextureAtlas>> {
    generate_texture_atlases_with(patches, AtlasLimits::default())
}
