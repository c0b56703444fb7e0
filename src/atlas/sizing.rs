use crate::config::AtlasLimits;
use crate::types::TexturePatch;

/// Heuristic for an efficient atlas edge length.
///
/// Expects `patches` sorted descending by pixel area; the early break on
/// the waste ratio relies on that ordering. Starts at `limits.max_size`
/// and halves while the patches plausibly fit a smaller atlas with low
/// padding overhead.
///
/// Asserts that no patch, padding included, exceeds `limits.max_size`;
/// the caller must guarantee this.
pub fn calculate_texture_size(patches: &[TexturePatch], limits: AtlasLimits) -> u32 {
    size_for_extents(
        &patches
            .iter()
            .map(|p| (p.width(), p.height()))
            .collect::<Vec<_>>(),
        limits,
    )
}

/// Dimension-level core of [`calculate_texture_size`].
pub(crate) fn size_for_extents(extents: &[(u32, u32)], limits: AtlasLimits) -> u32 {
    let mut size = limits.max_size;

    let max_padding = (limits.max_size >> 7).min(32);
    for &(w, h) in extents {
        assert!(
            w + 2 * max_padding <= limits.max_size && h + 2 * max_padding <= limits.max_size,
            "patch {w}x{h} exceeds the maximum atlas size {}",
            limits.max_size
        );
    }

    loop {
        let padding = (size >> 7).min(32);
        let mut total_area: u64 = 0;
        let mut max_width: u32 = 0;
        let mut max_height: u32 = 0;

        for &(w, h) in extents {
            let width = w + 2 * padding;
            let height = h + 2 * padding;

            max_width = max_width.max(width);
            max_height = max_height.max(height);

            let area = width as u64 * height as u64;
            let content = w as u64 * h as u64;
            let waste = area - content;

            // Only consider patches where the information dominates
            // padding. Since the patches are sorted by size, the
            // remaining patches contribute negligibly.
            if waste as f64 / content as f64 > 1.0 {
                break;
            }

            total_area += area;
        }

        if size <= limits.min_size {
            return limits.min_size;
        }

        if max_height < size / 2
            && max_width < size / 2
            && (total_area as f64) / (size as f64 * size as f64) < 0.2
        {
            size /= 2;
            continue;
        }

        return size;
    }
}
