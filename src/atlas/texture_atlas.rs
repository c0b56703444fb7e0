use std::collections::BTreeMap;

use glam::Vec2;
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

use crate::atlas::bin::RectangularBin;
use crate::error::{AtlasError, Result};
use crate::types::TexturePatch;

const INV_GAMMA: f32 = 1.0 / 2.2;

/// Reinhard tone-mapping parameters for one insertion.
///
/// `mean` is the scene key (average luminance) and `max` the maximum
/// luminance after key scaling, as in Reinhard et al., "Photographic tone
/// reproduction for digital images", TOG 2002.
#[derive(Debug, Clone, Copy)]
pub struct ToneMapping {
    pub mean: f32,
    pub max: f32,
}

impl ToneMapping {
    const MIN_LUMINANCE: f32 = 1e-4;

    /// Derive parameters from a patch's own HDR statistics: `mean` is the
    /// average Rec. 709 luminance over valid pixels and `max` the maximum
    /// luminance scaled by the key factor `0.18 / mean`. Both are clamped
    /// away from zero so all-black or fully invalid patches stay finite.
    pub fn from_patch(patch: &TexturePatch) -> Self {
        let mut sum = 0.0f64;
        let mut peak = 0.0f32;
        let mut count = 0u64;

        for (pixel, mask) in patch.image().pixels().zip(patch.validity_mask().pixels()) {
            if mask.0[0] == 0 {
                continue;
            }
            let [r, g, b] = pixel.0.map(|c| c.max(0.0));
            let luminance = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            sum += luminance as f64;
            peak = peak.max(luminance);
            count += 1;
        }

        if count == 0 {
            return Self { mean: 1.0, max: 1.0 };
        }

        let mean = ((sum / count as f64) as f32).max(Self::MIN_LUMINANCE);
        let max = ((0.18 / mean) * peak).max(Self::MIN_LUMINANCE);
        Self { mean, max }
    }
}

/// One fixed-size square texture atlas.
///
/// Accumulates tone-mapped patch pixels, their validity, and the face/UV
/// lists of everything packed into it. `finalize` runs edge padding and
/// UV deduplication, after which the atlas is immutable.
#[derive(Debug)]
pub struct TextureAtlas {
    size: u32,
    padding: u32,
    bin: Option<RectangularBin>,
    image: RgbImage,
    validity_mask: Option<GrayImage>,
    faces: Vec<u32>,
    texcoords: Vec<Vec2>,
    texcoord_ids: Vec<usize>,
    finalized: bool,
}

impl TextureAtlas {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            padding: size >> 7,
            bin: Some(RectangularBin::new(size, size)),
            image: RgbImage::new(size, size),
            validity_mask: Some(GrayImage::new(size, size)),
            faces: Vec::new(),
            texcoords: Vec::new(),
            texcoord_ids: Vec::new(),
            finalized: false,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Mesh face ids of every inserted patch, in insertion order.
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    /// Atlas-normalized UV coordinates: three per face before `finalize`,
    /// the deduplicated table afterwards.
    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    /// Per-face UV index triplets into [`Self::texcoords`]; filled by
    /// `finalize`.
    pub fn texcoord_ids(&self) -> &[usize] {
        &self.texcoord_ids
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Insert a patch, tone mapping its valid pixels into the atlas.
    ///
    /// Returns `Ok(false)` without mutating any state when the packer has
    /// no room for the padded patch rect, `Err(AlreadyFinalized)` after
    /// `finalize`.
    pub fn insert(&mut self, patch: &TexturePatch, tone: &ToneMapping) -> Result<bool> {
        // Bin and mask are released together by finalize.
        let (Some(bin), Some(mask)) = (self.bin.as_mut(), self.validity_mask.as_mut()) else {
            return Err(AtlasError::AlreadyFinalized);
        };

        let width = patch.width();
        let height = patch.height();
        let Some((x, y)) = bin.insert(width + 2 * self.padding, height + 2 * self.padding) else {
            return Ok(false);
        };

        let staged = tone_map_patch(patch, tone);

        // Blit image and validity at the placement, offset by the padding
        // ring; the ring itself is filled later by edge padding.
        let dst_x = x + self.padding;
        let dst_y = y + self.padding;
        let atlas_pixels: &mut [u8] = &mut self.image;
        let mask_pixels: &mut [u8] = mask;
        let row_bytes = (width * 3) as usize;
        for row in 0..height {
            let src_offset = (row * width * 3) as usize;
            let img_offset = (((dst_y + row) * self.size + dst_x) * 3) as usize;
            atlas_pixels[img_offset..img_offset + row_bytes]
                .copy_from_slice(&staged[src_offset..src_offset + row_bytes]);

            let mask_src = (row * width) as usize;
            let mask_dst = ((dst_y + row) * self.size + dst_x) as usize;
            mask_pixels[mask_dst..mask_dst + width as usize].copy_from_slice(
                &patch.validity_mask().as_raw()[mask_src..mask_src + width as usize],
            );
        }

        self.faces.extend_from_slice(patch.faces());

        // Final texcoords: translate into atlas pixel space, then
        // normalize by the atlas edge length.
        let offset = Vec2::new(dst_x as f32, dst_y as f32);
        for &uv in patch.texcoords() {
            self.texcoords.push((uv + offset) / self.size as f32);
        }

        Ok(true)
    }

    /// Collapse the raw per-face texcoords into a deduplicated table plus
    /// per-entry indices. Exact bitwise equality; first occurrence wins.
    fn merge_texcoords(&mut self) {
        let raw = std::mem::take(&mut self.texcoords);

        // Coordinates are non-negative after normalization, so the bit
        // pattern order is a consistent total order over values.
        let mut texcoord_map: BTreeMap<(u32, u32), usize> = BTreeMap::new();
        for texcoord in raw {
            let key = (texcoord.x.to_bits(), texcoord.y.to_bits());
            match texcoord_map.get(&key) {
                Some(&id) => self.texcoord_ids.push(id),
                None => {
                    let id = self.texcoords.len();
                    texcoord_map.insert(key, id);
                    self.texcoords.push(texcoord);
                    self.texcoord_ids.push(id);
                }
            }
        }
    }

    /// Close out the atlas: release the packer, fill the padding rings by
    /// dilation, release the validity mask, deduplicate texcoords.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(AtlasError::AlreadyFinalized);
        }

        self.bin = None;
        if let Some(mut mask) = self.validity_mask.take() {
            apply_edge_padding(&mut self.image, &mut mask, self.padding);
        }
        self.merge_texcoords();

        self.finalized = true;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn validity_mask(&self) -> Option<&GrayImage> {
        self.validity_mask.as_ref()
    }
}

/// Tone map one patch into an 8-bit staging buffer (row-parallel).
///
/// Per valid channel sample: clamp negatives, apply the Reinhard operator
/// with the given parameters, clamp to [0, 1], gamma correct with 1/2.2,
/// quantize. Invalid pixels stay black.
fn tone_map_patch(patch: &TexturePatch, tone: &ToneMapping) -> Vec<u8> {
    let width = patch.width() as usize;
    let scale = 0.18 / tone.mean;
    let max_2 = tone.max * tone.max;

    let mut staged = vec![0u8; width * patch.height() as usize * 3];
    staged
        .par_chunks_mut(width * 3)
        .zip(patch.image().as_raw().par_chunks(width * 3))
        .zip(patch.validity_mask().as_raw().par_chunks(width))
        .for_each(|((dst_row, src_row), mask_row)| {
            for px in 0..width {
                if mask_row[px] == 0 {
                    continue;
                }
                for c in 0..3 {
                    let v = src_row[px * 3 + c].max(0.0) * scale;
                    let v = (v * (1.0 + v / max_2)) / (1.0 + v);
                    let ldr = v.clamp(0.0, 1.0).powf(INV_GAMMA);
                    dst_row[px * 3 + c] = (ldr * 255.0) as u8;
                }
            }
        });

    staged
}

const GAUSS: [f32; 9] = [1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0];

fn has_valid_neighbor(mask: &[u8], width: i64, height: i64, x: i64, y: i64) -> bool {
    for dy in -1..=1i64 {
        for dx in -1..=1i64 {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || width <= nx || ny < 0 || height <= ny {
                continue;
            }
            if mask[(ny * width + nx) as usize] == 255 {
                return true;
            }
        }
    }
    false
}

/// Fill the invalid border around every patch with weighted averages of
/// valid neighbors, dilating outward one ring per iteration for
/// `padding + 1` iterations.
///
/// New pixels are committed to the validity mask only after a full pass,
/// so one iteration's output never feeds its own averaging. A pixel, once
/// valid, is never changed again.
pub fn apply_edge_padding(image: &mut RgbImage, validity_mask: &mut GrayImage, padding: u32) {
    let width = image.width() as i64;
    let height = image.height() as i64;
    let mask: &mut [u8] = validity_mask;
    let pixels: &mut [u8] = image;

    // Invalid pixels bordering the valid area form the initial frontier.
    let mut frontier: Vec<usize> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            if mask[idx] == 255 {
                continue;
            }
            if has_valid_neighbor(mask, width, height, x, y) {
                frontier.push(idx);
            }
        }
    }

    for _ in 0..=padding {
        let mut new_valid_pixels: Vec<usize> = Vec::new();

        for &idx in &frontier {
            let x = idx as i64 % width;
            let y = idx as i64 / width;

            let mut norm = 0.0f32;
            let mut value = [0.0f32; 3];
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || width <= nx || ny < 0 || height <= ny {
                        continue;
                    }
                    let nidx = (ny * width + nx) as usize;
                    if mask[nidx] != 255 {
                        continue;
                    }

                    let w = GAUSS[((dy + 1) * 3 + (dx + 1)) as usize];
                    norm += w;
                    for c in 0..3 {
                        value[c] += pixels[nidx * 3 + c] as f32 * w;
                    }
                }
            }

            if norm <= 0.0 {
                continue;
            }

            for c in 0..3 {
                pixels[idx * 3 + c] = (value[c] / norm) as u8;
            }
            new_valid_pixels.push(idx);
        }

        // Commit after the full pass so averaging order stays irrelevant.
        for &idx in &new_valid_pixels {
            mask[idx] = 255;
        }

        // Next frontier: invalid neighbors of the newly valid ring.
        frontier.clear();
        let mut queued = std::collections::BTreeSet::new();
        for &idx in &new_valid_pixels {
            let x = idx as i64 % width;
            let y = idx as i64 / width;
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || width <= nx || ny < 0 || height <= ny {
                        continue;
                    }
                    let nidx = (ny * width + nx) as usize;
                    if mask[nidx] == 255 {
                        continue;
                    }
                    if queued.insert(nidx) {
                        frontier.push(nidx);
                    }
                }
            }
        }
    }
}
