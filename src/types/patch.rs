use glam::Vec2;
use image::{GrayImage, Rgb32FImage, RgbImage};

use crate::error::{AtlasError, Result};

/// A rectangular texture fragment awaiting atlas placement.
///
/// Produced by an upstream reprojection stage: a linear HDR color image,
/// a per-pixel validity mask (0 = invalid, 255 = valid), the mesh faces
/// the fragment textures, and three UV coordinates per face in patch-local
/// pixel space (unnormalized).
#[derive(Debug, Clone)]
pub struct TexturePatch {
    image: Rgb32FImage,
    validity_mask: GrayImage,
    faces: Vec<u32>,
    texcoords: Vec<Vec2>,
}

impl TexturePatch {
    /// Build a patch, validating buffer and face/UV consistency.
    pub fn new(
        image: Rgb32FImage,
        validity_mask: GrayImage,
        faces: Vec<u32>,
        texcoords: Vec<Vec2>,
    ) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AtlasError::InvalidPatch("zero-sized image".into()));
        }
        if image.dimensions() != validity_mask.dimensions() {
            return Err(AtlasError::InvalidPatch(format!(
                "validity mask is {}x{} but image is {}x{}",
                validity_mask.width(),
                validity_mask.height(),
                image.width(),
                image.height()
            )));
        }
        if texcoords.len() != faces.len() * 3 {
            return Err(AtlasError::InvalidPatch(format!(
                "{} faces require {} texcoords, got {}",
                faces.len(),
                faces.len() * 3,
                texcoords.len()
            )));
        }
        Ok(Self {
            image,
            validity_mask,
            faces,
            texcoords,
        })
    }

    /// Build a fully valid patch from an 8-bit image, linearizing with
    /// gamma 2.2. Used when packing loose LDR patch images.
    pub fn from_ldr(image: &RgbImage, faces: Vec<u32>, texcoords: Vec<Vec2>) -> Result<Self> {
        let (w, h) = image.dimensions();
        let hdr = Rgb32FImage::from_fn(w, h, |x, y| {
            let px = image.get_pixel(x, y);
            image::Rgb(px.0.map(|c| (c as f32 / 255.0).powf(2.2)))
        });
        let mask = GrayImage::from_pixel(w, h, image::Luma([255]));
        Self::new(hdr, mask, faces, texcoords)
    }

    /// Build a fully valid patch from a linear HDR image.
    pub fn from_hdr(image: Rgb32FImage, faces: Vec<u32>, texcoords: Vec<Vec2>) -> Result<Self> {
        let mask = GrayImage::from_pixel(image.width(), image.height(), image::Luma([255]));
        Self::new(image, mask, faces, texcoords)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel area (width * height); the packing sort key.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn image(&self) -> &Rgb32FImage {
        &self.image
    }

    pub fn validity_mask(&self) -> &GrayImage {
        &self.validity_mask
    }

    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }
}

/// Two triangle faces covering the full `w` x `h` rect, in patch-local
/// pixel space. Convenience for whole-image patches.
pub fn full_rect_texcoords(w: u32, h: u32) -> Vec<Vec2> {
    let (w, h) = (w as f32, h as f32);
    vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(w, 0.0),
        Vec2::new(w, h),
        Vec2::new(0.0, 0.0),
        Vec2::new(w, h),
        Vec2::new(0.0, h),
    ]
}
