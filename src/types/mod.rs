pub mod patch;

pub use patch::{TexturePatch, full_rect_texcoords};
