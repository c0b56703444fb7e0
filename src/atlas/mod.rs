pub mod bin;
pub mod packer;
pub mod sizing;
pub mod texture_atlas;

pub use bin::RectangularBin;
pub use packer::{generate_texture_atlases, generate_texture_atlases_with};
pub use sizing::calculate_texture_size;
pub use texture_atlas::{TextureAtlas, ToneMapping, apply_edge_padding};
